// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use branch_import::GenerationStore;
use branch_import_domain::Generation;

use crate::{Persistence, PersistenceError};

#[test]
fn test_new_generation_starts_inactive() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let generation: Generation = persistence.create_generation("spring").unwrap();

    assert!(!generation.is_active());
    assert_eq!(generation.description(), "spring");
    assert_eq!(persistence.current_generation().unwrap(), None);
}

#[test]
fn test_current_generation_is_latest_active() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let first: Generation = persistence.new_generation("first").unwrap();
    let second: Generation = persistence.new_generation("second").unwrap();
    let third: Generation = persistence.new_generation("third").unwrap();
    persistence.activate_generation(first.id()).unwrap();
    persistence.activate_generation(second.id()).unwrap();

    let current: Generation = persistence.current_generation().unwrap().unwrap();
    assert_eq!(current.id(), second.id());
    assert!(current.is_active());
    assert!(
        !persistence
            .get_generation(third.id())
            .unwrap()
            .unwrap()
            .is_active()
    );
}

#[test]
fn test_get_unknown_generation_is_none() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    assert_eq!(persistence.get_generation(99).unwrap(), None);
}

#[test]
fn test_activate_unknown_generation_fails() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    assert_eq!(
        persistence.activate_generation(99),
        Err(PersistenceError::GenerationNotFound(99))
    );
}

#[test]
fn test_list_generations_oldest_first() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    persistence.new_generation("a").unwrap();
    persistence.new_generation("b").unwrap();

    let descriptions: Vec<String> = persistence
        .list_generations()
        .unwrap()
        .iter()
        .map(|generation| generation.description().to_string())
        .collect();
    assert_eq!(descriptions, vec!["a", "b"]);
}
