// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod generation_tests;

use branch_import::AreaStore;
use branch_import_domain::geometry::square;
use branch_import_domain::{AreaType, CodeType, Generation, GenerationRange, NewArea};
use geo::Polygon;

use crate::Persistence;

pub const HEADER: &str = "area_type,area_id,area_name,area_gss,gss_code,parent_gss_code";

/// Builds CSV text from rows of
/// `[area_type, area_id, area_name, area_gss, gss_code, parent_gss_code]`.
pub fn csv(rows: &[[&str; 6]]) -> String {
    let mut text: String = format!("{HEADER}\n");
    for row in rows {
        text.push_str(&row.join(","));
        text.push('\n');
    }
    text
}

/// A fresh catalogue with one active generation.
pub fn create_test_persistence() -> (Persistence, Generation) {
    let mut persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create persistence");
    let generation: Generation = persistence
        .new_generation("initial")
        .expect("Failed to create generation");
    persistence
        .activate_generation(generation.id())
        .expect("Failed to activate generation");
    (persistence, generation)
}

/// Seeds an area carrying `gss` with the given polygons.
pub fn add_area(
    persistence: &mut Persistence,
    generation: &Generation,
    name: &str,
    area_type: AreaType,
    gss: &str,
    polygons: &[Polygon<f64>],
) -> i64 {
    let area_id: i64 = persistence
        .create_area(&NewArea {
            name: name.to_string(),
            area_type,
            parent_id: None,
            generations: GenerationRange::single(generation.id()),
        })
        .unwrap();
    persistence
        .upsert_code(area_id, CodeType::Gss, gss)
        .unwrap();
    persistence.insert_polygons(area_id, polygons).unwrap();
    area_id
}

/// Seeds a ward-like subarea that is a square of `width` metres.
pub fn add_subarea(
    persistence: &mut Persistence,
    generation: &Generation,
    gss: &str,
    x: f64,
    y: f64,
    width: f64,
) -> i64 {
    add_area(
        persistence,
        generation,
        gss,
        AreaType::Other(String::from("UTW")),
        gss,
        &[square(x, y, width)],
    )
}

/// Two adjacent 1 km wards `W1` and `W2`, a ward `W3` straddling their
/// eastern edge and a far-away ward `W4`.
pub fn create_seeded_persistence() -> (Persistence, Generation) {
    let (mut persistence, generation) = create_test_persistence();
    add_subarea(&mut persistence, &generation, "W1", 0.0, 0.0, 1000.0);
    add_subarea(&mut persistence, &generation, "W2", 1000.0, 0.0, 1000.0);
    add_subarea(&mut persistence, &generation, "W3", 1500.0, 0.0, 1000.0);
    add_subarea(&mut persistence, &generation, "W4", 9000.0, 9000.0, 1000.0);
    (persistence, generation)
}
