// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Collaborator contracts the engine runs against.
//!
//! The engine never talks to a database directly. It drives an area store
//! and a generation store through these traits, wrapped in one atomic scope
//! provided by [`Catalogue::atomically`], and reports progress through a
//! [`ProgressSink`] that must live outside that scope.

use branch_import_domain::{AreaRecord, AreaType, AreaUpdate, CodeType, Generation, NewArea};
use geo::Polygon;
use std::collections::{BTreeSet, HashMap};

use crate::error::StoreError;

/// Code-keyed access to areas, their codes and their polygons.
pub trait AreaStore {
    /// Returns every area carrying one of the given GSS codes.
    ///
    /// One batched lookup; a code may match several areas.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_areas_by_gss(&mut self, codes: &BTreeSet<String>)
    -> Result<Vec<AreaRecord>, StoreError>;

    /// Loads the stored polygons of the given areas, keyed by area id.
    ///
    /// Areas without polygons are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or a geometry cannot be decoded.
    fn load_polygons(
        &mut self,
        area_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Polygon<f64>>>, StoreError>;

    /// Creates an area and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn create_area(&mut self, area: &NewArea) -> Result<i64, StoreError>;

    /// Overwrites the name, type, parent and generation range of an area.
    ///
    /// Region, branch and branch variant codes other than the one matching
    /// the new type are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn update_area(&mut self, area_id: i64, update: &AreaUpdate) -> Result<(), StoreError>;

    /// Deletes an area together with its codes and polygons.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete_area(&mut self, area_id: i64) -> Result<(), StoreError>;

    /// Deletes every area of the given types and returns how many went.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete_areas_of_types(&mut self, types: &[AreaType]) -> Result<usize, StoreError>;

    /// Sets the code of the given type on an area, inserting it if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn upsert_code(&mut self, area_id: i64, code_type: CodeType, code: &str)
    -> Result<(), StoreError>;

    /// Adds polygons to an area.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_polygons(&mut self, area_id: i64, polygons: &[Polygon<f64>])
    -> Result<(), StoreError>;

    /// Removes every polygon of an area and returns how many went.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete_polygons(&mut self, area_id: i64) -> Result<usize, StoreError>;
}

/// Access to dataset generations.
pub trait GenerationStore {
    /// The latest active generation, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn current_generation(&mut self) -> Result<Option<Generation>, StoreError>;

    /// Creates a new, not yet active, generation.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn create_generation(&mut self, description: &str) -> Result<Generation, StoreError>;

    /// Looks a generation up by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn get_generation(&mut self, generation_id: i64) -> Result<Option<Generation>, StoreError>;
}

/// An area and generation store that can run work atomically.
pub trait Catalogue: AreaStore + GenerationStore {
    /// Runs `f` inside a transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns `Err` or panics. A panic is re-raised after the rollback.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or a store error if the transaction itself
    /// cannot be opened, committed or rolled back.
    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>;
}

/// Out-of-band receiver for progress messages.
///
/// Implementations must persist independently of any open [`Catalogue`]
/// transaction.
pub trait ProgressSink {
    /// Records the latest message for a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be stored. The engine logs and
    /// ignores it.
    fn update(&mut self, task_id: &str, message: &str) -> Result<(), StoreError>;
}
