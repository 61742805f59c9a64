// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the area catalogue.
//!
//! This crate stores areas, their codes and polygons, and dataset
//! generations in `SQLite` through Diesel, and implements the store traits
//! the import engine runs against.
//!
//! ## Databases
//!
//! - The **catalogue** (`Persistence`) holds areas and generations. Imports
//!   run inside one transaction on its connection.
//! - The **progress store** (`ProgressStore`) holds one progress row per
//!   task on a connection of its own, to a database of its own. `SQLite`
//!   allows a single writer per database, so progress written next to an
//!   open import transaction would either block or be rolled back with it.
//!
//! ## Testing Philosophy
//!
//! - Tests run against isolated shared-cache in-memory databases
//! - Each `new_in_memory()` call gets a fresh database name from an atomic
//!   counter, so tests never see each other's data

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use branch_import::{AreaStore, Catalogue, GenerationStore, ProgressSink, StoreError};
use branch_import_domain::{
    AreaRecord, AreaType, AreaUpdate, CodeType, Generation, NewArea, ProgressRecord,
};
use diesel::SqliteConnection;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use geo::Polygon;
use std::collections::{BTreeSet, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// How long a connection waits on a locked database file.
const BUSY_TIMEOUT_MS: u32 = 5_000;

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::AreaDetails;
pub use error::PersistenceError;

/// Opens a uniquely named shared-cache in-memory database.
fn open_in_memory(prefix: &str) -> Result<SqliteConnection, PersistenceError> {
    let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let shared_memory_url = format!("file:{prefix}_{db_id}?mode=memory&cache=shared");

    let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
    backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;
    Ok(conn)
}

/// Opens (creating if needed) a file-based database.
fn open_file(path: &Path) -> Result<SqliteConnection, PersistenceError> {
    let path_str = path.to_str().ok_or_else(|| {
        PersistenceError::InitializationError("Invalid database path".to_string())
    })?;

    let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
    backend::sqlite::enable_wal_mode(&mut conn)?;
    backend::sqlite::set_busy_timeout(&mut conn, BUSY_TIMEOUT_MS)?;
    backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;
    Ok(conn)
}

/// Persistence adapter for the area catalogue and its generations.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        Ok(Self {
            conn: open_in_memory("memdb_test")?,
        })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        Ok(Self {
            conn: open_file(path.as_ref())?,
        })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Generations
    // ========================================================================

    /// Lists every generation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_generations(&mut self) -> Result<Vec<Generation>, PersistenceError> {
        queries::generations::list_generations(&mut self.conn)
    }

    /// Creates a new, inactive generation outside of any import.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn new_generation(&mut self, description: &str) -> Result<Generation, PersistenceError> {
        mutations::generations::create_generation(&mut self.conn, description)
    }

    /// Marks a generation active.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::GenerationNotFound` if the generation does
    /// not exist.
    pub fn activate_generation(&mut self, generation_id: i64) -> Result<(), PersistenceError> {
        mutations::generations::activate_generation(&mut self.conn, generation_id)
    }

    // ========================================================================
    // Area Queries
    // ========================================================================

    /// Retrieves an area by GSS code, with its codes and polygons.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_area_by_gss(&mut self, gss: &str) -> Result<Option<AreaDetails>, PersistenceError> {
        queries::areas::get_area_by_gss(&mut self.conn, gss)
    }

    /// Counts areas, optionally restricted to one type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_areas(&mut self, area_type: Option<&AreaType>) -> Result<i64, PersistenceError> {
        queries::areas::count_areas(&mut self.conn, area_type)
    }

    /// Counts the polygon rows stored for an area.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_polygons(&mut self, area_id: i64) -> Result<i64, PersistenceError> {
        queries::areas::count_polygons(&mut self.conn, area_id)
    }
}

impl AreaStore for Persistence {
    fn find_areas_by_gss(
        &mut self,
        codes: &BTreeSet<String>,
    ) -> Result<Vec<AreaRecord>, StoreError> {
        Ok(queries::areas::find_areas_by_gss(&mut self.conn, codes)?)
    }

    fn load_polygons(
        &mut self,
        area_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Polygon<f64>>>, StoreError> {
        Ok(queries::areas::load_polygons(&mut self.conn, area_ids)?)
    }

    fn create_area(&mut self, area: &NewArea) -> Result<i64, StoreError> {
        Ok(mutations::areas::create_area(&mut self.conn, area)?)
    }

    fn update_area(&mut self, area_id: i64, update: &AreaUpdate) -> Result<(), StoreError> {
        Ok(mutations::areas::update_area(&mut self.conn, area_id, update)?)
    }

    fn delete_area(&mut self, area_id: i64) -> Result<(), StoreError> {
        Ok(mutations::areas::delete_area(&mut self.conn, area_id)?)
    }

    fn delete_areas_of_types(&mut self, types: &[AreaType]) -> Result<usize, StoreError> {
        Ok(mutations::areas::delete_areas_of_types(&mut self.conn, types)?)
    }

    fn upsert_code(
        &mut self,
        area_id: i64,
        code_type: CodeType,
        code: &str,
    ) -> Result<(), StoreError> {
        Ok(mutations::areas::upsert_code(
            &mut self.conn,
            area_id,
            code_type,
            code,
        )?)
    }

    fn insert_polygons(
        &mut self,
        area_id: i64,
        polygons: &[Polygon<f64>],
    ) -> Result<(), StoreError> {
        Ok(mutations::areas::insert_polygons(
            &mut self.conn,
            area_id,
            polygons,
        )?)
    }

    fn delete_polygons(&mut self, area_id: i64) -> Result<usize, StoreError> {
        Ok(mutations::areas::delete_polygons(&mut self.conn, area_id)?)
    }
}

impl GenerationStore for Persistence {
    fn current_generation(&mut self) -> Result<Option<Generation>, StoreError> {
        Ok(queries::generations::current_generation(&mut self.conn)?)
    }

    fn create_generation(&mut self, description: &str) -> Result<Generation, StoreError> {
        Ok(mutations::generations::create_generation(
            &mut self.conn,
            description,
        )?)
    }

    fn get_generation(&mut self, generation_id: i64) -> Result<Option<Generation>, StoreError> {
        Ok(queries::generations::get_generation(
            &mut self.conn,
            generation_id,
        )?)
    }
}

impl Catalogue for Persistence {
    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        AnsiTransactionManager::begin_transaction(&mut self.conn)
            .map_err(|e| E::from(StoreError::from(PersistenceError::from(e))))?;
        debug!("Began catalogue transaction");

        let outcome: Result<T, E> = match panic::catch_unwind(AssertUnwindSafe(|| f(&mut *self))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                self.roll_back();
                panic::resume_unwind(payload);
            }
        };

        match outcome {
            Ok(value) => {
                AnsiTransactionManager::commit_transaction(&mut self.conn)
                    .map_err(|e| E::from(StoreError::from(PersistenceError::from(e))))?;
                debug!("Committed catalogue transaction");
                Ok(value)
            }
            Err(err) => {
                self.roll_back();
                Err(err)
            }
        }
    }
}

impl Persistence {
    fn roll_back(&mut self) {
        if let Err(e) = AnsiTransactionManager::rollback_transaction(&mut self.conn) {
            warn!(error = %e, "Failed to roll back catalogue transaction");
        } else {
            debug!("Rolled back catalogue transaction");
        }
    }
}

/// Out-of-band store for import progress messages.
///
/// Owns its own connection to its own database so that progress is visible
/// to other readers while an import transaction is still open.
pub struct ProgressStore {
    conn: SqliteConnection,
}

impl ProgressStore {
    /// Creates a progress store backed by a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        Ok(Self {
            conn: open_in_memory("memdb_progress")?,
        })
    }

    /// Creates a progress store backed by a database file.
    ///
    /// The file must not be the catalogue database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        Ok(Self {
            conn: open_file(path.as_ref())?,
        })
    }

    /// Records the latest message of a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set(&mut self, task_id: &str, message: &str) -> Result<(), PersistenceError> {
        mutations::progress::set_progress(&mut self.conn, task_id, message)
    }

    /// Retrieves the latest message of a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get(&mut self, task_id: &str) -> Result<Option<ProgressRecord>, PersistenceError> {
        queries::progress::get_progress(&mut self.conn, task_id)
    }
}

impl ProgressSink for ProgressStore {
    fn update(&mut self, task_id: &str, message: &str) -> Result<(), StoreError> {
        Ok(self.set(task_id, message)?)
    }
}
