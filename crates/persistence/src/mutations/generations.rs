// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use branch_import_domain::Generation;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::diesel_schema::generations;
use crate::error::PersistenceError;
use crate::mutations::timestamp_now;

/// Creates a generation. New generations start inactive.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_generation(
    conn: &mut SqliteConnection,
    description: &str,
) -> Result<Generation, PersistenceError> {
    diesel::insert_into(generations::table)
        .values((
            generations::description.eq(description),
            generations::active.eq(0),
            generations::created_at.eq(timestamp_now()?),
        ))
        .execute(conn)?;

    let generation_id: i64 = get_last_insert_rowid(conn)?;
    info!(generation_id, description, "Created generation");
    Ok(Generation::new(generation_id, description.to_string(), false))
}

/// Marks a generation active, making it current if it is the newest
/// active one.
///
/// # Errors
///
/// Returns `PersistenceError::GenerationNotFound` if the generation does
/// not exist.
pub fn activate_generation(
    conn: &mut SqliteConnection,
    generation_id: i64,
) -> Result<(), PersistenceError> {
    let rows: usize = diesel::update(generations::table.find(generation_id))
        .set(generations::active.eq(1))
        .execute(conn)?;

    if rows == 0 {
        return Err(PersistenceError::GenerationNotFound(generation_id));
    }

    info!(generation_id, "Activated generation");
    Ok(())
}
