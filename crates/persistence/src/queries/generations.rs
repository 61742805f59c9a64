// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use branch_import_domain::Generation;
use diesel::SqliteConnection;
use diesel::prelude::*;

use crate::data_models::GenerationRow;
use crate::diesel_schema::generations;
use crate::error::PersistenceError;

/// Returns the latest active generation.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no generation is active.
pub fn current_generation(
    conn: &mut SqliteConnection,
) -> Result<Option<Generation>, PersistenceError> {
    let row: Option<GenerationRow> = generations::table
        .filter(generations::active.eq(1))
        .order(generations::generation_id.desc())
        .select(GenerationRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(Generation::from))
}

/// Retrieves a generation by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the generation does not exist.
pub fn get_generation(
    conn: &mut SqliteConnection,
    generation_id: i64,
) -> Result<Option<Generation>, PersistenceError> {
    let row: Option<GenerationRow> = generations::table
        .find(generation_id)
        .select(GenerationRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(Generation::from))
}

/// Lists every generation, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_generations(conn: &mut SqliteConnection) -> Result<Vec<Generation>, PersistenceError> {
    let rows: Vec<GenerationRow> = generations::table
        .order(generations::generation_id.asc())
        .select(GenerationRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(Generation::from).collect())
}
