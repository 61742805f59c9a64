// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use branch_import_domain::ProgressRecord;
use diesel::SqliteConnection;
use diesel::prelude::*;

use crate::data_models::ProgressRow;
use crate::diesel_schema::import_progress;
use crate::error::PersistenceError;

/// Retrieves the latest progress message of a task.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the task never reported progress.
pub fn get_progress(
    conn: &mut SqliteConnection,
    task_id: &str,
) -> Result<Option<ProgressRecord>, PersistenceError> {
    let row: Option<ProgressRow> = import_progress::table
        .find(task_id)
        .select(ProgressRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(ProgressRecord::from))
}
