// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;

use crate::diesel_schema::import_progress;
use crate::error::PersistenceError;
use crate::mutations::timestamp_now;

/// Records the latest progress message of a task, replacing the previous one.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn set_progress(
    conn: &mut SqliteConnection,
    task_id: &str,
    message: &str,
) -> Result<(), PersistenceError> {
    let updated_at: String = timestamp_now()?;

    diesel::insert_into(import_progress::table)
        .values((
            import_progress::task_id.eq(task_id),
            import_progress::message.eq(message),
            import_progress::updated_at.eq(&updated_at),
        ))
        .on_conflict(import_progress::task_id)
        .do_update()
        .set((
            import_progress::message.eq(message),
            import_progress::updated_at.eq(&updated_at),
        ))
        .execute(conn)?;
    Ok(())
}
