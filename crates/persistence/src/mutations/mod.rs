// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Catalogue mutations.
//!
//! None of these open a transaction of their own; atomicity is the job of
//! `Persistence::atomically`.

pub mod areas;
pub mod generations;
pub mod progress;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::PersistenceError;

/// The current UTC time as an RFC 3339 string.
pub(crate) fn timestamp_now() -> Result<String, PersistenceError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}
