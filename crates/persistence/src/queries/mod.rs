// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only catalogue queries.
//!
//! Every function takes the caller's connection, so lookups issued while an
//! import transaction is open see that transaction's own writes.

pub mod areas;
pub mod generations;
pub mod progress;

/// Upper bound on bound parameters per `IN (...)` lookup.
pub const LOOKUP_CHUNK: usize = 500;
