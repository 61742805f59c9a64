// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! This module isolates backend-specific initialization, migration,
//! and helper functions that cannot be expressed in Diesel DSL.
//!
//! ## Backend Support
//!
//! - `sqlite`: `SQLite` backend, file-based or shared-cache in-memory
//!
//! Everything else (lookups, upserts, progress writes) lives in the
//! `queries/` and `mutations/` modules and uses Diesel DSL only.

pub mod sqlite;
