// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod cancel;
mod error;
mod import;
mod ingest;
mod options;
mod parents;
mod progress;
mod store;
mod upsert;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use cancel::Cancellation;
pub use error::{ImportError, StoreError};
pub use import::import_branches;
pub use ingest::{BranchGroup, IngestedFile, ingest, parse_rows};
pub use options::{DEFAULT_SMALL_AREA_THRESHOLD, GenerationChoice, ImportOptions, ImportSource};
pub use parents::{ParentArea, ResolvedParents, resolve_parents};
pub use progress::Progress;
pub use store::{AreaStore, Catalogue, GenerationStore, ProgressSink};
pub use upsert::{GroupOutcome, TargetState, upsert_group};
