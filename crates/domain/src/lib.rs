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

mod error;
pub mod geometry;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use geometry::Footprint;
pub use types::{
    AreaRecord, AreaType, AreaUpdate, CodeType, CsvRow, Generation, GenerationRange,
    ImportResult, NewArea, ProgressRecord,
};
pub use validation::{validate_group_consistency, validate_row};
