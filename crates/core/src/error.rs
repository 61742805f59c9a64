// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use branch_import_domain::DomainError;
use thiserror::Error;

/// Failure reported by an area, generation or progress store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        Self::new(err.to_string())
    }
}

/// Fatal conditions that abort an import run.
///
/// The `Display` text is what callers see in `ImportResult::error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// The CSV header does not carry every required field.
    #[error("{0}")]
    Configuration(String),
    /// A row broke a validation rule.
    #[error("Invalid row on line {line}: {message}")]
    Validation { line: usize, message: String },
    /// The CSV source could not be read.
    #[error("{0}")]
    Input(String),
    /// The requested generation could not be resolved.
    #[error("{0}")]
    Generation(String),
    /// The run was asked to stop before it finished.
    #[error("Import cancelled")]
    Cancelled,
    /// A collaborator store failed.
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl ImportError {
    pub(crate) fn invalid_row(line: usize, err: &DomainError) -> Self {
        Self::Validation {
            line,
            message: err.to_string(),
        }
    }
}
