// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors raised by the pure row and geometry rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The `area_type` value is not one of the managed type codes.
    InvalidAreaType(String),
    /// A region row declared a parent.
    RegionHasParent,
    /// A required field was empty or absent.
    MissingField(&'static str),
    /// A row disagreed with the canonical values of its group.
    InconsistentField {
        /// The field that differs.
        field: &'static str,
        /// The value established by the first row of the group.
        expected: String,
        /// The value found on the offending row.
        actual: String,
    },
    /// A stored geometry could not be decoded.
    InvalidGeometry(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAreaType(value) => write!(
                f,
                "Field area_type has an invalid value ('{value}'), must be one of 'LR', 'LBR', 'LBRF'"
            ),
            Self::RegionHasParent => {
                write!(f, "Regions must not have a parent_gss_code specified.")
            }
            Self::MissingField(field) => write!(f, "Value for field {field} is missing"),
            Self::InconsistentField {
                field,
                expected,
                actual,
            } => write!(
                f,
                "Field {field} value ('{actual}') doesn't match expected value ('{expected}')"
            ),
            Self::InvalidGeometry(msg) => write!(f, "Invalid geometry: {msg}"),
        }
    }
}

impl std::error::Error for DomainError {}
