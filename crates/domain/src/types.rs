// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The type of an area in the catalogue.
///
/// Regions, branches and branch variants are managed by the importer.
/// Everything else (wards, constituencies, councils, ...) is `Other` and is
/// only ever read, as a subarea or a parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaType {
    /// Top-level managed area; has no parent.
    Region,
    /// Managed area built by intersecting subareas with a parent.
    Branch,
    /// Alternative branch layout, handled exactly like a branch.
    BranchVariant,
    /// Any area type the importer does not manage.
    Other(String),
}

impl AreaType {
    /// Returns the stored type code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Region => "LR",
            Self::Branch => "LBR",
            Self::BranchVariant => "LBRF",
            Self::Other(code) => code,
        }
    }

    /// Maps a stored type code to an `AreaType`. Unknown codes become `Other`.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "LR" => Self::Region,
            "LBR" => Self::Branch,
            "LBRF" => Self::BranchVariant,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the managed types, in the order they are purged.
    #[must_use]
    pub const fn managed() -> [Self; 3] {
        [Self::Region, Self::Branch, Self::BranchVariant]
    }

    /// Whether this type is owned by the importer.
    #[must_use]
    pub const fn is_managed(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Whether this is the region type.
    #[must_use]
    pub const fn is_region(&self) -> bool {
        matches!(self, Self::Region)
    }

    /// The type-specific code every managed area carries next to its GSS code.
    #[must_use]
    pub const fn code_type(&self) -> Option<CodeType> {
        match self {
            Self::Region => Some(CodeType::Region),
            Self::Branch => Some(CodeType::Branch),
            Self::BranchVariant => Some(CodeType::BranchVariant),
            Self::Other(_) => None,
        }
    }

    /// Short human label used in warnings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Branch | Self::BranchVariant => "branch",
            Self::Other(_) => "area",
        }
    }
}

impl FromStr for AreaType {
    type Err = DomainError;

    /// Parses a CSV `area_type` value. Only managed codes are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_code(s) {
            Self::Other(value) => Err(DomainError::InvalidAreaType(value)),
            managed => Ok(managed),
        }
    }
}

impl std::fmt::Display for AreaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Kinds of external code attached to an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeType {
    /// ONS GSS code, the cross-reference key.
    Gss,
    /// Region identifier.
    Region,
    /// Branch identifier.
    Branch,
    /// Branch variant identifier.
    BranchVariant,
}

impl CodeType {
    /// Codes that identify an area within one managed type.
    pub const TYPE_SPECIFIC: [Self; 3] = [Self::Region, Self::Branch, Self::BranchVariant];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gss => "gss",
            Self::Region => "lr",
            Self::Branch => "lbr",
            Self::BranchVariant => "lbrf",
        }
    }
}

impl std::fmt::Display for CodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A versioned snapshot of the area dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    id: i64,
    description: String,
    active: bool,
}

impl Generation {
    #[must_use]
    pub const fn new(id: i64, description: String, active: bool) -> Self {
        Self {
            id,
            description,
            active,
        }
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

/// The inclusive range of generations an area is valid for.
///
/// Invariant: `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationRange {
    low: i64,
    high: i64,
}

impl GenerationRange {
    /// Builds a range, swapping the bounds if they arrive inverted.
    #[must_use]
    pub const fn new(low: i64, high: i64) -> Self {
        if low <= high {
            Self { low, high }
        } else {
            Self {
                low: high,
                high: low,
            }
        }
    }

    /// A range covering exactly one generation.
    #[must_use]
    pub const fn single(generation_id: i64) -> Self {
        Self {
            low: generation_id,
            high: generation_id,
        }
    }

    /// Moves `high` to the given generation, lowering `low` if the target
    /// predates it.
    #[must_use]
    pub const fn with_high(self, generation_id: i64) -> Self {
        let low = if generation_id < self.low {
            generation_id
        } else {
            self.low
        };
        Self {
            low,
            high: generation_id,
        }
    }

    #[must_use]
    pub const fn low(&self) -> i64 {
        self.low
    }

    #[must_use]
    pub const fn high(&self) -> i64 {
        self.high
    }
}

/// An area as seen through a GSS code lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaRecord {
    pub id: i64,
    pub name: String,
    pub area_type: AreaType,
    pub parent_id: Option<i64>,
    pub generations: GenerationRange,
    /// The GSS code the record was found under.
    pub gss: String,
}

/// Values for a new area row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArea {
    pub name: String,
    pub area_type: AreaType,
    pub parent_id: Option<i64>,
    pub generations: GenerationRange,
}

/// Values written over an existing area row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaUpdate {
    pub name: String,
    pub area_type: AreaType,
    pub parent_id: Option<i64>,
    pub generations: GenerationRange,
}

/// One data row of the branch CSV.
///
/// Fields absent from a short record are left empty so that rule checks,
/// not the CSV reader, decide what is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    pub area_type: String,
    pub area_id: String,
    pub area_name: String,
    pub area_gss: String,
    pub gss_code: String,
    pub parent_gss_code: String,
}

impl CsvRow {
    /// The fields every input must provide, in header order.
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "area_type",
        "area_id",
        "area_name",
        "area_gss",
        "gss_code",
        "parent_gss_code",
    ];

    /// Returns `(name, value)` pairs in header order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("area_type", &self.area_type),
            ("area_id", &self.area_id),
            ("area_name", &self.area_name),
            ("area_gss", &self.area_gss),
            ("gss_code", &self.gss_code),
            ("parent_gss_code", &self.parent_gss_code),
        ]
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub created: u32,
    pub updated: u32,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl ImportResult {
    /// Whether the run hit a fatal error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Latest progress message for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub task_id: String,
    pub message: String,
    /// RFC 3339 timestamp of the last update.
    pub updated_at: String,
}
