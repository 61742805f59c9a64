// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::PathBuf;

use crate::cancel::Cancellation;
use crate::error::ImportError;

/// Footprints below this many square metres produce a warning.
pub const DEFAULT_SMALL_AREA_THRESHOLD: f64 = 50_000.0;

/// Which generation the imported areas are stamped with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationChoice {
    /// The latest active generation.
    #[default]
    Current,
    /// A brand-new generation, created inside the import transaction.
    New { description: String },
    /// An existing generation, by id.
    Existing(i64),
}

impl GenerationChoice {
    /// Interprets the `generation` invocation parameter.
    ///
    /// Absent means the current generation, `"new"` creates one (and needs a
    /// description), anything else must be a generation id.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Generation` if `"new"` is given without a
    /// description or the value is not an id.
    pub fn parse(value: Option<&str>, description: Option<&str>) -> Result<Self, ImportError> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Self::Current);
        };

        if value.eq_ignore_ascii_case("new") {
            let description: &str = description.map(str::trim).unwrap_or_default();
            if description.is_empty() {
                return Err(ImportError::Generation(String::from(
                    "A description is required to create a new generation",
                )));
            }
            return Ok(Self::New {
                description: description.to_string(),
            });
        }

        value.parse::<i64>().map(Self::Existing).map_err(|_| {
            ImportError::Generation(format!("Invalid generation number specified: '{value}'"))
        })
    }
}

/// Invocation parameters of one import run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// Delete every managed area before processing rows.
    pub purge: bool,
    /// Keep the changes. When false the run is a dry run and rolls back.
    pub commit: bool,
    pub generation: GenerationChoice,
    /// Task id progress messages are recorded under.
    pub task_id: Option<String>,
    pub small_area_threshold: f64,
    /// Stop request checked while the run is in progress.
    pub cancellation: Cancellation,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            purge: false,
            commit: false,
            generation: GenerationChoice::Current,
            task_id: None,
            small_area_threshold: DEFAULT_SMALL_AREA_THRESHOLD,
            cancellation: Cancellation::default(),
        }
    }
}

/// Where the CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImportSource {
    /// Reads the whole source as UTF-8 text, dropping a leading byte order mark.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Input` if the file cannot be read or is not
    /// UTF-8.
    pub fn read_text(&self) -> Result<String, ImportError> {
        let bytes: Vec<u8> = match self {
            Self::Path(path) => std::fs::read(path).map_err(|e| {
                ImportError::Input(format!("Cannot open {}: {e}", path.display()))
            })?,
            Self::Bytes(bytes) => bytes.clone(),
        };

        let text: String = String::from_utf8(bytes)
            .map_err(|e| ImportError::Input(format!("CSV source is not valid UTF-8: {e}")))?;

        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }
}

impl From<PathBuf> for ImportSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&str> for ImportSource {
    fn from(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }
}
