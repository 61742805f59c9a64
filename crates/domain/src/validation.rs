// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{AreaType, CsvRow};

/// Fields that must agree across every row of a group.
const GROUP_FIELDS: [&str; 4] = ["area_id", "area_name", "parent_gss_code", "area_type"];

/// Validates a single CSV row in isolation.
///
/// Checks, in order: the area type is a managed code, a region declares no
/// parent, and every other field is non-empty (branches must also name a
/// parent).
///
/// # Returns
///
/// The parsed area type of the row.
///
/// # Errors
///
/// Returns the first rule the row breaks.
pub fn validate_row(row: &CsvRow) -> Result<AreaType, DomainError> {
    let area_type: AreaType = row.area_type.parse()?;

    if area_type.is_region() && !row.parent_gss_code.is_empty() {
        return Err(DomainError::RegionHasParent);
    }

    for (field, value) in row.fields() {
        if field == "parent_gss_code" && area_type.is_region() {
            continue;
        }
        if value.is_empty() {
            return Err(DomainError::MissingField(field));
        }
    }

    Ok(area_type)
}

/// Checks a row against the canonical row of its group.
///
/// # Errors
///
/// Returns `InconsistentField` for the first group field whose value differs.
pub fn validate_group_consistency(canonical: &CsvRow, row: &CsvRow) -> Result<(), DomainError> {
    for field in GROUP_FIELDS {
        let expected: &str = group_field(canonical, field);
        let actual: &str = group_field(row, field);
        if expected != actual {
            return Err(DomainError::InconsistentField {
                field,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    Ok(())
}

fn group_field<'a>(row: &'a CsvRow, field: &str) -> &'a str {
    match field {
        "area_id" => &row.area_id,
        "area_name" => &row.area_name,
        "parent_gss_code" => &row.parent_gss_code,
        _ => &row.area_type,
    }
}
