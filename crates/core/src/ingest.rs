// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! CSV ingestion and row validation.
//!
//! Rows are parsed up front, every GSS code they mention is resolved in one
//! batched lookup, and then the rows are validated and grouped in file order
//! so that the first broken row is the one reported.

use branch_import_domain::{
    AreaRecord, AreaType, CsvRow, validate_group_consistency, validate_row,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use geo::Polygon;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::error::ImportError;
use crate::store::AreaStore;

/// Line number of the first data row; line 1 is the header.
const FIRST_DATA_LINE: usize = 2;

/// All rows sharing one `area_gss`, reduced to what the upsert needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchGroup {
    pub area_gss: String,
    pub area_id: String,
    pub area_name: String,
    /// Empty for regions.
    pub parent_gss_code: String,
    pub area_type: AreaType,
    /// Line of the row that opened the group.
    pub first_line: usize,
    /// Polygons of every resolved subarea, in row order.
    pub subareas: Vec<Polygon<f64>>,
}

/// Result of reading and validating a whole CSV file.
#[derive(Debug, Clone, Default)]
pub struct IngestedFile {
    /// Groups in first-seen order.
    pub groups: Vec<BranchGroup>,
    /// Distinct non-empty parent codes referenced by any group.
    pub parent_codes: BTreeSet<String>,
    /// Managed areas that already exist under a group's `area_gss`.
    pub existing: HashMap<String, AreaRecord>,
    pub warnings: Vec<String>,
}

impl IngestedFile {
    /// Groups in processing order: regions first, then everything else,
    /// each in first-seen order.
    pub fn processing_order(&self) -> impl Iterator<Item = &BranchGroup> {
        let regions = self.groups.iter().filter(|g| g.area_type.is_region());
        let others = self.groups.iter().filter(|g| !g.area_type.is_region());
        regions.chain(others)
    }
}

/// Parses CSV text into numbered rows after checking the header.
///
/// # Errors
///
/// Returns `ImportError::Configuration` if the header lacks a required field
/// and `ImportError::Input` if the text is not well-formed CSV.
pub fn parse_rows(text: &str) -> Result<Vec<(usize, CsvRow)>, ImportError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| ImportError::Input(e.to_string()))?
        .clone();
    validate_headers(&headers)?;

    let mut rows: Vec<(usize, CsvRow)> = Vec::new();
    for (offset, record) in reader.records().enumerate() {
        let line: usize = offset + FIRST_DATA_LINE;
        let record: StringRecord = record.map_err(|e| ImportError::Input(e.to_string()))?;
        let row: CsvRow = record_to_row(&headers, &record);
        rows.push((line, row));
    }

    debug!(rows = rows.len(), "Parsed CSV rows");
    Ok(rows)
}

fn validate_headers(headers: &StringRecord) -> Result<(), ImportError> {
    let present: BTreeSet<&str> = headers.iter().collect();
    if CsvRow::REQUIRED_FIELDS
        .iter()
        .all(|field| present.contains(field))
    {
        return Ok(());
    }
    Err(ImportError::Configuration(format!(
        "Invalid CSV header. Required fields are: {}",
        CsvRow::REQUIRED_FIELDS.join(", ")
    )))
}

/// Builds a row by header name; short rows leave the missing fields empty.
fn record_to_row(headers: &StringRecord, record: &StringRecord) -> CsvRow {
    let mut row: CsvRow = CsvRow::default();
    for (header, value) in headers.iter().zip(record.iter()) {
        let slot: &mut String = match header {
            "area_type" => &mut row.area_type,
            "area_id" => &mut row.area_id,
            "area_name" => &mut row.area_name,
            "area_gss" => &mut row.area_gss,
            "gss_code" => &mut row.gss_code,
            "parent_gss_code" => &mut row.parent_gss_code,
            _ => continue,
        };
        *slot = value.to_string();
    }
    row
}

/// Reads, validates and groups a CSV file against the current store.
///
/// # Errors
///
/// Returns the first fatal condition: a bad header, malformed CSV, a row
/// that breaks a rule, a group whose rows disagree, or an `area_gss` that
/// belongs to an area the importer does not manage.
pub fn ingest<S: AreaStore + ?Sized>(store: &mut S, text: &str) -> Result<IngestedFile, ImportError> {
    let rows: Vec<(usize, CsvRow)> = parse_rows(text)?;

    let codes: BTreeSet<String> = rows
        .iter()
        .flat_map(|(_, row)| [row.area_gss.clone(), row.gss_code.clone()])
        .filter(|code| !code.is_empty())
        .collect();
    let known: HashMap<String, AreaRecord> = latest_by_gss(store.find_areas_by_gss(&codes)?);

    let subarea_ids: Vec<i64> = rows
        .iter()
        .filter_map(|(_, row)| known.get(&row.gss_code))
        .filter(|record| !record.area_type.is_managed())
        .map(|record| record.id)
        .collect::<BTreeSet<i64>>()
        .into_iter()
        .collect();
    let subarea_polygons: HashMap<i64, Vec<Polygon<f64>>> = store.load_polygons(&subarea_ids)?;

    let mut ingested: IngestedFile = IngestedFile::default();
    let mut canonical_rows: Vec<CsvRow> = Vec::new();
    let mut index_by_gss: HashMap<String, usize> = HashMap::new();

    for (line, row) in rows {
        let area_type: AreaType =
            validate_row(&row).map_err(|e| ImportError::invalid_row(line, &e))?;

        let index: usize = if let Some(&index) = index_by_gss.get(&row.area_gss) {
            validate_group_consistency(&canonical_rows[index], &row)
                .map_err(|e| ImportError::invalid_row(line, &e))?;
            index
        } else {
            if let Some(record) = known.get(&row.area_gss) {
                if !record.area_type.is_managed() {
                    return Err(ImportError::Validation {
                        line,
                        message: format!(
                            "Cannot reuse an existing GSS code for region/branch: '{}'",
                            row.area_gss
                        ),
                    });
                }
                ingested
                    .existing
                    .insert(row.area_gss.clone(), record.clone());
            }
            if !row.parent_gss_code.is_empty() {
                ingested.parent_codes.insert(row.parent_gss_code.clone());
            }
            ingested.groups.push(BranchGroup {
                area_gss: row.area_gss.clone(),
                area_id: row.area_id.clone(),
                area_name: row.area_name.clone(),
                parent_gss_code: row.parent_gss_code.clone(),
                area_type,
                first_line: line,
                subareas: Vec::new(),
            });
            index_by_gss.insert(row.area_gss.clone(), canonical_rows.len());
            canonical_rows.push(row.clone());
            canonical_rows.len() - 1
        };

        match known
            .get(&row.gss_code)
            .filter(|record| !record.area_type.is_managed())
        {
            Some(subarea) => {
                if let Some(polygons) = subarea_polygons.get(&subarea.id) {
                    ingested.groups[index]
                        .subareas
                        .extend(polygons.iter().cloned());
                }
            }
            None => ingested.warnings.push(format!(
                "Invalid row on line {line}: Subarea with GSS code '{}' doesn't exist.",
                row.gss_code
            )),
        }
    }

    debug!(
        groups = ingested.groups.len(),
        parents = ingested.parent_codes.len(),
        existing = ingested.existing.len(),
        "Ingested CSV file"
    );
    Ok(ingested)
}

/// Keeps one record per GSS code, preferring the most recent generation.
pub(crate) fn latest_by_gss(records: Vec<AreaRecord>) -> HashMap<String, AreaRecord> {
    let mut by_gss: HashMap<String, AreaRecord> = HashMap::new();
    for record in records {
        let newer: bool = by_gss.get(&record.gss).is_none_or(|current| {
            (record.generations.high(), record.id) > (current.generations.high(), current.id)
        });
        if newer {
            by_gss.insert(record.gss.clone(), record);
        }
    }
    by_gss
}
