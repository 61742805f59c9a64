// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Area, code and polygon lookups.

use branch_import_domain::geometry::decode_polygon;
use branch_import_domain::{AreaRecord, AreaType, CodeType};
use diesel::SqliteConnection;
use diesel::prelude::*;
use geo::Polygon;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::data_models::{AreaDetails, AreaRow};
use crate::diesel_schema::{area_codes, area_polygons, areas};
use crate::error::PersistenceError;
use crate::queries::LOOKUP_CHUNK;

/// Returns every area carrying one of the given GSS codes.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `codes` - The GSS codes to look up
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_areas_by_gss(
    conn: &mut SqliteConnection,
    codes: &BTreeSet<String>,
) -> Result<Vec<AreaRecord>, PersistenceError> {
    let codes: Vec<&str> = codes.iter().map(String::as_str).collect();
    let mut records: Vec<AreaRecord> = Vec::new();

    for chunk in codes.chunks(LOOKUP_CHUNK) {
        let rows: Vec<(AreaRow, String)> = areas::table
            .inner_join(area_codes::table)
            .filter(area_codes::code_type.eq(CodeType::Gss.as_str()))
            .filter(area_codes::code.eq_any(chunk.to_vec()))
            .select((AreaRow::as_select(), area_codes::code))
            .load(conn)?;
        records.extend(rows.into_iter().map(|(row, gss)| row.into_record(gss)));
    }

    debug!(
        requested = codes.len(),
        found = records.len(),
        "Looked up areas by GSS code"
    );
    Ok(records)
}

/// Loads the stored polygons of the given areas, keyed by area id.
///
/// # Errors
///
/// Returns an error if the query fails or a stored geometry cannot be
/// decoded.
pub fn load_polygons(
    conn: &mut SqliteConnection,
    area_ids: &[i64],
) -> Result<HashMap<i64, Vec<Polygon<f64>>>, PersistenceError> {
    let mut polygons: HashMap<i64, Vec<Polygon<f64>>> = HashMap::new();

    for chunk in area_ids.chunks(LOOKUP_CHUNK) {
        let rows: Vec<(i64, String)> = area_polygons::table
            .filter(area_polygons::area_id.eq_any(chunk.to_vec()))
            .order(area_polygons::polygon_id.asc())
            .select((area_polygons::area_id, area_polygons::geometry))
            .load(conn)?;
        for (area_id, geometry) in rows {
            polygons
                .entry(area_id)
                .or_default()
                .push(decode_polygon(&geometry)?);
        }
    }

    Ok(polygons)
}

/// Retrieves an area by GSS code, with its codes and polygons.
///
/// When several areas share the code the one valid for the most recent
/// generation wins.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no area carries the code.
pub fn get_area_by_gss(
    conn: &mut SqliteConnection,
    gss: &str,
) -> Result<Option<AreaDetails>, PersistenceError> {
    let row: Option<AreaRow> = areas::table
        .inner_join(area_codes::table)
        .filter(area_codes::code_type.eq(CodeType::Gss.as_str()))
        .filter(area_codes::code.eq(gss))
        .order((
            areas::generation_high_id.desc(),
            areas::area_id.desc(),
        ))
        .select(AreaRow::as_select())
        .first(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };
    let area_id: i64 = row.area_id;

    let codes: BTreeMap<String, String> = area_codes::table
        .filter(area_codes::area_id.eq(area_id))
        .select((area_codes::code_type, area_codes::code))
        .load::<(String, String)>(conn)?
        .into_iter()
        .collect();

    let polygons: Vec<Polygon<f64>> = load_polygons(conn, &[area_id])?
        .remove(&area_id)
        .unwrap_or_default();

    Ok(Some(AreaDetails {
        record: row.into_record(gss.to_string()),
        codes,
        polygons,
    }))
}

/// Counts areas, optionally restricted to one type.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_areas(
    conn: &mut SqliteConnection,
    area_type: Option<&AreaType>,
) -> Result<i64, PersistenceError> {
    let count: i64 = match area_type {
        Some(area_type) => areas::table
            .filter(areas::area_type.eq(area_type.code()))
            .count()
            .get_result(conn)?,
        None => areas::table.count().get_result(conn)?,
    };
    Ok(count)
}

/// Counts the polygon rows stored for an area.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_polygons(conn: &mut SqliteConnection, area_id: i64) -> Result<i64, PersistenceError> {
    Ok(area_polygons::table
        .filter(area_polygons::area_id.eq(area_id))
        .count()
        .get_result(conn)?)
}
