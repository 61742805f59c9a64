// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Area, code and polygon mutations.

use branch_import_domain::geometry::encode_polygon;
use branch_import_domain::{AreaType, AreaUpdate, CodeType, NewArea};
use diesel::SqliteConnection;
use diesel::prelude::*;
use geo::Polygon;
use tracing::{debug, info};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::diesel_schema::{area_codes, area_polygons, areas};
use crate::error::PersistenceError;

/// Creates an area.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `area` - Name, type, parent and generation range of the new area
///
/// # Returns
///
/// The id of the new area.
///
/// # Errors
///
/// Returns an error if the insert fails, e.g. when the parent or a
/// generation does not exist.
pub fn create_area(conn: &mut SqliteConnection, area: &NewArea) -> Result<i64, PersistenceError> {
    diesel::insert_into(areas::table)
        .values((
            areas::name.eq(&area.name),
            areas::area_type.eq(area.area_type.code()),
            areas::parent_area_id.eq(area.parent_id),
            areas::generation_low_id.eq(area.generations.low()),
            areas::generation_high_id.eq(area.generations.high()),
        ))
        .execute(conn)?;

    let area_id: i64 = get_last_insert_rowid(conn)?;
    debug!(area_id, area_type = %area.area_type, "Created area");
    Ok(area_id)
}

/// Overwrites the name, type, parent and generation range of an area.
///
/// Type-specific codes that belong to another type than the new one are
/// removed, so an area never carries more than one of them.
///
/// # Errors
///
/// Returns `PersistenceError::AreaNotFound` if no row was updated.
pub fn update_area(
    conn: &mut SqliteConnection,
    area_id: i64,
    update: &AreaUpdate,
) -> Result<(), PersistenceError> {
    let rows: usize = diesel::update(areas::table.find(area_id))
        .set((
            areas::name.eq(&update.name),
            areas::area_type.eq(update.area_type.code()),
            areas::parent_area_id.eq(update.parent_id),
            areas::generation_low_id.eq(update.generations.low()),
            areas::generation_high_id.eq(update.generations.high()),
        ))
        .execute(conn)?;

    if rows == 0 {
        return Err(PersistenceError::AreaNotFound(area_id));
    }

    let kept: Option<CodeType> = update.area_type.code_type();
    let stale: Vec<&str> = CodeType::TYPE_SPECIFIC
        .iter()
        .filter(|code_type| Some(**code_type) != kept)
        .map(CodeType::as_str)
        .collect();
    let removed: usize = diesel::delete(
        area_codes::table
            .filter(area_codes::area_id.eq(area_id))
            .filter(area_codes::code_type.eq_any(stale)),
    )
    .execute(conn)?;
    if removed > 0 {
        debug!(area_id, removed, area_type = %update.area_type, "Removed codes of a previous type");
    }
    Ok(())
}

/// Deletes an area; its codes and polygons go with it and children lose
/// their parent link.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_area(conn: &mut SqliteConnection, area_id: i64) -> Result<(), PersistenceError> {
    diesel::delete(areas::table.find(area_id)).execute(conn)?;
    debug!(area_id, "Deleted area");
    Ok(())
}

/// Deletes every area of the given types.
///
/// # Returns
///
/// The number of areas deleted.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_areas_of_types(
    conn: &mut SqliteConnection,
    types: &[AreaType],
) -> Result<usize, PersistenceError> {
    let codes: Vec<&str> = types.iter().map(AreaType::code).collect();
    let deleted: usize = diesel::delete(areas::table.filter(areas::area_type.eq_any(codes)))
        .execute(conn)?;
    info!(deleted, "Deleted areas by type");
    Ok(deleted)
}

/// Sets the code of the given type on an area, inserting it if absent.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn upsert_code(
    conn: &mut SqliteConnection,
    area_id: i64,
    code_type: CodeType,
    code: &str,
) -> Result<(), PersistenceError> {
    diesel::insert_into(area_codes::table)
        .values((
            area_codes::area_id.eq(area_id),
            area_codes::code_type.eq(code_type.as_str()),
            area_codes::code.eq(code),
        ))
        .on_conflict((area_codes::area_id, area_codes::code_type))
        .do_update()
        .set(area_codes::code.eq(code))
        .execute(conn)?;
    Ok(())
}

/// Adds polygons to an area, one row per polygon.
///
/// # Errors
///
/// Returns an error if a polygon cannot be encoded or the insert fails.
pub fn insert_polygons(
    conn: &mut SqliteConnection,
    area_id: i64,
    polygons: &[Polygon<f64>],
) -> Result<(), PersistenceError> {
    let encoded: Vec<String> = polygons
        .iter()
        .map(encode_polygon)
        .collect::<Result<_, _>>()?;

    for geometry in &encoded {
        diesel::insert_into(area_polygons::table)
            .values((
                area_polygons::area_id.eq(area_id),
                area_polygons::geometry.eq(geometry),
            ))
            .execute(conn)?;
    }

    debug!(area_id, polygons = encoded.len(), "Stored polygons");
    Ok(())
}

/// Removes every polygon of an area.
///
/// # Returns
///
/// The number of polygons removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_polygons(conn: &mut SqliteConnection, area_id: i64) -> Result<usize, PersistenceError> {
    Ok(
        diesel::delete(area_polygons::table.filter(area_polygons::area_id.eq(area_id)))
            .execute(conn)?,
    )
}
