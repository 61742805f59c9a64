// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use branch_import_domain::{AreaRecord, AreaType, Generation, GenerationRange, ProgressRecord};
use diesel::prelude::*;
use geo::Polygon;
use std::collections::BTreeMap;

use crate::diesel_schema::{areas, generations, import_progress};

/// An area with everything stored against it.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaDetails {
    pub record: AreaRecord,
    /// Codes keyed by code type (`gss`, `lr`, `lbr`, `lbrf`, ...).
    pub codes: BTreeMap<String, String>,
    pub polygons: Vec<Polygon<f64>>,
}

/// Diesel Queryable struct for area rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = areas)]
pub struct AreaRow {
    pub area_id: i64,
    pub name: String,
    pub area_type: String,
    pub parent_area_id: Option<i64>,
    pub generation_low_id: i64,
    pub generation_high_id: i64,
}

impl AreaRow {
    /// Converts the row into a record found under `gss`.
    pub fn into_record(self, gss: String) -> AreaRecord {
        AreaRecord {
            id: self.area_id,
            name: self.name,
            area_type: AreaType::from_code(&self.area_type),
            parent_id: self.parent_area_id,
            generations: GenerationRange::new(self.generation_low_id, self.generation_high_id),
            gss,
        }
    }
}

/// Diesel Queryable struct for generation rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = generations)]
pub struct GenerationRow {
    pub generation_id: i64,
    pub description: String,
    pub active: i32,
}

impl From<GenerationRow> for Generation {
    fn from(row: GenerationRow) -> Self {
        Self::new(row.generation_id, row.description, row.active != 0)
    }
}

/// Diesel Queryable struct for progress rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = import_progress)]
pub struct ProgressRow {
    pub task_id: String,
    pub message: String,
    pub updated_at: String,
}

impl From<ProgressRow> for ProgressRecord {
    fn from(row: ProgressRow) -> Self {
        Self {
            task_id: row.task_id,
            message: row.message,
            updated_at: row.updated_at,
        }
    }
}
