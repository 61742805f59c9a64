// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Batched resolution of parent areas.

use branch_import_domain::AreaRecord;
use geo::Polygon;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::error::StoreError;
use crate::ingest::latest_by_gss;
use crate::store::AreaStore;

/// A parent area with its polygons prefetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentArea {
    pub record: AreaRecord,
    pub polygons: Vec<Polygon<f64>>,
}

/// Parent areas keyed by GSS code.
#[derive(Debug, Clone, Default)]
pub struct ResolvedParents {
    parents: HashMap<String, ParentArea>,
    /// One warning per referenced code nobody could satisfy.
    pub warnings: Vec<String>,
}

impl ResolvedParents {
    #[must_use]
    pub fn get(&self, gss: &str) -> Option<&ParentArea> {
        self.parents.get(gss)
    }

    /// Replaces (or, with `None`, forgets) the parent stored under a code.
    ///
    /// Used once a region from the same file has been reconciled, so that
    /// its branches clip against the fresh footprint.
    pub fn refresh(&mut self, gss: &str, parent: Option<ParentArea>) {
        match parent {
            Some(parent) => {
                self.parents.insert(gss.to_string(), parent);
            }
            None => {
                self.parents.remove(gss);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Loads every referenced parent, and its polygons, in one pass.
///
/// Codes that resolve to nothing produce a warning unless `declared_regions`
/// contains them; those regions are created later in the same run.
///
/// # Errors
///
/// Returns an error if the store lookup fails.
pub fn resolve_parents<S: AreaStore + ?Sized>(
    store: &mut S,
    codes: &BTreeSet<String>,
    declared_regions: &HashSet<&str>,
) -> Result<ResolvedParents, StoreError> {
    let mut resolved: ResolvedParents = ResolvedParents::default();
    if codes.is_empty() {
        return Ok(resolved);
    }

    let records: HashMap<String, AreaRecord> = latest_by_gss(store.find_areas_by_gss(codes)?);
    let ids: Vec<i64> = records.values().map(|record| record.id).collect();
    let mut polygons: HashMap<i64, Vec<Polygon<f64>>> = store.load_polygons(&ids)?;

    for code in codes {
        if let Some(record) = records.get(code) {
            let parent: ParentArea = ParentArea {
                record: record.clone(),
                polygons: polygons.remove(&record.id).unwrap_or_default(),
            };
            resolved.parents.insert(code.clone(), parent);
        } else if !declared_regions.contains(code.as_str()) {
            resolved.warnings.push(format!(
                "Parent area with GSS code '{code}' does not exist."
            ));
        }
    }

    debug!(
        requested = codes.len(),
        resolved = resolved.len(),
        "Resolved parent areas"
    );
    Ok(resolved)
}
