// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-group upsert and geometry reconciliation.

use branch_import_domain::geometry::reconcile;
use branch_import_domain::{
    AreaRecord, AreaUpdate, CodeType, Footprint, Generation, GenerationRange, NewArea,
};
use tracing::{debug, info};

use crate::error::ImportError;
use crate::ingest::BranchGroup;
use crate::parents::ParentArea;
use crate::store::AreaStore;

/// How a group relates to what is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState<'a> {
    /// No managed area carries the group's `area_gss` yet.
    NotFound,
    /// An existing managed area will be updated in place.
    MatchedExisting(&'a AreaRecord),
}

impl<'a> TargetState<'a> {
    #[must_use]
    pub const fn from_lookup(existing: Option<&'a AreaRecord>) -> Self {
        match existing {
            Some(record) => Self::MatchedExisting(record),
            None => Self::NotFound,
        }
    }
}

/// What processing one group did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupOutcome {
    pub created: u32,
    pub updated: u32,
    pub warnings: Vec<String>,
    /// The stored area and its new polygons, if it survived reconciliation.
    pub stored: Option<ParentArea>,
}

/// Creates or updates the area for one group and replaces its polygons.
///
/// An area whose footprint comes out empty is deleted again, so the group
/// is absent from the generation and only its warning remains.
///
/// # Errors
///
/// Returns an error if any store operation fails.
pub fn upsert_group<S: AreaStore + ?Sized>(
    store: &mut S,
    group: &BranchGroup,
    target: TargetState<'_>,
    parent: Option<&ParentArea>,
    generation: &Generation,
    small_area_threshold: f64,
) -> Result<GroupOutcome, ImportError> {
    let mut outcome: GroupOutcome = GroupOutcome::default();
    let parent_id: Option<i64> = parent.map(|p| p.record.id);
    let label: &str = group.area_type.label();

    let (area_id, generations): (i64, GenerationRange) = match target {
        TargetState::NotFound => {
            let new_area: NewArea = NewArea {
                name: group.area_name.clone(),
                area_type: group.area_type.clone(),
                parent_id,
                generations: GenerationRange::single(generation.id()),
            };
            let area_id: i64 = store.create_area(&new_area)?;
            debug!(area_id, gss = %group.area_gss, "Created area");
            outcome.created = 1;
            (area_id, new_area.generations)
        }
        TargetState::MatchedExisting(existing) => {
            if existing.parent_id != parent_id {
                outcome.warnings.push(format!(
                    "Area {} ({label} {}) changed parent from {} to {}",
                    group.area_gss,
                    group.area_id,
                    existing
                        .parent_id
                        .map_or_else(|| String::from("none"), |id| format!("area {id}")),
                    parent.map_or_else(
                        || String::from("none"),
                        |p| format!("'{}'", p.record.gss)
                    ),
                ));
            }
            if existing.area_type != group.area_type {
                info!(
                    area_id = existing.id,
                    from = %existing.area_type,
                    to = %group.area_type,
                    "Area changed type"
                );
            }
            let update: AreaUpdate = AreaUpdate {
                name: group.area_name.clone(),
                area_type: group.area_type.clone(),
                parent_id,
                generations: existing.generations.with_high(generation.id()),
            };
            store.update_area(existing.id, &update)?;
            let removed: usize = store.delete_polygons(existing.id)?;
            debug!(area_id = existing.id, removed, "Updated area");
            outcome.updated = 1;
            (existing.id, update.generations)
        }
    };

    store.upsert_code(area_id, CodeType::Gss, &group.area_gss)?;
    if let Some(code_type) = group.area_type.code_type() {
        store.upsert_code(area_id, code_type, &group.area_id)?;
    }

    let footprint: Footprint = if group.area_type.is_region() {
        reconcile(&group.subareas, None)
    } else {
        match parent {
            Some(parent) => reconcile(&group.subareas, Some(parent.polygons.as_slice())),
            None => Footprint::empty(),
        }
    };

    if footprint.is_empty() {
        outcome.warnings.push(if group.area_type.is_region() {
            format!(
                "Area {} ({label} {}) has no geometry",
                group.area_gss, group.area_id
            )
        } else {
            format!(
                "Area {} ({label} {}) doesn't overlap with parent area",
                group.area_gss, group.area_id
            )
        });
        store.delete_area(area_id)?;
        info!(area_id, gss = %group.area_gss, "Dropped area with empty footprint");
        outcome.created = 0;
        outcome.updated = 0;
        return Ok(outcome);
    }

    store.insert_polygons(area_id, footprint.polygons())?;

    if footprint.area() < small_area_threshold {
        outcome.warnings.push(format!(
            "Area {} ({label} {}) has a small geographic area ({} m²)",
            group.area_gss,
            group.area_id,
            footprint.whole_area()
        ));
    }

    outcome.stored = Some(ParentArea {
        record: AreaRecord {
            id: area_id,
            name: group.area_name.clone(),
            area_type: group.area_type.clone(),
            parent_id,
            generations,
            gss: group.area_gss.clone(),
        },
        polygons: footprint.into_polygons(),
    });
    Ok(outcome)
}
