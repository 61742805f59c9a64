// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use branch_import_domain::geometry::square;
use branch_import_domain::{
    AreaRecord, AreaType, AreaUpdate, CodeType, Generation, GenerationRange, NewArea,
};
use geo::Polygon;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{AreaStore, Cancellation, Catalogue, GenerationStore, ProgressSink, StoreError};

pub const HEADER: &str = "area_type,area_id,area_name,area_gss,gss_code,parent_gss_code";

/// Builds CSV text from rows of
/// `[area_type, area_id, area_name, area_gss, gss_code, parent_gss_code]`.
pub fn csv(rows: &[[&str; 6]]) -> String {
    let mut text: String = format!("{HEADER}\n");
    for row in rows {
        text.push_str(&row.join(","));
        text.push('\n');
    }
    text
}

#[derive(Debug, Clone)]
pub struct StoredArea {
    pub name: String,
    pub area_type: AreaType,
    pub parent_id: Option<i64>,
    pub generations: GenerationRange,
}

#[derive(Debug, Clone, Default)]
struct CatalogueState {
    areas: BTreeMap<i64, StoredArea>,
    codes: HashMap<(i64, CodeType), String>,
    polygons: HashMap<i64, Vec<Polygon<f64>>>,
    generations: Vec<Generation>,
    next_area_id: i64,
    next_generation_id: i64,
}

/// In-memory catalogue with snapshot rollback.
#[derive(Debug, Default)]
pub struct MemoryCatalogue {
    state: CatalogueState,
    pub commits: usize,
    pub rollbacks: usize,
    /// Makes every `insert_polygons` call fail.
    pub fail_polygon_inserts: bool,
}

impl MemoryCatalogue {
    /// A catalogue with one active generation (id 1) and no areas.
    pub fn with_active_generation() -> Self {
        let mut catalogue: Self = Self::default();
        catalogue.add_generation("initial", true);
        catalogue
    }

    pub fn add_generation(&mut self, description: &str, active: bool) -> i64 {
        self.state.next_generation_id += 1;
        let id: i64 = self.state.next_generation_id;
        self.state
            .generations
            .push(Generation::new(id, description.to_string(), active));
        id
    }

    /// Seeds an area carrying `gss` and the given polygons.
    pub fn add_area(
        &mut self,
        name: &str,
        area_type: AreaType,
        gss: &str,
        parent_id: Option<i64>,
        polygons: Vec<Polygon<f64>>,
    ) -> i64 {
        let id: i64 = self
            .create_area(&NewArea {
                name: name.to_string(),
                area_type,
                parent_id,
                generations: GenerationRange::single(1),
            })
            .unwrap();
        self.upsert_code(id, CodeType::Gss, gss).unwrap();
        self.state.polygons.insert(id, polygons);
        id
    }

    /// Seeds a ward-like subarea that is a square of `width` metres.
    pub fn add_subarea(&mut self, gss: &str, x: f64, y: f64, width: f64) -> i64 {
        self.add_area(
            gss,
            AreaType::Other(String::from("UTW")),
            gss,
            None,
            vec![square(x, y, width)],
        )
    }

    pub fn area_count(&self) -> usize {
        self.state.areas.len()
    }

    pub fn area(&self, id: i64) -> Option<&StoredArea> {
        self.state.areas.get(&id)
    }

    pub fn area_id_by_gss(&self, gss: &str) -> Option<i64> {
        self.state
            .codes
            .iter()
            .find(|((_, code_type), code)| *code_type == CodeType::Gss && code.as_str() == gss)
            .map(|((id, _), _)| *id)
    }

    pub fn code(&self, area_id: i64, code_type: CodeType) -> Option<&str> {
        self.state
            .codes
            .get(&(area_id, code_type))
            .map(String::as_str)
    }

    pub fn polygons(&self, area_id: i64) -> &[Polygon<f64>] {
        self.state
            .polygons
            .get(&area_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn generations(&self) -> &[Generation] {
        &self.state.generations
    }

    fn record(&self, id: i64, gss: &str) -> Option<AreaRecord> {
        self.state.areas.get(&id).map(|area| AreaRecord {
            id,
            name: area.name.clone(),
            area_type: area.area_type.clone(),
            parent_id: area.parent_id,
            generations: area.generations,
            gss: gss.to_string(),
        })
    }
}

impl AreaStore for MemoryCatalogue {
    fn find_areas_by_gss(
        &mut self,
        codes: &BTreeSet<String>,
    ) -> Result<Vec<AreaRecord>, StoreError> {
        Ok(self
            .state
            .codes
            .iter()
            .filter(|((_, code_type), code)| *code_type == CodeType::Gss && codes.contains(*code))
            .filter_map(|((id, _), code)| self.record(*id, code))
            .collect())
    }

    fn load_polygons(
        &mut self,
        area_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Polygon<f64>>>, StoreError> {
        Ok(area_ids
            .iter()
            .filter_map(|id| {
                self.state
                    .polygons
                    .get(id)
                    .filter(|polygons| !polygons.is_empty())
                    .map(|polygons| (*id, polygons.clone()))
            })
            .collect())
    }

    fn create_area(&mut self, area: &NewArea) -> Result<i64, StoreError> {
        self.state.next_area_id += 1;
        let id: i64 = self.state.next_area_id;
        self.state.areas.insert(
            id,
            StoredArea {
                name: area.name.clone(),
                area_type: area.area_type.clone(),
                parent_id: area.parent_id,
                generations: area.generations,
            },
        );
        Ok(id)
    }

    fn update_area(&mut self, area_id: i64, update: &AreaUpdate) -> Result<(), StoreError> {
        let area: &mut StoredArea = self
            .state
            .areas
            .get_mut(&area_id)
            .ok_or_else(|| StoreError::new(format!("Area {area_id} not found")))?;
        area.name.clone_from(&update.name);
        area.area_type = update.area_type.clone();
        area.parent_id = update.parent_id;
        area.generations = update.generations;

        let kept: Option<CodeType> = update.area_type.code_type();
        self.state.codes.retain(|(id, code_type), _| {
            *id != area_id
                || !CodeType::TYPE_SPECIFIC.contains(code_type)
                || Some(*code_type) == kept
        });
        Ok(())
    }

    fn delete_area(&mut self, area_id: i64) -> Result<(), StoreError> {
        self.state.areas.remove(&area_id);
        self.state.codes.retain(|(id, _), _| *id != area_id);
        self.state.polygons.remove(&area_id);
        for area in self.state.areas.values_mut() {
            if area.parent_id == Some(area_id) {
                area.parent_id = None;
            }
        }
        Ok(())
    }

    fn delete_areas_of_types(&mut self, types: &[AreaType]) -> Result<usize, StoreError> {
        let ids: Vec<i64> = self
            .state
            .areas
            .iter()
            .filter(|(_, area)| types.contains(&area.area_type))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.delete_area(*id)?;
        }
        Ok(ids.len())
    }

    fn upsert_code(
        &mut self,
        area_id: i64,
        code_type: CodeType,
        code: &str,
    ) -> Result<(), StoreError> {
        self.state
            .codes
            .insert((area_id, code_type), code.to_string());
        Ok(())
    }

    fn insert_polygons(
        &mut self,
        area_id: i64,
        polygons: &[Polygon<f64>],
    ) -> Result<(), StoreError> {
        if self.fail_polygon_inserts {
            return Err(StoreError::new("disk full"));
        }
        self.state
            .polygons
            .entry(area_id)
            .or_default()
            .extend(polygons.iter().cloned());
        Ok(())
    }

    fn delete_polygons(&mut self, area_id: i64) -> Result<usize, StoreError> {
        Ok(self
            .state
            .polygons
            .remove(&area_id)
            .map_or(0, |polygons| polygons.len()))
    }
}

impl GenerationStore for MemoryCatalogue {
    fn current_generation(&mut self) -> Result<Option<Generation>, StoreError> {
        Ok(self
            .state
            .generations
            .iter()
            .filter(|generation| generation.is_active())
            .max_by_key(|generation| generation.id())
            .cloned())
    }

    fn create_generation(&mut self, description: &str) -> Result<Generation, StoreError> {
        let id: i64 = self.add_generation(description, false);
        Ok(Generation::new(id, description.to_string(), false))
    }

    fn get_generation(&mut self, generation_id: i64) -> Result<Option<Generation>, StoreError> {
        Ok(self
            .state
            .generations
            .iter()
            .find(|generation| generation.id() == generation_id)
            .cloned())
    }
}

impl Catalogue for MemoryCatalogue {
    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        let snapshot: CatalogueState = self.state.clone();
        match f(self) {
            Ok(value) => {
                self.commits += 1;
                Ok(value)
            }
            Err(err) => {
                self.state = snapshot;
                self.rollbacks += 1;
                Err(err)
            }
        }
    }
}

/// Records every progress message it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub messages: Vec<(String, String)>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(|(_, message)| message.as_str())
    }

    pub fn contains(&self, message: &str) -> bool {
        self.messages.iter().any(|(_, m)| m == message)
    }
}

impl ProgressSink for RecordingSink {
    fn update(&mut self, task_id: &str, message: &str) -> Result<(), StoreError> {
        self.messages
            .push((task_id.to_string(), message.to_string()));
        Ok(())
    }
}

/// Cancels a run as soon as a given progress message is reported.
pub struct CancellingSink {
    pub trigger: String,
    pub cancellation: Cancellation,
}

impl ProgressSink for CancellingSink {
    fn update(&mut self, _task_id: &str, message: &str) -> Result<(), StoreError> {
        if message == self.trigger {
            self.cancellation.cancel();
        }
        Ok(())
    }
}

/// Rejects every progress message.
#[derive(Debug, Default)]
pub struct FailingSink {
    pub attempts: usize,
}

impl ProgressSink for FailingSink {
    fn update(&mut self, _task_id: &str, _message: &str) -> Result<(), StoreError> {
        self.attempts += 1;
        Err(StoreError::new("progress store unavailable"))
    }
}
