// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Polygon set operations used to build branch and region footprints.
//!
//! All coordinates are in the working projection of the catalogue (British
//! National Grid), so areas come out in square metres.

use geo::{Area, BooleanOps, LineString, MultiPolygon, Polygon};
use num_traits::ToPrimitive;

use crate::error::DomainError;

/// Components at or below this area are treated as degenerate.
pub const MIN_COMPONENT_AREA: f64 = 1e-6;

/// The computed footprint of one branch or region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Footprint {
    polygons: Vec<Polygon<f64>>,
    area: f64,
}

impl Footprint {
    /// A footprint with no polygons.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            polygons: Vec::new(),
            area: 0.0,
        }
    }

    /// The non-overlapping polygons to store, one row each.
    #[must_use]
    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.polygons
    }

    #[must_use]
    pub fn into_polygons(self) -> Vec<Polygon<f64>> {
        self.polygons
    }

    /// Total area of all components.
    #[must_use]
    pub const fn area(&self) -> f64 {
        self.area
    }

    /// Total area rounded to whole square metres, for messages.
    #[must_use]
    pub fn whole_area(&self) -> u64 {
        self.area.round().to_u64().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Merges a set of polygons into one multipolygon.
///
/// Overlapping inputs are dissolved so the result never double counts.
#[must_use]
pub fn aggregate<'a, I>(polygons: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = &'a Polygon<f64>>,
{
    polygons
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, polygon| {
            acc.union(&MultiPolygon::new(vec![polygon.clone()]))
        })
}

/// Area-preserving intersection of two multipolygons.
#[must_use]
pub fn intersect(subject: &MultiPolygon<f64>, clip: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    subject.intersection(clip)
}

/// Drops degenerate components left behind by set operations.
///
/// Equivalent to a zero-distance buffer: shells and holes with no area
/// (slivers, collapsed rings, boundary-only contact) are removed, real area
/// is kept untouched.
#[must_use]
pub fn cleanup(geometry: MultiPolygon<f64>) -> MultiPolygon<f64> {
    let polygons: Vec<Polygon<f64>> = geometry
        .0
        .into_iter()
        .filter_map(|polygon| {
            let (exterior, interiors) = polygon.into_inner();
            if !has_area(&exterior) {
                return None;
            }
            let interiors: Vec<LineString<f64>> =
                interiors.into_iter().filter(has_area).collect();
            Some(Polygon::new(exterior, interiors))
        })
        .collect();
    MultiPolygon::new(polygons)
}

/// Splits a multipolygon into its component polygons.
#[must_use]
pub fn decompose(geometry: MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    geometry.0
}

/// Computes a footprint from subarea polygons, optionally clipped to a parent.
///
/// Without a parent the subareas themselves form the footprint (the region
/// case). Callers decide what an absent parent means for branches.
#[must_use]
pub fn reconcile(subareas: &[Polygon<f64>], parent: Option<&[Polygon<f64>]>) -> Footprint {
    let subject: MultiPolygon<f64> = aggregate(subareas);
    let combined: MultiPolygon<f64> = match parent {
        Some(parent_polygons) => intersect(&subject, &aggregate(parent_polygons)),
        None => subject,
    };

    let polygons: Vec<Polygon<f64>> = decompose(cleanup(combined));
    let area: f64 = polygons.iter().map(|polygon| polygon.unsigned_area()).sum();
    Footprint { polygons, area }
}

/// Encodes a polygon for storage.
///
/// # Errors
///
/// Returns an error if the polygon cannot be serialized.
pub fn encode_polygon(polygon: &Polygon<f64>) -> Result<String, DomainError> {
    serde_json::to_string(polygon).map_err(|e| DomainError::InvalidGeometry(e.to_string()))
}

/// Decodes a stored polygon.
///
/// # Errors
///
/// Returns an error if the stored text is not a serialized polygon.
pub fn decode_polygon(text: &str) -> Result<Polygon<f64>, DomainError> {
    serde_json::from_str(text).map_err(|e| DomainError::InvalidGeometry(e.to_string()))
}

/// Axis-aligned square polygon, mostly for fixtures.
#[must_use]
pub fn square(x: f64, y: f64, width: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (x, y),
            (x + width, y),
            (x + width, y + width),
            (x, y + width),
            (x, y),
        ]),
        Vec::new(),
    )
}

fn has_area(ring: &LineString<f64>) -> bool {
    ring.0.len() >= 4 && Polygon::new(ring.clone(), Vec::new()).unsigned_area() > MIN_COMPONENT_AREA
}
