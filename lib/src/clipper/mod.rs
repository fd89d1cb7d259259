//! Clipper polygon boolean operations module.
//!
//! This module provides the polygon set primitives the support pipeline is
//! built on: union, intersection, difference, offset and area queries,
//! backed by the geo-clipper library.
//!
//! Every operation returns a cleaned polygon set: rings with fewer than three
//! points or without area are dropped, so an offset that collapses a polygon
//! yields an empty set rather than a degenerate one.

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon};
use crate::{scale, unscale, CoordF};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Precision factor handed to clipper: geometry is converted to mm and
/// clipper snaps it to a 1/1000 mm integer grid.
const CLIPPER_FACTOR: f64 = 1000.0;

/// Join type for offset corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoinType {
    /// Square corners
    Square,
    /// Round corners
    #[default]
    Round,
    /// Mitered corners
    Miter,
}

impl From<OffsetJoinType> for JoinType {
    fn from(jt: OffsetJoinType) -> Self {
        match jt {
            OffsetJoinType::Square => JoinType::Square,
            OffsetJoinType::Round => JoinType::Round(0.25),
            OffsetJoinType::Miter => JoinType::Miter(2.0),
        }
    }
}

/// Convert a ring of scaled points to a closed geo LineString in mm.
fn ring_to_geo(poly: &Polygon) -> LineString<f64> {
    let mut coords: Vec<GeoCoord<f64>> = poly
        .points()
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();

    // Close the ring if needed
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }

    LineString::new(coords)
}

/// Convert a closed geo LineString back to a scaled ring.
fn geo_to_ring(ring: &LineString<f64>) -> Polygon {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::new(scale(c.x), scale(c.y)))
        .collect();

    // Our Polygon doesn't store the closing point
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    Polygon::from_points(points)
}

/// Convert our ExPolygon to geo's Polygon type (with holes).
fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    GeoPolygon::new(
        ring_to_geo(&expoly.contour),
        expoly.holes.iter().map(ring_to_geo).collect(),
    )
}

/// Convert geo's Polygon to our ExPolygon type, dropping degenerate holes.
fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> ExPolygon {
    let holes = geo_poly
        .interiors()
        .iter()
        .map(geo_to_ring)
        .filter(Polygon::is_valid)
        .collect();

    ExPolygon::with_holes(geo_to_ring(geo_poly.exterior()), holes)
}

/// Convert geo's MultiPolygon to our ExPolygons type, dropping degenerate islands.
fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi
        .0
        .iter()
        .map(geo_to_expolygon)
        .filter(|expoly| expoly.contour.is_valid() && expoly.area() > 0.0)
        .collect()
}

/// Convert our ExPolygons to geo's MultiPolygon.
fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

// ============================================================================
// Boolean Operations
// ============================================================================

/// Compute the union of two sets of polygons.
pub fn union(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return union_ex(clip);
    }
    if clip.is_empty() {
        return union_ex(subject);
    }

    let result = expolygons_to_geo_multi(subject).union(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the union of a single set of potentially overlapping polygons.
pub fn union_ex(polygons: &[ExPolygon]) -> ExPolygons {
    match polygons {
        [] => Vec::new(),
        [single] => clean(std::slice::from_ref(single)),
        [first, rest @ ..] => rest.iter().fold(clean(std::slice::from_ref(first)), |acc, poly| {
            let result = expolygons_to_geo_multi(&acc)
                .union(&expolygons_to_geo_multi(std::slice::from_ref(poly)), CLIPPER_FACTOR);
            geo_multi_to_expolygons(&result)
        }),
    }
}

/// Compute the intersection of two sets of polygons.
pub fn intersection(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return Vec::new();
    }

    let result = expolygons_to_geo_multi(subject)
        .intersection(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the difference of two sets of polygons (subject - clip).
pub fn difference(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return Vec::new();
    }
    if clip.is_empty() {
        return clean(subject);
    }

    let result = expolygons_to_geo_multi(subject)
        .difference(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset multiple ExPolygons by a given distance.
///
/// Positive delta inflates (grows) the polygons, negative delta deflates (shrinks) them.
/// Overlapping results are merged.
///
/// # Arguments
/// * `expolygons` - The polygons to offset
/// * `delta` - The offset distance in mm (positive = grow, negative = shrink)
/// * `join_type` - The type of join to use at corners
pub fn offset_expolygons(
    expolygons: &[ExPolygon],
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() {
        return Vec::new();
    }
    if delta == 0.0 {
        return clean(expolygons);
    }

    let result = expolygons_to_geo_multi(expolygons).offset(
        delta,
        join_type.into(),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    );
    geo_multi_to_expolygons(&result)
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Drop invalid rings: islands whose contour is degenerate and holes that are.
pub fn clean(expolygons: &[ExPolygon]) -> ExPolygons {
    expolygons
        .iter()
        .filter(|expoly| expoly.contour.is_valid())
        .map(|expoly| {
            let mut result = expoly.clone();
            result.holes.retain(Polygon::is_valid);
            result
        })
        .collect()
}

/// Remove polygons whose area is at or below `min_area` (scaled² units).
pub fn remove_small(expolygons: &[ExPolygon], min_area: CoordF) -> ExPolygons {
    expolygons
        .iter()
        .filter(|expoly| expoly.area().abs() > min_area)
        .cloned()
        .collect()
}

/// Compute the total area of a set of polygons (scaled² units).
pub fn total_area(expolygons: &[ExPolygon]) -> CoordF {
    expolygons.iter().map(|p| p.area()).sum()
}
