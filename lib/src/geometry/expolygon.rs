//! ExPolygon type for polygons with holes.
//!
//! A layer outline or support region is a set of ExPolygons: each one is a
//! connected island (exterior contour) with optional holes.

use super::{BoundingBox, Point, Polygon, CIRCLE_SEGMENTS};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A polygon with holes (exterior polygon + interior hole polygons).
///
/// The contour is the outer boundary (should be counter-clockwise for positive area).
/// The holes are interior boundaries (should be clockwise).
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExPolygon {
    /// The outer contour of the polygon.
    pub contour: Polygon,
    /// The holes (interior contours) of the polygon.
    pub holes: Vec<Polygon>,
}

/// A collection of ExPolygons, i.e. a polygon set.
pub type ExPolygons = Vec<ExPolygon>;

impl ExPolygon {
    /// Create a new ExPolygon with only a contour and no holes.
    #[inline]
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    /// Create a new ExPolygon with a contour and holes.
    #[inline]
    pub fn with_holes(contour: Polygon, holes: Vec<Polygon>) -> Self {
        Self { contour, holes }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contour.is_empty()
    }

    /// Area of the ExPolygon (contour area minus hole areas).
    pub fn area(&self) -> CoordF {
        let holes_area: CoordF = self.holes.iter().map(|h| h.area()).sum();
        self.contour.area() - holes_area
    }

    /// Bounding box of the ExPolygon (same as the contour's bounding box).
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// Centroid of the contour.
    #[inline]
    pub fn centroid(&self) -> Point {
        self.contour.centroid()
    }

    /// Check that the contour and every hole are valid rings.
    pub fn is_valid(&self) -> bool {
        self.contour.is_valid() && self.holes.iter().all(Polygon::is_valid)
    }

    /// Create a rectangular ExPolygon.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::new(Polygon::rectangle(min, max))
    }

    /// Create a circular ExPolygon with the default resolution.
    pub fn circle(center: Point, radius: Coord) -> Self {
        Self::new(Polygon::circle(center, radius, CIRCLE_SEGMENTS))
    }
}

impl From<Polygon> for ExPolygon {
    fn from(contour: Polygon) -> Self {
        Self::new(contour)
    }
}

impl fmt::Debug for ExPolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExPolygon(contour: {} points, holes: {})",
            self.contour.len(),
            self.holes.len()
        )
    }
}
