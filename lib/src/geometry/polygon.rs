//! Polygon type for closed contours.

use super::{BoundingBox, Point};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed polygon defined by a sequence of points.
///
/// The polygon is implicitly closed - the last point connects back to the first.
/// Points should be ordered counter-clockwise for outer contours (positive area)
/// and clockwise for holes (negative area).
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Create a new empty polygon.
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polygon from a vector of points.
    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Get the points of this polygon.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the edges as (start, end) pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..if n < 2 { 0 } else { n }).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Calculate the signed area of the polygon.
    /// Positive for counter-clockwise (exterior), negative for clockwise (hole).
    /// Uses the shoelace formula.
    pub fn signed_area(&self) -> CoordF {
        if self.points.len() < 3 {
            return 0.0;
        }

        let mut sum: i128 = 0;
        for (a, b) in self.edges() {
            sum += a.x as i128 * b.y as i128;
            sum -= b.x as i128 * a.y as i128;
        }

        sum as CoordF / 2.0
    }

    /// Calculate the unsigned area of the polygon.
    #[inline]
    pub fn area(&self) -> CoordF {
        self.signed_area().abs()
    }

    /// The longest edge, if the polygon has any.
    pub fn longest_edge(&self) -> Option<(Point, Point)> {
        self.edges().max_by_key(|(a, b)| a.distance_squared(b))
    }

    /// Calculate the centroid (center of mass) of the polygon.
    pub fn centroid(&self) -> Point {
        match self.points.len() {
            0 => return Point::zero(),
            1 => return self.points[0],
            _ => {}
        }

        let mut cx: i128 = 0;
        let mut cy: i128 = 0;
        let mut area: i128 = 0;

        for (a, b) in self.edges() {
            let cross = a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128;
            cx += (a.x as i128 + b.x as i128) * cross;
            cy += (a.y as i128 + b.y as i128) * cross;
            area += cross;
        }

        if area == 0 {
            // Degenerate polygon, return average of points
            let n = self.points.len() as i128;
            let sum_x: i128 = self.points.iter().map(|p| p.x as i128).sum();
            let sum_y: i128 = self.points.iter().map(|p| p.y as i128).sum();
            return Point::new((sum_x / n) as Coord, (sum_y / n) as Coord);
        }

        Point::new((cx / (3 * area)) as Coord, (cy / (3 * area)) as Coord)
    }

    /// Get the bounding box of the polygon.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// A polygon is usable as a boolean operand when it has at least three
    /// points and encloses some area.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3 && self.signed_area() != 0.0
    }

    /// Create an axis-aligned rectangle (counter-clockwise).
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::from_points(vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ])
    }

    /// Create a circle approximation with n segments (counter-clockwise).
    pub fn circle(center: Point, radius: Coord, segments: usize) -> Self {
        if segments < 3 || radius <= 0 {
            return Self::new();
        }

        let points = (0..segments)
            .map(|i| {
                let angle = 2.0 * std::f64::consts::PI * i as CoordF / segments as CoordF;
                Point::new(
                    center.x + (radius as CoordF * angle.cos()).round() as Coord,
                    center.y + (radius as CoordF * angle.sin()).round() as Coord,
                )
            })
            .collect();

        Self::from_points(points)
    }
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon({} points)", self.points.len())
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}
