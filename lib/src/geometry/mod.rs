//! Geometry primitives for support generation.
//!
//! This module provides the 2D geometric types the support pipeline works on:
//! - [`Point`] - 2D point with integer coordinates (scaled)
//! - [`Polygon`] - Closed polygon (boundary)
//! - [`ExPolygon`] - Polygon with holes (exterior + interior contours)
//! - [`BoundingBox`] - Axis-aligned bounding box
//!
//! ## Coordinate System
//!
//! Coordinates are scaled integers to avoid floating-point drift across many
//! layers. Coordinates are scaled by `SCALING_FACTOR` (1,000,000), so 1 unit = 1 nanometer.
//!
//! - Use `scale()` to convert from mm to internal units
//! - Use `unscale()` to convert from internal units to mm

mod bounding_box;
mod expolygon;
mod point;
mod polygon;

pub use bounding_box::BoundingBox;
pub use expolygon::{ExPolygon, ExPolygons};
pub use point::Point;
pub use polygon::Polygon;

/// Default number of segments used when approximating circles.
pub const CIRCLE_SEGMENTS: usize = 32;
