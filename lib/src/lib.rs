//! # Area Support
//!
//! Area-based support generation for FFF slicing.
//!
//! Given the sliced outlines of every mesh on every layer, this library
//! computes the polygons occupied by support material on each layer and
//! splits them into dense interface (skin) regions and sparse interior
//! regions:
//! - Overhang detection (basic and full overhang per layer)
//! - Tower synthesis for small isolated overhangs
//! - Strut reinforcement of thin support walls
//! - Layer joining with conical widening, gap filling and smoothing
//! - Bottom clearance with stair stepping
//! - Interface roof/floor generation
//!
//! ## Example
//!
//! ```rust,ignore
//! use area_support::{generate_support_areas, MeshStorage, SliceDataStorage, SupportConfig};
//!
//! let mut storage = SliceDataStorage::new(0.1, layer_count);
//! storage.add_mesh(MeshStorage::new("part", SupportConfig::enabled(), outlines));
//! generate_support_areas(&mut storage)?;
//! for layer in &storage.support.layers {
//!     println!("{} sparse, {} skin", layer.support_areas.len(), layer.interface_areas.len());
//! }
//! ```

pub mod clipper;
pub mod config;
pub mod geometry;
pub mod storage;
pub mod support;

pub use clipper::{
    difference, intersection, offset_expolygons, total_area, union, union_ex, OffsetJoinType,
};
pub use config::{SupportConfig, SupportParams, SupportPlacement};
pub use geometry::{BoundingBox, ExPolygon, ExPolygons, Point, Polygon};
pub use storage::{MeshStorage, SliceDataStorage, SupportLayer, SupportStorage};
pub use support::{generate_support_areas, OverhangPoint, TowerState};

/// Coordinate type used throughout the library.
/// Using i64 for integer coordinates (scaled by SCALING_FACTOR) to avoid floating-point drift.
pub type Coord = i64;

/// Floating-point coordinate type for unscaled values (mm).
pub type CoordF = f64;

/// Scaling factor: coordinates are stored as integers scaled by this factor.
/// 1 unit = 1 nanometer, so 1mm = 1_000_000 units.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Scale a floating-point coordinate (mm) to integer units.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Unscale an integer coordinate to floating-point (mm).
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// Convert an area in mm² to scaled² units, the unit returned by `area()`.
#[inline]
pub fn scale_area(mm2: CoordF) -> CoordF {
    mm2 * SCALING_FACTOR * SCALING_FACTOR
}

/// Convert an area in scaled² units to mm².
#[inline]
pub fn unscale_area(area: CoordF) -> CoordF {
    area / (SCALING_FACTOR * SCALING_FACTOR)
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for support generation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid geometry: {0}")]
    Geometry(String),
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
