//! Support configuration.
//!
//! [`SupportConfig`] holds the user-facing settings in millimetres and
//! degrees, serialisable to and from JSON. [`SupportParams`] is derived from
//! it for a given layer height: scaled integer distances and layer counts,
//! which is what the pipeline stages consume.

use crate::{scale, scale_area, Coord, CoordF, Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where support is allowed to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportPlacement {
    /// Support may rest on the build plate and on the model.
    #[default]
    Everywhere,
    /// Only support columns that reach the build plate are kept.
    BuildplateOnly,
}

/// Support generation settings for one mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    // === General ===
    /// Generate support for this mesh.
    pub enabled: bool,

    /// Where support may rest.
    pub placement: SupportPlacement,

    /// Overhang angle threshold (degrees from vertical).
    pub overhang_angle: CoordF,

    // === Distances ===
    /// Z gap between the top of support and the model above (mm).
    pub top_distance: CoordF,

    /// Z gap between the model below and the bottom of support (mm).
    pub bottom_distance: CoordF,

    /// Horizontal gap between support and the model (mm).
    pub xy_distance: CoordF,

    /// Horizontal expansion applied to raw overhang areas (mm).
    pub offset: CoordF,

    // === Joining and smoothing ===
    /// Gaps narrower than this are closed (mm).
    pub join_distance: CoordF,

    /// Smoothing distance (mm).
    pub area_smoothing: CoordF,

    /// Regions at or below this area are not smoothed (mm²).
    pub min_smoothing_area: CoordF,

    // === Conical support ===
    pub conical_enabled: bool,

    /// Positive widens support going down, negative narrows it (degrees).
    pub conical_angle: CoordF,

    /// Parts narrower than this are never narrowed (mm).
    pub conical_min_width: CoordF,

    // === Towers and struts ===
    pub tower_enabled: bool,

    /// Diameter of towers and wall struts (mm).
    pub tower_diameter: CoordF,

    /// Smallest overhang diameter that is supported without a tower (mm).
    pub minimal_diameter: CoordF,

    /// Angle of the tower roof (degrees from horizontal).
    pub tower_roof_angle: CoordF,

    /// Layers between an overhang point and the top of its tower.
    /// Defaults to the top distance in layers.
    pub tower_z_distance_layers: Option<usize>,

    /// Distance between struts along a thin support wall (mm).
    pub wall_strut_spacing: CoordF,

    // === Bottom stair stepping ===
    /// Maximum height of a stair step (mm).
    pub bottom_stair_step_height: CoordF,

    /// Maximum width of a stair step (mm).
    pub bottom_stair_step_width: CoordF,

    // === Interface ===
    pub interface_enabled: bool,

    /// Thickness of the dense roof under the model (mm).
    pub roof_height: CoordF,

    /// Thickness of the dense floor on top of the model (mm).
    pub bottom_height: CoordF,

    /// Vertical sampling step when looking for model near the interface (mm).
    pub interface_skip_height: CoordF,

    /// Line width of interface extrusions (mm).
    pub interface_line_width: CoordF,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            placement: SupportPlacement::Everywhere,
            overhang_angle: 50.0,
            top_distance: 0.1,
            bottom_distance: 0.1,
            xy_distance: 0.7,
            offset: 0.2,
            join_distance: 2.0,
            area_smoothing: 0.6,
            min_smoothing_area: 2.0,
            conical_enabled: false,
            conical_angle: 30.0,
            conical_min_width: 5.0,
            tower_enabled: true,
            tower_diameter: 3.0,
            minimal_diameter: 3.0,
            tower_roof_angle: 65.0,
            tower_z_distance_layers: None,
            wall_strut_spacing: 10.0,
            bottom_stair_step_height: 0.3,
            bottom_stair_step_width: 5.0,
            interface_enabled: true,
            roof_height: 1.0,
            bottom_height: 1.0,
            interface_skip_height: 0.3,
            interface_line_width: 0.4,
        }
    }
}

impl SupportConfig {
    /// Create a new support config with supports enabled.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Parse a config from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Builder method to set placement
    pub fn with_placement(mut self, placement: SupportPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Builder method to enable conical support
    pub fn with_conical(mut self, angle: CoordF, min_width: CoordF) -> Self {
        self.conical_enabled = true;
        self.conical_angle = angle;
        self.conical_min_width = min_width;
        self
    }

    /// Builder method to enable or disable towers and struts
    pub fn with_towers(mut self, enabled: bool) -> Self {
        self.tower_enabled = enabled;
        self
    }

    /// Check the settings for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("top_distance", self.top_distance),
            ("bottom_distance", self.bottom_distance),
            ("xy_distance", self.xy_distance),
            ("join_distance", self.join_distance),
            ("area_smoothing", self.area_smoothing),
            ("min_smoothing_area", self.min_smoothing_area),
            ("conical_min_width", self.conical_min_width),
            ("wall_strut_spacing", self.wall_strut_spacing),
            ("bottom_stair_step_height", self.bottom_stair_step_height),
            ("bottom_stair_step_width", self.bottom_stair_step_width),
            ("roof_height", self.roof_height),
            ("bottom_height", self.bottom_height),
            ("interface_skip_height", self.interface_skip_height),
            ("interface_line_width", self.interface_line_width),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("{name} must be >= 0, got {value}")));
            }
        }

        for (name, value) in [
            ("tower_diameter", self.tower_diameter),
            ("minimal_diameter", self.minimal_diameter),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!("{name} must be > 0, got {value}")));
            }
        }

        if !(0.0..90.0).contains(&self.overhang_angle) {
            return Err(Error::Config(format!(
                "overhang_angle must be in [0, 90), got {}",
                self.overhang_angle
            )));
        }
        if !(self.tower_roof_angle > 0.0 && self.tower_roof_angle < 90.0) {
            return Err(Error::Config(format!(
                "tower_roof_angle must be in (0, 90), got {}",
                self.tower_roof_angle
            )));
        }
        if !(self.conical_angle.abs() < 90.0) {
            return Err(Error::Config(format!(
                "conical_angle must be in (-90, 90), got {}",
                self.conical_angle
            )));
        }
        if !self.offset.is_finite() {
            return Err(Error::Config("offset must be finite".into()));
        }

        Ok(())
    }
}

/// Settings of the support pipeline in scaled units and layer counts,
/// derived from a [`SupportConfig`] for one layer height.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportParams {
    pub placement: SupportPlacement,
    /// Overhang reach of the layer below.
    pub max_dist_from_lower_layer: Coord,
    /// Layers between an overhang and the top of its support.
    pub top_distance_layers: usize,
    /// Layers between the model below and the bottom of support.
    pub bottom_distance_layers: usize,
    pub xy_distance: Coord,
    pub extension_offset: Coord,
    pub join_distance: Coord,
    pub smoothing_distance: Coord,
    /// Scaled² units, comparable with `ExPolygon::area()`.
    pub min_smoothing_area: CoordF,
    pub conical: bool,
    /// Growth of the support per layer going down (negative narrows).
    pub conical_offset: Coord,
    pub conical_smallest_breadth: Coord,
    pub towers: bool,
    pub tower_diameter: Coord,
    pub min_supportable_diameter: Coord,
    pub tower_roof_expansion: Coord,
    pub tower_z_distance_layers: usize,
    pub wall_strut_spacing: Coord,
    pub bottom_stair_step_layers: usize,
    pub bottom_stair_step_width: Coord,
    pub interface: bool,
    pub roof_layers: usize,
    pub floor_layers: usize,
    pub interface_skip_layers: usize,
    pub interface_line_width: Coord,
}

impl SupportParams {
    /// Derive pipeline parameters for the given layer height (mm).
    pub fn derive(config: &SupportConfig, layer_height: CoordF) -> Result<Self> {
        if !layer_height.is_finite() || layer_height <= 0.0 {
            return Err(Error::Config(format!(
                "layer height must be > 0, got {layer_height}"
            )));
        }
        config.validate()?;

        let round_layers = |mm: CoordF| (mm / layer_height).round().max(0.0) as usize;
        let round_up_layers = |mm: CoordF| (mm / layer_height - 1e-9).ceil().max(0.0) as usize;

        // Support must always be at least one layer below the overhang
        let top_distance_layers = round_up_layers(config.top_distance) + 1;

        let tan_overhang = (config.overhang_angle.to_radians().tan() - 0.01).max(0.0);

        let conical_tan = config.conical_angle.abs().to_radians().tan();
        let conical_offset = scale(conical_tan * layer_height) * config.conical_angle.signum() as Coord;

        Ok(Self {
            placement: config.placement,
            max_dist_from_lower_layer: scale(tan_overhang * layer_height),
            top_distance_layers,
            bottom_distance_layers: round_up_layers(config.bottom_distance),
            xy_distance: scale(config.xy_distance),
            extension_offset: scale(config.offset),
            join_distance: scale(config.join_distance),
            smoothing_distance: scale(config.area_smoothing),
            min_smoothing_area: scale_area(config.min_smoothing_area),
            conical: config.conical_enabled && config.conical_angle != 0.0,
            conical_offset,
            conical_smallest_breadth: scale(config.conical_min_width),
            towers: config.tower_enabled,
            tower_diameter: scale(config.tower_diameter),
            min_supportable_diameter: scale(config.minimal_diameter),
            tower_roof_expansion: scale(layer_height / config.tower_roof_angle.to_radians().tan()),
            tower_z_distance_layers: config
                .tower_z_distance_layers
                .unwrap_or(top_distance_layers),
            wall_strut_spacing: scale(config.wall_strut_spacing),
            bottom_stair_step_layers: round_layers(config.bottom_stair_step_height).max(1),
            bottom_stair_step_width: scale(config.bottom_stair_step_width),
            interface: config.interface_enabled,
            roof_layers: round_layers(config.roof_height),
            floor_layers: round_layers(config.bottom_height),
            interface_skip_layers: round_layers(config.interface_skip_height).max(1),
            interface_line_width: scale(config.interface_line_width),
        })
    }
}
