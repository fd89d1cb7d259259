//! Area support generation.
//!
//! Support is generated per mesh from the top of the model down to the
//! build plate, then merged across meshes and split into sparse support and
//! dense interface skin.
//!
//! # Algorithm Overview
//!
//! 1. **Overhang Detection** (parallel over layers): for each layer, the part
//!    of the mesh outline not standing on the layer below. Small isolated
//!    overhangs are recorded as overhang points.
//!
//! 2. **Descent** (sequential, top to bottom): the overhang of the layer
//!    `top_distance_layers` above becomes this layer's raw support. Towers and
//!    wall struts are added, the result is joined with the layer above, and
//!    the model below is cleared with stair stepping. The model on the layer
//!    itself is kept clear by the XY distance.
//!
//! 3. **Build plate only**: support that does not reach the plate is removed.
//!
//! 4. **Merge and interface**: the support of all meshes is unioned per layer,
//!    then roof and floor skin is split off per mesh.
//!
//! Every stage takes its input by value and returns the new region; the
//! descent threads the layer above and the tower state explicitly.

pub mod bottom;
pub mod interface;
pub mod join;
pub mod overhang;
pub mod struts;
pub mod towers;

pub use bottom::handle_bottom;
pub use interface::generate_support_interface;
pub use join::join;
pub use overhang::{compute_basic_and_full_overhang, detect_overhang_points, OverhangPoint};
pub use struts::handle_wall_struts;
pub use towers::{handle_towers, TowerState};

use crate::clipper::{self, OffsetJoinType};
use crate::config::{SupportParams, SupportPlacement};
use crate::geometry::{ExPolygon, ExPolygons};
use crate::storage::{MeshStorage, SliceDataStorage};
use crate::{unscale, Result};
use rayon::prelude::*;
use tracing::{debug, info, trace};

/// Generate support for every mesh of `storage` and store it per layer.
///
/// Meshes with support disabled or without geometry are skipped. The support
/// of all meshes is merged into `storage.support`, after which each mesh
/// splits its interface skin off the merged result.
pub fn generate_support_areas(storage: &mut SliceDataStorage) -> Result<()> {
    storage.validate()?;
    let layer_count = storage.layer_count();

    let mut jobs: Vec<(usize, SupportParams)> = Vec::new();
    for (mesh_idx, mesh) in storage.meshes.iter().enumerate() {
        if !mesh.config.enabled {
            debug!(mesh = %mesh.name, "Support disabled, skipping mesh");
            continue;
        }
        if mesh.is_empty() {
            debug!(mesh = %mesh.name, "Mesh has no geometry, skipping");
            continue;
        }
        jobs.push((mesh_idx, SupportParams::derive(&mesh.config, storage.layer_height)?));
    }

    if jobs.is_empty() || layer_count == 0 {
        storage.support.generated = true;
        return Ok(());
    }

    info!(meshes = jobs.len(), layer_count, "Generating area support");

    let model_outlines = storage.all_layer_outlines();

    let per_mesh: Vec<Vec<ExPolygons>> = jobs
        .par_iter()
        .map(|(mesh_idx, params)| {
            generate_mesh_support(&storage.meshes[*mesh_idx], &model_outlines, params)
        })
        .collect();

    let merged: Vec<ExPolygons> = (0..layer_count)
        .into_par_iter()
        .map(|layer_idx| {
            let parts: ExPolygons = per_mesh
                .iter()
                .flat_map(|areas| areas[layer_idx].iter().cloned())
                .collect();
            if per_mesh.len() > 1 {
                clipper::union_ex(&parts)
            } else {
                parts
            }
        })
        .collect();

    let mut layers = std::mem::take(&mut storage.support.layers);
    for (layer, areas) in layers.iter_mut().zip(merged) {
        if !areas.is_empty() {
            layer.support_areas = clipper::union(&layer.support_areas, &areas);
        }
    }

    for (mesh_idx, params) in &jobs {
        layers = generate_support_interface(layers, &storage.meshes[*mesh_idx], params);
    }

    let total_area: f64 = layers.iter().map(|l| l.total_area()).sum();
    info!(
        support_layers = layers.iter().filter(|l| !l.is_empty()).count(),
        total_area_mm2 = total_area,
        "Area support generated"
    );

    storage.support.layers = layers;
    storage.support.generated = true;
    Ok(())
}

/// Support areas of one mesh per layer, before merging and interface.
///
/// `model_outlines` is the union of all meshes per layer; support of this
/// mesh keeps clear of every mesh in the group.
pub fn generate_mesh_support(
    mesh: &MeshStorage,
    model_outlines: &[ExPolygons],
    params: &SupportParams,
) -> Vec<ExPolygons> {
    let layer_count = model_outlines.len();
    let mut support_areas: Vec<ExPolygons> = vec![Vec::new(); layer_count];
    let z_top = params.top_distance_layers;

    if layer_count < z_top + 1 {
        debug!(mesh = %mesh.name, layer_count, z_top, "Too few layers for support");
        return support_areas;
    }

    let (basic_overhangs, full_overhangs): (Vec<ExPolygons>, Vec<ExPolygons>) = (0..layer_count)
        .into_par_iter()
        .map(|layer_idx| {
            compute_basic_and_full_overhang(
                mesh,
                model_outlines,
                layer_idx,
                params.max_dist_from_lower_layer,
            )
        })
        .unzip();

    let overhang_points = if params.towers {
        detect_overhang_points(mesh, &basic_overhangs, params.min_supportable_diameter)
    } else {
        Vec::new()
    };
    debug!(
        mesh = %mesh.name,
        overhang_points = overhang_points.len(),
        "Detected overhangs"
    );

    let mut towers = TowerState::default();
    let mut support_last: ExPolygons = Vec::new();
    let top_layer = layer_count - 1 - z_top;

    for layer_idx in (0..=top_layer).rev() {
        let mut support_this = full_overhangs[layer_idx + z_top].clone();
        if params.extension_offset != 0 && !support_this.is_empty() {
            support_this = clipper::offset_expolygons(
                &support_this,
                unscale(params.extension_offset),
                OffsetJoinType::Round,
            );
        }

        if params.towers {
            let (with_towers, state) = handle_towers(
                support_this,
                towers,
                &overhang_points,
                layer_idx,
                &model_outlines[layer_idx],
                params,
            );
            towers = state;
            support_this = handle_wall_struts(
                with_towers,
                params.min_supportable_diameter,
                params.tower_diameter,
                params.wall_strut_spacing,
            );
        }

        let support_this = join(&support_last, support_this, params);
        let support_this = handle_bottom(
            support_this,
            model_outlines,
            layer_idx,
            params.bottom_distance_layers,
            params.bottom_stair_step_layers,
            params.bottom_stair_step_width,
        );

        support_areas[layer_idx] =
            remove_xy_disallowed(&support_this, &model_outlines[layer_idx], params);
        trace!(
            layer_idx,
            regions = support_areas[layer_idx].len(),
            active_towers = towers.active_towers(),
            "Support layer done"
        );
        support_last = support_this;
    }

    if params.placement == SupportPlacement::BuildplateOnly {
        keep_buildplate_support(&mut support_areas);
    }

    debug!(
        mesh = %mesh.name,
        support_layers = support_areas.iter().filter(|a| !a.is_empty()).count(),
        "Mesh support done"
    );
    support_areas
}

/// Remove the model on this layer, grown by the XY distance.
fn remove_xy_disallowed(
    support: &[ExPolygon],
    model_outline: &[ExPolygon],
    params: &SupportParams,
) -> ExPolygons {
    if support.is_empty() || model_outline.is_empty() {
        return support.to_vec();
    }
    let disallowed = clipper::offset_expolygons(
        model_outline,
        unscale(params.xy_distance),
        OffsetJoinType::Round,
    );
    clipper::difference(support, &disallowed)
}

/// Keep only support standing on the build plate through every layer below.
fn keep_buildplate_support(support_areas: &mut [ExPolygons]) {
    for layer_idx in 1..support_areas.len() {
        if support_areas[layer_idx].is_empty() {
            continue;
        }
        let reachable =
            clipper::intersection(&support_areas[layer_idx], &support_areas[layer_idx - 1]);
        support_areas[layer_idx] = reachable;
    }
}
