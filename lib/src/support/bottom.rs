//! Bottom Z distance and stair stepping.
//!
//! Support standing on the model keeps `bottom_distance_layers` of air
//! between itself and the model surface below. On sloped surfaces the
//! clearance is quantized into stair steps of `stair_step_layers` layers so
//! the support does not follow every layer of the slope.

use crate::clipper::{self, OffsetJoinType};
use crate::geometry::{ExPolygon, ExPolygons};
use crate::{unscale, Coord};

/// Remove the model below `layer_idx` from the support of that layer.
///
/// The removed region is the model in the Z-distance window below the layer,
/// or the model on the layer itself when the distance is zero.
/// With stair stepping, each group of `stair_step_layers` layers also clears
/// the outline of the group's lowest model layer, up to `stair_step_width`
/// from the model directly below the gap. Past that width the support follows
/// the model surface.
pub fn handle_bottom(
    support_this: ExPolygons,
    model_outlines: &[ExPolygons],
    layer_idx: usize,
    bottom_distance_layers: usize,
    stair_step_layers: usize,
    stair_step_width: Coord,
) -> ExPolygons {
    if support_this.is_empty() {
        return support_this;
    }

    // Without a gap the support still may not enter the model on its own layer
    let window = if bottom_distance_layers == 0 {
        layer_idx..layer_idx + 1
    } else if layer_idx == 0 {
        return support_this;
    } else {
        layer_idx.saturating_sub(bottom_distance_layers)..layer_idx
    };
    let window_end = window.end.min(model_outlines.len());
    let window: ExPolygons = model_outlines
        .get(window.start..window_end)
        .unwrap_or_default()
        .iter()
        .flatten()
        .cloned()
        .collect();
    let mut removal = clipper::union_ex(&window);

    if stair_step_layers > 1 && layer_idx >= bottom_distance_layers {
        let bottom_layer = layer_idx - bottom_distance_layers;
        let step_base = bottom_layer - bottom_layer % stair_step_layers;
        if step_base != bottom_layer {
            let step = stair_step(model_outlines, step_base, bottom_layer, stair_step_width);
            removal = clipper::union(&removal, &step);
        }
    }

    if removal.is_empty() {
        return support_this;
    }
    clipper::difference(&support_this, &removal)
}

/// The part of the step base outline within `width` of the model at `bottom_layer`.
fn stair_step(
    model_outlines: &[ExPolygons],
    step_base: usize,
    bottom_layer: usize,
    width: Coord,
) -> ExPolygons {
    let base = model_outlines.get(step_base).map_or(&[][..], Vec::as_slice);
    let below: &[ExPolygon] = model_outlines.get(bottom_layer).map_or(&[][..], Vec::as_slice);
    if base.is_empty() || below.is_empty() {
        return Vec::new();
    }
    let reach = clipper::offset_expolygons(below, unscale(width), OffsetJoinType::Round);
    clipper::intersection(base, &reach)
}
