//! Support interface (roof and floor skin).
//!
//! Support directly under the model (roof) or directly on top of it (floor)
//! is printed dense so the model surface comes out clean. Everything else
//! stays sparse. The two parts of a layer are kept disjoint.

use crate::clipper::{self, OffsetJoinType};
use crate::config::SupportParams;
use crate::geometry::ExPolygons;
use crate::storage::{MeshStorage, SupportLayer};
use crate::{scale_area, unscale};
use rayon::prelude::*;
use tracing::debug;

/// Skin fragments smaller than this stay sparse.
const MIN_SKIN_AREA_MM2: f64 = 1.0;

/// Split each layer's support into sparse support and interface skin.
///
/// Roofs are the support lying under this mesh within `roof_layers` above the
/// top Z gap; floors are the support above it within `floor_layers` below the
/// bottom Z gap. Model layers in those windows are sampled every
/// `interface_skip_layers`, always including the far end of the window.
pub fn generate_support_interface(
    mut layers: Vec<SupportLayer>,
    mesh: &MeshStorage,
    params: &SupportParams,
) -> Vec<SupportLayer> {
    if !params.interface || (params.roof_layers == 0 && params.floor_layers == 0) {
        return layers;
    }

    let layer_count = layers.len();
    let min_skin_area = scale_area(MIN_SKIN_AREA_MM2);

    layers
        .par_iter_mut()
        .enumerate()
        .for_each(|(layer_idx, layer)| {
            if layer.support_areas.is_empty() {
                return;
            }

            let roofs = roof_window(layer_idx, layer_count, params)
                .map(|(lo, hi)| touching(layer, mesh, lo, hi, params.interface_skip_layers))
                .unwrap_or_default();
            let floors = floor_window(layer_idx, params)
                .map(|(lo, hi)| touching(layer, mesh, lo, hi, params.interface_skip_layers))
                .unwrap_or_default();

            let skin = clipper::union(&roofs, &floors);
            if skin.is_empty() {
                return;
            }

            let skin = clipper::offset_expolygons(
                &skin,
                unscale(params.interface_line_width),
                OffsetJoinType::Round,
            );
            let skin = clipper::intersection(&skin, &layer.support_areas);
            let skin = clipper::remove_small(&skin, min_skin_area);
            if skin.is_empty() {
                return;
            }

            layer.support_areas = clipper::difference(&layer.support_areas, &skin);
            layer.interface_areas = clipper::union(&layer.interface_areas, &skin);
        });

    debug!(
        mesh = %mesh.name,
        interface_layers = layers.iter().filter(|l| !l.interface_areas.is_empty()).count(),
        "Generated support interface"
    );

    layers
}

/// Inclusive range of model layers above the top gap of `layer_idx`.
fn roof_window(
    layer_idx: usize,
    layer_count: usize,
    params: &SupportParams,
) -> Option<(usize, usize)> {
    if params.roof_layers == 0 {
        return None;
    }
    let lo = layer_idx + params.top_distance_layers;
    if lo >= layer_count {
        return None;
    }
    let hi = (lo + params.roof_layers - 1).min(layer_count - 1);
    Some((lo, hi))
}

/// Inclusive range of model layers below the bottom gap of `layer_idx`.
fn floor_window(layer_idx: usize, params: &SupportParams) -> Option<(usize, usize)> {
    if params.floor_layers == 0 {
        return None;
    }
    let hi = layer_idx.checked_sub(params.bottom_distance_layers + 1)?;
    let lo = (hi + 1).saturating_sub(params.floor_layers);
    Some((lo, hi))
}

/// Support of `layer` covered by the mesh on the sampled layers of `lo..=hi`.
fn touching(
    layer: &SupportLayer,
    mesh: &MeshStorage,
    lo: usize,
    hi: usize,
    skip: usize,
) -> ExPolygons {
    let model: ExPolygons = sampled_layers(lo, hi, skip)
        .flat_map(|idx| mesh.outlines(idx).iter().cloned())
        .collect();
    if model.is_empty() {
        return Vec::new();
    }
    clipper::intersection(&layer.support_areas, &clipper::union_ex(&model))
}

/// `lo`, `lo + skip`, ... up to `hi`, with `hi` always included.
fn sampled_layers(lo: usize, hi: usize, skip: usize) -> impl Iterator<Item = usize> {
    let step = skip.max(1);
    (lo..=hi)
        .step_by(step)
        .chain(std::iter::once(hi).filter(move |&h| h >= lo && (h - lo) % step != 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupportConfig;
    use crate::geometry::{ExPolygon, Point};
    use crate::unscale_area;

    fn rect_mm(x0: f64, y0: f64, x1: f64, y1: f64) -> ExPolygon {
        ExPolygon::rectangle(Point::new_scale(x0, y0), Point::new_scale(x1, y1))
    }

    fn area_mm2(polys: &[ExPolygon]) -> f64 {
        unscale_area(clipper::total_area(polys))
    }

    fn params() -> SupportParams {
        // 0.2mm layers: top gap 2, bottom gap 1, 5 roof/floor layers, skip 1
        let config = SupportConfig {
            top_distance: 0.2,
            bottom_distance: 0.2,
            roof_height: 1.0,
            bottom_height: 1.0,
            interface_skip_height: 0.2,
            ..SupportConfig::enabled()
        };
        SupportParams::derive(&config, 0.2).unwrap()
    }

    /// A 10mm shelf on layers 10..12 with a block standing on the plate.
    fn shelf_mesh() -> MeshStorage {
        let layers = (0..12)
            .map(|l| match l {
                0..=2 => vec![rect_mm(20.0, 0.0, 30.0, 10.0)],
                10..=11 => vec![rect_mm(0.0, 0.0, 30.0, 10.0)],
                _ => vec![],
            })
            .collect();
        MeshStorage::new("shelf", SupportConfig::enabled(), layers)
    }

    fn support_column(layer_count: usize) -> Vec<SupportLayer> {
        (0..layer_count)
            .map(|_| SupportLayer {
                support_areas: vec![rect_mm(0.0, 0.0, 19.0, 10.0)],
                interface_areas: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_sampled_layers() {
        assert_eq!(sampled_layers(2, 8, 3).collect::<Vec<_>>(), vec![2, 5, 8]);
        assert_eq!(sampled_layers(2, 9, 3).collect::<Vec<_>>(), vec![2, 5, 8, 9]);
        assert_eq!(sampled_layers(4, 4, 0).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_windows() {
        let p = params();
        assert_eq!(p.top_distance_layers, 2);
        assert_eq!(p.bottom_distance_layers, 1);
        assert_eq!(roof_window(3, 20, &p), Some((5, 9)));
        assert_eq!(roof_window(18, 20, &p), None);
        assert_eq!(roof_window(16, 20, &p), Some((18, 19)));
        assert_eq!(floor_window(10, &p), Some((4, 8)));
        assert_eq!(floor_window(3, &p), Some((0, 1)));
        assert_eq!(floor_window(1, &p), None);
    }

    #[test]
    fn test_roof_under_shelf() {
        let p = params();
        let mesh = shelf_mesh();
        let layers = generate_support_interface(support_column(12), &mesh, &p);

        // Layers 4..=9 see the shelf within five layers above the gap
        for layer_idx in 4..=9 {
            assert!(
                !layers[layer_idx].interface_areas.is_empty(),
                "layer {} should have a roof",
                layer_idx
            );
        }
        // Layer 2 sees model layers 4..=8, all empty
        assert!(layers[2].interface_areas.is_empty());
    }

    #[test]
    fn test_skin_partition_is_disjoint() {
        let p = params();
        let mesh = shelf_mesh();
        let before = support_column(12);
        let after = generate_support_interface(before.clone(), &mesh, &p);

        for (b, a) in before.iter().zip(&after) {
            let overlap = clipper::intersection(&a.support_areas, &a.interface_areas);
            assert!(area_mm2(&overlap) < 1e-3);
            let total = area_mm2(&a.support_areas) + area_mm2(&a.interface_areas);
            assert!((total - area_mm2(&b.support_areas)).abs() < 0.01);
        }
    }

    #[test]
    fn test_floor_above_model() {
        let p = params();
        // Support column standing on a block in layers 0..=2
        let mesh = MeshStorage::new(
            "block",
            SupportConfig::enabled(),
            (0..12)
                .map(|l| if l <= 2 { vec![rect_mm(20.0, 0.0, 30.0, 10.0)] } else { vec![] })
                .collect(),
        );
        let layers: Vec<SupportLayer> = (0..12)
            .map(|l| SupportLayer {
                support_areas: if l >= 4 {
                    vec![rect_mm(22.0, 2.0, 28.0, 8.0)]
                } else {
                    Vec::new()
                },
                interface_areas: Vec::new(),
            })
            .collect();

        let layers = generate_support_interface(layers, &mesh, &p);
        // Layer 4: bottom gap is layer 3, floor window 0..=2 holds the block
        assert!((area_mm2(&layers[4].interface_areas) - 36.0).abs() < 0.01);
        assert!(layers[4].support_areas.is_empty());
        // Layer 9: window 3..=7 is empty
        assert!(layers[9].interface_areas.is_empty());
    }

    #[test]
    fn test_disabled_interface_is_noop() {
        let config = SupportConfig {
            interface_enabled: false,
            ..SupportConfig::enabled()
        };
        let p = SupportParams::derive(&config, 0.2).unwrap();
        let layers = generate_support_interface(support_column(12), &shelf_mesh(), &p);
        assert!(layers.iter().all(|l| l.interface_areas.is_empty()));
    }
}
