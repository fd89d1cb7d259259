//! Tower synthesis for small isolated overhangs.
//!
//! A small overhang would be narrowed away by ordinary support before it
//! reaches anything solid. Instead, a round roof is seeded under it and
//! flared outward layer by layer until it is as wide as a tower, after which
//! it is carried down by the regular layer join like any other support.

use super::overhang::{cluster_center, OverhangPoint};
use crate::clipper::{self, OffsetJoinType};
use crate::config::SupportParams;
use crate::geometry::{ExPolygon, ExPolygons};
use crate::{unscale, CoordF};
use tracing::debug;

/// Tower state threaded through the top-down descent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TowerState {
    /// Roofs still growing, one polygon set per tower.
    pub roofs: Vec<ExPolygons>,
    /// Number of overhang point records consumed, counted from the top.
    pub cursor: usize,
}

impl TowerState {
    /// Number of towers still flaring out.
    pub fn active_towers(&self) -> usize {
        self.roofs.len()
    }
}

/// Diameter of the circle with the same area as `polys`.
pub(crate) fn effective_diameter(polys: &[ExPolygon]) -> CoordF {
    2.0 * (clipper::total_area(polys).max(0.0) / std::f64::consts::PI).sqrt()
}

/// Add tower roofs to the support of `layer_idx`.
///
/// `overhang_points` must be in ascending layer order. Records are consumed
/// from the top through `state.cursor`, which only ever moves forward: a
/// record seeds its towers on the layer `tower_z_distance_layers` below its
/// own, and records whose seed layer was already passed are skipped.
///
/// Every roof is clipped by the model on this layer and unioned into the
/// support. Roofs narrower than `tower_diameter` are grown by the roof
/// expansion for the next layer down; wider ones are done and dropped.
pub fn handle_towers(
    support_this: ExPolygons,
    state: TowerState,
    overhang_points: &[OverhangPoint],
    layer_idx: usize,
    model_outline: &[ExPolygon],
    params: &SupportParams,
) -> (ExPolygons, TowerState) {
    let TowerState { mut roofs, mut cursor } = state;
    let z_tower = params.tower_z_distance_layers;

    while cursor < overhang_points.len() {
        let point = &overhang_points[overhang_points.len() - 1 - cursor];
        let Some(seed_layer) = point.layer_idx.checked_sub(z_tower) else {
            // Would seed below the build plate, and so would every record under it
            break;
        };
        if seed_layer < layer_idx {
            break;
        }

        cursor += 1;
        if seed_layer > layer_idx {
            continue;
        }

        let radius = params.min_supportable_diameter / 2;
        for cluster in &point.clusters {
            let Some(center) = cluster_center(cluster) else {
                continue;
            };
            let seed = clipper::union(cluster, &[ExPolygon::circle(center, radius)]);
            if !seed.is_empty() {
                roofs.push(seed);
            }
        }
        debug!(
            layer_idx,
            overhang_layer = point.layer_idx,
            clusters = point.clusters.len(),
            "Seeded tower roofs"
        );
    }

    if roofs.is_empty() {
        return (support_this, TowerState { roofs, cursor });
    }

    let mut support = support_this;
    let mut growing = Vec::with_capacity(roofs.len());
    for roof in roofs {
        let roof = clipper::difference(&roof, model_outline);
        if roof.is_empty() {
            continue;
        }

        support = clipper::union(&support, &roof);

        if effective_diameter(&roof) < params.tower_diameter as CoordF {
            let grown = clipper::offset_expolygons(
                &roof,
                unscale(params.tower_roof_expansion),
                OffsetJoinType::Round,
            );
            growing.push(grown);
        }
    }

    (
        support,
        TowerState {
            roofs: growing,
            cursor,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupportConfig;
    use crate::geometry::Point;
    use crate::{scale, unscale_area};

    fn params() -> SupportParams {
        let config = SupportConfig {
            minimal_diameter: 3.0,
            tower_diameter: 5.0,
            tower_roof_angle: 65.0,
            tower_z_distance_layers: Some(2),
            ..SupportConfig::enabled()
        };
        SupportParams::derive(&config, 0.1).unwrap()
    }

    fn square_point(layer_idx: usize, x: f64) -> OverhangPoint {
        OverhangPoint {
            layer_idx,
            clusters: vec![vec![ExPolygon::rectangle(
                Point::new_scale(x, 0.0),
                Point::new_scale(x + 2.0, 2.0),
            )]],
        }
    }

    #[test]
    fn test_nothing_to_do() {
        let p = params();
        let (support, state) = handle_towers(Vec::new(), TowerState::default(), &[], 5, &[], &p);
        assert!(support.is_empty());
        assert_eq!(state, TowerState::default());
    }

    #[test]
    fn test_tower_seeded_at_z_distance() {
        let p = params();
        let points = vec![square_point(10, 0.0)];

        // Layer 9 is above the seed layer: nothing happens yet
        let (support, state) = handle_towers(Vec::new(), TowerState::default(), &points, 9, &[], &p);
        assert!(support.is_empty());
        assert_eq!(state.cursor, 0);

        let (support, state) = handle_towers(support, state, &points, 8, &[], &p);
        assert_eq!(state.cursor, 1);
        assert_eq!(state.active_towers(), 1);
        let d = effective_diameter(&support);
        assert!(d >= scale(2.9) as f64, "seed diameter {}", d);
    }

    #[test]
    fn test_tower_grows_to_full_diameter() {
        let p = params();
        let points = vec![square_point(40, 0.0)];
        let mut state = TowerState::default();
        let mut last_area = 0.0;
        let mut finished_at = None;

        for layer_idx in (0..=38).rev() {
            let (support, next) = handle_towers(Vec::new(), state, &points, layer_idx, &[], &p);
            state = next;
            let area = unscale_area(clipper::total_area(&support));
            assert!(area + 1e-6 >= last_area, "roof shrank at layer {}", layer_idx);
            last_area = area;
            if state.active_towers() == 0 {
                finished_at = Some(layer_idx);
                assert!(effective_diameter(&support) >= p.tower_diameter as f64);
                break;
            }
        }

        // Radius 1.5mm to 2.5mm at ~0.047mm per layer
        let finished_at = finished_at.expect("tower never reached full diameter");
        assert!(finished_at < 25 && finished_at > 10, "finished at {}", finished_at);
        assert_eq!(state.cursor, 1);
    }

    #[test]
    fn test_model_below_consumes_roof() {
        let p = params();
        let points = vec![square_point(10, 0.0)];
        let (_, state) = handle_towers(Vec::new(), TowerState::default(), &points, 8, &[], &p);
        assert_eq!(state.active_towers(), 1);

        let floor = vec![ExPolygon::rectangle(
            Point::new_scale(-10.0, -10.0),
            Point::new_scale(10.0, 10.0),
        )];
        let (support, state) = handle_towers(Vec::new(), state, &points, 7, &floor, &p);
        assert!(support.is_empty());
        assert_eq!(state.active_towers(), 0);
    }

    #[test]
    fn test_passed_and_low_records_are_never_seeded() {
        let p = params();
        // Record at layer 1 would seed below the plate; record at 20 is passed
        let points = vec![square_point(1, 0.0), square_point(12, 10.0), square_point(20, 20.0)];

        let (_, state) = handle_towers(Vec::new(), TowerState::default(), &points, 10, &[], &p);
        assert_eq!(state.cursor, 2);
        assert_eq!(state.active_towers(), 1);

        let mut state = state;
        for layer_idx in (0..10).rev() {
            let (_, next) = handle_towers(Vec::new(), state, &points, layer_idx, &[], &p);
            assert!(next.cursor >= 2);
            state = next;
        }
        assert_eq!(state.cursor, 2);
    }
}
