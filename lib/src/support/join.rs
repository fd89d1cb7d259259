//! Joining a layer's support with the support of the layer above.

use crate::clipper::{self, OffsetJoinType};
use crate::config::SupportParams;
use crate::geometry::{ExPolygon, ExPolygons};
use crate::unscale;

/// Slack added when growing inset regions back, so pieces that survived the
/// inset are not reported as small parts along their edges.
const SMALL_PART_EPSILON_MM: f64 = 0.02;

/// Merge `support_above` into `support_this` and clean up the result.
///
/// With conical support the region above is offset by the conical offset
/// first, except for parts narrower than the smallest conical breadth, which
/// are carried down unchanged. Gaps narrower than the join distance are then
/// closed, and regions larger than the minimum smoothing area are rounded by
/// the smoothing distance.
pub fn join(
    support_above: &[ExPolygon],
    support_this: ExPolygons,
    params: &SupportParams,
) -> ExPolygons {
    let joined = if support_above.is_empty() {
        support_this
    } else if params.conical {
        let half_breadth = unscale(params.conical_smallest_breadth) / 2.0;
        let insetted =
            clipper::offset_expolygons(support_above, -half_breadth, OffsetJoinType::Round);
        let wide_enough = clipper::offset_expolygons(
            &insetted,
            half_breadth + SMALL_PART_EPSILON_MM,
            OffsetJoinType::Round,
        );
        let small_parts = clipper::difference(support_above, &wide_enough);

        let adjusted = clipper::offset_expolygons(
            support_above,
            unscale(params.conical_offset),
            OffsetJoinType::Round,
        );
        let joined = clipper::union(&support_this, &adjusted);
        clipper::union(&joined, &small_parts)
    } else {
        clipper::union(&support_this, support_above)
    };

    let joined = close_gaps(joined, params);
    smooth(joined, params)
}

/// Morphological closing by half the join distance.
fn close_gaps(support: ExPolygons, params: &SupportParams) -> ExPolygons {
    if params.join_distance <= 0 || support.is_empty() {
        return support;
    }
    let half = unscale(params.join_distance) / 2.0;
    let grown = clipper::offset_expolygons(&support, half, OffsetJoinType::Round);
    clipper::offset_expolygons(&grown, -half, OffsetJoinType::Round)
}

fn smooth(support: ExPolygons, params: &SupportParams) -> ExPolygons {
    if params.smoothing_distance <= 0 || support.is_empty() {
        return support;
    }
    let half = unscale(params.smoothing_distance) / 2.0;

    let smoothed: ExPolygons = support
        .into_iter()
        .flat_map(|region| {
            if region.area() > params.min_smoothing_area {
                let region = std::slice::from_ref(&region);
                let grown = clipper::offset_expolygons(region, half, OffsetJoinType::Round);
                clipper::offset_expolygons(&grown, -half, OffsetJoinType::Round)
            } else {
                vec![region]
            }
        })
        .collect();

    clipper::union_ex(&smoothed)
}
