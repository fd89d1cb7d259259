//! Wall struts for thin support regions.

use crate::clipper;
use crate::geometry::{ExPolygon, ExPolygons, Point};
use crate::{Coord, CoordF};

/// Brace thin, long support walls with round struts.
///
/// For every region, the longest contour edge gives the wall direction and
/// `area / edge length` estimates its width. A region narrower than
/// `min_diameter` along an edge at least `min_diameter` long gets struts of
/// `tower_diameter` centred on that edge, one per `spacing` of edge length
/// but no closer together than `tower_diameter`.
/// Struts are only ever unioned in, so connectivity is never reduced.
pub fn handle_wall_struts(
    support_this: ExPolygons,
    min_diameter: Coord,
    tower_diameter: Coord,
    spacing: Coord,
) -> ExPolygons {
    let struts: ExPolygons = support_this
        .iter()
        .flat_map(|region| wall_struts(region, min_diameter, tower_diameter, spacing))
        .collect();

    if struts.is_empty() {
        support_this
    } else {
        clipper::union(&support_this, &struts)
    }
}

fn wall_struts(
    region: &ExPolygon,
    min_diameter: Coord,
    tower_diameter: Coord,
    spacing: Coord,
) -> Vec<ExPolygon> {
    let Some((a, b)) = region.contour.longest_edge() else {
        return Vec::new();
    };
    let length = a.distance(&b);
    if length < min_diameter as CoordF {
        return Vec::new();
    }

    let width = region.area() / length;
    if width > min_diameter as CoordF {
        return Vec::new();
    }

    // Struts are never packed closer than their own diameter
    let count = if spacing > 0 {
        let pitch = spacing.max(tower_diameter);
        ((length / pitch as CoordF).floor() as usize).max(1)
    } else {
        1
    };
    let radius = tower_diameter / 2;
    let along: Point = b - a;

    (0..count)
        .map(|i| {
            let t = (i as CoordF + 0.5) / count as CoordF;
            ExPolygon::circle(a + along * t, radius)
        })
        .filter(ExPolygon::is_valid)
        .collect()
}
