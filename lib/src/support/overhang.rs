//! Overhang detection.
//!
//! The basic overhang of a layer is the part of the mesh outline that lies
//! further than the overhang distance from anything printed on the layer
//! below. The full overhang additionally covers the sliver between the basic
//! overhang and the lower outline, so support reaches the actual edge.

use crate::clipper::{self, OffsetJoinType};
use crate::geometry::{ExPolygon, ExPolygons, Point};
use crate::storage::MeshStorage;
use crate::{unscale, Coord};

/// Small overhang clusters that start on one layer and need towers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverhangPoint {
    /// Layer the clusters first appear on.
    pub layer_idx: usize,
    /// One polygon set per isolated cluster.
    pub clusters: Vec<ExPolygons>,
}

/// Compute the basic and full overhang of a mesh at `layer_idx`.
///
/// `model_outlines` is the union of all meshes per layer; a mesh can rest on
/// any other mesh of the group. Layer 0 stands on the build plate and never
/// overhangs.
pub fn compute_basic_and_full_overhang(
    mesh: &MeshStorage,
    model_outlines: &[ExPolygons],
    layer_idx: usize,
    max_dist_from_lower_layer: Coord,
) -> (ExPolygons, ExPolygons) {
    if layer_idx == 0 {
        return (Vec::new(), Vec::new());
    }

    let supportee = mesh.outlines(layer_idx);
    if supportee.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let supporter = model_outlines
        .get(layer_idx - 1)
        .map_or(&[][..], Vec::as_slice);
    let supported = clipper::offset_expolygons(
        supporter,
        unscale(max_dist_from_lower_layer),
        OffsetJoinType::Round,
    );

    let basic = clipper::difference(supportee, &supported);
    if basic.is_empty() {
        return (basic, Vec::new());
    }

    // Extend to the lower outline, but only inside this layer's own outline
    let extension = clipper::offset_expolygons(
        &basic,
        unscale(max_dist_from_lower_layer),
        OffsetJoinType::Round,
    );
    let extension = clipper::intersection(&extension, &supported);
    let extension = clipper::intersection(&extension, supportee);
    let full = clipper::union(&basic, &extension);

    (basic, full)
}

/// Find small isolated overhangs that would vanish under ordinary support.
///
/// A mesh part whose bounding box is smaller than `min_diameter` in both
/// directions and that overlaps the layer's basic overhang becomes a cluster.
/// When the layer directly below also had clusters, clusters within twice
/// `min_diameter` of them are trimmed so a sloping feature seeds one tower.
///
/// Records come out in ascending layer order, one per layer with clusters.
pub fn detect_overhang_points(
    mesh: &MeshStorage,
    basic_overhangs: &[ExPolygons],
    min_diameter: Coord,
) -> Vec<OverhangPoint> {
    let mut points: Vec<OverhangPoint> = Vec::new();
    // Untrimmed clusters of the last layer that had any
    let mut previous: Option<(usize, ExPolygons)> = None;

    for (layer_idx, overhang) in basic_overhangs.iter().enumerate() {
        if overhang.is_empty() {
            continue;
        }

        let clusters: Vec<ExPolygons> = mesh
            .outlines(layer_idx)
            .iter()
            .filter(|part| part.bounding_box().max_extent() < min_diameter)
            .map(|part| clipper::intersection(std::slice::from_ref(part), overhang))
            .filter(|cluster| !cluster.is_empty())
            .collect();

        if clusters.is_empty() {
            continue;
        }

        let raw: ExPolygons = clusters.iter().flatten().cloned().collect();
        let clusters: Vec<ExPolygons> = match &previous {
            Some((prev_idx, lower)) if prev_idx + 1 == layer_idx => {
                let lower = clipper::offset_expolygons(
                    lower,
                    unscale(2 * min_diameter),
                    OffsetJoinType::Round,
                );
                clusters
                    .into_iter()
                    .map(|cluster| clipper::difference(&cluster, &lower))
                    .filter(|cluster| !cluster.is_empty())
                    .collect()
            }
            _ => clusters,
        };
        previous = Some((layer_idx, raw));

        if !clusters.is_empty() {
            points.push(OverhangPoint {
                layer_idx,
                clusters,
            });
        }
    }

    points
}

/// Area-weighted centre of a cluster.
pub(crate) fn cluster_center(cluster: &[ExPolygon]) -> Option<Point> {
    let total: f64 = cluster.iter().map(ExPolygon::area).sum();
    if total <= 0.0 {
        return cluster.first().map(ExPolygon::centroid);
    }
    let (x, y) = cluster.iter().fold((0.0, 0.0), |(x, y), part| {
        let c = part.centroid();
        let w = part.area() / total;
        (x + c.x as f64 * w, y + c.y as f64 * w)
    });
    Some(Point::new(x.round() as Coord, y.round() as Coord))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupportConfig;
    use crate::{scale, unscale_area};

    fn rect_mm(x0: f64, y0: f64, x1: f64, y1: f64) -> ExPolygon {
        ExPolygon::rectangle(Point::new_scale(x0, y0), Point::new_scale(x1, y1))
    }

    fn area_mm2(polys: &[ExPolygon]) -> f64 {
        unscale_area(clipper::total_area(polys))
    }

    fn mesh(layers: Vec<ExPolygons>) -> MeshStorage {
        MeshStorage::new("test", SupportConfig::enabled(), layers)
    }

    #[test]
    fn test_first_layer_never_overhangs() {
        let m = mesh(vec![vec![rect_mm(0.0, 0.0, 10.0, 10.0)]]);
        let (basic, full) = compute_basic_and_full_overhang(&m, &[vec![]], 0, scale(0.1));
        assert!(basic.is_empty());
        assert!(full.is_empty());
    }

    #[test]
    fn test_straight_wall_has_no_overhang() {
        let layers = vec![vec![rect_mm(0.0, 0.0, 10.0, 10.0)]; 3];
        let m = mesh(layers.clone());
        let (basic, full) = compute_basic_and_full_overhang(&m, &layers, 2, scale(0.1));
        assert!(basic.is_empty());
        assert!(full.is_empty());
    }

    #[test]
    fn test_ledge_overhang() {
        // 10mm column with a 20mm wide shelf on layer 1
        let layers = vec![
            vec![rect_mm(0.0, 0.0, 10.0, 10.0)],
            vec![rect_mm(0.0, 0.0, 20.0, 10.0)],
        ];
        let m = mesh(layers.clone());
        let max_dist = scale(0.5);
        let (basic, full) = compute_basic_and_full_overhang(&m, &layers, 1, max_dist);

        // Basic: x in [10.5, 20]
        assert!((area_mm2(&basic) - 95.0).abs() < 0.5, "basic = {}", area_mm2(&basic));
        // Full reaches back to the column edge at x = 10
        assert!((area_mm2(&full) - 100.0).abs() < 0.5, "full = {}", area_mm2(&full));
        assert!(clipper::total_area(&clipper::difference(&basic, &full)) < 1.0);
    }

    #[test]
    fn test_floating_part_fully_overhangs() {
        let layers = vec![vec![], vec![rect_mm(0.0, 0.0, 4.0, 4.0)]];
        let m = mesh(layers.clone());
        let (basic, full) = compute_basic_and_full_overhang(&m, &layers, 1, scale(0.2));
        assert!((area_mm2(&basic) - 16.0).abs() < 0.01);
        assert!((area_mm2(&full) - 16.0).abs() < 0.01);
    }

    #[test]
    fn test_other_mesh_supports() {
        // This mesh starts on layer 1 on top of another mesh's block
        let own = vec![vec![], vec![rect_mm(0.0, 0.0, 5.0, 5.0)]];
        let model = vec![vec![rect_mm(-1.0, -1.0, 6.0, 6.0)], own[1].clone()];
        let m = mesh(own);
        let (basic, _) = compute_basic_and_full_overhang(&m, &model, 1, scale(0.2));
        assert!(basic.is_empty());
    }

    #[test]
    fn test_detect_small_overhang_point() {
        let layers = vec![
            vec![rect_mm(20.0, 0.0, 40.0, 20.0)],
            vec![rect_mm(20.0, 0.0, 40.0, 20.0), rect_mm(0.0, 0.0, 2.0, 2.0)],
            vec![rect_mm(20.0, 0.0, 40.0, 20.0), rect_mm(0.0, 0.0, 2.0, 2.0)],
        ];
        let m = mesh(layers.clone());
        let basic: Vec<ExPolygons> = (0..layers.len())
            .map(|l| compute_basic_and_full_overhang(&m, &layers, l, scale(0.1)).0)
            .collect();

        let points = detect_overhang_points(&m, &basic, scale(3.0));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].layer_idx, 1);
        assert_eq!(points[0].clusters.len(), 1);
        assert!((area_mm2(&points[0].clusters[0]) - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_large_overhang_is_not_a_point() {
        let layers = vec![vec![], vec![rect_mm(0.0, 0.0, 10.0, 10.0)]];
        let m = mesh(layers.clone());
        let basic: Vec<ExPolygons> = (0..2)
            .map(|l| compute_basic_and_full_overhang(&m, &layers, l, scale(0.1)).0)
            .collect();
        assert!(detect_overhang_points(&m, &basic, scale(3.0)).is_empty());
    }

    #[test]
    fn test_sloping_point_is_recorded_once() {
        // A thin feature creeping sideways: each layer overhangs a little
        let layers: Vec<ExPolygons> = (0..4)
            .map(|l| {
                if l == 0 {
                    vec![]
                } else {
                    let x = (l as f64) * 0.5;
                    vec![rect_mm(x, 0.0, x + 1.5, 1.5)]
                }
            })
            .collect();
        let m = mesh(layers.clone());
        let basic: Vec<ExPolygons> = (0..layers.len())
            .map(|l| compute_basic_and_full_overhang(&m, &layers, l, scale(0.1)).0)
            .collect();
        assert!(basic[2].iter().any(|p| p.area() > 0.0));

        let points = detect_overhang_points(&m, &basic, scale(3.0));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].layer_idx, 1);
    }

    #[test]
    fn test_cluster_center() {
        let cluster = vec![rect_mm(0.0, 0.0, 2.0, 2.0)];
        assert_eq!(cluster_center(&cluster), Some(Point::new_scale(1.0, 1.0)));
        assert_eq!(cluster_center(&[]), None);
    }
}
