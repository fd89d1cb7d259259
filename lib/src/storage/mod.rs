//! Slice data storage consumed and produced by support generation.
//!
//! [`SliceDataStorage`] holds the sliced outlines of every mesh in a mesh
//! group (read-only input) and the shared per-layer [`SupportStorage`] the
//! support pipeline writes into.

use crate::clipper;
use crate::config::SupportConfig;
use crate::geometry::{ExPolygon, ExPolygons};
use crate::{unscale_area, CoordF, Error, Result};
use rayon::prelude::*;
use tracing::warn;

/// Sliced outlines and support settings of one mesh.
#[derive(Debug, Clone)]
pub struct MeshStorage {
    /// Mesh name, used in log output.
    pub name: String,
    /// Support settings of this mesh.
    pub config: SupportConfig,
    /// Solid model outline per layer, index 0 on the build plate.
    layers: Vec<ExPolygons>,
}

impl MeshStorage {
    /// Create mesh storage from per-layer outlines.
    ///
    /// Degenerate rings (fewer than three points or no area) coming from the
    /// slicing stage are removed; a layer with only degenerate rings becomes empty.
    pub fn new(name: impl Into<String>, config: SupportConfig, layers: Vec<ExPolygons>) -> Self {
        let name = name.into();
        let layers = layers
            .into_iter()
            .enumerate()
            .map(|(layer_idx, outline)| {
                let cleaned = clipper::clean(&outline);
                if cleaned.len() != outline.len()
                    || cleaned
                        .iter()
                        .zip(&outline)
                        .any(|(c, o)| c.holes.len() != o.holes.len())
                {
                    warn!(
                        mesh = %name,
                        layer_idx,
                        dropped = outline.len() - cleaned.len(),
                        "Removed degenerate polygons from layer outline"
                    );
                }
                cleaned
            })
            .collect();

        Self {
            name,
            config,
            layers,
        }
    }

    /// Number of layers this mesh was sliced into.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Outline of this mesh at a layer; empty above the mesh.
    #[inline]
    pub fn outlines(&self, layer_idx: usize) -> &[ExPolygon] {
        self.layers.get(layer_idx).map_or(&[][..], Vec::as_slice)
    }

    /// Check whether every layer of this mesh is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty)
    }
}

/// Support output of one layer.
///
/// `support_areas` is the sparse interior and `interface_areas` the dense
/// skin; the two are disjoint and together make up the layer's support.
#[derive(Debug, Clone, Default)]
pub struct SupportLayer {
    /// Support to be filled with sparse infill.
    pub support_areas: ExPolygons,
    /// Dense roof/floor skin touching the model.
    pub interface_areas: ExPolygons,
}

impl SupportLayer {
    /// Check if this layer has any support
    pub fn is_empty(&self) -> bool {
        self.support_areas.is_empty() && self.interface_areas.is_empty()
    }

    /// Sparse and interface areas together.
    pub fn full_areas(&self) -> ExPolygons {
        clipper::union(&self.support_areas, &self.interface_areas)
    }

    /// Total support area (mm²)
    pub fn total_area(&self) -> CoordF {
        unscale_area(clipper::total_area(&self.support_areas))
            + unscale_area(clipper::total_area(&self.interface_areas))
    }
}

/// Support output for all layers of a mesh group.
#[derive(Debug, Clone, Default)]
pub struct SupportStorage {
    pub layers: Vec<SupportLayer>,
    /// Set once support generation has run.
    pub generated: bool,
}

impl SupportStorage {
    fn with_layer_count(layer_count: usize) -> Self {
        Self {
            layers: vec![SupportLayer::default(); layer_count],
            generated: false,
        }
    }
}

/// Everything support generation reads and writes for one mesh group.
#[derive(Debug, Clone)]
pub struct SliceDataStorage {
    /// Layer height (mm), uniform across the group.
    pub layer_height: CoordF,
    pub meshes: Vec<MeshStorage>,
    pub support: SupportStorage,
    layer_count: usize,
}

impl SliceDataStorage {
    /// Create empty storage for `layer_count` layers of `layer_height` mm.
    pub fn new(layer_height: CoordF, layer_count: usize) -> Self {
        Self {
            layer_height,
            meshes: Vec::new(),
            support: SupportStorage::with_layer_count(layer_count),
            layer_count,
        }
    }

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Add a mesh to the group.
    pub fn add_mesh(&mut self, mesh: MeshStorage) {
        self.meshes.push(mesh);
    }

    /// Check that every mesh was sliced into the group's layer count.
    pub fn validate(&self) -> Result<()> {
        for mesh in &self.meshes {
            if mesh.layer_count() != self.layer_count {
                return Err(Error::Geometry(format!(
                    "mesh '{}' has {} layers, storage expects {}",
                    mesh.name,
                    mesh.layer_count(),
                    self.layer_count
                )));
            }
        }
        Ok(())
    }

    /// Union of all meshes' outlines at one layer.
    pub fn layer_outlines(&self, layer_idx: usize) -> ExPolygons {
        let outlines: ExPolygons = self
            .meshes
            .iter()
            .flat_map(|mesh| mesh.outlines(layer_idx).iter().cloned())
            .collect();
        if self.meshes.len() > 1 {
            clipper::union_ex(&outlines)
        } else {
            outlines
        }
    }

    /// Union of all meshes' outlines for every layer, computed in parallel.
    pub fn all_layer_outlines(&self) -> Vec<ExPolygons> {
        (0..self.layer_count)
            .into_par_iter()
            .map(|layer_idx| self.layer_outlines(layer_idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Polygon};
    use crate::scale;

    fn square_mm(x: f64, y: f64, size: f64) -> ExPolygon {
        ExPolygon::rectangle(Point::new_scale(x, y), Point::new_scale(x + size, y + size))
    }

    #[test]
    fn test_mesh_storage_drops_degenerate_rings() {
        let sliver = ExPolygon::new(Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(scale(1.0), 0),
        ]));
        let mesh = MeshStorage::new(
            "part",
            SupportConfig::default(),
            vec![vec![square_mm(0.0, 0.0, 5.0), sliver.clone()], vec![sliver]],
        );

        assert_eq!(mesh.layer_count(), 2);
        assert_eq!(mesh.outlines(0).len(), 1);
        assert!(mesh.outlines(1).is_empty());
        assert!(mesh.outlines(7).is_empty());
    }

    #[test]
    fn test_layer_outlines_union_meshes() {
        let mut storage = SliceDataStorage::new(0.2, 1);
        storage.add_mesh(MeshStorage::new(
            "a",
            SupportConfig::default(),
            vec![vec![square_mm(0.0, 0.0, 10.0)]],
        ));
        storage.add_mesh(MeshStorage::new(
            "b",
            SupportConfig::default(),
            vec![vec![square_mm(5.0, 0.0, 10.0)]],
        ));

        let outlines = storage.layer_outlines(0);
        assert_eq!(outlines.len(), 1);
        assert!((unscale_area(clipper::total_area(&outlines)) - 150.0).abs() < 0.1);
        assert_eq!(storage.all_layer_outlines().len(), 1);
    }

    #[test]
    fn test_validate_layer_count() {
        let mut storage = SliceDataStorage::new(0.2, 3);
        storage.add_mesh(MeshStorage::new("a", SupportConfig::default(), vec![vec![]; 2]));
        assert!(matches!(storage.validate(), Err(Error::Geometry(_))));
    }

    #[test]
    fn test_support_layer_area() {
        let layer = SupportLayer {
            support_areas: vec![square_mm(0.0, 0.0, 2.0)],
            interface_areas: vec![square_mm(5.0, 0.0, 1.0)],
        };
        assert!(!layer.is_empty());
        assert!((layer.total_area() - 5.0).abs() < 1e-6);
        assert_eq!(layer.full_areas().len(), 2);
        assert!(SupportLayer::default().is_empty());
    }
}
