//! CPU-side model representation shared by every loader.

use crate::mesh::texture::TextureData;
use crate::scene::geometry::BoundingBox;

/// Vertex with position/normal/uv/color. Values are in object space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            color: [1.0; 4],
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

impl Default for MeshVertex {
    fn default() -> Self {
        Self::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2])
    }
}

/// Indexed triangle mesh bound to one material slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub material: usize,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>, material: usize) -> Self {
        Self {
            vertices,
            indices,
            material,
        }
    }

    /// Axis-aligned extent of the untransformed vertex positions.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| v.position))
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Material slot: diffuse color and an optional diffuse map.
#[derive(Clone, Debug)]
pub struct MaterialData {
    pub name: String,
    pub diffuse_color: [f32; 4],
    pub diffuse: Option<TextureData>,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            diffuse_color: [1.0; 4],
            diffuse: None,
        }
    }
}

/// A loaded model: meshes plus the material slots they reference.
/// Slot 0 always exists and is the one hot-swapped textures bind into.
#[derive(Clone, Debug)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

impl ModelData {
    pub fn new(meshes: Vec<MeshData>, mut materials: Vec<MaterialData>) -> Self {
        if materials.is_empty() {
            materials.push(MaterialData::default());
        }
        let last = materials.len() - 1;
        let meshes = meshes
            .into_iter()
            .map(|mut mesh| {
                mesh.material = mesh.material.min(last);
                mesh
            })
            .collect();
        Self { meshes, materials }
    }

    /// Bounds of the first mesh, or the zero box when there is none.
    pub fn first_mesh_bounds(&self) -> BoundingBox {
        self.meshes
            .first()
            .map(MeshData::bounding_box)
            .unwrap_or_default()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra as na;

    fn tri(offset: f32, material: usize) -> MeshData {
        MeshData::new(
            vec![
                MeshVertex::new([offset, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                MeshVertex::new([offset + 1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
                MeshVertex::new([offset, 2.0, -1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            vec![0, 1, 2],
            material,
        )
    }

    #[test]
    fn model_always_has_primary_material() {
        let model = ModelData::new(vec![tri(0.0, 3)], Vec::new());
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.meshes[0].material, 0);
    }

    #[test]
    fn first_mesh_bounds_ignore_later_meshes() {
        let model = ModelData::new(vec![tri(0.0, 0), tri(10.0, 0)], Vec::new());
        let bounds = model.first_mesh_bounds();
        assert_eq!(bounds.min, na::Point3::new(0.0, 0.0, -1.0));
        assert_eq!(bounds.max, na::Point3::new(1.0, 2.0, 0.0));
        assert_eq!(model.vertex_count(), 6);
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn empty_model_has_zero_bounds() {
        let model = ModelData::new(Vec::new(), Vec::new());
        assert_eq!(model.first_mesh_bounds(), BoundingBox::default());
    }
}
