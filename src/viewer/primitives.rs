//! CPU-side geometry for the helper shapes drawn around the model: the
//! reference grid, selection box, light markers and the lit demo props.

use bytemuck::{Pod, Zeroable};
use nalgebra as na;
use std::f32::consts::{PI, TAU};

use crate::mesh::model::{MeshData, MeshVertex, ModelData};
use crate::scene::geometry::BoundingBox;
use crate::scene::palette;

/// Position + color, for unshaded lines and triangles.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl ColorVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    pub fn new(position: na::Point3<f32>, color: [f32; 4]) -> Self {
        Self {
            position: position.into(),
            color,
        }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Line list for a grid of `slices` cells per side in the XZ plane, centred
/// on the origin. The two centre lines are darker.
pub fn grid(slices: i32, spacing: f32) -> Vec<ColorVertex> {
    let half = slices / 2;
    let extent = half as f32 * spacing;
    let center = palette::linear_f32(palette::GRID_CENTER);
    let line = palette::linear_f32(palette::GRID_LINE);

    let mut out = Vec::with_capacity(((2 * half + 1) * 4) as usize);
    for i in -half..=half {
        let color = if i == 0 { center } else { line };
        let offset = i as f32 * spacing;
        out.push(ColorVertex::new(na::Point3::new(offset, 0.0, -extent), color));
        out.push(ColorVertex::new(na::Point3::new(offset, 0.0, extent), color));
        out.push(ColorVertex::new(na::Point3::new(-extent, 0.0, offset), color));
        out.push(ColorVertex::new(na::Point3::new(extent, 0.0, offset), color));
    }
    out
}

/// Line list with the twelve edges of `bounds`.
pub fn box_outline(bounds: &BoundingBox, color: [f32; 4]) -> Vec<ColorVertex> {
    const EDGES: [(usize, usize); 12] = [
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 0),
        (4, 5),
        (5, 6),
        (6, 7),
        (7, 4),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];
    let corners = bounds.corners();
    EDGES
        .iter()
        .flat_map(|&(a, b)| {
            [
                ColorVertex::new(corners[a], color),
                ColorVertex::new(corners[b], color),
            ]
        })
        .collect()
}

/// Latitude/longitude grid of sphere points; `rings` latitudes sit between
/// the poles.
fn sphere_points(
    center: na::Point3<f32>,
    radius: f32,
    rings: u32,
    slices: u32,
) -> Vec<Vec<na::Point3<f32>>> {
    let bands = rings + 1;
    (0..=bands)
        .map(|lat| {
            let theta = PI * lat as f32 / bands as f32;
            (0..=slices)
                .map(|lon| {
                    let phi = TAU * lon as f32 / slices as f32;
                    center
                        + na::Vector3::new(
                            theta.sin() * phi.cos(),
                            theta.cos(),
                            theta.sin() * phi.sin(),
                        ) * radius
                })
                .collect()
        })
        .collect()
}

/// Triangle list for a solid sphere.
pub fn sphere(
    center: na::Point3<f32>,
    radius: f32,
    rings: u32,
    slices: u32,
    color: [f32; 4],
) -> Vec<ColorVertex> {
    let points = sphere_points(center, radius, rings, slices);
    let mut out = Vec::new();
    for band in points.windows(2) {
        let (top, bottom) = (&band[0], &band[1]);
        for lon in 0..slices as usize {
            let quad = [top[lon], bottom[lon], bottom[lon + 1], top[lon + 1]];
            for i in [0, 1, 2, 0, 2, 3] {
                out.push(ColorVertex::new(quad[i], color));
            }
        }
    }
    out
}

/// Line list for a wireframe sphere: one latitude and one longitude segment
/// per grid cell.
pub fn sphere_wires(
    center: na::Point3<f32>,
    radius: f32,
    rings: u32,
    slices: u32,
    color: [f32; 4],
) -> Vec<ColorVertex> {
    let points = sphere_points(center, radius, rings, slices);
    let mut out = Vec::new();
    for band in points.windows(2) {
        let (top, bottom) = (&band[0], &band[1]);
        for lon in 0..slices as usize {
            out.push(ColorVertex::new(top[lon], color));
            out.push(ColorVertex::new(top[lon + 1], color));
            out.push(ColorVertex::new(top[lon], color));
            out.push(ColorVertex::new(bottom[lon], color));
        }
    }
    out
}

/// Axis-aligned cube centred on the origin, one quad per face.
pub fn cube(width: f32, height: f32, length: f32) -> ModelData {
    let (x, y, z) = (width / 2.0, height / 2.0, length / 2.0);
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0], [[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]]),
        ([0.0, 0.0, -1.0], [[x, -y, -z], [-x, -y, -z], [-x, y, -z], [x, y, -z]]),
        ([0.0, 1.0, 0.0], [[-x, y, z], [x, y, z], [x, y, -z], [-x, y, -z]]),
        ([0.0, -1.0, 0.0], [[-x, -y, -z], [x, -y, -z], [x, -y, z], [-x, -y, z]]),
        ([1.0, 0.0, 0.0], [[x, -y, z], [x, -y, -z], [x, y, -z], [x, y, z]]),
        ([-1.0, 0.0, 0.0], [[-x, -y, -z], [-x, -y, z], [-x, y, z], [-x, y, -z]]),
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for (corner, uv) in corners.into_iter().zip(uvs) {
            vertices.push(MeshVertex::new(corner, normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    ModelData::new(vec![MeshData::new(vertices, indices, 0)], Vec::new())
}

/// Flat quad in the XZ plane facing +Y.
pub fn plane(width: f32, length: f32) -> ModelData {
    let (x, z) = (width / 2.0, length / 2.0);
    let up = [0.0, 1.0, 0.0];
    let vertices = vec![
        MeshVertex::new([-x, 0.0, z], up, [0.0, 1.0]),
        MeshVertex::new([x, 0.0, z], up, [1.0, 1.0]),
        MeshVertex::new([x, 0.0, -z], up, [1.0, 0.0]),
        MeshVertex::new([-x, 0.0, -z], up, [0.0, 0.0]),
    ];
    ModelData::new(
        vec![MeshData::new(vertices, vec![0, 1, 2, 0, 2, 3], 0)],
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_two_lines_per_slice_and_dark_centre() {
        let lines = grid(20, 10.0);
        assert_eq!(lines.len(), 21 * 2 * 2);
        let center = palette::linear_f32(palette::GRID_CENTER);
        let centre_lines: Vec<_> = lines.chunks(2).filter(|l| l[0].color == center).collect();
        assert_eq!(centre_lines.len(), 2);
        assert!(centre_lines.iter().all(|l| l[0].position[0] == 0.0 || l[0].position[2] == 0.0));
        let max = lines
            .iter()
            .map(|v| v.position[0].abs())
            .fold(0.0f32, f32::max);
        assert_eq!(max, 100.0);
    }

    #[test]
    fn box_outline_has_twelve_edges() {
        let bounds = BoundingBox::new(na::Point3::new(-1.0, 0.0, -1.0), na::Point3::new(1.0, 2.0, 1.0));
        let edges = box_outline(&bounds, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(edges.len(), 24);
        for edge in edges.chunks(2) {
            let a = na::Vector3::from(edge[0].position);
            let b = na::Vector3::from(edge[1].position);
            // Every edge runs along exactly one axis.
            let changed = (0..3).filter(|&i| a[i] != b[i]).count();
            assert_eq!(changed, 1);
        }
    }

    #[test]
    fn sphere_vertex_counts() {
        let c = na::Point3::new(2.0, 1.0, 2.0);
        let solid = sphere(c, 0.2, 8, 8, [1.0; 4]);
        assert_eq!(solid.len(), 9 * 8 * 6);
        let wires = sphere_wires(c, 0.2, 8, 8, [1.0; 4]);
        assert_eq!(wires.len(), 9 * 8 * 4);
        for v in &solid {
            let r = (na::Point3::from(v.position) - c).norm();
            assert!((r - 0.2).abs() < 1e-5);
        }
    }

    #[test]
    fn cube_and_plane_extents() {
        let cube = cube(2.0, 2.0, 2.0);
        assert_eq!(cube.meshes[0].triangle_count(), 12);
        let b = cube.first_mesh_bounds();
        assert_eq!(b.min, na::Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(b.max, na::Point3::new(1.0, 1.0, 1.0));

        let plane = plane(50.0, 50.0);
        let b = plane.first_mesh_bounds();
        assert_eq!(b.size(), na::Vector3::new(50.0, 0.0, 50.0));
    }

    #[test]
    fn cube_faces_wind_counter_clockwise_outward() {
        let cube = cube(2.0, 2.0, 2.0);
        let mesh = &cube.meshes[0];
        for tri in mesh.indices.chunks(3) {
            let p = |i: u32| na::Vector3::from(mesh.vertices[i as usize].position);
            let n = (p(tri[1]) - p(tri[0])).cross(&(p(tri[2]) - p(tri[0])));
            let expected = na::Vector3::from(mesh.vertices[tri[0] as usize].normal);
            assert!(n.dot(&expected) > 0.0);
        }
    }
}
