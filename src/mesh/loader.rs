use nalgebra as na;
use std::path::Path;

use crate::error::{AssetError, AssetResult};
use crate::mesh::model::{MaterialData, MeshData, MeshVertex, ModelData};
use crate::mesh::texture::TextureData;
use crate::mesh::vox::load_vox_from_bytes;

/// Load a model from file (supports .obj, .gltf, .glb and .vox)
pub fn load_model(input: &Path) -> AssetResult<ModelData> {
    let extension = input
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .ok_or_else(|| AssetError::UnsupportedFormat(format!("{:?} has no extension", input)))?;

    let model = match extension.as_str() {
        "obj" => load_model_from_obj(input)?,
        "glb" | "gltf" => load_model_from_gltf(input)?,
        "vox" => {
            let bytes = std::fs::read(input).map_err(|source| AssetError::Io {
                path: input.to_path_buf(),
                source,
            })?;
            load_vox_from_bytes(&bytes)?
        }
        "iqm" | "m3d" => return Err(AssetError::NoDecoder(extension)),
        _ => return Err(AssetError::UnsupportedFormat(extension)),
    };

    if model.meshes.is_empty() {
        return Err(AssetError::Empty(input.to_path_buf()));
    }

    log::info!(
        "Loaded model {:?}: {} meshes, {} vertices, {} triangles, {} materials",
        input,
        model.meshes.len(),
        model.vertex_count(),
        model.triangle_count(),
        model.materials.len()
    );
    Ok(model)
}

/// Load model from OBJ file, resolving MTL diffuse maps next to it
pub fn load_model_from_obj(path: &Path) -> AssetResult<ModelData> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let materials = match materials {
        Ok(materials) => materials
            .into_iter()
            .map(|m| {
                let diffuse = m.diffuse_texture.as_deref().and_then(|file| {
                    let texture_path = base_dir.join(file);
                    match TextureData::load(&texture_path) {
                        Ok(texture) => Some(texture),
                        Err(e) => {
                            log::warn!("Material '{}' diffuse map unavailable: {}", m.name, e);
                            None
                        }
                    }
                });
                let [r, g, b] = m.diffuse.unwrap_or([1.0, 1.0, 1.0]);
                MaterialData {
                    name: m.name,
                    diffuse_color: [r, g, b, m.dissolve.unwrap_or(1.0)],
                    diffuse,
                }
            })
            .collect(),
        Err(e) => {
            // A missing or broken MTL is not fatal; geometry still loads.
            log::debug!("No usable MTL for {:?}: {}", path, e);
            Vec::new()
        }
    };

    let meshes = models
        .into_iter()
        .map(|model| {
            let mesh = model.mesh;
            let vertex_count = mesh.positions.len() / 3;
            let vertices = (0..vertex_count)
                .map(|i| {
                    let position = [
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ];
                    let normal = if mesh.normals.len() >= (i + 1) * 3 {
                        [
                            mesh.normals[i * 3],
                            mesh.normals[i * 3 + 1],
                            mesh.normals[i * 3 + 2],
                        ]
                    } else {
                        [0.0; 3]
                    };
                    // OBJ texture space has V pointing up.
                    let uv = if mesh.texcoords.len() >= (i + 1) * 2 {
                        [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]
                    } else {
                        [0.0, 0.0]
                    };
                    let mut vertex = MeshVertex::new(position, normal, uv);
                    if mesh.vertex_color.len() >= (i + 1) * 3 {
                        vertex = vertex.with_color([
                            mesh.vertex_color[i * 3],
                            mesh.vertex_color[i * 3 + 1],
                            mesh.vertex_color[i * 3 + 2],
                            1.0,
                        ]);
                    }
                    vertex
                })
                .collect();
            let mut data = MeshData::new(vertices, mesh.indices, mesh.material_id.unwrap_or(0));
            if mesh.normals.is_empty() {
                compute_normals(&mut data);
            }
            data
        })
        .filter(|mesh: &MeshData| !mesh.indices.is_empty())
        .collect();

    Ok(ModelData::new(meshes, materials))
}

/// Load model from GLB/glTF file, baking node transforms into the vertices.
/// Material slot 0 is a plain default; glTF materials follow from slot 1.
pub fn load_model_from_gltf(path: &Path) -> AssetResult<ModelData> {
    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut materials = vec![MaterialData::default()];
    for material in document.materials() {
        let pbr = material.pbr_metallic_roughness();
        let diffuse = pbr.base_color_texture().and_then(|info| {
            let index = info.texture().source().index();
            images.get(index).and_then(gltf_image_to_texture)
        });
        materials.push(MaterialData {
            name: material.name().unwrap_or("<unnamed>").to_string(),
            diffuse_color: pbr.base_color_factor(),
            diffuse,
        });
    }

    let mut meshes = Vec::new();
    let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next())
    {
        Some(scene) => scene.nodes().collect(),
        None => Vec::new(),
    };

    if roots.is_empty() {
        for mesh in document.meshes() {
            append_gltf_mesh(&mesh, &buffers, &na::Matrix4::identity(), &mut meshes);
        }
    } else {
        let mut stack: Vec<(gltf::Node, na::Matrix4<f32>)> = roots
            .into_iter()
            .map(|node| (node, na::Matrix4::identity()))
            .collect();
        while let Some((node, parent)) = stack.pop() {
            let local: na::Matrix4<f32> = node.transform().matrix().into();
            let world = parent * local;
            if let Some(mesh) = node.mesh() {
                append_gltf_mesh(&mesh, &buffers, &world, &mut meshes);
            }
            stack.extend(node.children().map(|child| (child, world)));
        }
    }

    Ok(ModelData::new(meshes, materials))
}

fn append_gltf_mesh(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    world: &na::Matrix4<f32>,
    out: &mut Vec<MeshData>,
) {
    let normal_matrix = world
        .fixed_view::<3, 3>(0, 0)
        .clone_owned()
        .try_inverse()
        .map(|m| m.transpose())
        .unwrap_or_else(na::Matrix3::identity);

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "Skipping non-triangle primitive in mesh '{}'",
                mesh.name().unwrap_or("<unnamed>")
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
        let uvs: Option<Vec<[f32; 2]>> =
            reader.read_tex_coords(0).map(|tc| tc.into_f32().collect());
        let colors: Option<Vec<[f32; 4]>> =
            reader.read_colors(0).map(|c| c.into_rgba_f32().collect());

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let position = world.transform_point(&na::Point3::from(*p));
                let normal = normals
                    .as_ref()
                    .and_then(|n| n.get(i))
                    .map(|n| {
                        let n = normal_matrix * na::Vector3::from(*n);
                        n.try_normalize(f32::EPSILON).unwrap_or(n).into()
                    })
                    .unwrap_or([0.0; 3]);
                let uv = uvs
                    .as_ref()
                    .and_then(|u| u.get(i))
                    .copied()
                    .unwrap_or([0.0, 0.0]);
                let color = colors
                    .as_ref()
                    .and_then(|c| c.get(i))
                    .copied()
                    .unwrap_or([1.0; 4]);
                MeshVertex::new(position.into(), normal, uv).with_color(color)
            })
            .collect();

        let indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let material = primitive.material().index().map_or(0, |i| i + 1);
        let mut data = MeshData::new(vertices, indices, material);
        if normals.is_none() {
            compute_normals(&mut data);
        }
        out.push(data);
    }
}

fn gltf_image_to_texture(image: &gltf::image::Data) -> Option<TextureData> {
    use gltf::image::Format;

    let rgba: Vec<u8> = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => image
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => {
            log::warn!("Unsupported glTF image format {:?}; using material color only", other);
            return None;
        }
    };
    TextureData::from_rgba8(image.width, image.height, rgba)
}

/// Fill in smooth vertex normals from face normals.
fn compute_normals(mesh: &mut MeshData) {
    let mut accum = vec![na::Vector3::<f32>::zeros(); mesh.vertices.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= accum.len() || b >= accum.len() || c >= accum.len() {
            continue;
        }
        let pa = na::Vector3::from(mesh.vertices[a].position);
        let pb = na::Vector3::from(mesh.vertices[b].position);
        let pc = na::Vector3::from(mesh.vertices[c].position);
        let face = (pb - pa).cross(&(pc - pa));
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }
    for (vertex, n) in mesh.vertices.iter_mut().zip(accum) {
        vertex.normal = n
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(na::Vector3::y)
            .into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CUBE_CORNER_OBJ: &str = "\
mtllib corner.mtl
o corner
v 0.0 0.0 0.0
v 2.0 0.0 0.0
v 2.0 3.0 0.0
v 0.0 3.0 -1.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
usemtl wood
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn obj_quad_is_triangulated_with_flipped_uvs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corner.obj");
        fs::write(&path, CUBE_CORNER_OBJ).unwrap();

        let model = load_model(&path).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].triangle_count(), 2);
        // No MTL on disk: the default slot stands in.
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.meshes[0].vertices[0].uv, [0.0, 1.0]);

        let bounds = model.first_mesh_bounds();
        assert_eq!(bounds.min, na::Point3::new(0.0, 0.0, -1.0));
        assert_eq!(bounds.max, na::Point3::new(2.0, 3.0, 0.0));

        // Normals were generated, facing roughly +Z.
        assert!(model.meshes[0].vertices[0].normal[2] > 0.5);
    }

    #[test]
    fn obj_material_diffuse_map_is_resolved_next_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("corner.obj"), CUBE_CORNER_OBJ).unwrap();
        fs::write(
            dir.path().join("corner.mtl"),
            "newmtl wood\nKd 0.5 0.25 1.0\nmap_Kd wood.png\n",
        )
        .unwrap();
        image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]))
            .save(dir.path().join("wood.png"))
            .unwrap();

        let model = load_model(&dir.path().join("corner.obj")).unwrap();
        assert_eq!(model.materials.len(), 1);
        let material = &model.materials[0];
        assert_eq!(material.name, "wood");
        assert_eq!(material.diffuse_color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(material.diffuse.as_ref().map(|t| t.width), Some(2));
    }

    #[test]
    fn gltf_node_transform_is_baked_in() {
        let dir = tempfile::tempdir().unwrap();
        let mut bin = Vec::new();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        fs::write(dir.path().join("tri.bin"), &bin).unwrap();
        let json = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"mesh": 0, "translation": [0.0, 5.0, 0.0]}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
            "buffers": [{"uri": "tri.bin", "byteLength": 36}],
            "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 36}],
            "accessors": [{
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            }]
        }"#;
        let path = dir.path().join("tri.gltf");
        fs::write(&path, json).unwrap();

        let model = load_model(&path).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(model.meshes[0].material, 0);
        let bounds = model.first_mesh_bounds();
        assert!((bounds.min.y - 5.0).abs() < 1e-6);
        assert!((bounds.max.y - 6.0).abs() < 1e-6);
    }

    #[test]
    fn vox_files_go_through_the_voxel_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.VOX");
        fs::write(
            &path,
            crate::mesh::vox::tests::vox_file([1, 1, 1], &[[0, 0, 0, 1]]),
        )
        .unwrap();
        let model = load_model(&path).unwrap();
        assert_eq!(model.meshes[0].vertices.len(), 24);
    }

    #[test]
    fn recognised_formats_without_decoder_fail_cleanly() {
        let err = load_model(Path::new("model.iqm")).unwrap_err();
        assert!(matches!(err, AssetError::NoDecoder(ext) if ext == "iqm"));
        let err = load_model(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_obj_reports_parse_error() {
        let err = load_model(Path::new("does/not/exist.obj")).unwrap_err();
        assert!(matches!(err, AssetError::Obj { .. }));
    }
}
