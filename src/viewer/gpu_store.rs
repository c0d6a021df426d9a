use bytemuck::{Pod, Zeroable};
use std::path::Path;
use wgpu::util::DeviceExt;

use crate::error::AssetResult;
use crate::mesh::loader::load_model;
use crate::mesh::model::{MeshVertex, ModelData};
use crate::mesh::texture::TextureData;
use crate::scene::geometry::BoundingBox;
use crate::scene::store::AssetStore;

/// Vertex layout consumed by `mesh.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl GpuVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x4,
    ];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    /// Material color is folded into the vertex color.
    fn from_mesh(v: &MeshVertex, material_color: [f32; 4]) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
            uv: v.uv,
            color: [
                v.color[0] * material_color[0],
                v.color[1] * material_color[1],
                v.color[2] * material_color[2],
                v.color[3] * material_color[3],
            ],
        }
    }
}

/// Uploaded RGBA8 image.
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl GpuTexture {
    fn upload(device: &wgpu::Device, queue: &wgpu::Queue, data: &TextureData, label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &data.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(data.bytes_per_row()),
                rows_per_image: Some(data.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

pub(crate) struct GpuMesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
    pub(crate) material: usize,
}

pub(crate) struct GpuMaterial {
    /// Diffuse map that came with the file, if any.
    own_texture: Option<GpuTexture>,
    pub(crate) bind_group: wgpu::BindGroup,
}

/// Uploaded model: one vertex/index buffer pair per mesh plus a bind group
/// per material slot.
pub struct GpuModel {
    pub(crate) meshes: Vec<GpuMesh>,
    pub(crate) materials: Vec<GpuMaterial>,
    bounds: BoundingBox,
}

/// `AssetStore` that keeps models and textures on the GPU.
pub struct GpuAssetStore {
    device: wgpu::Device,
    queue: wgpu::Queue,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: GpuTexture,
}

impl GpuAssetStore {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Diffuse Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = GpuTexture::upload(device, queue, &TextureData::white(), "White Texture");

        Self {
            device: device.clone(),
            queue: queue.clone(),
            material_layout,
            sampler,
            white,
        }
    }

    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    fn material_bind_group(&self, texture: &GpuTexture, label: &str) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Upload CPU model data. Meshes without indices are skipped.
    pub fn upload(&self, data: &ModelData, label: &str) -> GpuModel {
        let materials = data
            .materials
            .iter()
            .map(|material| {
                let own_texture = material.diffuse.as_ref().map(|texture| {
                    GpuTexture::upload(&self.device, &self.queue, texture, &material.name)
                });
                let bind_group = self.material_bind_group(
                    own_texture.as_ref().unwrap_or(&self.white),
                    &material.name,
                );
                GpuMaterial {
                    own_texture,
                    bind_group,
                }
            })
            .collect();

        let meshes = data
            .meshes
            .iter()
            .filter(|mesh| !mesh.indices.is_empty())
            .map(|mesh| {
                let material_color = data
                    .materials
                    .get(mesh.material)
                    .map_or([1.0; 4], |m| m.diffuse_color);
                let vertices: Vec<GpuVertex> = mesh
                    .vertices
                    .iter()
                    .map(|v| GpuVertex::from_mesh(v, material_color))
                    .collect();
                let vertex_buffer =
                    self.device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some(&format!("{label} Vertex Buffer")),
                            contents: bytemuck::cast_slice(&vertices),
                            usage: wgpu::BufferUsages::VERTEX,
                        });
                let index_buffer =
                    self.device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some(&format!("{label} Index Buffer")),
                            contents: bytemuck::cast_slice(&mesh.indices),
                            usage: wgpu::BufferUsages::INDEX,
                        });
                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                    material: mesh.material,
                }
            })
            .collect();

        GpuModel {
            meshes,
            materials,
            bounds: data.first_mesh_bounds(),
        }
    }
}

impl AssetStore for GpuAssetStore {
    type Model = GpuModel;
    type Texture = GpuTexture;

    fn load_model(&mut self, path: &Path) -> AssetResult<GpuModel> {
        let data = load_model(path)?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        Ok(self.upload(&data, &label))
    }

    fn load_texture(&mut self, path: &Path) -> AssetResult<GpuTexture> {
        let data = TextureData::load(path)?;
        Ok(GpuTexture::upload(
            &self.device,
            &self.queue,
            &data,
            &path.to_string_lossy(),
        ))
    }

    fn release_model(&mut self, model: GpuModel) {
        for mesh in &model.meshes {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
        for material in &model.materials {
            if let Some(texture) = &material.own_texture {
                texture.texture.destroy();
            }
        }
        log::debug!("Released model with {} meshes", model.meshes.len());
    }

    fn release_texture(&mut self, texture: GpuTexture) {
        let (width, height) = texture.size();
        texture.texture.destroy();
        log::debug!("Released {}x{} texture", width, height);
    }

    fn bind_diffuse(&mut self, model: &mut GpuModel, texture: Option<&GpuTexture>) {
        let bind_group = self.material_bind_group(texture.unwrap_or(&self.white), "Primary Material");
        if let Some(primary) = model.materials.first_mut() {
            primary.bind_group = bind_group;
        }
    }

    fn mesh_bounds(&self, model: &GpuModel) -> BoundingBox {
        model.bounds
    }
}
