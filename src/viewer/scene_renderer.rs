use bytemuck::{Pod, Zeroable};
use nalgebra as na;

use super::gpu::{DEPTH_FORMAT, GpuState};
use super::gpu_store::{GpuAssetStore, GpuModel, GpuVertex};
use super::primitives::{self, ColorVertex};
use crate::config::Variant;
use crate::scene::lights::{LightUniform, Lighting, MAX_LIGHTS};
use crate::scene::palette;
use crate::scene::session::Session;

const GRID_SLICES: i32 = 20;
const GRID_SPACING: f32 = 10.0;
const MARKER_RADIUS: f32 = 0.2;
const MARKER_RINGS: u32 = 8;
const MARKER_SLICES: u32 = 8;
const DISABLED_MARKER_ALPHA: f32 = 0.3;

/// Per-draw uniforms live at 256-byte offsets in one buffer.
const DRAW_STRIDE: u64 = 256;
const SLOT_MODEL: u64 = 0;
const SLOT_CUBE: u64 = 1;
const SLOT_PLANE: u64 = 2;
const DRAW_SLOTS: u64 = 3;

/// Matches `Frame` in `mesh.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub lighting: u32,
    pub _padding: [u32; 3],
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl FrameUniform {
    fn new(
        view_proj: &na::Matrix4<f32>,
        view_pos: &na::Point3<f32>,
        lighting: Option<&Lighting>,
    ) -> Self {
        Self {
            view_proj: (*view_proj).into(),
            view_pos: view_pos.to_homogeneous().into(),
            ambient: lighting.map_or([0.0; 4], |l| l.ambient),
            lighting: lighting.is_some() as u32,
            _padding: [0; 3],
            lights: lighting.map_or([LightUniform::zeroed(); MAX_LIGHTS], Lighting::uniforms),
        }
    }
}

/// Matches `Draw` in `mesh.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub tint: [f32; 4],
}

impl DrawUniform {
    fn new(model: &na::Matrix4<f32>, tint: [f32; 4]) -> Self {
        // Degenerate scale has no inverse; fall back to the plain rotation.
        let normal = model
            .fixed_view::<3, 3>(0, 0)
            .clone_owned()
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or_else(na::Matrix3::identity)
            .to_homogeneous();
        Self {
            model: (*model).into(),
            normal: normal.into(),
            tint,
        }
    }
}

/// Color vertices rewritten every frame into a buffer that only grows.
struct VertexStream {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: u64,
    count: u32,
}

impl VertexStream {
    fn new(device: &wgpu::Device, label: &'static str, vertices: u64) -> Self {
        let capacity = vertices * std::mem::size_of::<ColorVertex>() as u64;
        Self {
            label,
            buffer: Self::create(device, label, capacity),
            capacity,
            count: 0,
        }
    }

    fn create(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, vertices: &[ColorVertex]) {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let needed = bytes.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::create(device, self.label, self.capacity);
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.count = vertices.len() as u32;
    }
}

/// Draws the 3D part of a frame: props, model, light markers, grid and the
/// selection box.
pub struct SceneRenderer {
    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    triangle_pipeline: wgpu::RenderPipeline,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,

    lines: VertexStream,
    triangles: VertexStream,
    grid: Vec<ColorVertex>,

    cube: GpuModel,
    plane: GpuModel,
}

impl SceneRenderer {
    pub fn new(gpu: &GpuState, store: &GpuAssetStore) -> Self {
        let device = &gpu.device;

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });
        let color_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Color Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/color.wgsl").into()),
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let draw_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size: DRAW_STRIDE * DRAW_SLOTS,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let draw_size = wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64);
        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: draw_size,
                },
                count: None,
            }],
        });
        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout: &draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_buffer,
                    offset: 0,
                    size: draw_size,
                }),
            }],
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout, store.material_layout()],
            push_constant_ranges: &[],
        });
        let color_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Color Pipeline Layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = create_pipeline(
            gpu,
            "Mesh Pipeline",
            &mesh_layout,
            &mesh_shader,
            GpuVertex::desc(),
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Back),
            wgpu::BlendState::REPLACE,
        );
        let line_pipeline = create_pipeline(
            gpu,
            "Line Pipeline",
            &color_layout,
            &color_shader,
            ColorVertex::desc(),
            wgpu::PrimitiveTopology::LineList,
            None,
            wgpu::BlendState::ALPHA_BLENDING,
        );
        let triangle_pipeline = create_pipeline(
            gpu,
            "Color Triangle Pipeline",
            &color_layout,
            &color_shader,
            ColorVertex::desc(),
            wgpu::PrimitiveTopology::TriangleList,
            None,
            wgpu::BlendState::ALPHA_BLENDING,
        );

        Self {
            mesh_pipeline,
            line_pipeline,
            triangle_pipeline,
            frame_buffer,
            frame_bind_group,
            draw_buffer,
            draw_bind_group,
            lines: VertexStream::new(device, "Line Vertex Buffer", 1024),
            triangles: VertexStream::new(device, "Triangle Vertex Buffer", 2048),
            grid: primitives::grid(GRID_SLICES, GRID_SPACING),
            cube: store.upload(&primitives::cube(2.0, 2.0, 2.0), "Cube"),
            plane: store.upload(&primitives::plane(50.0, 50.0), "Plane"),
        }
    }

    /// Upload this frame's uniforms and helper geometry.
    pub fn prepare(&mut self, gpu: &GpuState, session: &Session<GpuAssetStore>) {
        let (width, height) = gpu.viewport();
        let camera = session.camera();
        let frame = FrameUniform::new(
            &camera.view_projection_matrix(width, height),
            &camera.position(),
            session.lighting(),
        );
        gpu.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let white = palette::linear(palette::WHITE);
        let mut draws = vec![0u8; (DRAW_STRIDE * DRAW_SLOTS) as usize];
        let mut put = |slot: u64, uniform: DrawUniform| {
            let start = (slot * DRAW_STRIDE) as usize;
            let bytes = bytemuck::bytes_of(&uniform);
            draws[start..start + bytes.len()].copy_from_slice(bytes);
        };
        put(SLOT_MODEL, DrawUniform::new(&session.model_matrix(), white));
        put(SLOT_CUBE, DrawUniform::new(&na::Matrix4::identity(), white));
        put(SLOT_PLANE, DrawUniform::new(&na::Matrix4::identity(), white));
        gpu.queue.write_buffer(&self.draw_buffer, 0, &draws);

        let mut lines = self.grid.clone();
        let mut triangles = Vec::new();
        if session.is_selected() {
            lines.extend(primitives::box_outline(
                &session.bounds(),
                palette::linear(palette::GREEN),
            ));
        }
        if let Some(lighting) = session.lighting() {
            for light in &lighting.lights {
                let color = palette::linear(light.color);
                if light.enabled {
                    triangles.extend(primitives::sphere(
                        light.position,
                        MARKER_RADIUS,
                        MARKER_RINGS,
                        MARKER_SLICES,
                        color,
                    ));
                } else {
                    lines.extend(primitives::sphere_wires(
                        light.position,
                        MARKER_RADIUS,
                        MARKER_RINGS,
                        MARKER_SLICES,
                        palette::with_alpha(color, DISABLED_MARKER_ALPHA),
                    ));
                }
            }
        }
        self.lines.write(&gpu.device, &gpu.queue, &lines);
        self.triangles.write(&gpu.device, &gpu.queue, &triangles);
    }

    /// Record the scene pass, clearing `frame` first.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        gpu: &GpuState,
        frame: &wgpu::TextureView,
        session: &Session<GpuAssetStore>,
    ) {
        let [r, g, b, a] = palette::linear(palette::RAYWHITE);
        let clear = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(gpu.scene_attachment(frame, clear))],
            depth_stencil_attachment: Some(gpu.depth_attachment()),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        render_pass.set_pipeline(&self.mesh_pipeline);

        if session.variant() == Variant::Lit {
            self.draw_model(&mut render_pass, &self.cube, SLOT_CUBE);
            self.draw_model(&mut render_pass, &self.plane, SLOT_PLANE);
        }
        if session.draw_model() {
            if let Some(model) = session.model() {
                self.draw_model(&mut render_pass, model, SLOT_MODEL);
            }
        }

        if self.triangles.count > 0 {
            render_pass.set_pipeline(&self.triangle_pipeline);
            render_pass.set_vertex_buffer(0, self.triangles.buffer.slice(..));
            render_pass.draw(0..self.triangles.count, 0..1);
        }
        if self.lines.count > 0 {
            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_vertex_buffer(0, self.lines.buffer.slice(..));
            render_pass.draw(0..self.lines.count, 0..1);
        }
    }

    fn draw_model(&self, render_pass: &mut wgpu::RenderPass<'_>, model: &GpuModel, slot: u64) {
        render_pass.set_bind_group(1, &self.draw_bind_group, &[(slot * DRAW_STRIDE) as u32]);
        for mesh in &model.meshes {
            let Some(material) = model.materials.get(mesh.material) else {
                continue;
            };
            render_pass.set_bind_group(2, &material.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    gpu: &GpuState,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    vertex_layout: wgpu::VertexBufferLayout<'_>,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: gpu.sample_count,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::lights::LightKind;

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 368);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 144);
        assert!(std::mem::size_of::<DrawUniform>() as u64 <= DRAW_STRIDE);
    }

    #[test]
    fn shader_light_kind_matches_point_lights() {
        let source = include_str!("shaders/mesh.wgsl");
        let expected = format!("const LIGHT_POINT: u32 = {}u;", LightKind::Point as u32);
        assert!(source.contains(&expected));

        let lighting = Lighting::default();
        let frame = FrameUniform::new(&na::Matrix4::identity(), &na::Point3::origin(), Some(&lighting));
        assert!(frame.lights.iter().all(|l| l.kind == LightKind::Point as u32));
    }

    #[test]
    fn unlit_frame_has_lighting_off() {
        let frame = FrameUniform::new(&na::Matrix4::identity(), &na::Point3::origin(), None);
        assert_eq!(frame.lighting, 0);
        assert!(frame.lights.iter().all(|l| l.enabled == 0));

        let lighting = Lighting::default();
        let frame = FrameUniform::new(
            &na::Matrix4::identity(),
            &na::Point3::new(1.0, 2.0, 3.0),
            Some(&lighting),
        );
        assert_eq!(frame.lighting, 1);
        assert_eq!(frame.view_pos, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(frame.ambient, [1.0; 4]);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = na::Matrix4::new_nonuniform_scaling(&na::Vector3::new(2.0, 1.0, 1.0));
        let draw = DrawUniform::new(&model, [1.0; 4]);
        let normal = na::Matrix4::from(draw.normal);
        assert!((normal[(0, 0)] - 0.5).abs() < 1e-6);

        let flat = DrawUniform::new(&na::Matrix4::new_scaling(0.0), [1.0; 4]);
        assert_eq!(na::Matrix4::from(flat.normal), na::Matrix4::identity());
    }
}
