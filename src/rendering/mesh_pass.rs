//! Base pass: draws the scene's renderables into the working target.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};
use wgpu::util::DeviceExt;

use super::targets::{RenderTargets, DEPTH_FORMAT, WORKING_FORMAT};
use super::{validated, RenderSystem};
use crate::camera::Camera;
use crate::error::RenderError;
use crate::mesh::{Vertex, AMBIENT};
use crate::scene::{Material, MeshPart, Renderable, Scene};

/// Uniform block of `field.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// xyz = direction toward the light, w = intensity
    pub light_dir: [f32; 4],
    /// xyz = position, w = intensity
    pub point_light: [f32; 4],
    /// time, amplitude, point light distance, ambient
    pub params: [f32; 4],
    /// speed flag, unlit
    pub flags: [u32; 4],
}

impl MeshUniforms {
    pub fn new(part: &impl Renderable, scene: &Scene, view_proj: Mat4) -> Self {
        let model = scene.root_transform() * part.transform();
        let normal_matrix = Mat4::from_mat3(Mat3::from_mat4(model).inverse().transpose());
        let lights = scene.lights.shade_inputs();

        let (color, time, amplitude, speed_flag, unlit) = match part.material() {
            Material::Field(field) => {
                (field.color, field.time, field.amplitude, field.speed_flag, 0)
            }
            Material::Basic(color) => (color, 0.0, 0.0, 0, 1),
        };

        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            color: color.0.extend(1.0).to_array(),
            light_dir: lights
                .directional_dir
                .extend(lights.directional_intensity)
                .to_array(),
            point_light: lights
                .point_position
                .extend(lights.point_intensity)
                .to_array(),
            params: [time, amplitude, lights.point_distance, AMBIENT],
            flags: [speed_flag, unlit, 0, 0],
        }
    }
}

/// GPU copies of one renderable
struct PartBuffers {
    label: &'static str,
    revision: u64,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub(crate) struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    parts: Vec<PartBuffers>,
}

impl MeshPass {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self, RenderError> {
        let (pipeline, bind_group_layout) = validated(device, "field.wgsl", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Field Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/field.wgsl").into()),
            });

            let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Mesh Bind Group Layout"),
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

            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Mesh Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
                wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Mesh Render Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &ATTRIBUTES,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: WORKING_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    // Forms are seen from inside and outside
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            (pipeline, bind_group_layout)
        })?;

        Ok(Self {
            pipeline,
            bind_group_layout,
            parts: Vec::new(),
        })
    }

    /// Upload geometry for parts that are new or whose revision changed
    fn sync_part(&mut self, device: &wgpu::Device, slot: usize, part: &MeshPart<'_>) {
        let label = part.label;
        let stale = self
            .parts
            .get(slot)
            .map_or(true, |p| p.label != label || p.revision != part.revision());
        if !stale {
            return;
        }

        let geometry = part.geometry();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<MeshUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let buffers = PartBuffers {
            label,
            revision: part.revision(),
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            uniform_buffer,
            bind_group,
        };
        if slot < self.parts.len() {
            self.parts[slot] = buffers;
        } else {
            self.parts.push(buffers);
        }
        log::debug!(
            "Uploaded '{}' geometry ({} indices)",
            label,
            geometry.indices.len()
        );
    }

    /// Record the base pass: clear to the background and draw every renderable
    pub(crate) fn record(
        &mut self,
        system: &RenderSystem,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        scene: &Scene,
        camera: &Camera,
    ) {
        let view_proj = camera.view_proj();
        let mut count = 0;
        for (slot, part) in scene.renderables().enumerate() {
            self.sync_part(&system.device, slot, &part);
            let uniforms = MeshUniforms::new(&part, scene, view_proj);
            system.queue.write_buffer(
                &self.parts[slot].uniform_buffer,
                0,
                bytemuck::bytes_of(&uniforms),
            );
            count = slot + 1;
        }
        self.parts.truncate(count);

        let bg = scene.background.0;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Base Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: targets.working_view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: bg.x as f64,
                        g: bg.y as f64,
                        b: bg.z as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth.1,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        for part in &self.parts {
            pass.set_bind_group(0, &part.bind_group, &[]);
            pass.set_vertex_buffer(0, part.vertex_buffer.slice(..));
            pass.set_index_buffer(part.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..part.index_count, 0, 0..1);
        }
    }

    pub(crate) fn release(&mut self) {
        for part in self.parts.drain(..) {
            part.vertex_buffer.destroy();
            part.index_buffer.destroy();
            part.uniform_buffer.destroy();
        }
    }
}
