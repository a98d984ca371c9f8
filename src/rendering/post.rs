//! Full-screen pass pipelines: noise, vignette, bloom and the final blit.

use bytemuck::{Pod, Zeroable};

use super::targets::{RenderTargets, WORKING_FORMAT};
use super::{validated, RenderSystem};
use crate::effects::{bloom_radius, PassKind};
use crate::error::RenderError;
use crate::params::PassParams;

/// Uniform block of `post.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct PostUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub amount: f32,
    pub speed: f32,
    pub strength: f32,
    pub zoom_strength: f32,
    /// bit 0: zoom blur enabled
    pub flags: u32,
    pub direction: [f32; 2],
    pub radius: f32,
    pub seed: u32,
}

/// Textures a single full-screen draw reads and writes
struct PassIo<'a> {
    src: &'a wgpu::TextureView,
    glow: &'a wgpu::TextureView,
    dst: &'a wgpu::TextureView,
}

/// One uniform buffer per draw so values written before submit stay distinct
struct UniformSlots {
    noise: wgpu::Buffer,
    vignette: wgpu::Buffer,
    blur_h: wgpu::Buffer,
    blur_v: wgpu::Buffer,
    bloom: wgpu::Buffer,
    blit: wgpu::Buffer,
}

impl UniformSlots {
    fn new(device: &wgpu::Device) -> Self {
        let buffer = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<PostUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        Self {
            noise: buffer("noise_uniforms"),
            vignette: buffer("vignette_uniforms"),
            blur_h: buffer("blur_h_uniforms"),
            blur_v: buffer("blur_v_uniforms"),
            bloom: buffer("bloom_uniforms"),
            blit: buffer("blit_uniforms"),
        }
    }

    fn all(&self) -> [&wgpu::Buffer; 6] {
        [
            &self.noise,
            &self.vignette,
            &self.blur_h,
            &self.blur_v,
            &self.bloom,
            &self.blit,
        ]
    }
}

pub(crate) struct PostPass {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    noise: wgpu::RenderPipeline,
    vignette: wgpu::RenderPipeline,
    blur: wgpu::RenderPipeline,
    bloom: wgpu::RenderPipeline,
    blit: wgpu::RenderPipeline,
    uniforms: UniformSlots,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn make_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    })
}

impl PostPass {
    /// Compile every pass program; any validation failure aborts startup
    pub(crate) fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self, RenderError> {
        validated(device, "post.wgsl", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Post Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/post.wgsl").into()),
            });

            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Post Bind Group Layout"),
                entries: &[
                    texture_entry(0),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    texture_entry(3),
                ],
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Post Pipeline Layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Post Sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            });

            let working = |entry: &str| {
                make_pipeline(device, &pipeline_layout, &shader, entry, WORKING_FORMAT)
            };
            Self {
                noise: working("fs_noise"),
                vignette: working("fs_vignette"),
                blur: working("fs_blur"),
                bloom: working("fs_bloom"),
                blit: make_pipeline(device, &pipeline_layout, &shader, "fs_blit", surface_format),
                layout,
                sampler,
                uniforms: UniformSlots::new(device),
            }
        })
    }

    fn draw(
        &self,
        system: &RenderSystem,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        uniforms: &wgpu::Buffer,
        io: PassIo<'_>,
    ) {
        let bind_group = system.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(io.src),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(io.glow),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: io.dst,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn write(&self, system: &RenderSystem, buffer: &wgpu::Buffer, uniforms: PostUniforms) {
        system
            .queue
            .write_buffer(buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Run one pass from the working target into the other ping-pong target
    pub(crate) fn apply(
        &self,
        system: &RenderSystem,
        encoder: &mut wgpu::CommandEncoder,
        targets: &mut RenderTargets,
        pass: PassKind,
        params: &PassParams,
        frame: u64,
    ) {
        let (width, height) = system.size();
        let base = PostUniforms {
            resolution: [width as f32, height as f32],
            time: frame as f32,
            ..Default::default()
        };

        match pass {
            PassKind::Noise => {
                let seed = (frame as f32 * params.noise.speed).to_bits();
                let uniforms = PostUniforms {
                    amount: params.noise.amount,
                    speed: params.noise.speed,
                    seed,
                    ..base
                };
                self.write(system, &self.uniforms.noise, uniforms);
                let (src, dst) = targets.ping_pong();
                let io = PassIo { src, glow: src, dst };
                self.draw(system, encoder, "noise", &self.noise, &self.uniforms.noise, io);
            }
            PassKind::Vignette => {
                let uniforms = PostUniforms {
                    amount: params.vignette.amount,
                    ..base
                };
                self.write(system, &self.uniforms.vignette, uniforms);
                let (src, dst) = targets.ping_pong();
                let io = PassIo { src, glow: src, dst };
                self.draw(
                    system,
                    encoder,
                    "vignette",
                    &self.vignette,
                    &self.uniforms.vignette,
                    io,
                );
            }
            PassKind::Bloom => {
                let bloom = &params.bloom;
                let radius = bloom_radius(width, height, bloom.blur_amount) as f32;
                self.write(
                    system,
                    &self.uniforms.blur_h,
                    PostUniforms {
                        direction: [1.0, 0.0],
                        radius,
                        ..base
                    },
                );
                self.write(
                    system,
                    &self.uniforms.blur_v,
                    PostUniforms {
                        direction: [0.0, 1.0],
                        radius,
                        ..base
                    },
                );
                self.write(
                    system,
                    &self.uniforms.bloom,
                    PostUniforms {
                        strength: bloom.strength,
                        zoom_strength: bloom.zoom_blur_strength,
                        flags: bloom.apply_zoom_blur as u32,
                        ..base
                    },
                );

                let (src, dst) = targets.ping_pong();
                let (glow_a, glow_b) = (&targets.glow[0].1, &targets.glow[1].1);
                self.draw(
                    system,
                    encoder,
                    "bloom_blur_h",
                    &self.blur,
                    &self.uniforms.blur_h,
                    PassIo { src, glow: src, dst: glow_a },
                );
                self.draw(
                    system,
                    encoder,
                    "bloom_blur_v",
                    &self.blur,
                    &self.uniforms.blur_v,
                    PassIo { src: glow_a, glow: glow_a, dst: glow_b },
                );
                self.draw(
                    system,
                    encoder,
                    "bloom_composite",
                    &self.bloom,
                    &self.uniforms.bloom,
                    PassIo { src, glow: glow_b, dst },
                );
            }
        }
        targets.flip();
    }

    /// Copy the working target to the presentable surface
    pub(crate) fn blit(
        &self,
        system: &RenderSystem,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        surface_view: &wgpu::TextureView,
    ) {
        let src = targets.working_view();
        let io = PassIo {
            src,
            glow: src,
            dst: surface_view,
        };
        self.draw(system, encoder, "blit", &self.blit, &self.uniforms.blit, io);
    }

    pub(crate) fn release(&self) {
        for buffer in self.uniforms.all() {
            buffer.destroy();
        }
    }
}
