//! wgpu backend.
//!
//! Replays a [`CommandBatch`] as one `wgpu::CommandEncoder` submission:
//!
//! - plain copies become `copy_texture_to_texture`
//! - staged blits become fullscreen-triangle render passes using the
//!   technique's pipeline
//!
//! # Shader Contract
//!
//! The host supplies a single WGSL module (or uses [`REFERENCE_WGSL`])
//! exposing:
//!
//! | Entry point    | Technique                       |
//! |----------------|---------------------------------|
//! | `vs_main`      | fullscreen triangle (3 vertices)|
//! | `fs_extract`   | [`PassStage::Extraction`]       |
//! | `fs_blur`      | [`PassStage::Blur`]             |
//! | `fs_composite` | [`PassStage::Composite`]        |
//!
//! and bind group 0:
//!
//! | Binding | Resource                                   |
//! |---------|--------------------------------------------|
//! | 0       | blit input (`texture_2d<f32>`)             |
//! | 1       | `_SourceTex` snapshot (`texture_2d<f32>`)  |
//! | 2       | filtering sampler                          |
//! | 3       | [`VolumetricUniforms`] (frustum rays)      |

use std::borrow::Cow;

use crate::errors::{Result, VolumetricError};
use crate::renderer::graph::command::{
    BlitCommand, BlitDest, BlitSource, CommandBatch, CommandQueue,
};
use crate::renderer::graph::transient_pool::{
    TargetBackend, TargetDesc, TargetId, TransientTargetPool,
};
use crate::resources::material::{MaterialHandle, PassStage};

/// Default color format for camera and pyramid targets.
pub const DEFAULT_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Built-in program satisfying the shader contract.
///
/// Extraction scatters the bright part of `_SourceTex` along the view rays,
/// blur is a 4-tap box filter and composite adds the blurred light on top of
/// the snapshot.
pub const REFERENCE_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) position : vec4<f32>,
    @location(0) uv : vec2<f32>,
};

struct Uniforms {
    // BL, TL, TR, BR
    rays : array<vec4<f32>, 4>,
};

@group(0) @binding(0) var t_input : texture_2d<f32>;
@group(0) @binding(1) var t_source : texture_2d<f32>;
@group(0) @binding(2) var s_linear : sampler;
@group(0) @binding(3) var<uniform> u : Uniforms;

@vertex
fn vs_main(@builtin(vertex_index) vertexIndex : u32) -> VertexOutput {
    var pos = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 3.0, -1.0),
        vec2<f32>(-1.0,  3.0)
    );
    var output : VertexOutput;
    output.position = vec4<f32>(pos[vertexIndex], 0.0, 1.0);
    output.uv = pos[vertexIndex] * 0.5 + 0.5;
    output.uv.y = 1.0 - output.uv.y;
    return output;
}

fn view_ray(uv : vec2<f32>) -> vec3<f32> {
    // uv.y grows downwards; v = 1 is the top edge.
    let v = 1.0 - uv.y;
    let bottom = mix(u.rays[0].xyz, u.rays[3].xyz, uv.x);
    let top = mix(u.rays[1].xyz, u.rays[2].xyz, uv.x);
    return normalize(mix(bottom, top, v));
}

@fragment
fn fs_extract(in : VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_source, s_linear, in.uv).rgb;
    let bright = max(color - vec3<f32>(1.0), vec3<f32>(0.0));
    let ray = view_ray(in.uv);
    let phase = 0.5 + 0.5 * max(ray.y, 0.0);
    return vec4<f32>(bright * phase, 1.0);
}

@fragment
fn fs_blur(in : VertexOutput) -> @location(0) vec4<f32> {
    let texel = 1.0 / vec2<f32>(textureDimensions(t_input));
    var sum = textureSample(t_input, s_linear, in.uv + texel * vec2<f32>(-0.5, -0.5));
    sum += textureSample(t_input, s_linear, in.uv + texel * vec2<f32>( 0.5, -0.5));
    sum += textureSample(t_input, s_linear, in.uv + texel * vec2<f32>(-0.5,  0.5));
    sum += textureSample(t_input, s_linear, in.uv + texel * vec2<f32>( 0.5,  0.5));
    return sum * 0.25;
}

@fragment
fn fs_composite(in : VertexOutput) -> @location(0) vec4<f32> {
    let scene = textureSample(t_source, s_linear, in.uv);
    let light = textureSample(t_input, s_linear, in.uv).rgb;
    return vec4<f32>(scene.rgb + light, scene.a);
}
"#;

// ============================================================================
// Targets
// ============================================================================

/// A pooled GPU target with its default view.
#[derive(Debug)]
pub struct WgpuTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Creates pooled targets on a `wgpu::Device` in a fixed color format.
#[derive(Debug)]
pub struct WgpuTargetBackend {
    device: wgpu::Device,
    format: wgpu::TextureFormat,
}

impl WgpuTargetBackend {
    /// `format` must match the camera color target, since the snapshot step
    /// copies between them.
    #[must_use]
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self {
            device: device.clone(),
            format,
        }
    }

    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

impl TargetBackend for WgpuTargetBackend {
    type Texture = WgpuTarget;

    fn create_target(&mut self, desc: &TargetDesc) -> Result<WgpuTarget> {
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(VolumetricError::TargetAllocation {
                width: desc.width,
                height: desc.height,
                reason: format!("size outside 1..={max}"),
            });
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(WgpuTarget { texture, view })
    }
}

// ============================================================================
// Pipelines
// ============================================================================

/// GPU uniform data shared by all three techniques.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VolumetricUniforms {
    /// `_BL`, `_TL`, `_TR`, `_BR`; `w` is unused.
    pub frustum_rays: [[f32; 4]; 4],
}

/// The three technique pipelines built from the host's shader module.
#[derive(Debug)]
pub struct VolumetricPipelines {
    material: MaterialHandle,
    format: wgpu::TextureFormat,
    layout: wgpu::BindGroupLayout,
    /// Indexed by [`PassStage::index`].
    pipelines: Vec<wgpu::RenderPipeline>,
    sampler: wgpu::Sampler,
    uniforms: wgpu::Buffer,
}

impl VolumetricPipelines {
    /// Builds pipelines for every technique in `shader`.
    ///
    /// The returned [`material`](Self::material) handle is what the pass
    /// settings must carry for batches to be accepted.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        label: &'static str,
    ) -> Self {
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Volumetric Layout"),
            entries: &[
                // Binding 0: Blit input
                texture_entry(0),
                // Binding 1: _SourceTex
                texture_entry(1),
                // Binding 2: Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Binding 3: Frustum rays
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Volumetric Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let pipelines = PassStage::ALL
            .iter()
            .map(|stage| create_stage_pipeline(device, shader, &pipeline_layout, format, *stage))
            .collect();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Volumetric Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Volumetric Uniforms"),
            size: std::mem::size_of::<VolumetricUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            material: MaterialHandle::new(label),
            format,
            layout,
            pipelines,
            sampler,
            uniforms,
        }
    }

    /// Builds pipelines from [`REFERENCE_WGSL`].
    #[must_use]
    pub fn with_reference_shader(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Volumetric Light Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(REFERENCE_WGSL)),
        });
        Self::new(device, &shader, format, "Volumetric Light Reference")
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> &MaterialHandle {
        &self.material
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[inline]
    #[must_use]
    pub fn pipeline(&self, stage: PassStage) -> &wgpu::RenderPipeline {
        &self.pipelines[stage.index() as usize]
    }
}

fn create_stage_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    stage: PassStage,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(stage_label(stage)),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(stage.entry_point()),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn stage_label(stage: PassStage) -> &'static str {
    match stage {
        PassStage::Extraction => "Volumetric Extraction",
        PassStage::Blur => "Volumetric Blur",
        PassStage::Composite => "Volumetric Composite",
    }
}

// ============================================================================
// Queue
// ============================================================================

/// Submits batches for one camera frame.
///
/// Build one per frame: it borrows that frame's camera color texture.
pub struct WgpuCommandQueue<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    pipelines: &'a VolumetricPipelines,
    camera_color: &'a wgpu::Texture,
}

impl<'a> WgpuCommandQueue<'a> {
    /// `camera_color` needs `RENDER_ATTACHMENT | COPY_SRC | COPY_DST` usage
    /// and the pipelines' format.
    #[must_use]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        pipelines: &'a VolumetricPipelines,
        camera_color: &'a wgpu::Texture,
    ) -> Self {
        Self {
            device,
            queue,
            pipelines,
            camera_color,
        }
    }

    fn resolve<'p>(
        pool: &'p TransientTargetPool<WgpuTargetBackend>,
        id: TargetId,
    ) -> Result<&'p WgpuTarget> {
        pool.texture(id).ok_or(VolumetricError::UnknownTarget(id))
    }

    fn encode_copy(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        command: &BlitCommand,
        pool: &TransientTargetPool<WgpuTargetBackend>,
    ) -> Result<()> {
        let src = match command.source {
            BlitSource::CameraColor => self.camera_color,
            BlitSource::Target(id) => &Self::resolve(pool, id)?.texture,
            BlitSource::None => {
                return Err(VolumetricError::UnsupportedBlit(
                    "copy without a source image".to_string(),
                ));
            }
        };
        let dst = match command.dest {
            BlitDest::CameraColor => self.camera_color,
            BlitDest::Target(id) => &Self::resolve(pool, id)?.texture,
        };

        if src.size() != dst.size() {
            return Err(VolumetricError::UnsupportedBlit(format!(
                "copy between {}x{} and {}x{}",
                src.width(),
                src.height(),
                dst.width(),
                dst.height()
            )));
        }

        encoder.copy_texture_to_texture(src.as_image_copy(), dst.as_image_copy(), src.size());
        Ok(())
    }

    fn encode_draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        command: &BlitCommand,
        stage: PassStage,
        source_view: &wgpu::TextureView,
        camera_view: &wgpu::TextureView,
        pool: &TransientTargetPool<WgpuTargetBackend>,
    ) -> Result<()> {
        let input_view = match command.source {
            // Techniques without an input image still get a valid binding.
            BlitSource::None => source_view,
            BlitSource::CameraColor => camera_view,
            BlitSource::Target(id) => &Self::resolve(pool, id)?.view,
        };
        let (output_view, load) = match command.dest {
            BlitDest::CameraColor => (camera_view, wgpu::LoadOp::Load),
            BlitDest::Target(id) => (
                &Self::resolve(pool, id)?.view,
                wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            ),
        };

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Volumetric BindGroup"),
            layout: &self.pipelines.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.pipelines.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.pipelines.uniforms.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(stage_label(stage)),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });

        pass.set_pipeline(self.pipelines.pipeline(stage));
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
        Ok(())
    }
}

impl CommandQueue<WgpuTargetBackend> for WgpuCommandQueue<'_> {
    fn submit(
        &mut self,
        batch: &CommandBatch,
        pool: &TransientTargetPool<WgpuTargetBackend>,
    ) -> Result<()> {
        if batch.material() != Some(&self.pipelines.material) {
            return Err(VolumetricError::MaterialMismatch);
        }
        let format = self.pipelines.format();
        let camera_format = self.camera_color.format();
        let target_format = pool.backend().format();
        if camera_format != format || target_format != format {
            return Err(VolumetricError::UnsupportedBlit(format!(
                "camera {camera_format:?} and targets {target_format:?} must match pipelines {format:?}"
            )));
        }
        let Some(source_id) = batch.params().source_texture else {
            return Err(VolumetricError::UnsupportedBlit(
                "no _SourceTex bound".to_string(),
            ));
        };
        let source_view = &Self::resolve(pool, source_id)?.view;

        let uniforms = VolumetricUniforms {
            frustum_rays: batch.params().frustum.to_uniform(),
        };
        self.queue
            .write_buffer(&self.pipelines.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let camera_view = self
            .camera_color
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(batch.label()),
            });
        encoder.push_debug_group(batch.label());

        for command in batch.commands() {
            match command.stage {
                None => self.encode_copy(&mut encoder, command, pool)?,
                Some(stage) => self.encode_draw(
                    &mut encoder,
                    command,
                    stage,
                    source_view,
                    &camera_view,
                    pool,
                )?,
            }
        }

        encoder.pop_debug_group();
        self.queue.submit(Some(encoder.finish()));

        log::trace!(
            "Submitted '{}' ({} commands)",
            batch.label(),
            batch.commands().len()
        );
        Ok(())
    }
}
