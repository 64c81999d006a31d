use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::device::{BufferHandle, DeviceError, PrimitiveTopology, ShaderHandle, ShaderStage, VertexFormat, WgpuDevice};

use super::plan::{FramePlan, PipelineKey, PlannedDraw};
use super::{CommandSink, DrawCommand};

const OBJECT_BINDING: u32 = 0;
const LIGHT_BINDING: u32 = 1;
const TEXTURE_BINDING: u32 = 2;
const SAMPLER_BINDING: u32 = 3;

/// What one `finish` call put on the GPU.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub passes: usize,
    pub draws: usize,
    pub skipped: usize,
}

struct ResolvedDraw {
    pipeline: PipelineKey,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_offset: u64,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_count: u32,
}

/// `CommandSink` that replays the frame into wgpu render passes on an
/// offscreen target.
///
/// Constant updates are written to the queue as they arrive; everything else
/// is buffered until `finish`. Pipelines are cached per `PipelineKey`. Every
/// shader module must expose `vs_main` or `fs_main` and use this bind group:
/// - `@binding(0)` object transforms (vertex)
/// - `@binding(1)` light buffer (fragment)
/// - `@binding(2)` diffuse `texture_2d<f32>` (fragment)
/// - `@binding(3)` filtering sampler (fragment)
///
/// Drawables without a texture sample a 1x1 white one.
pub struct WgpuSink {
    gpu: Arc<WgpuDevice>,
    size: wgpu::Extent3d,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    blank: wgpu::TextureView,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    commands: Vec<DrawCommand>,
    clear_color: wgpu::Color,
}

impl WgpuSink {
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(gpu: Arc<WgpuDevice>, width: u32, height: u32) -> Self {
        let device = gpu.device();
        let size = wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 };

        let target = |label: &str, format: wgpu::TextureFormat, usage: wgpu::TextureUsages| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };
        let color = target(
            "stadium color target",
            Self::COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let depth = target("stadium depth target", Self::DEPTH_FORMAT, wgpu::TextureUsages::RENDER_ATTACHMENT);
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let uniform = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stadium bgl"),
            entries: &[
                uniform(OBJECT_BINDING, wgpu::ShaderStages::VERTEX),
                uniform(LIGHT_BINDING, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: TEXTURE_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: SAMPLER_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("stadium pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("stadium sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let blank = device
            .create_texture_with_data(
                gpu.queue(),
                &wgpu::TextureDescriptor {
                    label: Some("stadium blank texture"),
                    size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: gpu.texture_format(),
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                },
                wgpu::util::TextureDataOrder::LayerMajor,
                &[255; 4],
            )
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            gpu,
            size,
            color,
            color_view,
            depth_view,
            bind_group_layout,
            pipeline_layout,
            sampler,
            blank,
            pipelines: HashMap::new(),
            commands: Vec::new(),
            clear_color: wgpu::Color::BLACK,
        }
    }

    pub fn with_clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Offscreen color target the frame is drawn into.
    pub fn target(&self) -> &wgpu::Texture {
        &self.color
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Encodes and submits everything recorded since the last call.
    pub fn finish(&mut self) -> Result<FrameStats, DeviceError> {
        let commands = std::mem::take(&mut self.commands);
        let plan = FramePlan::from_commands(&commands);
        for reason in &plan.skipped {
            log::debug!("draw skipped: {reason:?}");
        }

        let mut segments = Vec::with_capacity(plan.segments.len());
        for segment in &plan.segments {
            let mut resolved = Vec::with_capacity(segment.len());
            for draw in segment {
                self.ensure_pipeline(&draw.pipeline)?;
                resolved.push(self.resolve(draw)?);
            }
            segments.push(resolved);
        }

        let device = self.gpu.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("stadium frame encoder"),
        });

        for (i, segment) in segments.iter().enumerate() {
            // Only the first segment clears color; each one starts with fresh depth.
            let load = if i == 0 { wgpu::LoadOp::Clear(self.clear_color) } else { wgpu::LoadOp::Load };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("stadium scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for d in segment {
                let Some(pipeline) = self.pipelines.get(&d.pipeline) else { continue };
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &d.bind_group, &[]);
                rpass.set_vertex_buffer(0, d.vertex_buffer.slice(d.vertex_offset..));
                rpass.set_index_buffer(d.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..d.index_count, 0, 0..d.instance_count);
            }
        }

        self.gpu.queue().submit(Some(encoder.finish()));

        Ok(FrameStats {
            passes: segments.len(),
            draws: plan.draw_count(),
            skipped: plan.skipped.len(),
        })
    }

    fn ensure_pipeline(&mut self, key: &PipelineKey) -> Result<(), DeviceError> {
        if self.pipelines.contains_key(key) {
            return Ok(());
        }

        let module = |handle: ShaderHandle, expected: ShaderStage| match self.gpu.shader_module(handle) {
            Some((stage, module)) if stage == expected => Ok(module),
            Some((stage, _)) => Err(DeviceError::Backend(format!("{handle:?} is a {stage:?} shader, not {expected:?}"))),
            None => Err(DeviceError::Backend(format!("unknown shader {handle:?}"))),
        };
        let vertex = module(key.vertex, ShaderStage::Vertex)?;
        let pixel = module(key.pixel, ShaderStage::Pixel)?;

        let elements = self
            .gpu
            .input_layout(key.layout)
            .ok_or_else(|| DeviceError::Backend(format!("unknown input layout {:?}", key.layout)))?;
        let attributes: Vec<wgpu::VertexAttribute> = elements
            .iter()
            .enumerate()
            .map(|(location, e)| wgpu::VertexAttribute {
                format: vertex_format(e.format),
                offset: u64::from(e.offset),
                shader_location: location as u32,
            })
            .collect();

        let (topology, strip_index_format) = match key.topology {
            PrimitiveTopology::TriangleList => (wgpu::PrimitiveTopology::TriangleList, None),
            PrimitiveTopology::TriangleStrip => {
                (wgpu::PrimitiveTopology::TriangleStrip, Some(wgpu::IndexFormat::Uint32))
            }
            PrimitiveTopology::PatchList3 => {
                return Err(DeviceError::Backend("patch lists need tessellation stages".to_string()));
            }
        };

        let pipeline = self.gpu.device().create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("stadium pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: u64::from(key.stride),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &pixel,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: Self::COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format,
                front_face: wgpu::FrontFace::Cw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Self::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("created pipeline for {key:?}");
        self.pipelines.insert(*key, pipeline);
        Ok(())
    }

    fn resolve(&self, draw: &PlannedDraw) -> Result<ResolvedDraw, DeviceError> {
        let buffer = |handle: BufferHandle| {
            self.gpu
                .buffer(handle)
                .ok_or_else(|| DeviceError::Backend(format!("unknown buffer {handle:?}")))
        };
        let object = buffer(draw.object_constants)?;
        let lights = buffer(draw.light_constants)?;
        let texture = match draw.texture {
            Some(handle) => self
                .gpu
                .texture_view(handle)
                .ok_or_else(|| DeviceError::Backend(format!("unknown texture {handle:?}")))?,
            None => self.blank.clone(),
        };

        let bind_group = self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stadium bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: OBJECT_BINDING, resource: object.as_entire_binding() },
                wgpu::BindGroupEntry { binding: LIGHT_BINDING, resource: lights.as_entire_binding() },
                wgpu::BindGroupEntry { binding: TEXTURE_BINDING, resource: wgpu::BindingResource::TextureView(&texture) },
                wgpu::BindGroupEntry { binding: SAMPLER_BINDING, resource: wgpu::BindingResource::Sampler(&self.sampler) },
            ],
        });

        Ok(ResolvedDraw {
            pipeline: draw.pipeline,
            bind_group,
            vertex_buffer: buffer(draw.vertex_buffer)?,
            vertex_offset: u64::from(draw.vertex_offset),
            index_buffer: buffer(draw.index_buffer)?,
            index_count: draw.index_count,
            instance_count: draw.instance_count,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }
}

impl CommandSink for WgpuSink {
    fn submit(&mut self, cmd: DrawCommand) {
        match cmd {
            DrawCommand::UpdateConstants { buffer, data } => {
                if let Err(e) = self.gpu.write_buffer(buffer, &data) {
                    log::warn!("constant update dropped: {e}");
                }
            }
            cmd => self.commands.push(cmd),
        }
    }
}

fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}
