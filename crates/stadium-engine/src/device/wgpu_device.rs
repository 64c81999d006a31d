use anyhow::{Context, Result};
use parking_lot::Mutex;
use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use super::{
    BufferDesc,
    BufferHandle,
    BufferUsage,
    DecodedImage,
    DeviceError,
    InputLayoutHandle,
    RenderDevice,
    ResourceHandle,
    ShaderHandle,
    ShaderStage,
    TextureHandle,
    VertexElement,
};

/// Initialization parameters for the wgpu backend.
#[derive(Debug, Clone)]
pub struct DeviceInit {
    /// Adapter preference.
    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Format used for every uploaded texture.
    pub texture_format: wgpu::TextureFormat,
}

impl Default for DeviceInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            texture_format: wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

#[derive(Default)]
struct Objects {
    buffers: SlotMap<BufferHandle, wgpu::Buffer>,
    shaders: SlotMap<ShaderHandle, (ShaderStage, wgpu::ShaderModule)>,
    layouts: SlotMap<InputLayoutHandle, Vec<VertexElement>>,
    textures: SlotMap<TextureHandle, (wgpu::Texture, wgpu::TextureView)>,
}

/// `RenderDevice` backed by a headless wgpu device.
///
/// Shader "bytecode" is WGSL source. wgpu exposes no hull, domain or geometry
/// stage, so creating those fails with `DeviceError::UnsupportedStage`.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture_format: wgpu::TextureFormat,
    objects: Mutex<Objects>,
}

impl WgpuDevice {
    /// Acquires an adapter and device without a surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new_headless(init: DeviceInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("stadium device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self::from_parts(device, queue, init.texture_format))
    }

    /// Wraps a device/queue pair owned by the host.
    pub fn from_parts(
        device: wgpu::Device,
        queue: wgpu::Queue,
        texture_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            texture_format,
            objects: Mutex::new(Objects::default()),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Rewrites a live buffer; used by hosts replaying constant updates.
    pub fn write_buffer(&self, handle: BufferHandle, data: &[u8]) -> Result<(), DeviceError> {
        let objects = self.objects.lock();
        let buffer = objects
            .buffers
            .get(handle)
            .ok_or_else(|| DeviceError::Backend(format!("unknown buffer {handle:?}")))?;
        self.queue.write_buffer(buffer, 0, data);
        Ok(())
    }

    /// Input elements recorded for a layout handle.
    pub fn input_layout(&self, handle: InputLayoutHandle) -> Option<Vec<VertexElement>> {
        self.objects.lock().layouts.get(handle).cloned()
    }

    pub fn texture_format(&self) -> wgpu::TextureFormat {
        self.texture_format
    }

    pub(crate) fn buffer(&self, handle: BufferHandle) -> Option<wgpu::Buffer> {
        self.objects.lock().buffers.get(handle).cloned()
    }

    pub(crate) fn shader_module(&self, handle: ShaderHandle) -> Option<(ShaderStage, wgpu::ShaderModule)> {
        self.objects.lock().shaders.get(handle).cloned()
    }

    pub(crate) fn texture_view(&self, handle: TextureHandle) -> Option<wgpu::TextureView> {
        self.objects.lock().textures.get(handle).map(|(_, view)| view.clone())
    }
}

fn buffer_usages(usage: BufferUsage) -> wgpu::BufferUsages {
    match usage {
        BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
        BufferUsage::Index => wgpu::BufferUsages::INDEX,
        BufferUsage::Constant => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    }
}

fn wgsl_source<'a>(label: &str, bytecode: &'a [u8]) -> Result<&'a str, DeviceError> {
    std::str::from_utf8(bytecode).map_err(|e| DeviceError::InvalidBytecode {
        label: label.to_string(),
        reason: format!("not WGSL text: {e}"),
    })
}

impl RenderDevice for WgpuDevice {
    fn create_shader(
        &self,
        stage: ShaderStage,
        label: &str,
        bytecode: &[u8],
    ) -> Result<ShaderHandle, DeviceError> {
        if !matches!(stage, ShaderStage::Vertex | ShaderStage::Pixel) {
            return Err(DeviceError::UnsupportedStage(stage));
        }
        let source = wgsl_source(label, bytecode)?;

        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        Ok(self.objects.lock().shaders.insert((stage, module)))
    }

    fn create_input_layout(
        &self,
        elements: &[VertexElement],
        bytecode: &[u8],
    ) -> Result<InputLayoutHandle, DeviceError> {
        let source = wgsl_source("input layout", bytecode)?;
        if !source.contains("@vertex") {
            return Err(DeviceError::InvalidBytecode {
                label: "input layout".to_string(),
                reason: "no vertex entry point".to_string(),
            });
        }
        Ok(self.objects.lock().layouts.insert(elements.to_vec()))
    }

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<BufferHandle, DeviceError> {
        if desc.size == 0 {
            return Err(DeviceError::InvalidBuffer {
                label: desc.label.to_string(),
                reason: "zero size".to_string(),
            });
        }

        let usage = buffer_usages(desc.usage);
        let buffer = match desc.contents {
            Some(contents) => self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(desc.label),
                contents,
                usage,
            }),
            None => self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size: desc.size,
                usage,
                mapped_at_creation: false,
            }),
        };

        Ok(self.objects.lock().buffers.insert(buffer))
    }

    fn create_texture(
        &self,
        label: &str,
        image: &DecodedImage,
    ) -> Result<TextureHandle, DeviceError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if image.width == 0 || image.height == 0 || image.width > max || image.height > max {
            return Err(DeviceError::OutOfMemory(label.to_string()));
        }

        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: self.texture_format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &image.rgba,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(self.objects.lock().textures.insert((texture, view)))
    }

    fn release(&self, handle: ResourceHandle) {
        let mut objects = self.objects.lock();
        match handle {
            ResourceHandle::Buffer(h) => {
                if let Some(buffer) = objects.buffers.remove(h) {
                    buffer.destroy();
                }
            }
            ResourceHandle::Shader(h) => {
                objects.shaders.remove(h);
            }
            ResourceHandle::InputLayout(h) => {
                objects.layouts.remove(h);
            }
            ResourceHandle::Texture(h) => {
                if let Some((texture, _view)) = objects.textures.remove(h) {
                    texture.destroy();
                }
            }
        }
    }
}
