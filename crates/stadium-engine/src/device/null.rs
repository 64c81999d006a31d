use parking_lot::Mutex;
use slotmap::SlotMap;

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

#[derive(Debug, Default)]
struct Pools {
    buffers: SlotMap<BufferHandle, (BufferUsage, u64)>,
    shaders: SlotMap<ShaderHandle, ShaderStage>,
    layouts: SlotMap<InputLayoutHandle, usize>,
    textures: SlotMap<TextureHandle, (u32, u32)>,
}

/// Device that validates requests and hands out handles, but owns no GPU memory.
///
/// Supports every shader stage. Useful for headless runs of the full build
/// pipeline and as the reference device in tests.
#[derive(Debug, Default)]
pub struct NullDevice {
    pools: Mutex<Pools>,
}

impl NullDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles currently alive, across all kinds.
    pub fn live_count(&self) -> usize {
        let p = self.pools.lock();
        p.buffers.len() + p.shaders.len() + p.layouts.len() + p.textures.len()
    }

    /// Size in bytes of a live buffer.
    pub fn buffer_size(&self, handle: BufferHandle) -> Option<u64> {
        self.pools.lock().buffers.get(handle).map(|(_, size)| *size)
    }

    /// Stage a live shader was created for.
    pub fn shader_stage(&self, handle: ShaderHandle) -> Option<ShaderStage> {
        self.pools.lock().shaders.get(handle).copied()
    }
}

impl RenderDevice for NullDevice {
    fn create_shader(
        &self,
        stage: ShaderStage,
        label: &str,
        bytecode: &[u8],
    ) -> Result<ShaderHandle, DeviceError> {
        if bytecode.is_empty() {
            return Err(DeviceError::InvalidBytecode {
                label: label.to_string(),
                reason: "empty bytecode".to_string(),
            });
        }
        Ok(self.pools.lock().shaders.insert(stage))
    }

    fn create_input_layout(
        &self,
        elements: &[VertexElement],
        bytecode: &[u8],
    ) -> Result<InputLayoutHandle, DeviceError> {
        if elements.is_empty() || bytecode.is_empty() {
            return Err(DeviceError::InvalidBytecode {
                label: "input layout".to_string(),
                reason: "no vertex signature to match".to_string(),
            });
        }
        Ok(self.pools.lock().layouts.insert(elements.len()))
    }

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<BufferHandle, DeviceError> {
        if desc.size == 0 {
            return Err(DeviceError::InvalidBuffer {
                label: desc.label.to_string(),
                reason: "zero size".to_string(),
            });
        }
        if let Some(contents) = desc.contents {
            if contents.len() as u64 != desc.size {
                return Err(DeviceError::InvalidBuffer {
                    label: desc.label.to_string(),
                    reason: format!("{} bytes of contents for size {}", contents.len(), desc.size),
                });
            }
        }
        Ok(self.pools.lock().buffers.insert((desc.usage, desc.size)))
    }

    fn create_texture(
        &self,
        label: &str,
        image: &DecodedImage,
    ) -> Result<TextureHandle, DeviceError> {
        let expected = u64::from(image.width) * u64::from(image.height) * 4;
        if expected == 0 || image.rgba.len() as u64 != expected {
            return Err(DeviceError::Backend(format!(
                "texture `{label}`: {}x{} does not match {} bytes",
                image.width,
                image.height,
                image.rgba.len()
            )));
        }
        Ok(self.pools.lock().textures.insert((image.width, image.height)))
    }

    fn release(&self, handle: ResourceHandle) {
        let mut p = self.pools.lock();
        let removed = match handle {
            ResourceHandle::Buffer(h) => p.buffers.remove(h).is_some(),
            ResourceHandle::Shader(h) => p.shaders.remove(h).is_some(),
            ResourceHandle::InputLayout(h) => p.layouts.remove(h).is_some(),
            ResourceHandle::Texture(h) => p.textures.remove(h).is_some(),
        };
        if !removed {
            log::trace!("release of unknown handle {handle:?} ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_tracked_until_released() {
        let dev = NullDevice::new();
        let vb = dev
            .create_buffer(&BufferDesc::init("vb", BufferUsage::Vertex, &[0u8; 36]))
            .unwrap();
        let ps = dev.create_shader(ShaderStage::Pixel, "ps", &[1, 2, 3]).unwrap();
        assert_eq!(dev.live_count(), 2);
        assert_eq!(dev.buffer_size(vb), Some(36));
        assert_eq!(dev.shader_stage(ps), Some(ShaderStage::Pixel));

        dev.release(vb.into());
        dev.release(vb.into());
        assert_eq!(dev.live_count(), 1);
    }

    #[test]
    fn malformed_requests_are_rejected() {
        let dev = NullDevice::new();
        assert!(matches!(
            dev.create_shader(ShaderStage::Vertex, "vs", &[]),
            Err(DeviceError::InvalidBytecode { .. })
        ));
        assert!(matches!(
            dev.create_buffer(&BufferDesc::empty("cb", BufferUsage::Constant, 0)),
            Err(DeviceError::InvalidBuffer { .. })
        ));
        let bad = DecodedImage { width: 2, height: 2, rgba: vec![0; 3] };
        assert!(dev.create_texture("tex", &bad).is_err());
    }
}
