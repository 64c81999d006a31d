//! GPU device abstraction.
//!
//! The build pipeline only needs to turn bytes into handles, and the frame
//! orchestrator only needs to refer to those handles, so both talk to the
//! `RenderDevice` trait. Two implementations ship with the crate:
//! - `NullDevice`: allocates handles without GPU memory (headless runs, tests)
//! - `WgpuDevice`: backs handles with real wgpu objects

mod error;
mod handles;
mod null;
mod types;
mod wgpu_device;

pub use error::DeviceError;
pub use handles::{BufferHandle, InputLayoutHandle, ResourceHandle, ShaderHandle, TextureHandle};
pub use null::NullDevice;
pub use types::{
    BufferDesc,
    BufferUsage,
    DecodedImage,
    PrimitiveTopology,
    ShaderStage,
    VertexElement,
    VertexFormat,
};
pub use wgpu_device::{DeviceInit, WgpuDevice};

/// Capability used to realize decoded data as GPU objects.
///
/// Implementations are called from build workers, hence `Send + Sync`.
/// Creation failures are hard errors; callers never retry.
pub trait RenderDevice: Send + Sync {
    /// Creates a shader for `stage` from its compiled bytecode.
    fn create_shader(
        &self,
        stage: ShaderStage,
        label: &str,
        bytecode: &[u8],
    ) -> Result<ShaderHandle, DeviceError>;

    /// Creates a vertex input layout validated against vertex-stage bytecode.
    fn create_input_layout(
        &self,
        elements: &[VertexElement],
        bytecode: &[u8],
    ) -> Result<InputLayoutHandle, DeviceError>;

    /// Creates a buffer, optionally initialized with `desc.contents`.
    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<BufferHandle, DeviceError>;

    /// Uploads a decoded RGBA8 image as a sampled 2D texture.
    fn create_texture(&self, label: &str, image: &DecodedImage)
        -> Result<TextureHandle, DeviceError>;

    /// Releases a handle. Unknown or already released handles are ignored.
    fn release(&self, handle: ResourceHandle);
}
