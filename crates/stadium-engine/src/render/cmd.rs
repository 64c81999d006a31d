use crate::device::{
    BufferHandle,
    InputLayoutHandle,
    PrimitiveTopology,
    ShaderHandle,
    ShaderStage,
    TextureHandle,
};

/// Device-context command stream produced by the frame orchestrator.
///
/// Bindings are explicit: a pass that does not use a stage or a texture slot
/// binds `None` rather than inheriting whatever the previous pass left there.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Overwrites a constant buffer with `data`.
    UpdateConstants { buffer: BufferHandle, data: Vec<u8> },
    SetVertexBuffer { buffer: BufferHandle, stride: u32, offset: u32 },
    /// 32-bit indices.
    SetIndexBuffer { buffer: BufferHandle },
    SetTopology(PrimitiveTopology),
    SetInputLayout(InputLayoutHandle),
    SetShader { stage: ShaderStage, shader: Option<ShaderHandle> },
    SetConstantBuffer { stage: ShaderStage, slot: u32, buffer: BufferHandle },
    SetTexture { stage: ShaderStage, slot: u32, texture: Option<TextureHandle> },
    DrawIndexed { index_count: u32 },
    DrawIndexedInstanced { index_count: u32, instance_count: u32 },
    ClearDepthStencil,
}

impl DrawCommand {
    #[inline]
    pub fn is_draw(&self) -> bool {
        matches!(self, DrawCommand::DrawIndexed { .. } | DrawCommand::DrawIndexedInstanced { .. })
    }
}
