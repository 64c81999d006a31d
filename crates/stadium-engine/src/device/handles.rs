use slotmap::new_key_type;

new_key_type! {
    pub struct BufferHandle;
    pub struct ShaderHandle;
    pub struct InputLayoutHandle;
    pub struct TextureHandle;
}

/// Any handle a device can hand out, for bulk release.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceHandle {
    Buffer(BufferHandle),
    Shader(ShaderHandle),
    InputLayout(InputLayoutHandle),
    Texture(TextureHandle),
}

impl From<BufferHandle> for ResourceHandle {
    fn from(h: BufferHandle) -> Self {
        Self::Buffer(h)
    }
}

impl From<ShaderHandle> for ResourceHandle {
    fn from(h: ShaderHandle) -> Self {
        Self::Shader(h)
    }
}

impl From<InputLayoutHandle> for ResourceHandle {
    fn from(h: InputLayoutHandle) -> Self {
        Self::InputLayout(h)
    }
}

impl From<TextureHandle> for ResourceHandle {
    fn from(h: TextureHandle) -> Self {
        Self::Texture(h)
    }
}
