/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
}

impl ShaderStage {
    /// All stages, in pipeline order.
    pub const ALL: [ShaderStage; 5] = [
        ShaderStage::Vertex,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Geometry,
        ShaderStage::Pixel,
    ];
}

/// Primitive assembly mode of a drawable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    /// Three-control-point patches, consumed by the tessellation stages.
    PatchList3,
}

/// What a buffer is bound as.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Constant,
}

/// Buffer creation parameters.
///
/// `contents` must be exactly `size` bytes when present. Constant buffers are
/// usually created empty and rewritten every frame.
#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub usage: BufferUsage,
    pub size: u64,
    pub contents: Option<&'a [u8]>,
}

impl<'a> BufferDesc<'a> {
    pub fn init(label: &'a str, usage: BufferUsage, contents: &'a [u8]) -> Self {
        Self {
            label,
            usage,
            size: contents.len() as u64,
            contents: Some(contents),
        }
    }

    pub fn empty(label: &'a str, usage: BufferUsage, size: u64) -> Self {
        Self { label, usage, size, contents: None }
    }
}

/// Vertex attribute component format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    pub const fn size(self) -> u32 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// One element of a vertex input layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexElement {
    pub semantic: &'static str,
    pub format: VertexFormat,
    pub offset: u32,
}

/// Decoded texture pixels, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}
