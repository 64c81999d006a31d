use crate::device::{
    BufferHandle,
    InputLayoutHandle,
    PrimitiveTopology,
    ResourceHandle,
    ShaderHandle,
    ShaderStage,
    TextureHandle,
};

use super::manifest::ConstantSlot;

/// Shader handles bound for one drawable.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShaderSet {
    pub vertex: ShaderHandle,
    pub hull: Option<ShaderHandle>,
    pub domain: Option<ShaderHandle>,
    pub geometry: Option<ShaderHandle>,
    pub pixel: ShaderHandle,
    /// Input layout derived from the vertex stage.
    pub input_layout: InputLayoutHandle,
}

impl ShaderSet {
    /// Handle bound at `stage`, `None` when the stage is unused.
    pub fn stage(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        match stage {
            ShaderStage::Vertex => Some(self.vertex),
            ShaderStage::Hull => self.hull,
            ShaderStage::Domain => self.domain,
            ShaderStage::Geometry => self.geometry,
            ShaderStage::Pixel => Some(self.pixel),
        }
    }
}

/// Fully built draw resources of one scene object. Immutable once published.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub name: String,
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
    pub topology: PrimitiveTopology,
    pub texture: Option<TextureHandle>,
    pub shaders: ShaderSet,
    pub constants: ConstantSlot,
    pub instances: u32,
    pub clear_depth_after: bool,
}

/// Per-frame constant buffers created by the build.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ConstantBuffers {
    pub shared: BufferHandle,
    pub instanced: Option<BufferHandle>,
    pub skybox: Option<BufferHandle>,
    pub lights: BufferHandle,
}

impl ConstantBuffers {
    pub fn slot(&self, slot: ConstantSlot) -> Option<BufferHandle> {
        match slot {
            ConstantSlot::Shared => Some(self.shared),
            ConstantSlot::Instanced => self.instanced,
            ConstantSlot::Skybox => self.skybox,
        }
    }
}

/// Output of one successful build generation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltScene {
    pub generation: u64,
    /// Drawables in pass order.
    pub drawables: Vec<Drawable>,
    pub constants: ConstantBuffers,
}

impl BuiltScene {
    pub fn drawable(&self, name: &str) -> Option<&Drawable> {
        self.drawables.iter().find(|d| d.name == name)
    }

    /// Every handle referenced by the scene, shared ones listed once.
    pub fn handles(&self) -> Vec<ResourceHandle> {
        let mut out: Vec<ResourceHandle> = Vec::new();
        let mut push = |h: ResourceHandle| {
            if !out.contains(&h) {
                out.push(h);
            }
        };

        for d in &self.drawables {
            push(d.vertex_buffer.into());
            push(d.index_buffer.into());
            if let Some(t) = d.texture {
                push(t.into());
            }
            for stage in ShaderStage::ALL {
                if let Some(s) = d.shaders.stage(stage) {
                    push(s.into());
                }
            }
            push(d.shaders.input_layout.into());
        }

        let c = &self.constants;
        push(c.shared.into());
        push(c.lights.into());
        for h in [c.instanced, c.skybox].into_iter().flatten() {
            push(h.into());
        }
        out
    }
}
