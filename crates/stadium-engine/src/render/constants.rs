use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Number of model matrices in the instanced constant buffer.
pub const MAX_INSTANCES: usize = 3;

/// Per-object transforms.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ModelViewProjection {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl ModelViewProjection {
    pub const SIZE: u64 = std::mem::size_of::<ModelViewProjection>() as u64;
}

impl Default for ModelViewProjection {
    fn default() -> Self {
        Self { model: Mat4::IDENTITY, view: Mat4::IDENTITY, projection: Mat4::IDENTITY }
    }
}

/// Transforms for an instanced draw; one model matrix per instance.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstancedModelViewProjection {
    pub model: [Mat4; MAX_INSTANCES],
    pub view: Mat4,
    pub projection: Mat4,
}

impl InstancedModelViewProjection {
    pub const SIZE: u64 = std::mem::size_of::<InstancedModelViewProjection>() as u64;
}

impl Default for InstancedModelViewProjection {
    fn default() -> Self {
        Self {
            model: [Mat4::IDENTITY; MAX_INSTANCES],
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_register_layout() {
        assert_eq!(ModelViewProjection::SIZE, 3 * 64);
        assert_eq!(InstancedModelViewProjection::SIZE, 5 * 64);
        assert_eq!(bytemuck::bytes_of(&ModelViewProjection::default()).len(), 192);
    }
}
