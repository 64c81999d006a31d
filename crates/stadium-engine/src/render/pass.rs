use crate::assets::Vertex;
use crate::device::{BufferHandle, ShaderStage};
use crate::resources::{ConstantSlot, Drawable};

use super::{CommandSink, DrawCommand};

/// Slot the object transforms are bound to in the vertex and domain stages.
pub const OBJECT_CONSTANTS_SLOT: u32 = 0;
/// Slot the light buffer is bound to in the pixel stage.
pub const LIGHT_CONSTANTS_SLOT: u32 = 0;
pub const DIFFUSE_TEXTURE_SLOT: u32 = 0;

/// One drawable's worth of binds and the draw call.
///
/// Every programmable stage is either bound or explicitly cleared, so a pass
/// never depends on what an earlier pass left bound.
#[derive(Debug, Copy, Clone)]
pub struct DrawPass<'a> {
    drawable: &'a Drawable,
    object_constants: BufferHandle,
    light_constants: BufferHandle,
}

impl<'a> DrawPass<'a> {
    pub fn new(drawable: &'a Drawable, object_constants: BufferHandle, light_constants: BufferHandle) -> Self {
        Self { drawable, object_constants, light_constants }
    }

    pub fn record(&self, sink: &mut dyn CommandSink) {
        let d = self.drawable;

        sink.submit(DrawCommand::SetVertexBuffer { buffer: d.vertex_buffer, stride: Vertex::STRIDE, offset: 0 });
        sink.submit(DrawCommand::SetIndexBuffer { buffer: d.index_buffer });
        sink.submit(DrawCommand::SetTopology(d.topology));
        sink.submit(DrawCommand::SetInputLayout(d.shaders.input_layout));

        for stage in ShaderStage::ALL {
            sink.submit(DrawCommand::SetShader { stage, shader: d.shaders.stage(stage) });
        }

        sink.submit(DrawCommand::SetConstantBuffer {
            stage: ShaderStage::Vertex,
            slot: OBJECT_CONSTANTS_SLOT,
            buffer: self.object_constants,
        });
        if d.shaders.domain.is_some() {
            sink.submit(DrawCommand::SetConstantBuffer {
                stage: ShaderStage::Domain,
                slot: OBJECT_CONSTANTS_SLOT,
                buffer: self.object_constants,
            });
        }
        sink.submit(DrawCommand::SetConstantBuffer {
            stage: ShaderStage::Pixel,
            slot: LIGHT_CONSTANTS_SLOT,
            buffer: self.light_constants,
        });

        sink.submit(DrawCommand::SetTexture {
            stage: ShaderStage::Pixel,
            slot: DIFFUSE_TEXTURE_SLOT,
            texture: d.texture,
        });

        if d.constants == ConstantSlot::Instanced {
            sink.submit(DrawCommand::DrawIndexedInstanced {
                index_count: d.index_count,
                instance_count: d.instances,
            });
        } else {
            sink.submit(DrawCommand::DrawIndexed { index_count: d.index_count });
        }

        if d.clear_depth_after {
            sink.submit(DrawCommand::ClearDepthStencil);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{
        BufferDesc,
        BufferUsage,
        NullDevice,
        PrimitiveTopology,
        RenderDevice,
        ShaderHandle,
    };
    use crate::resources::ShaderSet;

    fn drawable(dev: &NullDevice, constants: ConstantSlot) -> Drawable {
        let buffer = |usage| dev.create_buffer(&BufferDesc::empty("b", usage, 16)).unwrap();
        let shader = |stage| dev.create_shader(stage, "s", &[1]).unwrap();
        let vertex: ShaderHandle = shader(ShaderStage::Vertex);
        Drawable {
            name: "thing".into(),
            vertex_buffer: buffer(BufferUsage::Vertex),
            index_buffer: buffer(BufferUsage::Index),
            index_count: 36,
            topology: PrimitiveTopology::TriangleStrip,
            texture: None,
            shaders: ShaderSet {
                vertex,
                hull: None,
                domain: None,
                geometry: None,
                pixel: shader(ShaderStage::Pixel),
                input_layout: dev.create_input_layout(&Vertex::LAYOUT, &[1]).unwrap(),
            },
            constants,
            instances: if constants == ConstantSlot::Instanced { 3 } else { 1 },
            clear_depth_after: false,
        }
    }

    #[test]
    fn unused_stages_and_texture_are_cleared() {
        let dev = NullDevice::new();
        let d = drawable(&dev, ConstantSlot::Shared);
        let cb = dev.create_buffer(&BufferDesc::empty("cb", BufferUsage::Constant, 192)).unwrap();
        let mut sink = crate::render::RecordingSink::new();
        DrawPass::new(&d, cb, cb).record(&mut sink);

        let cleared: Vec<_> = sink
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetShader { stage, shader: None } => Some(*stage),
                _ => None,
            })
            .collect();
        assert_eq!(cleared, vec![ShaderStage::Hull, ShaderStage::Domain, ShaderStage::Geometry]);
        assert!(sink.commands().contains(&DrawCommand::SetTexture {
            stage: ShaderStage::Pixel,
            slot: DIFFUSE_TEXTURE_SLOT,
            texture: None,
        }));
        assert_eq!(sink.commands().last(), Some(&DrawCommand::DrawIndexed { index_count: 36 }));
    }

    #[test]
    fn instanced_drawables_draw_every_instance() {
        let dev = NullDevice::new();
        let mut d = drawable(&dev, ConstantSlot::Instanced);
        d.clear_depth_after = true;
        let cb = dev.create_buffer(&BufferDesc::empty("cb", BufferUsage::Constant, 320)).unwrap();
        let mut sink = crate::render::RecordingSink::new();
        DrawPass::new(&d, cb, cb).record(&mut sink);

        let tail = &sink.commands()[sink.len() - 2..];
        assert_eq!(
            tail,
            &[
                DrawCommand::DrawIndexedInstanced { index_count: 36, instance_count: 3 },
                DrawCommand::ClearDepthStencil,
            ]
        );
    }
}
