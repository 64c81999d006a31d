use crate::device::{
    BufferHandle,
    InputLayoutHandle,
    PrimitiveTopology,
    ShaderHandle,
    ShaderStage,
    TextureHandle,
};

use super::pass::{DIFFUSE_TEXTURE_SLOT, LIGHT_CONSTANTS_SLOT, OBJECT_CONSTANTS_SLOT};
use super::DrawCommand;

/// Everything that selects a render pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineKey {
    pub vertex: ShaderHandle,
    pub pixel: ShaderHandle,
    pub layout: InputLayoutHandle,
    pub topology: PrimitiveTopology,
    pub stride: u32,
}

/// One indexed draw with the bindings it was recorded with.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDraw {
    pub pipeline: PipelineKey,
    pub vertex_buffer: BufferHandle,
    pub vertex_offset: u32,
    pub index_buffer: BufferHandle,
    pub object_constants: BufferHandle,
    pub light_constants: BufferHandle,
    pub texture: Option<TextureHandle>,
    pub index_count: u32,
    pub instance_count: u32,
}

/// Why a recorded draw could not be planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A hull, domain or geometry shader was bound.
    UnsupportedStage(ShaderStage),
    /// Patch lists only make sense with tessellation.
    PatchTopology,
    /// Required state was never bound.
    Unbound(&'static str),
}

/// A frame's draw commands regrouped into render passes.
///
/// A `ClearDepthStencil` command ends the current segment; the next segment
/// starts with a cleared depth buffer and keeps the color written so far.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub segments: Vec<Vec<PlannedDraw>>,
    pub skipped: Vec<SkipReason>,
}

#[derive(Debug, Default)]
struct Bound {
    vertex_buffer: Option<(BufferHandle, u32, u32)>,
    index_buffer: Option<BufferHandle>,
    topology: Option<PrimitiveTopology>,
    layout: Option<InputLayoutHandle>,
    vertex: Option<ShaderHandle>,
    pixel: Option<ShaderHandle>,
    extra_stage: [Option<ShaderHandle>; 3],
    object_constants: Option<BufferHandle>,
    light_constants: Option<BufferHandle>,
    texture: Option<TextureHandle>,
}

impl Bound {
    fn set_shader(&mut self, stage: ShaderStage, shader: Option<ShaderHandle>) {
        match stage {
            ShaderStage::Vertex => self.vertex = shader,
            ShaderStage::Hull => self.extra_stage[0] = shader,
            ShaderStage::Domain => self.extra_stage[1] = shader,
            ShaderStage::Geometry => self.extra_stage[2] = shader,
            ShaderStage::Pixel => self.pixel = shader,
        }
    }

    fn draw(&self, index_count: u32, instance_count: u32) -> Result<PlannedDraw, SkipReason> {
        const EXTRA: [ShaderStage; 3] = [ShaderStage::Hull, ShaderStage::Domain, ShaderStage::Geometry];
        if let Some(i) = self.extra_stage.iter().position(Option::is_some) {
            return Err(SkipReason::UnsupportedStage(EXTRA[i]));
        }

        let topology = self.topology.ok_or(SkipReason::Unbound("topology"))?;
        if topology == PrimitiveTopology::PatchList3 {
            return Err(SkipReason::PatchTopology);
        }
        let (vertex_buffer, stride, vertex_offset) = self.vertex_buffer.ok_or(SkipReason::Unbound("vertex buffer"))?;

        Ok(PlannedDraw {
            pipeline: PipelineKey {
                vertex: self.vertex.ok_or(SkipReason::Unbound("vertex shader"))?,
                pixel: self.pixel.ok_or(SkipReason::Unbound("pixel shader"))?,
                layout: self.layout.ok_or(SkipReason::Unbound("input layout"))?,
                topology,
                stride,
            },
            vertex_buffer,
            vertex_offset,
            index_buffer: self.index_buffer.ok_or(SkipReason::Unbound("index buffer"))?,
            object_constants: self.object_constants.ok_or(SkipReason::Unbound("object constants"))?,
            light_constants: self.light_constants.ok_or(SkipReason::Unbound("light constants"))?,
            texture: self.texture,
            index_count,
            instance_count,
        })
    }
}

impl FramePlan {
    /// Replays `commands` against a model of the bound state.
    ///
    /// Constant updates carry no binding state and are ignored here.
    pub fn from_commands(commands: &[DrawCommand]) -> Self {
        let mut bound = Bound::default();
        let mut segments = vec![Vec::new()];
        let mut skipped = Vec::new();

        for cmd in commands {
            let (index_count, instance_count) = match *cmd {
                DrawCommand::UpdateConstants { .. } => continue,
                DrawCommand::SetVertexBuffer { buffer, stride, offset } => {
                    bound.vertex_buffer = Some((buffer, stride, offset));
                    continue;
                }
                DrawCommand::SetIndexBuffer { buffer } => {
                    bound.index_buffer = Some(buffer);
                    continue;
                }
                DrawCommand::SetTopology(topology) => {
                    bound.topology = Some(topology);
                    continue;
                }
                DrawCommand::SetInputLayout(layout) => {
                    bound.layout = Some(layout);
                    continue;
                }
                DrawCommand::SetShader { stage, shader } => {
                    bound.set_shader(stage, shader);
                    continue;
                }
                DrawCommand::SetConstantBuffer { stage, slot, buffer } => {
                    match (stage, slot) {
                        (ShaderStage::Vertex, OBJECT_CONSTANTS_SLOT) => bound.object_constants = Some(buffer),
                        (ShaderStage::Pixel, LIGHT_CONSTANTS_SLOT) => bound.light_constants = Some(buffer),
                        _ => {}
                    }
                    continue;
                }
                DrawCommand::SetTexture { stage, slot, texture } => {
                    if stage == ShaderStage::Pixel && slot == DIFFUSE_TEXTURE_SLOT {
                        bound.texture = texture;
                    }
                    continue;
                }
                DrawCommand::ClearDepthStencil => {
                    segments.push(Vec::new());
                    continue;
                }
                DrawCommand::DrawIndexed { index_count } => (index_count, 1),
                DrawCommand::DrawIndexedInstanced { index_count, instance_count } => (index_count, instance_count),
            };

            match bound.draw(index_count, instance_count) {
                Ok(draw) => {
                    if let Some(segment) = segments.last_mut() {
                        segment.push(draw);
                    }
                }
                Err(reason) => skipped.push(reason),
            }
        }

        Self { segments, skipped }
    }

    pub fn draw_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Vertex;
    use crate::device::{BufferDesc, BufferUsage, NullDevice, RenderDevice};
    use crate::render::{CommandSink, DrawPass, RecordingSink};
    use crate::resources::{ConstantSlot, Drawable, ShaderSet};

    fn drawable(dev: &NullDevice, name: &str, geometry: bool) -> Drawable {
        let buffer = |usage| dev.create_buffer(&BufferDesc::empty("b", usage, 16)).unwrap();
        let shader = |stage| dev.create_shader(stage, "s", &[1]).unwrap();
        Drawable {
            name: name.into(),
            vertex_buffer: buffer(BufferUsage::Vertex),
            index_buffer: buffer(BufferUsage::Index),
            index_count: 6,
            topology: PrimitiveTopology::TriangleList,
            texture: None,
            shaders: ShaderSet {
                vertex: shader(ShaderStage::Vertex),
                hull: None,
                domain: None,
                geometry: geometry.then(|| shader(ShaderStage::Geometry)),
                pixel: shader(ShaderStage::Pixel),
                input_layout: dev.create_input_layout(&Vertex::LAYOUT, &[1]).unwrap(),
            },
            constants: ConstantSlot::Shared,
            instances: 1,
            clear_depth_after: false,
        }
    }

    #[test]
    fn recorded_passes_become_planned_draws() {
        let dev = NullDevice::new();
        let cb = dev.create_buffer(&BufferDesc::empty("cb", BufferUsage::Constant, 192)).unwrap();
        let lights = dev.create_buffer(&BufferDesc::empty("lights", BufferUsage::Constant, 416)).unwrap();
        let a = drawable(&dev, "a", false);
        let b = drawable(&dev, "b", false);

        let mut sink = RecordingSink::new();
        sink.submit(DrawCommand::UpdateConstants { buffer: cb, data: vec![0; 192] });
        DrawPass::new(&a, cb, lights).record(&mut sink);
        DrawPass::new(&b, cb, lights).record(&mut sink);

        let plan = FramePlan::from_commands(sink.commands());
        assert!(plan.skipped.is_empty());
        assert_eq!(plan.segments.len(), 1);
        assert_eq!(plan.draw_count(), 2);

        let first = &plan.segments[0][0];
        assert_eq!(first.vertex_buffer, a.vertex_buffer);
        assert_eq!(first.object_constants, cb);
        assert_eq!(first.light_constants, lights);
        assert_eq!(first.pipeline.stride, Vertex::STRIDE);
        assert_eq!(first.pipeline.vertex, a.shaders.vertex);
        assert_ne!(plan.segments[0][1].pipeline, first.pipeline);
    }

    #[test]
    fn depth_clear_starts_a_new_segment() {
        let dev = NullDevice::new();
        let cb = dev.create_buffer(&BufferDesc::empty("cb", BufferUsage::Constant, 192)).unwrap();
        let mut sky = drawable(&dev, "sky", false);
        sky.clear_depth_after = true;
        let rest = drawable(&dev, "rest", false);

        let mut sink = RecordingSink::new();
        DrawPass::new(&sky, cb, cb).record(&mut sink);
        DrawPass::new(&rest, cb, cb).record(&mut sink);

        let plan = FramePlan::from_commands(sink.commands());
        assert_eq!(plan.segments.iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 1]);
        assert_eq!(plan.segments[1][0].vertex_buffer, rest.vertex_buffer);
    }

    #[test]
    fn stages_without_a_wgpu_counterpart_are_skipped() {
        let dev = NullDevice::new();
        let cb = dev.create_buffer(&BufferDesc::empty("cb", BufferUsage::Constant, 192)).unwrap();
        let dome = drawable(&dev, "dome", true);
        let mut patches = drawable(&dev, "patches", false);
        patches.topology = PrimitiveTopology::PatchList3;
        let plain = drawable(&dev, "plain", false);

        let mut sink = RecordingSink::new();
        for d in [&dome, &patches, &plain] {
            DrawPass::new(d, cb, cb).record(&mut sink);
        }

        let plan = FramePlan::from_commands(sink.commands());
        assert_eq!(plan.skipped, vec![SkipReason::UnsupportedStage(ShaderStage::Geometry), SkipReason::PatchTopology]);
        assert_eq!(plan.draw_count(), 1);
        assert_eq!(plan.segments[0][0].index_buffer, plain.index_buffer);
    }

    #[test]
    fn draw_without_bindings_is_skipped() {
        let plan = FramePlan::from_commands(&[DrawCommand::DrawIndexed { index_count: 3 }]);
        assert_eq!(plan.skipped, vec![SkipReason::Unbound("topology")]);
        assert_eq!(plan.draw_count(), 0);
    }
}
