use std::sync::Arc;

use glam::Mat4;

use crate::build::ReadinessGate;
use crate::resources::BuiltScene;
use crate::scene::{LightBuffer, LIGHT_COUNT};

use super::constants::{InstancedModelViewProjection, ModelViewProjection, MAX_INSTANCES};
use super::pass::DrawPass;
use super::{CommandSink, DrawCommand};

/// Per-frame inputs the orchestrator turns into constants.
#[derive(Debug, Copy, Clone)]
pub struct FrameState<'a> {
    /// Camera-to-world transform.
    pub camera_pose: Mat4,
    pub projection: Mat4,
    /// Model matrix of the shared constant buffer.
    pub model: Mat4,
    pub lights: &'a LightBuffer,
}

/// What one `render` call did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// Resources are not ready; nothing was submitted.
    NotReady,
    Rendered { passes: usize },
}

/// Issues the ordered draw passes over the built scene.
///
/// Returns immediately while the readiness gate is closed. Once it is open,
/// every frame rewrites all constant buffers in full and then records one
/// pass per drawable, in manifest order.
#[derive(Debug)]
pub struct FrameOrchestrator {
    gate: Arc<ReadinessGate>,
    shared: ModelViewProjection,
    instanced: InstancedModelViewProjection,
    skybox: ModelViewProjection,
    frames: u64,
}

impl FrameOrchestrator {
    pub fn new(gate: Arc<ReadinessGate>) -> Self {
        Self {
            gate,
            shared: ModelViewProjection::default(),
            instanced: InstancedModelViewProjection::default(),
            skybox: ModelViewProjection::default(),
            frames: 0,
        }
    }

    pub fn render(
        &mut self,
        scene: Option<&BuiltScene>,
        frame: &FrameState<'_>,
        sink: &mut dyn CommandSink,
    ) -> FrameOutcome {
        if !self.gate.is_open() {
            return FrameOutcome::NotReady;
        }
        let Some(scene) = scene else {
            log::warn!("readiness gate open without a published scene; skipping frame");
            return FrameOutcome::NotReady;
        };

        let view = frame.camera_pose.inverse();
        let eye = frame.camera_pose.w_axis.truncate();

        self.shared = ModelViewProjection { model: frame.model, view, projection: frame.projection };

        let mut models = [Mat4::IDENTITY; MAX_INSTANCES];
        for (model, light) in models.iter_mut().zip(&frame.lights.lights[..LIGHT_COUNT.min(MAX_INSTANCES)]) {
            *model = Mat4::from_translation(light.position.truncate());
        }
        self.instanced = InstancedModelViewProjection { model: models, view, projection: frame.projection };

        self.skybox = ModelViewProjection {
            model: Mat4::from_translation(eye),
            view,
            projection: frame.projection,
        };

        let c = &scene.constants;
        sink.submit(DrawCommand::UpdateConstants {
            buffer: c.shared,
            data: bytemuck::bytes_of(&self.shared).to_vec(),
        });
        if let Some(buffer) = c.instanced {
            sink.submit(DrawCommand::UpdateConstants {
                buffer,
                data: bytemuck::bytes_of(&self.instanced).to_vec(),
            });
        }
        if let Some(buffer) = c.skybox {
            sink.submit(DrawCommand::UpdateConstants {
                buffer,
                data: bytemuck::bytes_of(&self.skybox).to_vec(),
            });
        }
        sink.submit(DrawCommand::UpdateConstants {
            buffer: c.lights,
            data: bytemuck::bytes_of(frame.lights).to_vec(),
        });

        let mut passes = 0;
        for drawable in &scene.drawables {
            let Some(object) = c.slot(drawable.constants) else {
                log::warn!("drawable `{}` has no {:?} constant buffer; skipped", drawable.name, drawable.constants);
                continue;
            };
            DrawPass::new(drawable, object, c.lights).record(sink);
            passes += 1;
        }

        self.frames += 1;
        if self.frames == 1 {
            log::debug!("first frame rendered: {passes} passes");
        }
        FrameOutcome::Rendered { passes }
    }

    pub fn shared_constants(&self) -> &ModelViewProjection {
        &self.shared
    }

    pub fn instanced_constants(&self) -> &InstancedModelViewProjection {
        &self.instanced
    }

    pub fn skybox_constants(&self) -> &ModelViewProjection {
        &self.skybox
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}
