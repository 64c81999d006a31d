use std::f32::consts::TAU;
use std::sync::Arc;

use glam::{Mat4, Vec4};

use crate::build::BuildError;
use crate::config::RendererConfig;
use crate::input::InputSnapshot;
use crate::resources::{BuildTicket, BuiltScene, ResourceBuilder};
use crate::scene::{CameraController, LightAnimator};
use crate::time::FrameTime;

use super::{CommandSink, FrameOrchestrator, FrameOutcome, FrameState};

/// Left-handed perspective for a `width` x `height` output.
///
/// Portrait outputs get twice the field of view. Returns `None` for an empty
/// output.
pub fn projection(config: &RendererConfig, width: u32, height: u32) -> Option<Mat4> {
    if width == 0 || height == 0 {
        return None;
    }
    let aspect = width as f32 / height as f32;
    let mut fov = config.fov_y_degrees.to_radians();
    if aspect < 1.0 {
        fov *= 2.0;
    }
    Some(Mat4::perspective_lh(fov, aspect, config.near, config.far))
}

/// Scene renderer: owns the resource build, the camera, the lights and the
/// frame orchestrator.
///
/// Call `update` then `render` once per frame on the same thread.
pub struct Renderer {
    config: RendererConfig,
    resources: ResourceBuilder,
    camera: CameraController,
    lights: LightAnimator,
    orchestrator: FrameOrchestrator,
    projection: Mat4,
    model: Mat4,
    output_width: u32,
    tracking: bool,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("resources", &self.resources)
            .field("tracking", &self.tracking)
            .field("frames", &self.orchestrator.frames_rendered())
            .finish()
    }
}

impl Renderer {
    pub fn new(config: RendererConfig, resources: ResourceBuilder) -> Self {
        let orchestrator = FrameOrchestrator::new(resources.gate());
        let lights = LightAnimator::new().with_global_ambient(Vec4::from_array(config.global_ambient));
        let projection = projection(&config, config.width, config.height).unwrap_or(Mat4::IDENTITY);

        Self {
            camera: CameraController::new(config.move_speed, config.rot_speed),
            lights,
            orchestrator,
            projection,
            model: Mat4::IDENTITY,
            output_width: config.width,
            tracking: false,
            resources,
            config,
        }
    }

    /// Submits the device-dependent build. Rendering starts once it completes.
    pub fn create_device_resources(&self) -> Result<BuildTicket, BuildError> {
        self.resources.build()
    }

    pub fn release_device_resources(&self) {
        self.resources.release();
    }

    pub fn handle_device_lost(&self) -> Result<BuildTicket, BuildError> {
        self.resources.rebuild()
    }

    /// Recomputes the projection for a new output size.
    pub fn resize(&mut self, width: u32, height: u32) {
        match projection(&self.config, width, height) {
            Some(p) => {
                self.projection = p;
                self.output_width = width;
            }
            None => log::warn!("ignoring resize to {width}x{height}"),
        }
    }

    /// Advances model rotation, camera and lights by one frame.
    pub fn update(&mut self, time: &FrameTime, input: &InputSnapshot) {
        if !self.tracking {
            let radians = if self.config.idle_rotation {
                let total = time.total * f64::from(self.config.degrees_per_second.to_radians());
                (total % f64::from(TAU)) as f32
            } else {
                0.0
            };
            self.rotate(radians);
        }

        self.camera.update(time.dt, input);
        self.lights.update(self.camera.eye_position());
    }

    /// Records this frame's commands. A no-op until the build has completed.
    pub fn render(&mut self, sink: &mut dyn CommandSink) -> FrameOutcome {
        if !self.resources.is_ready() {
            return FrameOutcome::NotReady;
        }
        let scene: Option<Arc<BuiltScene>> = self.resources.scene();
        let frame = FrameState {
            camera_pose: self.camera.pose(),
            projection: self.projection,
            model: self.model,
            lights: self.lights.buffer(),
        };
        self.orchestrator.render(scene.as_deref(), &frame, sink)
    }

    pub fn start_tracking(&mut self) {
        self.tracking = true;
    }

    /// While tracking, the pointer's horizontal position spins the model
    /// two full turns across the output width.
    pub fn tracking_update(&mut self, x: f32) {
        if self.tracking && self.output_width > 0 {
            self.rotate(TAU * 2.0 * x / self.output_width as f32);
        }
    }

    pub fn stop_tracking(&mut self) {
        self.tracking = false;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    fn rotate(&mut self, radians: f32) {
        self.model = Mat4::from_rotation_y(radians);
    }

    pub fn resources(&self) -> &ResourceBuilder {
        &self.resources
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    pub fn lights(&self) -> &LightAnimator {
        &self.lights
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portrait_doubles_the_field_of_view() {
        let config = RendererConfig::default();
        let landscape = projection(&config, 1600, 900).unwrap();
        let portrait = projection(&config, 900, 1600).unwrap();
        // y scale is 1 / tan(fov / 2)
        let y_scale = |m: Mat4| m.y_axis.y;
        assert!((y_scale(landscape) - 1.0 / 35f32.to_radians().tan()).abs() < 1e-5);
        assert!((y_scale(portrait) - 1.0 / 70f32.to_radians().tan()).abs() < 1e-5);
        assert!(projection(&config, 0, 10).is_none());
    }
}
