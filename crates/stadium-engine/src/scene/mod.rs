//! Per-frame scene state: the camera pose and the three animated lights.

mod camera;
mod light;

pub use camera::CameraController;
pub use light::{Axis, Light, LightAnimator, LightBuffer, LightKind, Oscillator, LIGHT_COUNT};
