//! Renderer configuration.

/// Tunables for camera motion, projection and the idle model rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Camera translation speed, units per second.
    pub move_speed: f32,
    /// Camera rotation speed, radians per pixel per second.
    pub rot_speed: f32,
    /// Vertical field of view in degrees; doubled for portrait viewports.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial output size in pixels.
    pub width: u32,
    pub height: u32,
    /// Spin the shared model matrix about Y while not tracking the pointer.
    pub idle_rotation: bool,
    pub degrees_per_second: f32,
    pub global_ambient: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            rot_speed: 0.75,
            fov_y_degrees: 70.0,
            near: 0.01,
            far: 100.0,
            width: 1280,
            height: 720,
            idle_rotation: false,
            degrees_per_second: 45.0,
            global_ambient: [0.0; 4],
        }
    }
}
