use glam::{Mat4, Vec3};

use crate::input::{InputSnapshot, PointerSample};

const KEY_FORWARD: u8 = b'W';
const KEY_BACK: u8 = b'S';
const KEY_LEFT: u8 = b'A';
const KEY_RIGHT: u8 = b'D';
const KEY_DOWN: u8 = b'X';
const KEY_UP: u8 = 0x20;

/// Key bindings in the order they are applied, with their local-space unit move.
const MOVES: [(u8, Vec3); 6] = [
    (KEY_FORWARD, Vec3::Z),
    (KEY_BACK, Vec3::NEG_Z),
    (KEY_LEFT, Vec3::NEG_X),
    (KEY_RIGHT, Vec3::X),
    (KEY_DOWN, Vec3::NEG_Y),
    (KEY_UP, Vec3::Y),
];

/// Free-flight camera driven by held keys and secondary-button drags.
///
/// The pose is camera-to-world in a left-handed frame; the view matrix is its
/// inverse. Moves are applied in camera space, so "forward" follows the
/// current heading.
#[derive(Debug, Clone)]
pub struct CameraController {
    pose: Mat4,
    move_speed: f32,
    rot_speed: f32,
    previous: Option<PointerSample>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(10.0, 0.75)
    }
}

impl CameraController {
    pub const DEFAULT_EYE: Vec3 = Vec3::new(0.0, 0.7, -1.5);
    pub const DEFAULT_TARGET: Vec3 = Vec3::new(0.0, -0.1, 0.0);

    pub fn new(move_speed: f32, rot_speed: f32) -> Self {
        Self {
            pose: Self::initial_pose(),
            move_speed,
            rot_speed,
            previous: None,
        }
    }

    /// Camera placed at the default eye, looking at the default target.
    pub fn initial_pose() -> Mat4 {
        Mat4::look_at_lh(Self::DEFAULT_EYE, Self::DEFAULT_TARGET, Vec3::Y).inverse()
    }

    pub fn reset(&mut self) {
        self.pose = Self::initial_pose();
        self.previous = None;
    }

    /// Integrates one frame of input into the pose.
    pub fn update(&mut self, dt: f32, input: &InputSnapshot) {
        let distance = self.move_speed * dt;
        for (code, dir) in MOVES {
            if input.keys.is_down(code) {
                self.pose *= Mat4::from_translation(dir * distance);
            }
        }

        if let (Some(current), Some(previous)) = (input.pointer, self.previous) {
            if current.buttons.secondary {
                let dx = current.x - previous.x;
                let dy = current.y - previous.y;
                self.rotate(dy * self.rot_speed * dt, dx * self.rot_speed * dt);
            }
        }

        // An absent sample clears the previous one too.
        self.previous = input.pointer;
    }

    /// Pitches about the camera's local X axis, then yaws about world Y,
    /// keeping the camera where it is.
    fn rotate(&mut self, pitch: f32, yaw: f32) {
        let translation = self.pose.w_axis;
        self.pose.w_axis = glam::Vec4::W;

        self.pose = Mat4::from_rotation_y(yaw) * self.pose * Mat4::from_rotation_x(pitch);

        self.pose.w_axis = translation;
    }

    #[inline]
    pub fn pose(&self) -> Mat4 {
        self.pose
    }

    pub fn set_pose(&mut self, pose: Mat4) {
        self.pose = pose;
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        self.pose.inverse()
    }

    #[inline]
    pub fn eye_position(&self) -> Vec3 {
        self.pose.w_axis.truncate()
    }

    pub fn previous_sample(&self) -> Option<PointerSample> {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyTable;

    fn keys(held: &[u8]) -> InputSnapshot {
        let mut table = KeyTable::new();
        for code in held {
            table.set(*code, true);
        }
        InputSnapshot::new(table, None)
    }

    fn drag(x: f32, y: f32) -> InputSnapshot {
        InputSnapshot::new(KeyTable::new(), Some(PointerSample::new(x, y).with_secondary(true)))
    }

    #[test]
    fn initial_pose_sits_at_the_default_eye() {
        let cam = CameraController::default();
        assert!(cam.eye_position().abs_diff_eq(CameraController::DEFAULT_EYE, 1e-6));

        let forward = cam.pose().z_axis.truncate();
        let expected = (CameraController::DEFAULT_TARGET - CameraController::DEFAULT_EYE).normalize();
        assert!(forward.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn no_input_leaves_the_pose_untouched() {
        let mut cam = CameraController::default();
        let before = cam.pose();
        for _ in 0..10 {
            cam.update(0.016, &InputSnapshot::default());
        }
        assert_eq!(cam.pose(), before);
    }

    #[test]
    fn forward_moves_along_the_view_direction() {
        let mut cam = CameraController::default();
        let start = cam.eye_position();
        let forward = cam.pose().z_axis.truncate();

        cam.update(0.1, &keys(&[b'W']));
        assert!(cam.eye_position().abs_diff_eq(start + forward, 1e-5));
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut cam = CameraController::default();
        let before = cam.pose();
        cam.update(0.05, &keys(&[b'W', b'S', b'A', b'D', b'X', 0x20]));
        assert!(cam.pose().abs_diff_eq(before, 1e-5));
    }

    #[test]
    fn space_and_x_move_along_local_y() {
        let mut cam = CameraController::default();
        let start = cam.eye_position();
        let up = cam.pose().y_axis.truncate();
        cam.update(0.1, &keys(&[0x20]));
        assert!(cam.eye_position().abs_diff_eq(start + up, 1e-5));
    }

    #[test]
    fn first_drag_sample_only_primes_the_previous_sample() {
        let mut cam = CameraController::default();
        let before = cam.pose();
        cam.update(0.1, &drag(10.0, 10.0));
        assert_eq!(cam.pose(), before);
        assert_eq!(cam.previous_sample().map(|s| (s.x, s.y)), Some((10.0, 10.0)));
    }

    #[test]
    fn drag_pitches_locally_then_yaws_globally_and_keeps_translation() {
        let mut cam = CameraController::new(10.0, 1.0);
        let start = cam.pose();
        cam.update(0.5, &drag(0.0, 0.0));
        cam.update(0.5, &drag(0.4, 0.2));

        let (pitch, yaw) = (0.2 * 0.5, 0.4 * 0.5);
        let mut rot = start;
        rot.w_axis = glam::Vec4::W;
        let mut expected = Mat4::from_rotation_y(yaw) * rot * Mat4::from_rotation_x(pitch);
        expected.w_axis = start.w_axis;

        assert!(cam.pose().abs_diff_eq(expected, 1e-5));
        assert_eq!(cam.eye_position(), start.w_axis.truncate());

        // The reverse order gives a different orientation.
        let mut swapped = Mat4::from_rotation_x(pitch) * rot * Mat4::from_rotation_y(yaw);
        swapped.w_axis = start.w_axis;
        assert!(!cam.pose().abs_diff_eq(swapped, 1e-4));
    }

    #[test]
    fn drag_without_secondary_button_does_not_rotate() {
        let mut cam = CameraController::default();
        let before = cam.pose();
        let hover = |x| InputSnapshot::new(KeyTable::new(), Some(PointerSample::new(x, 0.0)));
        cam.update(0.1, &hover(0.0));
        cam.update(0.1, &hover(50.0));
        assert_eq!(cam.pose(), before);
        assert_eq!(cam.previous_sample().map(|s| s.x), Some(50.0));
    }

    #[test]
    fn missing_sample_clears_the_previous_one() {
        let mut cam = CameraController::default();
        cam.update(0.1, &drag(3.0, 4.0));
        cam.update(0.1, &InputSnapshot::default());
        assert!(cam.previous_sample().is_none());
    }

    #[test]
    fn fresh_sample_after_a_gap_does_not_rotate() {
        let mut cam = CameraController::default();
        cam.update(0.1, &drag(0.0, 0.0));
        cam.update(0.1, &InputSnapshot::default());
        let before = cam.pose();

        cam.update(0.1, &drag(500.0, 300.0));
        assert_eq!(cam.pose(), before);
        assert_eq!(cam.previous_sample().map(|s| (s.x, s.y)), Some((500.0, 300.0)));
    }

    #[test]
    fn view_is_the_inverse_pose() {
        let cam = CameraController::default();
        let view = cam.view();
        let expected = Mat4::look_at_lh(
            CameraController::DEFAULT_EYE,
            CameraController::DEFAULT_TARGET,
            Vec3::Y,
        );
        assert!(view.abs_diff_eq(expected, 1e-5));
    }
}
