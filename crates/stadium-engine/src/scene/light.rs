use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

pub const LIGHT_COUNT: usize = 3;

/// Distance at which a step counts as having reached a bound.
const BOUND_EPSILON: f32 = 1e-4;

/// World axis an oscillator moves along.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn component(self, v: &mut Vec4) -> &mut f32 {
        match self {
            Axis::X => &mut v.x,
            Axis::Y => &mut v.y,
            Axis::Z => &mut v.z,
        }
    }
}

/// Bounded back-and-forth motion along one axis.
///
/// Moves by `step` per frame in the current direction and reverses on the
/// frame that reaches a bound.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Oscillator {
    pub axis: Axis,
    pub step: f32,
    pub lower: f32,
    pub upper: f32,
    pub advancing_positive: bool,
}

impl Oscillator {
    /// Symmetric range `[-extent, extent]`, starting towards the negative bound.
    pub const fn symmetric(axis: Axis, extent: f32, step: f32) -> Self {
        Self { axis, step, lower: -extent, upper: extent, advancing_positive: false }
    }

    /// Advances `position` one step.
    ///
    /// Returns the direction of this step (`1.0` or `-1.0`), taken before any
    /// reversal it triggers.
    pub fn advance(&mut self, position: &mut Vec4) -> f32 {
        let v = self.axis.component(position);

        if self.advancing_positive {
            *v += self.step;
            if *v >= self.upper - BOUND_EPSILON {
                if (*v - self.upper).abs() < BOUND_EPSILON {
                    *v = self.upper;
                }
                self.advancing_positive = false;
            }
            1.0
        } else {
            *v -= self.step;
            if *v <= self.lower + BOUND_EPSILON {
                if (*v - self.lower).abs() < BOUND_EPSILON {
                    *v = self.lower;
                }
                self.advancing_positive = true;
            }
            -1.0
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LightKind {
    Directional = 0,
    Point = 1,
    Spot = 2,
}

impl LightKind {
    pub const ALL: [LightKind; LIGHT_COUNT] = [LightKind::Directional, LightKind::Point, LightKind::Spot];
}

/// GPU layout of one light. Eight 16-byte registers.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
pub struct Light {
    pub position: Vec4,
    pub direction: Vec4,
    /// `x` = radius.
    pub radius: Vec4,
    pub color: Vec4,
    /// `x` = spot angle (radians), `y` constant, `z` linear, `w` quadratic.
    pub attenuation: Vec4,
    /// `x` = type index, `y` = enabled.
    pub type_enabled: Vec4,
    /// `x` = inner ratio, `y` = outer ratio.
    pub cone_ratio: Vec4,
    pub cone_angle: Vec4,
}

/// GPU layout of the light constant buffer. Rewritten in full every frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
pub struct LightBuffer {
    pub eye_position: Vec4,
    pub global_ambient: Vec4,
    pub lights: [Light; LIGHT_COUNT],
}

impl LightBuffer {
    pub const SIZE: u64 = std::mem::size_of::<LightBuffer>() as u64;
}

/// Owns the animated state of the directional, point and spot lights.
#[derive(Debug, Clone)]
pub struct LightAnimator {
    positions: [Vec4; LIGHT_COUNT],
    oscillators: [Oscillator; LIGHT_COUNT],
    colors: [Vec4; LIGHT_COUNT],
    enabled: [bool; LIGHT_COUNT],
    cone_base: Vec4,
    radius: f32,
    cone_ratio: (f32, f32),
    global_ambient: Vec4,
    buffer: LightBuffer,
}

impl Default for LightAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl LightAnimator {
    pub fn new() -> Self {
        Self {
            positions: [
                Vec4::new(-7.0, 5.0, 0.0, 1.0),
                Vec4::new(5.0, 1.0, 5.0, 1.0),
                Vec4::new(0.0, 2.0, 0.0, 1.0),
            ],
            oscillators: [
                Oscillator::symmetric(Axis::X, 15.0, 0.5),
                Oscillator::symmetric(Axis::X, 10.0, 0.2),
                Oscillator::symmetric(Axis::Z, 2.0, 0.1),
            ],
            colors: [
                Vec4::ONE,
                Vec4::new(0.0, 0.0, 1.0, 1.0),
                Vec4::new(1.0, 0.0, 0.0, 1.0),
            ],
            enabled: [true; LIGHT_COUNT],
            cone_base: Vec4::new(0.0, -1.0, 0.0, 0.0),
            radius: 10.0,
            cone_ratio: (0.8, 0.45),
            global_ambient: Vec4::ZERO,
            buffer: LightBuffer::default(),
        }
    }

    pub fn with_global_ambient(mut self, ambient: Vec4) -> Self {
        self.global_ambient = ambient;
        self
    }

    pub fn set_enabled(&mut self, kind: LightKind, enabled: bool) {
        self.enabled[kind as usize] = enabled;
    }

    /// Advances every light one step and rebuilds the light buffer.
    pub fn update(&mut self, eye_position: Vec3) -> &LightBuffer {
        self.buffer.eye_position = eye_position.extend(1.0);
        self.buffer.global_ambient = self.global_ambient;

        for kind in LightKind::ALL {
            let i = kind as usize;
            let sign = self.oscillators[i].advance(&mut self.positions[i]);

            let cone_angle = match kind {
                LightKind::Spot => self.cone_base + Vec4::new(0.0, 0.0, sign, 0.0),
                _ => Vec4::ZERO,
            };

            let position = self.positions[i];
            self.buffer.lights[i] = Light {
                position,
                direction: (-position.truncate()).normalize_or_zero().extend(0.0),
                radius: Vec4::new(self.radius, 0.0, 0.0, 0.0),
                color: self.colors[i],
                attenuation: Vec4::new(45f32.to_radians(), 1.0, 2.0, 0.0),
                type_enabled: Vec4::new(i as f32, if self.enabled[i] { 1.0 } else { 0.0 }, 0.0, 0.0),
                cone_ratio: Vec4::new(self.cone_ratio.0, self.cone_ratio.1, 0.0, 0.0),
                cone_angle,
            };
        }

        &self.buffer
    }

    pub fn buffer(&self) -> &LightBuffer {
        &self.buffer
    }

    pub fn position(&self, kind: LightKind) -> Vec4 {
        self.positions[kind as usize]
    }

    pub fn positions(&self) -> &[Vec4; LIGHT_COUNT] {
        &self.positions
    }

    pub fn oscillator(&self, kind: LightKind) -> &Oscillator {
        &self.oscillators[kind as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Light>(), 8 * 16);
        assert_eq!(LightBuffer::SIZE, 2 * 16 + 3 * 8 * 16);
    }

    #[test]
    fn point_light_flips_on_the_step_that_reaches_the_lower_bound() {
        let mut lights = LightAnimator::new();
        for _ in 0..74 {
            lights.update(Vec3::ZERO);
            assert!(!lights.oscillator(LightKind::Point).advancing_positive);
        }

        lights.update(Vec3::ZERO);
        assert_eq!(lights.position(LightKind::Point).x, -10.0);
        assert!(lights.oscillator(LightKind::Point).advancing_positive);

        lights.update(Vec3::ZERO);
        assert!((lights.position(LightKind::Point).x - -9.8).abs() < 1e-4);
    }

    #[test]
    fn directional_light_bounces_between_bounds() {
        let mut lights = LightAnimator::new();
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for _ in 0..200 {
            lights.update(Vec3::ZERO);
            let x = lights.position(LightKind::Directional).x;
            min = min.min(x);
            max = max.max(x);
        }
        assert_eq!(min, -15.0);
        assert_eq!(max, 15.0);
    }

    #[test]
    fn direction_always_points_at_the_origin() {
        let mut lights = LightAnimator::new();
        for _ in 0..300 {
            let buffer = *lights.update(Vec3::new(1.0, 2.0, 3.0));
            for light in &buffer.lights {
                let expected = (-light.position.truncate()).normalize();
                assert!(light.direction.truncate().abs_diff_eq(expected, 1e-5));
                assert_eq!(light.direction.w, 0.0);
            }
        }
    }

    #[test]
    fn spot_cone_follows_step_direction() {
        let mut lights = LightAnimator::new();
        // 0.0 -> -2.0 takes 20 steps moving negative; the 21st moves positive.
        for _ in 0..20 {
            let cone = lights.update(Vec3::ZERO).lights[2].cone_angle;
            assert_eq!(cone, Vec4::new(0.0, -1.0, -1.0, 0.0));
        }
        let cone = lights.update(Vec3::ZERO).lights[2].cone_angle;
        assert_eq!(cone, Vec4::new(0.0, -1.0, 1.0, 0.0));
    }

    #[test]
    fn constants_are_written_every_frame() {
        let mut lights = LightAnimator::new().with_global_ambient(Vec4::splat(0.1));
        lights.set_enabled(LightKind::Point, false);
        let buffer = *lights.update(Vec3::new(0.0, 0.7, -1.5));

        assert_eq!(buffer.eye_position, Vec4::new(0.0, 0.7, -1.5, 1.0));
        assert_eq!(buffer.global_ambient, Vec4::splat(0.1));
        for (i, light) in buffer.lights.iter().enumerate() {
            assert_eq!(light.type_enabled.x, i as f32);
            assert_eq!(light.radius.x, 10.0);
            assert_eq!(light.cone_ratio.truncate().truncate(), glam::Vec2::new(0.8, 0.45));
            assert_eq!(light.attenuation.y, 1.0);
        }
        assert_eq!(buffer.lights[1].type_enabled.y, 0.0);
        assert_eq!(buffer.lights[2].color, Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn custom_oscillator_reverses_at_upper_bound() {
        let mut osc = Oscillator { advancing_positive: true, ..Oscillator::symmetric(Axis::Y, 1.0, 0.5) };
        let mut p = Vec4::ZERO;
        assert_eq!(osc.advance(&mut p), 1.0);
        assert_eq!(osc.advance(&mut p), 1.0);
        assert_eq!(p.y, 1.0);
        assert!(!osc.advancing_positive);
        assert_eq!(osc.advance(&mut p), -1.0);
        assert_eq!(p.y, 0.5);
    }
}
