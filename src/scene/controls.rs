//! Manual model transform: uniform scale plus self-centering tilt.

use nalgebra as na;

pub const SCALE_STEP: f32 = 0.1;

/// Per-axis push applied while a key is held, and the pull back toward zero
/// applied every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub push: f32,
    pub relax: f32,
}

pub const PITCH_SPRING: Spring = Spring {
    push: 0.6,
    relax: 0.3,
};
pub const YAW_SPRING: Spring = Spring {
    push: 1.0,
    relax: 0.5,
};
pub const ROLL_SPRING: Spring = Spring {
    push: 1.0,
    relax: 0.5,
};

/// Direction held on one axis this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Push {
    #[default]
    None,
    Positive,
    Negative,
}

/// Held tilt keys for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TiltInput {
    pub pitch: Push,
    pub yaw: Push,
    pub roll: Push,
}

/// Pitch/yaw/roll are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub scale: f32,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            scale: 1.0,
        }
    }
}

impl ModelTransform {
    /// Unclamped; scale may reach zero or go negative.
    pub fn adjust_scale(&mut self, steps: i32) {
        self.scale += steps as f32 * SCALE_STEP;
    }

    /// Apply one frame of push, then relax every axis toward zero.
    pub fn step(&mut self, input: TiltInput) {
        self.pitch = spring_step(self.pitch, input.pitch, PITCH_SPRING);
        self.yaw = spring_step(self.yaw, input.yaw, YAW_SPRING);
        self.roll = spring_step(self.roll, input.roll, ROLL_SPRING);
    }

    /// Rotation alone: X by pitch, then Y by yaw, then Z by roll.
    pub fn rotation(&self) -> na::Rotation3<f32> {
        na::Rotation3::from_euler_angles(
            self.pitch.to_radians(),
            self.yaw.to_radians(),
            self.roll.to_radians(),
        )
    }

    /// World matrix T(position) * S(scale) * R.
    pub fn matrix(&self, position: &na::Point3<f32>) -> na::Matrix4<f32> {
        na::Matrix4::new_translation(&position.coords)
            * na::Matrix4::new_scaling(self.scale)
            * self.rotation().to_homogeneous()
    }
}

fn spring_step(value: f32, push: Push, spring: Spring) -> f32 {
    let pushed = match push {
        Push::Positive => value + spring.push,
        Push::Negative => value - spring.push,
        Push::None => value,
    };
    relax(pushed, spring.relax)
}

/// Move `value` toward zero by `step` without crossing it.
fn relax(value: f32, step: f32) -> f32 {
    if value > 0.0 {
        (value - step).max(0.0)
    } else if value < 0.0 {
        (value + step).min(0.0)
    } else {
        0.0
    }
}
