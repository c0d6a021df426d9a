//! Point lights for the lit viewer and their GPU-side layout.

use bytemuck::{Pod, Zeroable};
use nalgebra as na;

use super::palette::{self, Rgba8};

pub const MAX_LIGHTS: usize = 4;

/// Discriminants match the `kind` values `mesh.wgsl` checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Point = 1,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub enabled: bool,
    pub position: na::Point3<f32>,
    pub target: na::Point3<f32>,
    pub color: Rgba8,
}

impl Light {
    pub fn point(position: na::Point3<f32>, color: Rgba8) -> Self {
        Self {
            kind: LightKind::Point,
            enabled: true,
            position,
            target: na::Point3::origin(),
            color,
        }
    }

    pub fn uniform(&self) -> LightUniform {
        LightUniform {
            position: self.position.to_homogeneous().into(),
            target: self.target.to_homogeneous().into(),
            color: palette::linear(self.color),
            enabled: self.enabled as u32,
            kind: self.kind as u32,
            _padding: [0; 2],
        }
    }
}

/// Matches `Light` in `mesh.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub target: [f32; 4],
    pub color: [f32; 4],
    pub enabled: u32,
    pub kind: u32,
    pub _padding: [u32; 2],
}

/// The fixed set of lights plus the ambient term.
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub lights: [Light; MAX_LIGHTS],
    pub ambient: [f32; 4],
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            lights: [
                Light::point(na::Point3::new(-2.0, 1.0, -2.0), palette::YELLOW),
                Light::point(na::Point3::new(2.0, 1.0, 2.0), palette::RED),
                Light::point(na::Point3::new(-2.0, 1.0, 2.0), palette::GREEN),
                Light::point(na::Point3::new(2.0, 1.0, -2.0), palette::BLUE),
            ],
            ambient: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl Lighting {
    /// Flip light `index`; out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let light = self.lights.get_mut(index)?;
        light.enabled = !light.enabled;
        log::debug!(
            "Light {} {}",
            index,
            if light.enabled { "on" } else { "off" }
        );
        Some(light.enabled)
    }

    pub fn uniforms(&self) -> [LightUniform; MAX_LIGHTS] {
        self.lights.map(|l| l.uniform())
    }

    pub fn enabled_count(&self) -> usize {
        self.lights.iter().filter(|l| l.enabled).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_uniform_is_four_vec4s() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 64);
    }

    #[test]
    fn default_rig_is_four_enabled_point_lights() {
        let lighting = Lighting::default();
        assert_eq!(lighting.enabled_count(), 4);
        assert!(lighting.lights.iter().all(|l| l.kind == LightKind::Point));
        assert_eq!(lighting.lights[1].position, na::Point3::new(2.0, 1.0, 2.0));
        assert_eq!(lighting.uniforms()[0].position, [-2.0, 1.0, -2.0, 1.0]);
    }

    #[test]
    fn toggle_flips_only_one_light() {
        let mut lighting = Lighting::default();
        assert_eq!(lighting.toggle(2), Some(false));
        assert_eq!(lighting.uniforms()[2].enabled, 0);
        assert_eq!(lighting.enabled_count(), 3);
        assert_eq!(lighting.toggle(2), Some(true));
        assert_eq!(lighting.toggle(9), None);
    }
}
