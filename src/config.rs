//! Compile-time viewer settings. Each binary picks one preset; nothing here
//! is read from flags or files.

use nalgebra as na;
use std::path::PathBuf;

use crate::viewer::camera::CameraMode;

pub const WINDOW_WIDTH: u32 = 1280;
pub const WINDOW_HEIGHT: u32 = 720;
pub const TARGET_FPS: u32 = 60;
pub const MSAA_SAMPLES: u32 = 4;

pub const STARTUP_MODEL: &str = "assets/obj/cottage_obj.obj";
pub const STARTUP_TEXTURE: &str = "assets/textures/cottage_diffuse.png";

/// Which of the two viewer programs is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// First-person camera, unlit textured model.
    FirstPerson,
    /// Orbital camera, four point lights and transform controls.
    Lit,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub variant: Variant,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    pub msaa_samples: u32,
    pub model_path: PathBuf,
    pub texture_path: PathBuf,
    pub camera_position: na::Point3<f32>,
    pub camera_target: na::Point3<f32>,
    pub camera_fovy: f32,
}

impl ViewerConfig {
    fn base(variant: Variant, title: &str) -> Self {
        Self {
            variant,
            title: title.to_string(),
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            target_fps: TARGET_FPS,
            msaa_samples: MSAA_SAMPLES,
            model_path: PathBuf::from(STARTUP_MODEL),
            texture_path: PathBuf::from(STARTUP_TEXTURE),
            camera_position: na::Point3::new(20.0, 10.0, 20.0),
            camera_target: na::Point3::origin(),
            camera_fovy: 45.0,
        }
    }

    pub fn first_person() -> Self {
        Self::base(Variant::FirstPerson, "modelview - first person")
    }

    pub fn lit() -> Self {
        Self::base(Variant::Lit, "modelview - lights")
    }

    pub fn camera_mode(&self) -> CameraMode {
        match self.variant {
            Variant::FirstPerson => CameraMode::FirstPerson,
            Variant::Lit => CameraMode::Orbital,
        }
    }

    /// One-line controls hint drawn at the bottom of the window.
    pub fn controls_hint(&self) -> &'static str {
        match self.variant {
            Variant::FirstPerson => {
                "Drag & drop model/texture | WASD: move | Mouse: look | Click: select | ESC: exit"
            }
            Variant::Lit => {
                "Drag & drop model/texture | Y/R/G/B: lights | D: model | Q/A: scale | Arrows, Z/X: tilt | ESC: exit"
            }
        }
    }
}
