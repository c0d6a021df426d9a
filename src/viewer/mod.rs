//! Window, GPU and input plumbing around a [`Session`](crate::scene::Session).

pub mod app;
pub mod camera;
pub mod gpu;
pub mod gpu_store;
pub mod input;
pub mod primitives;
pub mod scene_renderer;
pub mod timing;
pub mod ui_renderer;

pub use app::run;
pub use camera::{Camera, CameraMode};
pub use gpu::GpuState;
pub use gpu_store::{GpuAssetStore, GpuModel, GpuTexture};
pub use input::FrameInput;
pub use timing::FrameTimer;
