use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a file on disk into CPU-side model or texture data.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse OBJ {path:?}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to import glTF {path:?}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to decode image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("malformed VOX data: {0}")]
    Vox(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("no decoder available for .{0} models")]
    NoDecoder(String),

    #[error("{0:?} contains no geometry")]
    Empty(PathBuf),
}

/// Failure while bringing up or driving the viewer window.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to load UI font: {0}")]
    Font(String),
}

pub type AssetResult<T> = Result<T, AssetError>;
