//! Drag-and-drop 3D model viewers.
//!
//! Two binaries share this library: `modelview-fp` (first-person camera,
//! unlit) and `modelview-lit` (orbital camera, four point lights, model
//! transform controls). Models and textures dropped on the window replace
//! the loaded ones; clicking the model toggles its selection.

pub mod config;
pub mod error;
pub mod mesh;
pub mod scene;
pub mod viewer;

pub use config::{Variant, ViewerConfig};
pub use error::{AssetError, ViewerError};
