pub mod loader;
pub mod model;
pub mod texture;
pub mod vox;

pub use loader::{load_model, load_model_from_gltf, load_model_from_obj};
pub use model::{MaterialData, MeshData, MeshVertex, ModelData};
pub use texture::TextureData;
pub use vox::load_vox_from_bytes;
