use std::path::Path;

use crate::error::AssetResult;
use crate::scene::geometry::BoundingBox;

/// Owner of loaded model and texture resources.
///
/// The session only ever holds the opaque handles; creating, binding and
/// freeing the resources behind them goes through this trait. Handles are
/// moved into `release_*`, so a released handle cannot be used again.
pub trait AssetStore {
    type Model;
    type Texture;

    fn load_model(&mut self, path: &Path) -> AssetResult<Self::Model>;

    fn load_texture(&mut self, path: &Path) -> AssetResult<Self::Texture>;

    fn release_model(&mut self, model: Self::Model);

    fn release_texture(&mut self, texture: Self::Texture);

    /// Bind `texture` into the diffuse slot of the model's primary material.
    /// `None` restores the 1x1 white fallback.
    fn bind_diffuse(&mut self, model: &mut Self::Model, texture: Option<&Self::Texture>);

    /// Bounds of the model's first mesh in object space.
    fn mesh_bounds(&self, model: &Self::Model) -> BoundingBox;
}
