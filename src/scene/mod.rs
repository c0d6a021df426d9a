//! Window-free session state: what is loaded, what is selected and how the
//! model and lights are set up. Everything here runs without a GPU.

pub mod asset_kind;
pub mod controls;
pub mod geometry;
pub mod lights;
pub mod palette;
pub mod selection;
pub mod session;
pub mod store;

pub use asset_kind::AssetKind;
pub use controls::ModelTransform;
pub use geometry::{BoundingBox, Ray, RayHit};
pub use lights::{Light, LightKind, Lighting};
pub use selection::Selection;
pub use session::{DropOutcome, Session};
pub use store::AssetStore;
