use nalgebra as na;
use std::path::{Path, PathBuf};
use winit::keyboard::KeyCode;

use crate::config::{Variant, ViewerConfig};
use crate::error::AssetResult;
use crate::scene::asset_kind::AssetKind;
use crate::scene::controls::{ModelTransform, Push, TiltInput};
use crate::scene::geometry::{BoundingBox, Ray};
use crate::scene::lights::Lighting;
use crate::scene::selection::Selection;
use crate::scene::store::AssetStore;
use crate::viewer::camera::{Camera, CameraMode};
use crate::viewer::input::FrameInput;

/// Lights 0..3 in order.
const LIGHT_KEYS: [KeyCode; 4] = [KeyCode::KeyY, KeyCode::KeyR, KeyCode::KeyG, KeyCode::KeyB];

/// What a drop event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Ignored,
    Model,
    Texture,
}

/// Everything one viewer window shows, independent of how it is drawn.
pub struct Session<S: AssetStore> {
    variant: Variant,
    camera: Camera,
    model: Option<S::Model>,
    texture: Option<S::Texture>,
    bounds: BoundingBox,
    position: na::Point3<f32>,
    transform: ModelTransform,
    selection: Selection,
    draw_model: bool,
    lighting: Option<Lighting>,
}

impl<S: AssetStore> Session<S> {
    /// Load the startup model and texture. Either failing is fatal.
    pub fn new(store: &mut S, config: &ViewerConfig) -> AssetResult<Self> {
        let mut model = store.load_model(&config.model_path)?;
        let texture = match store.load_texture(&config.texture_path) {
            Ok(texture) => texture,
            Err(e) => {
                store.release_model(model);
                return Err(e);
            }
        };
        store.bind_diffuse(&mut model, Some(&texture));
        let bounds = store.mesh_bounds(&model);

        let camera = Camera::new(
            config.camera_position,
            config.camera_target,
            config.camera_fovy,
            config.camera_mode(),
        );

        Ok(Self {
            variant: config.variant,
            camera,
            model: Some(model),
            texture: Some(texture),
            bounds,
            position: na::Point3::origin(),
            transform: ModelTransform::default(),
            selection: Selection::Idle,
            draw_model: true,
            lighting: (config.variant == Variant::Lit).then(Lighting::default),
        })
    }

    /// One frame of input handling: camera, drops, picking, then the
    /// lit viewer's light and transform keys.
    pub fn update(&mut self, store: &mut S, input: &FrameInput, dt: f32, viewport: (u32, u32)) {
        self.camera.update(input, dt);

        if !input.dropped().is_empty() {
            match self.handle_drop(store, input.dropped()) {
                DropOutcome::Model => log::info!(
                    "Model slot updated ({}), bounds {:?}..{:?}",
                    if self.model.is_some() { "loaded" } else { "empty" },
                    self.bounds.min,
                    self.bounds.max
                ),
                DropOutcome::Texture => log::info!(
                    "Texture slot updated ({})",
                    if self.texture.is_some() { "loaded" } else { "empty" }
                ),
                DropOutcome::Ignored => {}
            }
        }

        if input.left_clicked() {
            let screen = match self.camera.mode() {
                // Cursor is locked; aim through the crosshair.
                CameraMode::FirstPerson => {
                    na::Point2::new(viewport.0 as f32 / 2.0, viewport.1 as f32 / 2.0)
                }
                CameraMode::Orbital => input.cursor().unwrap_or_else(na::Point2::origin),
            };
            let ray = self.camera.screen_to_world_ray(screen, viewport);
            self.handle_click(&ray);
        }

        if self.variant == Variant::Lit {
            self.handle_lit_keys(input);
        }
    }

    /// Swap in a dropped model or texture. Anything but exactly one file
    /// with a known extension is ignored.
    pub fn handle_drop(&mut self, store: &mut S, paths: &[PathBuf]) -> DropOutcome {
        let [path] = paths else {
            log::debug!("Ignoring drop of {} files", paths.len());
            return DropOutcome::Ignored;
        };

        match AssetKind::classify(path) {
            Some(AssetKind::Model) => {
                self.replace_model(store, path);
                DropOutcome::Model
            }
            Some(AssetKind::Texture) => {
                self.replace_texture(store, path);
                DropOutcome::Texture
            }
            None => {
                log::debug!("Ignoring dropped file {:?}", path);
                DropOutcome::Ignored
            }
        }
    }

    fn replace_model(&mut self, store: &mut S, path: &Path) {
        if let Some(old) = self.model.take() {
            store.release_model(old);
        }

        match store.load_model(path) {
            Ok(mut model) => {
                store.bind_diffuse(&mut model, self.texture.as_ref());
                self.bounds = store.mesh_bounds(&model);
                self.model = Some(model);
            }
            Err(e) => {
                log::error!("Failed to load model {:?}: {}", path, e);
                self.bounds = BoundingBox::default();
            }
        }
    }

    fn replace_texture(&mut self, store: &mut S, path: &Path) {
        if let Some(old) = self.texture.take() {
            store.release_texture(old);
        }

        self.texture = match store.load_texture(path) {
            Ok(texture) => Some(texture),
            Err(e) => {
                log::error!("Failed to load texture {:?}: {}", path, e);
                None
            }
        };

        if let Some(model) = self.model.as_mut() {
            store.bind_diffuse(model, self.texture.as_ref());
        }
    }

    /// Test `ray` against the model bounds and update the selection.
    /// Returns whether it hit. An empty model slot is never hit.
    pub fn handle_click(&mut self, ray: &Ray) -> bool {
        let hit = self.model.is_some() && self.bounds.intersect_ray(ray).is_some();
        let next = self.selection.on_click(hit);
        if next != self.selection {
            log::debug!("Selection: {:?} -> {:?}", self.selection, next);
        }
        self.selection = next;
        hit
    }

    fn handle_lit_keys(&mut self, input: &FrameInput) {
        if let Some(lighting) = self.lighting.as_mut() {
            for (index, key) in LIGHT_KEYS.iter().enumerate() {
                if input.was_pressed(*key) {
                    lighting.toggle(index);
                }
            }
        }

        if input.was_pressed(KeyCode::KeyD) {
            self.draw_model = !self.draw_model;
            log::debug!("Model visible: {}", self.draw_model);
        }
        if input.was_pressed(KeyCode::KeyQ) {
            self.transform.adjust_scale(1);
        }
        if input.was_pressed(KeyCode::KeyA) {
            self.transform.adjust_scale(-1);
        }

        let axis = |positive: KeyCode, negative: KeyCode| {
            if input.is_down(positive) {
                Push::Positive
            } else if input.is_down(negative) {
                Push::Negative
            } else {
                Push::None
            }
        };
        self.transform.step(TiltInput {
            pitch: axis(KeyCode::ArrowDown, KeyCode::ArrowUp),
            yaw: axis(KeyCode::KeyX, KeyCode::KeyZ),
            roll: axis(KeyCode::ArrowRight, KeyCode::ArrowLeft),
        });
    }

    /// Release whatever is still loaded.
    pub fn shutdown(mut self, store: &mut S) {
        if let Some(model) = self.model.take() {
            store.release_model(model);
        }
        if let Some(texture) = self.texture.take() {
            store.release_texture(texture);
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn model(&self) -> Option<&S::Model> {
        self.model.as_ref()
    }

    pub fn texture(&self) -> Option<&S::Texture> {
        self.texture.as_ref()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn is_selected(&self) -> bool {
        self.selection.is_selected()
    }

    pub fn draw_model(&self) -> bool {
        self.draw_model
    }

    pub fn transform(&self) -> &ModelTransform {
        &self.transform
    }

    pub fn lighting(&self) -> Option<&Lighting> {
        self.lighting.as_ref()
    }

    /// World matrix the model is drawn with.
    pub fn model_matrix(&self) -> na::Matrix4<f32> {
        self.transform.matrix(&self.position)
    }
}
