use nalgebra as na;
use winit::keyboard::KeyCode;

use super::input::FrameInput;
use crate::scene::geometry::Ray;

/// World units per second for first-person movement.
const MOVE_SPEED: f32 = 5.4;
/// Radians per pixel of mouse motion.
const MOUSE_SENSITIVITY: f32 = 0.003;
/// Radians per frame while an arrow key is held.
const KEY_ROTATION_SPEED: f32 = 0.03;
/// Radians per second around the target in orbital mode.
const ORBITAL_SPEED: f32 = 0.5;
const MIN_TARGET_DISTANCE: f32 = 0.001;
/// Keeps pitch just short of the poles so the view never flips.
const PITCH_MARGIN: f32 = 0.001;

const Z_NEAR: f32 = 0.01;
const Z_FAR: f32 = 1000.0;

/// nalgebra builds OpenGL clip space (z in -1..1); wgpu wants 0..1.
#[rustfmt::skip]
fn opengl_to_wgpu() -> na::Matrix4<f32> {
    na::Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Mouse look, WASD moves in the ground plane.
    FirstPerson,
    /// Circles the target on its own; the wheel zooms.
    Orbital,
}

/// Perspective camera driven by one fixed control mode.
#[derive(Debug, Clone)]
pub struct Camera {
    position: na::Point3<f32>,
    target: na::Point3<f32>,
    up: na::Vector3<f32>,
    /// Vertical field of view in degrees.
    fovy: f32,
    mode: CameraMode,
}

impl Camera {
    pub fn new(
        position: na::Point3<f32>,
        target: na::Point3<f32>,
        fovy: f32,
        mode: CameraMode,
    ) -> Self {
        Self {
            position,
            target,
            up: na::Vector3::y(),
            fovy,
            mode,
        }
    }

    /// Advance one frame of `dt` seconds.
    pub fn update(&mut self, input: &FrameInput, dt: f32) {
        match self.mode {
            CameraMode::FirstPerson => self.update_first_person(input, dt),
            CameraMode::Orbital => self.update_orbital(input, dt),
        }
    }

    fn update_first_person(&mut self, input: &FrameInput, dt: f32) {
        let delta = input.mouse_delta();
        self.yaw(-delta.x * MOUSE_SENSITIVITY);
        self.pitch(-delta.y * MOUSE_SENSITIVITY);

        if input.is_down(KeyCode::ArrowDown) {
            self.pitch(-KEY_ROTATION_SPEED);
        }
        if input.is_down(KeyCode::ArrowUp) {
            self.pitch(KEY_ROTATION_SPEED);
        }
        if input.is_down(KeyCode::ArrowRight) {
            self.yaw(-KEY_ROTATION_SPEED);
        }
        if input.is_down(KeyCode::ArrowLeft) {
            self.yaw(KEY_ROTATION_SPEED);
        }

        let step = MOVE_SPEED * dt;
        let mut forward = 0.0;
        let mut right = 0.0;
        if input.is_down(KeyCode::KeyW) {
            forward += step;
        }
        if input.is_down(KeyCode::KeyS) {
            forward -= step;
        }
        if input.is_down(KeyCode::KeyD) {
            right += step;
        }
        if input.is_down(KeyCode::KeyA) {
            right -= step;
        }
        if forward != 0.0 || right != 0.0 {
            self.move_in_ground_plane(forward, right);
        }
    }

    fn update_orbital(&mut self, input: &FrameInput, dt: f32) {
        let rotation = na::Rotation3::from_axis_angle(
            &na::Unit::new_normalize(self.up),
            ORBITAL_SPEED * dt,
        );
        let offset = rotation * (self.position - self.target);
        self.position = self.target + offset;

        let wheel = input.wheel();
        if wheel != 0.0 {
            self.move_to_target(-wheel);
        }
    }

    fn forward(&self) -> na::Vector3<f32> {
        (self.target - self.position).normalize()
    }

    fn right(&self) -> na::Vector3<f32> {
        self.forward().cross(&self.up).normalize()
    }

    /// Turn around the up axis, keeping the position.
    fn yaw(&mut self, angle: f32) {
        if angle == 0.0 {
            return;
        }
        let rotation = na::Rotation3::from_axis_angle(&na::Unit::new_normalize(self.up), angle);
        self.target = self.position + rotation * (self.target - self.position);
    }

    /// Look up (positive) or down, never past straight up or down.
    fn pitch(&mut self, angle: f32) {
        if angle == 0.0 {
            return;
        }
        let view = self.target - self.position;
        let up = self.up.normalize();
        let max_up = up.angle(&view) - PITCH_MARGIN;
        let max_down = -((-up).angle(&view) - PITCH_MARGIN);
        let angle = angle.min(max_up).max(max_down);

        let axis = na::Unit::new_normalize(self.right());
        let rotation = na::Rotation3::from_axis_angle(&axis, angle);
        self.target = self.position + rotation * view;
    }

    /// Move along the view direction and its right vector projected onto
    /// the XZ plane, so height never changes.
    fn move_in_ground_plane(&mut self, forward: f32, right: f32) {
        let flatten = |v: na::Vector3<f32>| {
            na::Vector3::new(v.x, 0.0, v.z)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(na::Vector3::zeros)
        };
        let offset = flatten(self.forward()) * forward + flatten(self.right()) * right;
        self.position += offset;
        self.target += offset;
    }

    /// Change the distance to the target by `delta`, never closer than
    /// `MIN_TARGET_DISTANCE`.
    fn move_to_target(&mut self, delta: f32) {
        let mut distance = (self.target - self.position).norm() + delta;
        if distance <= 0.0 {
            distance = MIN_TARGET_DISTANCE;
        }
        self.position = self.target - self.forward() * distance;
    }

    pub fn view_matrix(&self) -> na::Matrix4<f32> {
        na::Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// wgpu-ready projection for a viewport of `width` x `height`.
    pub fn projection_matrix(&self, width: u32, height: u32) -> na::Matrix4<f32> {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        opengl_to_wgpu() * na::Matrix4::new_perspective(aspect, self.fovy.to_radians(), Z_NEAR, Z_FAR)
    }

    pub fn view_projection_matrix(&self, width: u32, height: u32) -> na::Matrix4<f32> {
        self.projection_matrix(width, height) * self.view_matrix()
    }

    /// World-space ray through a pixel, origin at the camera.
    pub fn screen_to_world_ray(&self, screen: na::Point2<f32>, viewport: (u32, u32)) -> Ray {
        let (width, height) = (viewport.0.max(1) as f32, viewport.1.max(1) as f32);
        let ndc_x = 2.0 * screen.x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * screen.y / height;

        let tan_half = (self.fovy.to_radians() / 2.0).tan();
        let forward = self.forward();
        let right = self.right();
        let up = right.cross(&forward);
        let direction = forward
            + right * (ndc_x * tan_half * width / height)
            + up * (ndc_y * tan_half);

        Ray::new(self.position, direction)
    }

    pub fn position(&self) -> na::Point3<f32> {
        self.position
    }

    pub fn target(&self) -> na::Point3<f32> {
        self.target
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(mode: CameraMode) -> Camera {
        Camera::new(
            na::Point3::new(20.0, 10.0, 20.0),
            na::Point3::origin(),
            45.0,
            mode,
        )
    }

    #[test]
    fn centre_pixel_looks_forward() {
        let cam = camera(CameraMode::Orbital);
        let ray = cam.screen_to_world_ray(na::Point2::new(640.0, 360.0), (1280, 720));
        assert!((ray.direction - cam.forward()).norm() < 1e-3);
        assert_eq!(ray.origin, cam.position());
    }

    #[test]
    fn top_left_pixel_points_up_and_left() {
        let cam = Camera::new(
            na::Point3::new(0.0, 0.0, 10.0),
            na::Point3::origin(),
            45.0,
            CameraMode::Orbital,
        );
        let ray = cam.screen_to_world_ray(na::Point2::new(0.0, 0.0), (800, 600));
        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.y > 0.0);
        assert!(ray.direction.z < 0.0);
    }

    #[test]
    fn orbit_keeps_distance_and_height() {
        let mut cam = camera(CameraMode::Orbital);
        let distance = (cam.position() - cam.target()).norm();
        let input = FrameInput::default();
        for _ in 0..120 {
            cam.update(&input, 1.0 / 60.0);
        }
        assert!(((cam.position() - cam.target()).norm() - distance).abs() < 1e-3);
        assert!((cam.position().y - 10.0).abs() < 1e-3);
        assert_ne!(cam.position(), na::Point3::new(20.0, 10.0, 20.0));
    }

    #[test]
    fn wheel_zooms_but_never_reaches_target() {
        let mut cam = camera(CameraMode::Orbital);
        let distance = (cam.position() - cam.target()).norm();
        let mut input = FrameInput::default();
        input.scroll(2.0);
        cam.update(&input, 0.0);
        assert!((distance - 2.0 - (cam.position() - cam.target()).norm()).abs() < 1e-3);

        input.end_frame();
        input.scroll(1000.0);
        cam.update(&input, 0.0);
        let d = (cam.position() - cam.target()).norm();
        assert!(d > 0.0 && d < 0.01);
    }

    #[test]
    fn walking_keeps_height() {
        let mut cam = camera(CameraMode::FirstPerson);
        let mut input = FrameInput::default();
        input.key_down(KeyCode::KeyW, false);
        input.key_down(KeyCode::KeyD, false);
        for _ in 0..30 {
            cam.update(&input, 1.0 / 60.0);
            input.end_frame();
        }
        assert!((cam.position().y - 10.0).abs() < 1e-4);
        let travelled = (cam.position() - na::Point3::new(20.0, 10.0, 20.0)).norm();
        assert!(travelled > 1.0);
    }

    #[test]
    fn pitch_never_flips_over_the_pole() {
        let mut cam = camera(CameraMode::FirstPerson);
        let mut input = FrameInput::default();
        input.mouse_motion(0.0, -100_000.0);
        cam.update(&input, 1.0 / 60.0);
        let forward = cam.forward();
        assert!(forward.y > 0.99);
        // Still facing the original horizontal direction.
        assert!(forward.x < 0.0 && forward.z < 0.0);

        input.end_frame();
        input.mouse_motion(0.0, 100_000.0);
        cam.update(&input, 1.0 / 60.0);
        assert!(cam.forward().y < -0.99);
    }

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let cam = camera(CameraMode::Orbital);
        let proj = cam.projection_matrix(1280, 720);
        let near = proj * na::Vector4::new(0.0, 0.0, -Z_NEAR, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        let far = proj * na::Vector4::new(0.0, 0.0, -Z_FAR, 1.0);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }
}
