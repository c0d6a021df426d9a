use nalgebra as na;
use std::collections::HashSet;
use std::path::PathBuf;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Input gathered between two frames.
///
/// Held keys persist across frames; presses, mouse motion, wheel, clicks
/// and drops are cleared by `end_frame`.
#[derive(Debug, Default, Clone)]
pub struct FrameInput {
    down: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
    cursor: Option<na::Point2<f32>>,
    mouse_delta: na::Vector2<f32>,
    wheel: f32,
    left_clicked: bool,
    dropped: Vec<PathBuf>,
}

impl FrameInput {
    /// Fold one window event into the frame; events input does not track
    /// are ignored.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => self.key_down(code, event.repeat),
                    ElementState::Released => self.key_up(code),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.click(),
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll(match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / 100.0) as f32,
                });
            }
            WindowEvent::DroppedFile(path) => self.file_dropped(path.clone()),
            WindowEvent::Focused(false) => self.focus_lost(),
            _ => {}
        }
    }

    pub fn key_down(&mut self, code: KeyCode, repeat: bool) {
        if !repeat && self.down.insert(code) {
            self.pressed.insert(code);
        }
    }

    pub fn key_up(&mut self, code: KeyCode) {
        self.down.remove(&code);
    }

    /// Releases are not always delivered to an unfocused window, so forget
    /// every held key.
    pub fn focus_lost(&mut self) {
        self.down.clear();
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        self.cursor = Some(na::Point2::new(x, y));
    }

    /// Raw relative motion, independent of the (possibly locked) cursor.
    pub fn mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse_delta += na::Vector2::new(dx as f32, dy as f32);
    }

    pub fn click(&mut self) {
        self.left_clicked = true;
    }

    pub fn scroll(&mut self, lines: f32) {
        self.wheel += lines;
    }

    pub fn file_dropped(&mut self, path: PathBuf) {
        self.dropped.push(path);
    }

    pub fn is_down(&self, code: KeyCode) -> bool {
        self.down.contains(&code)
    }

    /// Went down this frame.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }

    pub fn cursor(&self) -> Option<na::Point2<f32>> {
        self.cursor
    }

    pub fn mouse_delta(&self) -> na::Vector2<f32> {
        self.mouse_delta
    }

    pub fn wheel(&self) -> f32 {
        self.wheel
    }

    pub fn left_clicked(&self) -> bool {
        self.left_clicked
    }

    pub fn dropped(&self) -> &[PathBuf] {
        &self.dropped
    }

    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.mouse_delta = na::Vector2::zeros();
        self.wheel = 0.0;
        self.left_clicked = false;
        self.dropped.clear();
    }
}
