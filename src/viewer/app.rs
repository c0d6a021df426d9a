use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use super::{
    gpu::GpuState, gpu_store::GpuAssetStore, input::FrameInput, scene_renderer::SceneRenderer,
    timing::FrameTimer, ui_renderer::UiRenderer,
};
use crate::config::{Variant, ViewerConfig};
use crate::error::ViewerError;
use crate::scene::session::Session;

/// Everything that exists only while the window does.
struct Running {
    window: Arc<Window>,
    gpu: GpuState,
    store: GpuAssetStore,
    scene: SceneRenderer,
    ui: UiRenderer,
    session: Session<GpuAssetStore>,
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: &ViewerConfig) -> Result<Self, ViewerError> {
        let attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let gpu = pollster::block_on(GpuState::new(window.clone(), config.msaa_samples))?;
        let mut store = GpuAssetStore::new(&gpu.device, &gpu.queue);
        let session = Session::new(&mut store, config)?;
        let scene = SceneRenderer::new(&gpu, &store);
        let ui = UiRenderer::new(&gpu, config.controls_hint())?;

        if config.variant == Variant::FirstPerson {
            lock_cursor(&window);
        }

        log::info!(
            "Loaded {} with texture {}",
            config.model_path.display(),
            config.texture_path.display()
        );

        Ok(Self {
            window,
            gpu,
            store,
            scene,
            ui,
            session,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
        self.ui.resize(&self.gpu.queue, size.width, size.height);
    }

    fn redraw(&mut self, input: &FrameInput, dt: f32, fps: u32) {
        let viewport = self.gpu.viewport();
        self.session.update(&mut self.store, input, dt, viewport);

        self.scene.prepare(&self.gpu, &self.session);
        self.ui.queue_text(&self.gpu, fps, self.session.is_selected());

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return;
            }
            Err(e) => {
                log::warn!("Failed to get surface texture: {:?}", e);
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.scene
            .render(&mut encoder, &self.gpu, &view, &self.session);
        self.ui.render(&mut encoder, &view);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
    }

    fn shutdown(self) {
        let Self {
            mut store, session, ..
        } = self;
        session.shutdown(&mut store);
        log::info!("Viewer closed");
    }
}

/// Confine and hide the cursor; mouse look reads raw device motion.
fn lock_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        log::warn!("Could not grab cursor: {}", e);
    }
    window.set_cursor_visible(false);
}

struct ViewerApp {
    config: ViewerConfig,
    running: Option<Running>,
    input: FrameInput,
    timer: FrameTimer,
    error: Option<ViewerError>,
}

impl ViewerApp {
    fn new(config: ViewerConfig) -> Self {
        let timer = FrameTimer::new(config.target_fps);
        Self {
            config,
            running: None,
            input: FrameInput::default(),
            timer,
            error: None,
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match Running::start(event_loop, &self.config) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                log::error!("Startup failed: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        self.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => running.resize(size),
            WindowEvent::RedrawRequested => {
                let dt = self.timer.tick(Instant::now());
                running.redraw(&self.input, dt, self.timer.fps());
                self.input.end_frame();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.mouse_motion(dx, dy);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = self.running.as_ref() else {
            return;
        };
        if self.timer.poll(Instant::now()) {
            running.window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.timer.next_frame()));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.take() {
            running.shutdown();
        }
    }
}

/// Open the window and run until it is closed. Startup failures, such as a
/// missing startup asset, are returned once the event loop has stopped.
pub fn run(config: ViewerConfig) -> Result<(), ViewerError> {
    log::info!("Starting {}", config.title);
    let event_loop = EventLoop::new()?;
    let mut app = ViewerApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
