use font_kit::family_name::FamilyName;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use wgpu_text::{
    BrushBuilder, TextBrush,
    glyph_brush::{Section, Text, ab_glyph::FontArc},
};

use super::gpu::GpuState;
use crate::error::ViewerError;
use crate::scene::palette::{self, Rgba8};

const FALLBACK_FONTS: [&str; 3] = [
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
];

const FPS_POSITION: (f32, f32) = (10.0, 10.0);
const FPS_SIZE: f32 = 20.0;
const SELECTED_SIZE: f32 = 10.0;
const SELECTED_RIGHT_INSET: f32 = 110.0;
const HINT_SIZE: f32 = 10.0;
const MARGIN: f32 = 10.0;

/// Overlay color for a frame rate: green when smooth, orange below 30,
/// red below 15.
pub fn fps_color(fps: u32) -> Rgba8 {
    match fps {
        0..15 => palette::RED,
        15..30 => palette::ORANGE,
        _ => palette::LIME,
    }
}

/// Find a sans-serif system font, falling back to well-known paths.
fn load_font() -> Result<FontArc, ViewerError> {
    let from_system = SystemSource::new()
        .select_best_match(&[FamilyName::SansSerif], &Properties::new())
        .ok()
        .and_then(|handle| handle.load().ok())
        .and_then(|font| {
            log::debug!("Overlay font: {}", font.full_name());
            font.copy_font_data()
        })
        .and_then(|data| FontArc::try_from_vec((*data).clone()).ok());
    if let Some(font) = from_system {
        return Ok(font);
    }

    for path in FALLBACK_FONTS {
        if let Ok(data) = std::fs::read(path) {
            log::debug!("Overlay font: {}", path);
            return FontArc::try_from_vec(data)
                .map_err(|e| ViewerError::Font(format!("{path}: {e}")));
        }
    }
    Err(ViewerError::Font(
        "no usable system font; install DejaVu or Noto fonts".to_string(),
    ))
}

/// 2D text drawn over the scene: frame rate, selection banner and the
/// controls hint.
pub struct UiRenderer {
    brush: TextBrush<FontArc>,
    hint: &'static str,
}

impl UiRenderer {
    pub fn new(gpu: &GpuState, hint: &'static str) -> Result<Self, ViewerError> {
        let font = load_font()?;
        let brush = BrushBuilder::using_fonts(vec![font]).build(
            &gpu.device,
            gpu.config.width,
            gpu.config.height,
            gpu.config.format,
        );
        Ok(Self { brush, hint })
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, width: u32, height: u32) {
        self.brush.resize_view(width as f32, height as f32, queue);
    }

    /// Lay out this frame's overlay.
    pub fn queue_text(&mut self, gpu: &GpuState, fps: u32, selected: bool) {
        let (width, height) = gpu.viewport();
        let fps_text = format!("{fps} FPS");

        let mut sections = vec![Section {
            screen_position: FPS_POSITION,
            text: vec![
                Text::new(&fps_text)
                    .with_scale(FPS_SIZE)
                    .with_color(palette::linear(fps_color(fps))),
            ],
            ..Default::default()
        }];

        if selected {
            sections.push(Section {
                screen_position: (width as f32 - SELECTED_RIGHT_INSET, MARGIN),
                text: vec![
                    Text::new("MODEL SELECTED")
                        .with_scale(SELECTED_SIZE)
                        .with_color(palette::linear(palette::GREEN)),
                ],
                ..Default::default()
            });
        }

        sections.push(Section {
            screen_position: (MARGIN, height as f32 - MARGIN - HINT_SIZE),
            text: vec![
                Text::new(self.hint)
                    .with_scale(HINT_SIZE)
                    .with_color(palette::linear(palette::DARKGRAY)),
            ],
            ..Default::default()
        });

        if let Err(e) = self.brush.queue(&gpu.device, &gpu.queue, sections) {
            log::warn!("Failed to queue overlay text: {}", e);
        }
    }

    /// Draw the queued text on top of `view`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("UI Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.brush.draw(&mut render_pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_color_thresholds() {
        assert_eq!(fps_color(60), palette::LIME);
        assert_eq!(fps_color(30), palette::LIME);
        assert_eq!(fps_color(29), palette::ORANGE);
        assert_eq!(fps_color(15), palette::ORANGE);
        assert_eq!(fps_color(14), palette::RED);
        assert_eq!(fps_color(0), palette::RED);
    }
}
