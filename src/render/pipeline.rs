use crate::assets::decode::PreparedImage;
use crate::assets::gradient::{GradientStop, LinearGradient};
use crate::foundation::core::{Canvas, Point, Rect, Rgba8Premul};
use crate::foundation::error::ReelResult;
use crate::render::surface::SurfaceDrawer;
use crate::render::text::{BlockPlacement, TextAnimation, TextStyle, layout_text_block};
use crate::schedule::frame::FrameState;

/// Look of every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStyle {
    /// Opaque fill under everything.
    pub base_color: Rgba8Premul,
    /// Background scale gained over one segment (`0.05` zooms to 105%).
    pub zoom: f64,
    /// Overlay starts this far down the surface, as a fraction of height.
    pub overlay_start: f64,
    /// Overlay color at the bottom edge.
    pub overlay_color: Rgba8Premul,
    /// Horizontal space left around wrapped text, both sides combined.
    pub text_margin_px: f64,
    /// Vertical anchor of the text block, as a fraction of height.
    pub text_anchor: f64,
    pub text: TextStyle,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            base_color: Rgba8Premul::opaque(0x0a, 0x0a, 0x0f),
            zoom: 0.05,
            overlay_start: 0.5,
            overlay_color: Rgba8Premul::from_straight_f32_alpha(0, 0, 0, 0.8),
            text_margin_px: 120.0,
            text_anchor: 0.75,
            text: TextStyle::default(),
        }
    }
}

impl FrameStyle {
    /// Bottom-darkening overlay for `canvas`.
    pub fn overlay_gradient(&self, canvas: Canvas) -> LinearGradient {
        let h = f64::from(canvas.height);
        LinearGradient {
            start: Point::new(0.0, h * self.overlay_start),
            end: Point::new(0.0, h),
            stops: vec![
                GradientStop {
                    offset: 0.0,
                    color: Rgba8Premul::transparent(),
                },
                GradientStop {
                    offset: 1.0,
                    color: self.overlay_color,
                },
            ],
        }
    }

    /// Destination of the background at segment `progress`: scaled about the surface center.
    pub fn background_rect(&self, canvas: Canvas, progress: f64) -> Rect {
        let scale = 1.0 + progress * self.zoom;
        let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
        let (w, h) = (cw * scale, ch * scale);
        let x = (cw - w) / 2.0;
        let y = (ch - h) / 2.0;
        Rect::new(x, y, x + w, y + h)
    }

    fn placement(&self, canvas: Canvas) -> BlockPlacement {
        BlockPlacement {
            max_width: f64::from(canvas.width) - self.text_margin_px,
            center_x: f64::from(canvas.width) / 2.0,
            anchor_y: f64::from(canvas.height) * self.text_anchor,
        }
    }
}

/// Paint one frame: base fill, zooming background, overlay, then the animated line.
pub fn draw_frame(
    surface: &mut dyn SurfaceDrawer,
    state: &FrameState,
    line: &str,
    background: &PreparedImage,
    style: &FrameStyle,
) -> ReelResult<()> {
    let canvas = surface.canvas();
    surface.clear(style.base_color)?;
    surface.draw_image(
        background,
        style.background_rect(canvas, state.segment_progress),
    )?;
    surface.fill_gradient(canvas.rect(), &style.overlay_gradient(canvas))?;

    if line.trim().is_empty() {
        return Ok(());
    }
    let text_style = style.text;
    let block = layout_text_block(
        line,
        &text_style,
        style.placement(canvas),
        TextAnimation::at(state.segment_progress),
        |s| surface.measure_text(s, &text_style),
    )?;
    if !block.is_empty() {
        surface.draw_text(&block)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
