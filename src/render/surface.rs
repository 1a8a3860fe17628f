use std::sync::{Arc, Mutex};

use crate::assets::decode::PreparedImage;
use crate::assets::gradient::LinearGradient;
use crate::foundation::core::{Canvas, Rect, Rgba8Premul};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::text::{TextBlock, TextStyle};

#[derive(Clone, Debug)]
/// Captured frame pixels in RGBA8 layout.
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major RGBA8 order.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Drawing capability the compositor renders through.
///
/// Calls between [`clear`](SurfaceDrawer::clear) and [`capture`](SurfaceDrawer::capture) make up
/// one frame and paint in call order.
pub trait SurfaceDrawer {
    fn canvas(&self) -> Canvas;

    /// Start a new frame filled with `color`.
    fn clear(&mut self, color: Rgba8Premul) -> ReelResult<()>;

    /// Draw `image` stretched to `dest`.
    fn draw_image(&mut self, image: &PreparedImage, dest: Rect) -> ReelResult<()>;

    /// Fill `rect` with a linear gradient.
    fn fill_gradient(&mut self, rect: Rect, gradient: &LinearGradient) -> ReelResult<()>;

    /// Advance width of a single line of text.
    fn measure_text(&mut self, text: &str, style: &TextStyle) -> ReelResult<f64>;

    fn draw_text(&mut self, block: &TextBlock) -> ReelResult<()>;

    /// Read back the current frame.
    fn capture(&mut self) -> ReelResult<FrameRGBA>;
}

/// A draw call seen by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba8Premul),
    Image {
        width: u32,
        height: u32,
        dest: Rect,
    },
    Gradient {
        rect: Rect,
        gradient: LinearGradient,
    },
    Text(TextBlock),
}

/// Shared, append-only log of captured frames and their draw commands.
#[derive(Clone, Debug, Default)]
pub struct CommandLog {
    frames: Arc<Mutex<Vec<Vec<DrawCommand>>>>,
}

impl CommandLog {
    /// Number of captured frames.
    pub fn len(&self) -> usize {
        self.frames.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commands of captured frame `i`.
    pub fn frame(&self, i: usize) -> Option<Vec<DrawCommand>> {
        self.frames.lock().ok().and_then(|f| f.get(i).cloned())
    }

    fn push(&self, commands: Vec<DrawCommand>) -> ReelResult<()> {
        self.frames
            .lock()
            .map_err(|_| ReelError::render("command log poisoned"))?
            .push(commands);
        Ok(())
    }
}

/// Surface that records draw calls instead of rasterizing.
///
/// Text metrics are deterministic: every character advances `font_size * 0.5`. Captures produce a
/// 1x1 frame whose pixel is derived from the recorded commands, so equal frames hash equal.
#[derive(Debug)]
pub struct RecordingSurface {
    canvas: Canvas,
    current: Vec<DrawCommand>,
    log: CommandLog,
}

impl RecordingSurface {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            current: Vec::new(),
            log: CommandLog::default(),
        }
    }

    /// Handle to the capture log; stays readable after the surface moves into a task.
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    /// Commands recorded since the last clear.
    pub fn current(&self) -> &[DrawCommand] {
        &self.current
    }
}

impl SurfaceDrawer for RecordingSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn clear(&mut self, color: Rgba8Premul) -> ReelResult<()> {
        self.current.clear();
        self.current.push(DrawCommand::Clear(color));
        Ok(())
    }

    fn draw_image(&mut self, image: &PreparedImage, dest: Rect) -> ReelResult<()> {
        self.current.push(DrawCommand::Image {
            width: image.width,
            height: image.height,
            dest,
        });
        Ok(())
    }

    fn fill_gradient(&mut self, rect: Rect, gradient: &LinearGradient) -> ReelResult<()> {
        self.current.push(DrawCommand::Gradient {
            rect,
            gradient: gradient.clone(),
        });
        Ok(())
    }

    fn measure_text(&mut self, text: &str, style: &TextStyle) -> ReelResult<f64> {
        Ok(text.chars().count() as f64 * f64::from(style.font_size_px) * 0.5)
    }

    fn draw_text(&mut self, block: &TextBlock) -> ReelResult<()> {
        self.current.push(DrawCommand::Text(block.clone()));
        Ok(())
    }

    fn capture(&mut self) -> ReelResult<FrameRGBA> {
        let digest = xxhash_rust::xxh3::xxh3_64(format!("{:?}", self.current).as_bytes());
        let [r, g, b, ..] = digest.to_le_bytes();
        self.log.push(self.current.clone())?;
        Ok(FrameRGBA {
            width: 1,
            height: 1,
            data: vec![r, g, b, 255],
            premultiplied: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
