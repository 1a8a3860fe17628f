use crate::foundation::core::{Point, Rgba8Premul, Vec2};
use crate::foundation::error::{ReelError, ReelResult};

/// Soft drop shadow painted under text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub color: Rgba8Premul,
    /// Blur extent in pixels; zero paints a hard shadow.
    pub blur_px: f64,
    pub offset: Vec2,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: Rgba8Premul::from_straight_f32_alpha(0, 0, 0, 0.8),
            blur_px: 20.0,
            offset: Vec2::new(0.0, 4.0),
        }
    }
}

/// How a script line is typeset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font_size_px: f32,
    /// Distance between consecutive line centers.
    pub line_height_px: f64,
    pub bold: bool,
    pub color: Rgba8Premul,
    pub shadow: Option<Shadow>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size_px: 64.0,
            line_height_px: 80.0,
            bold: true,
            color: Rgba8Premul::opaque(255, 255, 255),
            shadow: Some(Shadow::default()),
        }
    }
}

impl TextStyle {
    pub fn validate(&self) -> ReelResult<()> {
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(ReelError::validation("text font size must be finite and > 0"));
        }
        if !self.line_height_px.is_finite() || self.line_height_px <= 0.0 {
            return Err(ReelError::validation("text line height must be finite and > 0"));
        }
        if let Some(s) = self.shadow
            && (!s.blur_px.is_finite() || s.blur_px < 0.0)
        {
            return Err(ReelError::validation("shadow blur must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Greedy word wrap.
///
/// Words are taken in order and appended to the current line while `measure` of the joined line
/// stays within `max_width`. A word that does not fit on its own still gets its own line; words
/// are never split and no empty lines are produced.
pub fn wrap_words<F>(text: &str, max_width: f64, mut measure: F) -> ReelResult<Vec<String>>
where
    F: FnMut(&str) -> ReelResult<f64>,
{
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate)? > max_width {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

/// Per-frame text animation derived from segment progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextAnimation {
    /// Block opacity in `[0, 1]`.
    pub opacity: f32,
    /// Downward offset in pixels; the block rises to rest during the first third.
    pub y_offset: f64,
}

impl TextAnimation {
    /// Fade in over the first quarter, fade out over the last fifth, rise in over the first third.
    pub fn at(progress: f64) -> Self {
        let p = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let fade_out = 1.0 - (0.0f64).max((p - 0.8) * 5.0);
        let opacity = (p * 4.0).min(fade_out).clamp(0.0, 1.0);
        let y_offset = (1.0 - (p * 3.0).min(1.0)) * 50.0;
        Self {
            opacity: opacity as f32,
            y_offset,
        }
    }
}

/// One wrapped line, horizontally centered on `center.x` and vertically centered on `center.y`.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedLine {
    pub text: String,
    pub center: Point,
    /// Measured advance width.
    pub width: f64,
}

/// A laid-out, animated text block ready for [`SurfaceDrawer::draw_text`].
///
/// [`SurfaceDrawer::draw_text`]: crate::render::surface::SurfaceDrawer::draw_text
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<PositionedLine>,
    pub style: TextStyle,
    pub opacity: f32,
}

impl TextBlock {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Where a block sits: wrap width, horizontal center, and the vertical anchor of the block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockPlacement {
    pub max_width: f64,
    pub center_x: f64,
    pub anchor_y: f64,
}

/// Wrap `text` and position its lines around `placement.anchor_y`, shifted by the animation.
///
/// `measure` returns the advance width of a candidate line in `style`.
pub fn layout_text_block<F>(
    text: &str,
    style: &TextStyle,
    placement: BlockPlacement,
    anim: TextAnimation,
    mut measure: F,
) -> ReelResult<TextBlock>
where
    F: FnMut(&str) -> ReelResult<f64>,
{
    let wrapped = wrap_words(text, placement.max_width, &mut measure)?;
    let n = wrapped.len();
    let start_y = placement.anchor_y
        - (n.saturating_sub(1) as f64) * style.line_height_px / 2.0
        + anim.y_offset;

    let mut lines = Vec::with_capacity(n);
    for (i, line) in wrapped.into_iter().enumerate() {
        let width = measure(&line)?;
        lines.push(PositionedLine {
            center: Point::new(placement.center_x, start_y + (i as f64) * style.line_height_px),
            width,
            text: line,
        });
    }
    Ok(TextBlock {
        lines,
        style: *style,
        opacity: anim.opacity,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
