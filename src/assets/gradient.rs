use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Canvas, Point, Rgba8Premul};
use crate::foundation::error::{ReelError, ReelResult};

/// One color stop, `offset` in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba8Premul,
}

/// Linear gradient between two points, padded beyond both ends.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    /// Stops sorted by offset.
    pub stops: Vec<GradientStop>,
}

impl LinearGradient {
    pub fn new(start: Point, end: Point, mut stops: Vec<GradientStop>) -> ReelResult<Self> {
        if stops.is_empty() {
            return Err(ReelError::validation("gradient needs at least one stop"));
        }
        if stops
            .iter()
            .any(|s| !s.offset.is_finite() || !(0.0..=1.0).contains(&s.offset))
        {
            return Err(ReelError::validation("gradient stop offsets must be in [0, 1]"));
        }
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Ok(Self { start, end, stops })
    }

    /// Color at parameter `t` along the gradient axis (premultiplied interpolation).
    pub fn color_at(&self, t: f64) -> Rgba8Premul {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let first = self.stops[0];
        if t <= first.offset {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                let u = if span <= 0.0 { 1.0 } else { (t - a.offset) / span };
                return lerp_color(a.color, b.color, u);
            }
        }
        self.stops[self.stops.len() - 1].color
    }

    /// Axis parameter of a point: its projection onto `start -> end`.
    pub fn param_at(&self, p: Point) -> f64 {
        let axis = self.end - self.start;
        let len2 = axis.hypot2();
        if len2 <= f64::EPSILON {
            return 0.0;
        }
        (p - self.start).dot(axis) / len2
    }

    /// Rasterize over a `canvas`-sized image, sampling pixel centers.
    pub fn rasterize(&self, canvas: Canvas) -> ReelResult<PreparedImage> {
        let w = canvas.width as usize;
        let mut bytes = vec![0u8; canvas.rgba8_len()];
        if self.start.x == self.end.x {
            // Vertical gradients are constant per row.
            for (y, row) in bytes.chunks_exact_mut(w * 4).enumerate() {
                let c = self
                    .color_at(self.param_at(Point::new(self.start.x, y as f64 + 0.5)))
                    .to_array();
                for px in row.chunks_exact_mut(4) {
                    px.copy_from_slice(&c);
                }
            }
        } else {
            for (i, px) in bytes.chunks_exact_mut(4).enumerate() {
                let x = (i % w) as f64 + 0.5;
                let y = (i / w) as f64 + 0.5;
                px.copy_from_slice(&self.color_at(self.param_at(Point::new(x, y))).to_array());
            }
        }
        PreparedImage::from_premul_rgba8(canvas.width, canvas.height, bytes)
    }
}

fn lerp_color(a: Rgba8Premul, b: Rgba8Premul, t: f64) -> Rgba8Premul {
    let lerp = |x: u8, y: u8| -> u8 {
        let xf = f64::from(x);
        let yf = f64::from(y);
        (xf + (yf - xf) * t).round().clamp(0.0, 255.0) as u8
    };
    Rgba8Premul {
        r: lerp(a.r, b.r),
        g: lerp(a.g, b.g),
        b: lerp(a.b, b.b),
        a: lerp(a.a, b.a),
    }
}

/// Diagonal three-stop dark gradient used when no background media loads.
pub fn fallback_gradient(canvas: Canvas) -> LinearGradient {
    let c = canvas.rect();
    LinearGradient {
        start: Point::new(c.x0, c.y0),
        end: Point::new(c.x1, c.y1),
        stops: vec![
            GradientStop {
                offset: 0.0,
                color: Rgba8Premul::opaque(0x1a, 0x1a, 0x2e),
            },
            GradientStop {
                offset: 0.5,
                color: Rgba8Premul::opaque(0x16, 0x21, 0x3e),
            },
            GradientStop {
                offset: 1.0,
                color: Rgba8Premul::opaque(0x0f, 0x34, 0x60),
            },
        ],
    }
}

/// Synthesize the fallback background frame.
pub fn fallback_background(canvas: Canvas) -> ReelResult<PreparedImage> {
    fallback_gradient(canvas).rasterize(canvas)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/gradient.rs"]
mod tests;
