use crate::foundation::error::{ReelError, ReelResult};

/// Separable gaussian kernel with Q16 fixed-point weights summing to exactly `1 << 16`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GaussianKernel {
    weights: Vec<u32>,
}

impl GaussianKernel {
    pub fn new(radius: u32, sigma: f32) -> ReelResult<Self> {
        if radius == 0 {
            return Ok(Self {
                weights: vec![1 << 16],
            });
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(ReelError::validation("blur sigma must be > 0"));
        }

        let r = radius as i32;
        let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
        let weights_f: Vec<f64> = (-r..=r)
            .map(|i| {
                let x = f64::from(i);
                (-x * x / denom).exp()
            })
            .collect();
        let sum: f64 = weights_f.iter().sum();
        if sum <= 0.0 {
            return Err(ReelError::render("gaussian kernel sum is zero"));
        }

        let mut weights: Vec<u32> = weights_f
            .iter()
            .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
            .collect();
        let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
        let delta = 65536 - acc;
        if delta != 0 {
            let mid = weights.len() / 2;
            weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
        }
        Ok(Self { weights })
    }

    /// Kernel approximating a CSS/canvas `shadowBlur` of `blur_px` (sigma is half the blur).
    pub fn for_shadow_blur(blur_px: f64) -> ReelResult<Self> {
        if !blur_px.is_finite() || blur_px < 0.0 {
            return Err(ReelError::validation("shadow blur must be finite and >= 0"));
        }
        let radius = blur_px.ceil() as u32;
        Self::new(radius, (blur_px / 2.0) as f32)
    }

    pub fn radius(&self) -> u32 {
        (self.weights.len() / 2) as u32
    }

    /// Blur a premultiplied RGBA8 buffer, clamping samples at the edges.
    pub fn apply(&self, src: &[u8], width: u32, height: u32) -> ReelResult<Vec<u8>> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| ReelError::render("blur buffer size overflow"))?;
        if src.len() != expected_len {
            return Err(ReelError::render(
                "blur expects a buffer of width*height*4 bytes",
            ));
        }
        if self.radius() == 0 || expected_len == 0 {
            return Ok(src.to_vec());
        }

        let mut tmp = vec![0u8; expected_len];
        let mut out = vec![0u8; expected_len];
        let (w, h) = (width as usize, height as usize);
        self.pass(src, &mut tmp, w, h, 4, w * 4);
        self.pass(&tmp, &mut out, h, w, w * 4, 4);
        Ok(out)
    }

    /// One 1-D pass. `len` samples along the axis are `step` bytes apart; `lanes` parallel runs
    /// start `lane_step` bytes apart.
    fn pass(&self, src: &[u8], dst: &mut [u8], len: usize, lanes: usize, step: usize, lane_step: usize) {
        let radius = (self.weights.len() / 2) as isize;
        let last = len as isize - 1;
        for lane in 0..lanes {
            let base = lane * lane_step;
            for i in 0..len as isize {
                let mut acc = [0u64; 4];
                for (ki, &kw) in self.weights.iter().enumerate() {
                    let s = (i + ki as isize - radius).clamp(0, last) as usize;
                    let idx = base + s * step;
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += u64::from(kw) * u64::from(src[idx + c]);
                    }
                }
                let out_idx = base + (i as usize) * step;
                for (c, a) in acc.iter().enumerate() {
                    dst[out_idx + c] = q16_to_u8(*a);
                }
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
