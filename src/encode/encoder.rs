use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::FrameRGBA;

/// Target bitrate of encoded reels (5 Mbps).
pub const DEFAULT_BITRATE_BPS: u64 = 5_000_000;

/// Stream parameters fixed when recording begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub bitrate_bps: u64,
}

impl EncoderConfig {
    pub fn new(canvas: Canvas, fps: Fps) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            fps,
            bitrate_bps: DEFAULT_BITRATE_BPS,
        }
    }

    pub fn with_bitrate(mut self, bitrate_bps: u64) -> Self {
        self.bitrate_bps = bitrate_bps;
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(ReelError::validation("encode fps must be non-zero"));
        }
        if self.bitrate_bps == 0 {
            return Err(ReelError::validation("encode bitrate must be non-zero"));
        }
        Ok(())
    }

    pub fn frame_len(&self) -> usize {
        Canvas {
            width: self.width,
            height: self.height,
        }
        .rgba8_len()
    }
}

/// Encoded payload and its content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedVideo {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Turns captured frames into a container payload.
///
/// Calls arrive in the order `begin`, `push_frame`*, `finalize`; [`EncoderSession`] enforces it.
/// `abort` may come at any point and must release every resource.
///
/// [`EncoderSession`]: crate::encode::lifecycle::EncoderSession
pub trait FrameEncoder: Send {
    fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()>;

    fn push_frame(&mut self, index: FrameIndex, frame: &FrameRGBA) -> ReelResult<()>;

    fn finalize(&mut self) -> ReelResult<EncodedVideo>;

    fn abort(&mut self);
}

/// Mime type of [`InMemoryEncoder`] payloads.
pub const FRAME_DIGESTS_MIME: &str = "application/x-reelkit-frame-digests";

/// Encoder that keeps one xxh3 digest per frame; the payload is the digests, little-endian.
#[derive(Clone, Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<EncoderConfig>,
    digests: Vec<u64>,
}

impl InMemoryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> usize {
        self.digests.len()
    }

    pub fn digests(&self) -> &[u64] {
        &self.digests
    }

    /// Split a payload produced by this encoder back into digests.
    pub fn parse_payload(bytes: &[u8]) -> ReelResult<Vec<u64>> {
        if !bytes.len().is_multiple_of(8) {
            return Err(ReelError::encode("digest payload length is not a multiple of 8"));
        }
        Ok(bytes
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                u64::from_le_bytes(b)
            })
            .collect())
    }
}

impl FrameEncoder for InMemoryEncoder {
    fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()> {
        cfg.validate()?;
        self.cfg = Some(*cfg);
        self.digests.clear();
        Ok(())
    }

    fn push_frame(&mut self, index: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        if self.cfg.is_none() {
            return Err(ReelError::encode("encoder has not begun"));
        }
        if index.0 != self.digests.len() as u64 {
            return Err(ReelError::encode(format!(
                "frame {} out of order, expected {}",
                index.0,
                self.digests.len()
            )));
        }
        self.digests.push(xxhash_rust::xxh3::xxh3_64(&frame.data));
        Ok(())
    }

    fn finalize(&mut self) -> ReelResult<EncodedVideo> {
        if self.cfg.take().is_none() {
            return Err(ReelError::encode("encoder has not begun"));
        }
        Ok(EncodedVideo {
            bytes: self.digests.iter().flat_map(|d| d.to_le_bytes()).collect(),
            mime: FRAME_DIGESTS_MIME.to_owned(),
        })
    }

    fn abort(&mut self) {
        self.cfg = None;
        self.digests.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/encoder.rs"]
mod tests;
