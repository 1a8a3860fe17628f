use std::io::Read as _;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::assets::decode::PreparedImage;
use crate::assets::fetch::SourceLocation;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// A clip being played by a background `ffmpeg` process.
///
/// Playback is muted and loops forever. The decoder is resampled to the output frame rate and
/// scaled to the surface, so one decoded frame corresponds to one output frame. Position follows
/// the job's frame clock: asking for frame `n` reads (and discards) everything before it.
pub struct ClipPlayback {
    source: String,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    canvas: Canvas,
    scratch: Vec<u8>,
    current: PreparedImage,
    position: u64,
    ended: bool,
}

impl ClipPlayback {
    /// Start playback and wait for the first frame.
    pub fn start(loc: &SourceLocation, canvas: Canvas, fps: Fps) -> ReelResult<Self> {
        if !crate::encode::ffmpeg::is_ffmpeg_on_path() {
            return Err(ReelError::asset(
                "ffmpeg is required for clip playback, but was not found on PATH",
            ));
        }

        let input = loc.ffmpeg_input();
        let filter = format!(
            "fps={}/{},scale={}:{}",
            fps.num, fps.den, canvas.width, canvas.height
        );
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-stream_loop", "-1", "-i"])
            .arg(&input)
            .args([
                "-an", "-vf", &filter, "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelError::asset(format!("failed to spawn ffmpeg for '{input}': {e}")))?;

        let stdout = child.stdout.take();
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });

        let mut playback = Self {
            source: input,
            child: Some(child),
            stdout,
            stderr_drain,
            canvas,
            scratch: vec![0u8; canvas.rgba8_len()],
            current: PreparedImage::from_premul_rgba8(
                canvas.width,
                canvas.height,
                vec![0u8; canvas.rgba8_len()],
            )?,
            position: 0,
            ended: false,
        };

        if let Err(e) = playback.read_into_scratch() {
            let stderr = playback.stop();
            return Err(ReelError::asset(format!(
                "clip '{}' produced no frames: {e}{}",
                playback.source,
                if stderr.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", stderr.trim())
                }
            )));
        }
        playback.current = playback.scratch_to_image()?;
        Ok(playback)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Output frame the clip is currently showing.
    pub fn position(&self) -> FrameIndex {
        FrameIndex(self.position)
    }

    /// Advance playback to `frame` and return the frame on screen.
    ///
    /// Requests for earlier frames return the current frame. If the stream ends, the last frame
    /// is held.
    pub fn frame_at(&mut self, frame: FrameIndex) -> ReelResult<PreparedImage> {
        if self.ended || frame.0 <= self.position {
            return Ok(self.current.clone());
        }
        let mut advanced = false;
        while self.position < frame.0 {
            if let Err(e) = self.read_into_scratch() {
                tracing::warn!(
                    source = %self.source,
                    position = self.position,
                    "clip stream ended ({e}); holding last frame"
                );
                self.ended = true;
                break;
            }
            self.position += 1;
            advanced = true;
        }
        if advanced {
            self.current = self.scratch_to_image()?;
        }
        Ok(self.current.clone())
    }

    fn read_into_scratch(&mut self) -> std::io::Result<()> {
        let stdout = self
            .stdout
            .as_mut()
            .ok_or_else(|| std::io::Error::other("clip playback stopped"))?;
        stdout.read_exact(&mut self.scratch)
    }

    fn scratch_to_image(&self) -> ReelResult<PreparedImage> {
        let mut bytes = self.scratch.clone();
        premultiply_rgba8_in_place(&mut bytes);
        PreparedImage::from_premul_rgba8(self.canvas.width, self.canvas.height, bytes)
    }

    /// Kill the decoder and return whatever it wrote to stderr.
    fn stop(&mut self) -> String {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        match self.stderr_drain.take().map(|h| h.join()) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).to_string(),
            _ => String::new(),
        }
    }
}

impl Drop for ClipPlayback {
    fn drop(&mut self) {
        if self.child.is_some() {
            tracing::debug!(source = %self.source, "stopping clip playback");
            let _ = self.stop();
        }
    }
}

impl std::fmt::Debug for ClipPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipPlayback")
            .field("source", &self.source)
            .field("position", &self.position)
            .field("ended", &self.ended)
            .finish()
    }
}

// Playback shells out to `ffmpeg`; it is exercised by `tests/clip_playback.rs`, which skips
// itself when the tool is unavailable.
