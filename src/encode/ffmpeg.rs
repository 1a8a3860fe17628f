use std::io::{Read as _, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::encoder::{EncodedVideo, EncoderConfig, FrameEncoder};
use crate::foundation::core::{FrameIndex, Rgba8Premul};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::FrameRGBA;

const STDOUT_CHUNK_BYTES: usize = 64 * 1024;

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Streaming container written to the pipe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Container {
    /// VP9 in WebM.
    #[default]
    WebM,
    /// H.264 in fragmented MP4, since a pipe cannot be seeked to write the index.
    Mp4,
}

impl Container {
    pub fn mime(self) -> &'static str {
        match self {
            Self::WebM => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::WebM => "webm",
            Self::Mp4 => "mp4",
        }
    }

    fn output_args(self, bitrate: &str) -> Vec<String> {
        let args: &[&str] = match self {
            Self::WebM => &[
                "-c:v",
                "libvpx-vp9",
                "-b:v",
                bitrate,
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-pix_fmt",
                "yuv420p",
                "-f",
                "webm",
            ],
            Self::Mp4 => &[
                "-c:v",
                "libx264",
                "-b:v",
                bitrate,
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "frag_keyframe+empty_moov+default_base_moof",
                "-f",
                "mp4",
            ],
        };
        args.iter().map(|s| (*s).to_owned()).collect()
    }
}

impl std::str::FromStr for Container {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webm" => Ok(Self::WebM),
            "mp4" => Ok(Self::Mp4),
            other => Err(ReelError::validation(format!(
                "unknown container '{other}' (expected webm or mp4)"
            ))),
        }
    }
}

/// Options for [`FfmpegEncoder`].
#[derive(Clone, Copy, Debug)]
pub struct FfmpegEncoderOpts {
    pub container: Container,
    /// Color translucent pixels are flattened over.
    pub background: Rgba8Premul,
}

impl Default for FfmpegEncoderOpts {
    fn default() -> Self {
        Self {
            container: Container::WebM,
            background: Rgba8Premul::opaque(0, 0, 0),
        }
    }
}

impl FfmpegEncoderOpts {
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }
}

type Drain<T> = JoinHandle<std::io::Result<T>>;

/// Encoder backed by a system `ffmpeg` process.
///
/// Raw RGBA frames go in on stdin; the container stream comes back on stdout and is collected
/// in chunks by a reader thread.
pub struct FfmpegEncoder {
    opts: FfmpegEncoderOpts,
    cfg: Option<EncoderConfig>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<Drain<Vec<Vec<u8>>>>,
    stderr_drain: Option<Drain<Vec<u8>>>,
    scratch: Vec<u8>,
    next_frame: u64,
}

impl FfmpegEncoder {
    pub fn new(opts: FfmpegEncoderOpts) -> Self {
        Self {
            opts,
            cfg: None,
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            scratch: Vec::new(),
            next_frame: 0,
        }
    }

    pub fn container(&self) -> Container {
        self.opts.container
    }

    fn stderr_text(&mut self) -> String {
        match self.stderr_drain.take().map(JoinHandle::join) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_string(),
            _ => String::new(),
        }
    }

    fn kill(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(h) = self.stdout_drain.take() {
            let _ = h.join();
        }
        if let Some(h) = self.stderr_drain.take() {
            let _ = h.join();
        }
        self.cfg = None;
    }
}

impl FrameEncoder for FfmpegEncoder {
    fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()> {
        cfg.validate()?;
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "encode width/height must be even (required for yuv420p output)",
            ));
        }
        if self.child.is_some() {
            return Err(ReelError::encode("ffmpeg encoder already started"));
        }
        if !is_ffmpeg_on_path() {
            return Err(ReelError::encode(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        let bitrate = cfg.bitrate_bps.to_string();
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .args([
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", cfg.width, cfg.height),
                "-r",
                &format!("{}/{}", cfg.fps.num, cfg.fps.den),
                "-i",
                "pipe:0",
                "-an",
            ])
            .args(self.opts.container.output_args(&bitrate))
            .arg("pipe:1");

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take();
        let stdout_drain = child.stdout.take().map(|mut stdout| {
            std::thread::spawn(move || {
                let mut chunks = Vec::new();
                loop {
                    let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
                    let n = stdout.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    buf.truncate(n);
                    chunks.push(buf);
                }
                Ok(chunks)
            })
        });
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });

        self.child = Some(child);
        self.stdin = stdin;
        self.stdout_drain = stdout_drain;
        self.stderr_drain = stderr_drain;
        if self.stdin.is_none() {
            self.kill();
            return Err(ReelError::encode("failed to open ffmpeg stdin"));
        }

        self.scratch = vec![0u8; cfg.frame_len()];
        self.cfg = Some(*cfg);
        self.next_frame = 0;
        tracing::debug!(container = ?self.opts.container, "ffmpeg encoder started");
        Ok(())
    }

    fn push_frame(&mut self, index: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| ReelError::encode("ffmpeg encoder has not begun"))?;
        if index.0 != self.next_frame {
            return Err(ReelError::encode(format!(
                "frame {} out of order, expected {}",
                index.0, self.next_frame
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        flatten_premul_over_bg_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.opts.background,
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::encode("ffmpeg encoder is already finalized"));
        };
        if let Err(e) = stdin.write_all(&self.scratch) {
            let stderr = self.stderr_text();
            return Err(ReelError::encode(format!(
                "failed to write frame {} to ffmpeg: {e} {stderr}",
                index.0
            )));
        }
        self.next_frame += 1;
        Ok(())
    }

    fn finalize(&mut self) -> ReelResult<EncodedVideo> {
        if self.cfg.is_none() {
            return Err(ReelError::encode("ffmpeg encoder has not begun"));
        }
        drop(self.stdin.take());

        let status = match self.child.take() {
            Some(mut child) => child
                .wait()
                .map_err(|e| ReelError::encode(format!("failed to wait for ffmpeg: {e}")))?,
            None => return Err(ReelError::encode("ffmpeg process is gone")),
        };
        let chunks = match self.stdout_drain.take().map(JoinHandle::join) {
            Some(Ok(Ok(chunks))) => chunks,
            Some(Ok(Err(e))) => {
                return Err(ReelError::encode(format!("failed to read ffmpeg output: {e}")));
            }
            _ => return Err(ReelError::encode("ffmpeg output reader failed")),
        };
        let stderr = self.stderr_text();
        self.cfg = None;

        if !status.success() {
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }

        let bytes = chunks.concat();
        if bytes.is_empty() {
            return Err(ReelError::encode("ffmpeg produced no output"));
        }
        Ok(EncodedVideo {
            bytes,
            mime: self.opts.container.mime().to_owned(),
        })
    }

    fn abort(&mut self) {
        if self.child.is_some() {
            tracing::debug!("killing ffmpeg encoder");
        }
        self.kill();
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Composite `src` over an opaque `bg`, writing opaque RGBA8 into `dst`.
pub(crate) fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg: Rgba8Premul,
) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::encode(
            "frame data size mismatch with width*height*4",
        ));
    }

    let [bg_r, bg_g, bg_b, _] = bg.to_array().map(u16::from);
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        let channel = |c: u8, bg_c: u16| -> u8 {
            let c = u16::from(c);
            let fg = if src_is_premul {
                c
            } else {
                mul_div255_u16(c, a)
            };
            (fg + mul_div255_u16(bg_c, inv)).min(255) as u8
        };
        d[0] = channel(s[0], bg_r);
        d[1] = channel(s[1], bg_g);
        d[2] = channel(s[2], bg_b);
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
