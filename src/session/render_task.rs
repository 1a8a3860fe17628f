use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::assets::loader::{AssetLoader, LoadedMedia, MediaSet, load_media};
use crate::encode::encoder::{DEFAULT_BITRATE_BPS, EncoderConfig, FrameEncoder};
use crate::encode::lifecycle::EncoderSession;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::model::RenderJob;
use crate::render::pipeline::{FrameStyle, draw_frame};
use crate::render::surface::{FrameRGBA, SurfaceDrawer};
use crate::schedule::frame::{FrameScheduler, OUTPUT_FPS};
use crate::schedule::pacing::FramePacer;
use crate::session::progress::{
    PendingResult, ProgressSender, ProgressStream, RenderResult, ResultSlot, progress_channel,
    result_channel,
};

const LOADING_MESSAGE: &str = "Loading media assets...";
const LOAD_START: f64 = 0.1;
const RENDER_START: f64 = 0.3;
const MESSAGE_EVERY_FRAMES: u64 = 30;

/// Options controlling how a [`Compositor`] renders jobs.
#[derive(Clone, Debug)]
pub struct CompositorOpts {
    /// Output frame rate.
    pub fps: Fps,
    /// Encoder target bitrate.
    pub bitrate_bps: u64,
    pub style: FrameStyle,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            fps: OUTPUT_FPS,
            bitrate_bps: DEFAULT_BITRATE_BPS,
            style: FrameStyle::default(),
        }
    }
}

impl CompositorOpts {
    pub fn with_bitrate(mut self, bitrate_bps: u64) -> Self {
        self.bitrate_bps = bitrate_bps;
        self
    }

    pub fn with_style(mut self, style: FrameStyle) -> Self {
        self.style = style;
        self
    }
}

/// Everything a caller holds for one started job.
pub struct StartedRender {
    pub task: RenderTask,
    pub progress: ProgressStream,
    pub result: PendingResult,
}

/// Turns script + media + duration into an encoded reel.
#[derive(Clone, Debug, Default)]
pub struct Compositor {
    opts: CompositorOpts,
}

impl Compositor {
    pub fn new(opts: CompositorOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Validate `job` and set up a task that renders it step by step.
    ///
    /// The surface, loader, and encoder are moved into the task and released when it ends.
    #[tracing::instrument(
        skip_all,
        fields(lines = job.script.len(), media = job.media.len(), duration_secs = job.duration_secs)
    )]
    pub fn start(
        &self,
        job: RenderJob,
        surface: Box<dyn SurfaceDrawer>,
        loader: Box<dyn AssetLoader>,
        encoder: Box<dyn FrameEncoder>,
    ) -> ReelResult<StartedRender> {
        job.validate()?;
        self.opts.style.text.validate()?;
        let scheduler = FrameScheduler::new(job.duration_secs, job.script.len(), self.opts.fps)?;
        let encoder_cfg = EncoderConfig::new(surface.canvas(), self.opts.fps)
            .with_bitrate(self.opts.bitrate_bps);
        encoder_cfg.validate()?;

        let (mut progress_tx, progress) = progress_channel();
        let (result_slot, result) = result_channel();

        tracing::info!(total_frames = scheduler.total_frames(), "render job started");
        progress_tx.set_message(LOADING_MESSAGE);
        progress_tx.emit(LOAD_START);

        let task = RenderTask {
            job,
            scheduler,
            style: self.opts.style,
            encoder_cfg,
            surface,
            loader,
            encoder: EncoderSession::new(encoder),
            phase: Phase::Loading {
                next: 0,
                set: MediaSet::new(),
            },
            status: TaskStatus::Running,
            progress: progress_tx,
            result: result_slot,
        };
        Ok(StartedRender {
            task,
            progress,
            result,
        })
    }

    /// Render a single frame of `job` without encoding.
    pub fn render_frame(
        &self,
        job: &RenderJob,
        frame: FrameIndex,
        surface: &mut dyn SurfaceDrawer,
        loader: &mut dyn AssetLoader,
    ) -> ReelResult<FrameRGBA> {
        job.validate()?;
        let scheduler = FrameScheduler::new(job.duration_secs, job.script.len(), self.opts.fps)?;
        if frame.0 >= scheduler.total_frames() {
            return Err(ReelError::validation(format!(
                "frame {} is out of range (job has {} frames)",
                frame.0,
                scheduler.total_frames()
            )));
        }
        let mut media = load_media(&job.media, loader, surface.canvas())?;
        let state = scheduler.state_at(frame);
        let background = media.for_segment(state.segment_index)?.frame_at(frame)?;
        draw_frame(
            surface,
            &state,
            &job.script[state.segment_index],
            &background,
            &self.opts.style,
        )?;
        surface.capture()
    }
}

/// Where a [`RenderTask`] stands after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// More steps are needed.
    Running,
    /// The result resolved with a payload.
    Completed,
    /// The result rejected with an error.
    Failed,
    /// The task was cancelled before completing.
    Cancelled,
}

enum Phase {
    Loading { next: usize, set: MediaSet },
    BeginRecording { media: LoadedMedia },
    Rendering { media: LoadedMedia, next_frame: u64 },
    Finalizing,
    Finished,
}

/// An in-flight render job, advanced one step at a time.
///
/// Dropping an unfinished task cancels it: loaded media are released, the encoder is aborted,
/// and the pending result rejects with [`ReelError::Cancelled`].
pub struct RenderTask {
    job: RenderJob,
    scheduler: FrameScheduler,
    style: FrameStyle,
    encoder_cfg: EncoderConfig,
    surface: Box<dyn SurfaceDrawer>,
    loader: Box<dyn AssetLoader>,
    encoder: EncoderSession,
    phase: Phase,
    status: TaskStatus,
    progress: ProgressSender,
    result: ResultSlot,
}

impl RenderTask {
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn total_frames(&self) -> u64 {
        self.scheduler.total_frames()
    }

    /// Whether the next step renders a frame.
    pub fn is_rendering(&self) -> bool {
        matches!(self.phase, Phase::Rendering { .. })
    }

    /// Perform one unit of work: load one asset, begin recording, render one frame, or finalize.
    pub fn step(&mut self) -> TaskStatus {
        if self.status != TaskStatus::Running {
            return self.status;
        }
        let phase = std::mem::replace(&mut self.phase, Phase::Finished);
        match self.advance(phase) {
            Ok(next) => self.phase = next,
            Err(e) => self.fail(e),
        }
        self.status
    }

    /// Stop the job. The pending result rejects with [`ReelError::Cancelled`].
    pub fn cancel(&mut self) {
        if self.status != TaskStatus::Running {
            return;
        }
        tracing::info!("render job cancelled");
        self.abandon(ReelError::Cancelled);
        self.status = TaskStatus::Cancelled;
    }

    fn advance(&mut self, phase: Phase) -> ReelResult<Phase> {
        match phase {
            Phase::Loading { next, mut set } => {
                let total = self.job.media.len();
                if let Some(asset) = self.job.media.get(next) {
                    set.load_next(self.loader.as_mut(), asset);
                    self.progress
                        .emit(LOAD_START + (RENDER_START - LOAD_START) * (next + 1) as f64 / total as f64);
                    return Ok(Phase::Loading {
                        next: next + 1,
                        set,
                    });
                }
                let skipped = set.skipped();
                let media = set.finish(self.surface.canvas())?;
                tracing::info!(
                    loaded = media.len(),
                    skipped,
                    fallback = media.is_fallback(),
                    "media ready"
                );
                self.progress.emit(RENDER_START);
                Ok(Phase::BeginRecording { media })
            }
            Phase::BeginRecording { media } => {
                self.encoder.begin(&self.encoder_cfg)?;
                Ok(Phase::Rendering {
                    media,
                    next_frame: 0,
                })
            }
            Phase::Rendering {
                mut media,
                next_frame,
            } => {
                let total = self.scheduler.total_frames();
                if next_frame >= total {
                    return Ok(Phase::Finalizing);
                }
                self.render_one(&mut media, FrameIndex(next_frame))?;
                if next_frame % MESSAGE_EVERY_FRAMES == 0 {
                    self.progress
                        .set_message(format!("Rendering frame {next_frame}/{total}..."));
                }
                self.progress
                    .emit(RENDER_START + (next_frame as f64 / total as f64) * (1.0 - RENDER_START));

                if next_frame + 1 >= total {
                    // Media are released before finalizing.
                    drop(media);
                    return Ok(Phase::Finalizing);
                }
                Ok(Phase::Rendering {
                    media,
                    next_frame: next_frame + 1,
                })
            }
            Phase::Finalizing => {
                let video = self.encoder.finalize()?;
                tracing::info!(
                    frames = self.encoder.frames_pushed(),
                    bytes = video.bytes.len(),
                    mime = %video.mime,
                    "render job complete"
                );
                self.progress.emit(1.0);
                self.progress.close();
                self.result.settle(Ok(RenderResult {
                    payload: video.bytes,
                    mime_type: video.mime,
                }));
                self.status = TaskStatus::Completed;
                Ok(Phase::Finished)
            }
            Phase::Finished => Ok(Phase::Finished),
        }
    }

    fn render_one(&mut self, media: &mut LoadedMedia, frame: FrameIndex) -> ReelResult<()> {
        let state = self.scheduler.state_at(frame);
        let background = media.for_segment(state.segment_index)?.frame_at(frame)?;
        let line = self
            .job
            .script
            .get(state.segment_index)
            .map(String::as_str)
            .unwrap_or_default();
        draw_frame(
            self.surface.as_mut(),
            &state,
            line,
            &background,
            &self.style,
        )?;
        let captured = self.surface.capture()?;
        self.encoder.push_frame(frame, &captured)
    }

    fn fail(&mut self, err: ReelError) {
        tracing::warn!("render job failed: {err}");
        self.abandon(err);
        self.status = TaskStatus::Failed;
    }

    fn abandon(&mut self, err: ReelError) {
        self.progress.close();
        self.phase = Phase::Finished;
        self.encoder.abort();
        self.result.settle(Err(err));
    }
}

impl Drop for RenderTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for RenderTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTask")
            .field("status", &self.status)
            .field("total_frames", &self.scheduler.total_frames())
            .field("encoder", &self.encoder)
            .field("settled", &self.result.is_settled())
            .finish()
    }
}

/// Shared flag asking a driven task to stop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Step `task` until it settles, asking `pacer` for a tick before each rendered frame.
pub fn drive(task: &mut RenderTask, pacer: &mut dyn FramePacer, cancel: &CancelToken) -> TaskStatus {
    loop {
        if cancel.is_cancelled() {
            task.cancel();
            return task.status();
        }
        if task.is_rendering() {
            pacer.wait_next_tick();
        }
        match task.step() {
            TaskStatus::Running => continue,
            done => return done,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_task.rs"]
mod tests;
