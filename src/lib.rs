//! reelkit renders short vertical videos: script lines drawn as animated text over background
//! media, encoded into a playable container.
//!
//! The API is task-oriented:
//!
//! - Describe the input as a [`RenderJob`]
//! - Start it with a [`Compositor`], handing over a [`SurfaceDrawer`], an [`AssetLoader`], and a
//!   [`FrameEncoder`]
//! - Advance the [`RenderTask`] with [`RenderTask::step`] (or [`drive`]) while reading the
//!   [`ProgressStream`]; the [`PendingResult`] yields the encoded [`RenderResult`]
#![forbid(unsafe_code)]

/// Background media loading.
pub mod assets;
/// Frame encoders.
pub mod encode;
mod foundation;
/// Job input model.
pub mod job;
/// Surfaces and the per-frame draw pipeline.
pub mod render;
/// Frame timing and pacing.
pub mod schedule;
/// Job-level render API.
pub mod session;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::assets::font::{TextLayoutEngine, find_system_font};
pub use crate::assets::loader::{AssetLoader, LoadedAsset, UriAssetLoader, UriAssetLoaderOpts};
pub use crate::encode::encoder::{EncodedVideo, EncoderConfig, FrameEncoder, InMemoryEncoder};
pub use crate::encode::ffmpeg::{Container, FfmpegEncoder, FfmpegEncoderOpts, is_ffmpeg_on_path};
pub use crate::encode::lifecycle::{EncoderSession, EncoderState};
pub use crate::job::model::{MediaAsset, MediaKind, RenderJob, parse_script_text};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::pipeline::FrameStyle;
pub use crate::render::surface::{DrawCommand, FrameRGBA, RecordingSurface, SurfaceDrawer};
pub use crate::render::text::{Shadow, TextStyle};
pub use crate::schedule::frame::{FrameScheduler, FrameState, OUTPUT_FPS};
pub use crate::schedule::pacing::{FramePacer, RealTime, Unpaced};
pub use crate::session::progress::{PendingResult, ProgressEvent, ProgressStream, RenderResult};
pub use crate::session::render_task::{
    CancelToken, Compositor, CompositorOpts, RenderTask, StartedRender, TaskStatus, drive,
};
