use std::path::PathBuf;

use crate::assets::decode::{PreparedImage, decode_image, looks_like_svg, parse_svg, rasterize_svg};
use crate::assets::fetch::{Fetcher, SourceLocation};
use crate::assets::gradient::fallback_background;
use crate::assets::media::ClipPlayback;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::model::{MediaAsset, MediaKind};
use crate::schedule::frame::{OUTPUT_FPS, media_index_for_segment};

/// A decoded, ready-to-draw background.
#[derive(Debug)]
pub enum LoadedAsset {
    /// Static frame (decoded image or synthesized fallback).
    Still(PreparedImage),
    /// Clip that is already playing.
    Clip(ClipPlayback),
}

impl LoadedAsset {
    /// Frame to draw at output frame `frame`.
    pub fn frame_at(&mut self, frame: FrameIndex) -> ReelResult<PreparedImage> {
        match self {
            Self::Still(img) => Ok(img.clone()),
            Self::Clip(clip) => clip.frame_at(frame),
        }
    }
}

/// Resolves one [`MediaAsset`] into a [`LoadedAsset`].
pub trait AssetLoader {
    fn load(&mut self, asset: &MediaAsset) -> ReelResult<LoadedAsset>;
}

/// Largest image side a surface can rasterize.
const MAX_IMAGE_SIDE: u32 = u16::MAX as u32;

/// Options for [`UriAssetLoader`].
#[derive(Clone, Debug)]
pub struct UriAssetLoaderOpts {
    /// Base directory for relative paths.
    pub assets_root: PathBuf,
    /// Surface size; SVGs rasterize and clips scale to it.
    pub canvas: Canvas,
    /// Clip playback rate.
    pub fps: Fps,
    /// Upper bound on a fetched image body.
    pub max_image_bytes: u64,
}

impl Default for UriAssetLoaderOpts {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("."),
            canvas: Canvas::PORTRAIT_1080,
            fps: OUTPUT_FPS,
            max_image_bytes: 64 * 1024 * 1024,
        }
    }
}

impl UriAssetLoaderOpts {
    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets_root = root.into();
        self
    }

    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }
}

/// Loader for filesystem paths, `file://` URIs, and `http(s)` URLs.
///
/// Images are fetched and decoded in-process; clips are handed to `ffmpeg`, which reads the
/// location directly.
pub struct UriAssetLoader {
    opts: UriAssetLoaderOpts,
    fetcher: Fetcher,
}

impl UriAssetLoader {
    pub fn new(opts: UriAssetLoaderOpts) -> ReelResult<Self> {
        let fetcher = Fetcher::new(opts.max_image_bytes)?;
        Ok(Self { opts, fetcher })
    }

    fn load_image(&self, loc: &SourceLocation) -> ReelResult<PreparedImage> {
        let bytes = self.fetcher.fetch(loc)?;
        if loc.has_svg_extension() || looks_like_svg(&bytes) {
            let tree = parse_svg(&bytes)?;
            return rasterize_svg(&tree, self.opts.canvas);
        }
        let image = decode_image(&bytes)?;
        if image.width > MAX_IMAGE_SIDE || image.height > MAX_IMAGE_SIDE {
            return Err(ReelError::asset(format!(
                "image '{}' is {}x{}, over the {MAX_IMAGE_SIDE}px side limit",
                loc.ffmpeg_input(),
                image.width,
                image.height
            )));
        }
        Ok(image)
    }
}

impl AssetLoader for UriAssetLoader {
    fn load(&mut self, asset: &MediaAsset) -> ReelResult<LoadedAsset> {
        let loc = SourceLocation::resolve(&asset.source, &self.opts.assets_root)?;
        match asset.kind {
            MediaKind::Image => Ok(LoadedAsset::Still(self.load_image(&loc)?)),
            MediaKind::Clip => Ok(LoadedAsset::Clip(ClipPlayback::start(
                &loc,
                self.opts.canvas,
                self.opts.fps,
            )?)),
        }
    }
}

/// Accumulates loaded backgrounds in input order, skipping failures.
#[derive(Debug, Default)]
pub struct MediaSet {
    loaded: Vec<LoadedAsset>,
    skipped: usize,
}

impl MediaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one asset; a failure is logged and skipped. Returns whether it loaded.
    pub fn load_next(&mut self, loader: &mut dyn AssetLoader, asset: &MediaAsset) -> bool {
        match loader.load(asset) {
            Ok(a) => {
                tracing::debug!(source = %asset.source, kind = ?asset.kind, "media loaded");
                self.loaded.push(a);
                true
            }
            Err(e) => {
                tracing::warn!(source = %asset.source, kind = ?asset.kind, "failed to load media: {e}");
                self.skipped += 1;
                false
            }
        }
    }

    pub fn loaded_len(&self) -> usize {
        self.loaded.len()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Close the set, synthesizing the fallback background when nothing loaded.
    pub fn finish(self, canvas: Canvas) -> ReelResult<LoadedMedia> {
        if !self.loaded.is_empty() {
            return Ok(LoadedMedia {
                assets: self.loaded,
                fallback: false,
            });
        }
        tracing::info!("no background media loaded; using fallback gradient");
        Ok(LoadedMedia {
            assets: vec![LoadedAsset::Still(fallback_background(canvas)?)],
            fallback: true,
        })
    }
}

/// Load every asset in order, then apply the fallback rule.
pub fn load_media(
    assets: &[MediaAsset],
    loader: &mut dyn AssetLoader,
    canvas: Canvas,
) -> ReelResult<LoadedMedia> {
    let mut set = MediaSet::new();
    for a in assets {
        set.load_next(loader, a);
    }
    set.finish(canvas)
}

/// Non-empty, job-owned set of backgrounds.
#[derive(Debug)]
pub struct LoadedMedia {
    assets: Vec<LoadedAsset>,
    fallback: bool,
}

impl LoadedMedia {
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Whether this set is the synthesized fallback.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Background for a segment, cycling through the loaded assets.
    pub fn for_segment(&mut self, segment_index: usize) -> ReelResult<&mut LoadedAsset> {
        let i = media_index_for_segment(segment_index, self.assets.len());
        self.assets
            .get_mut(i)
            .ok_or_else(|| ReelError::render("no background media available"))
    }

    pub fn assets(&self) -> &[LoadedAsset] {
        &self.assets
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
