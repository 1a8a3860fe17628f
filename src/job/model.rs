use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// What kind of media a [`MediaAsset`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A still image (raster or SVG).
    Image,
    /// A video clip, played muted and looping.
    #[serde(alias = "video")]
    Clip,
}

/// A background media source, owned by the caller.
///
/// Accepts the media-search wire shape (`{"type": "video", "url": "...", "id": 7}`) as well as
/// `{"kind": "clip", "source": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MediaAsset {
    /// Image or clip.
    #[serde(alias = "type")]
    pub kind: MediaKind,
    /// URI, `file://` URI, or filesystem path.
    #[serde(alias = "url")]
    pub source: String,
    /// Upstream identifier, carried through for logging only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl MediaAsset {
    pub fn image(source: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            source: source.into(),
            id: None,
        }
    }

    pub fn clip(source: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Clip,
            source: source.into(),
            id: None,
        }
    }
}

/// Input to a render: script lines, background media, and target duration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderJob {
    /// Script lines in display order; one line per segment.
    #[serde(default)]
    pub script: Vec<String>,
    /// Background media in display order; may be empty.
    #[serde(default)]
    pub media: Vec<MediaAsset>,
    /// Target duration in seconds.
    #[serde(alias = "duration")]
    pub duration_secs: f64,
}

impl RenderJob {
    /// Build and validate a job.
    pub fn new(
        script: Vec<String>,
        media: Vec<MediaAsset>,
        duration_secs: f64,
    ) -> ReelResult<Self> {
        let job = Self {
            script,
            media,
            duration_secs,
        };
        job.validate()?;
        Ok(job)
    }

    /// Parse and validate a job from JSON text.
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        let job: Self = serde_json::from_str(s)
            .map_err(|e| ReelError::validation(format!("invalid render job json: {e}")))?;
        job.validate()?;
        Ok(job)
    }

    /// Read, parse, and validate a job JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read render job '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.script.is_empty() {
            return Err(ReelError::validation(
                "render job script must contain at least one line",
            ));
        }
        if let Some(i) = self.script.iter().position(|l| l.trim().is_empty()) {
            return Err(ReelError::validation(format!(
                "render job script line {i} is blank"
            )));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(ReelError::validation(format!(
                "render job duration must be finite and > 0, got {}",
                self.duration_secs
            )));
        }
        Ok(())
    }
}

/// Split line-delimited script text into script lines.
///
/// Lines are trimmed and blank lines dropped.
pub fn parse_script_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/job/model.rs"]
mod tests;
