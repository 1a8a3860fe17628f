use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Where a media source lives once its URI is resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLocation {
    /// Local file.
    File(PathBuf),
    /// Remote `http(s)` URL.
    Remote(String),
}

impl SourceLocation {
    /// Resolve a URI or path; relative paths are taken against `assets_root`.
    pub fn resolve(source: &str, assets_root: &Path) -> ReelResult<Self> {
        let s = source.trim();
        if s.is_empty() {
            return Err(ReelError::asset("media source must be non-empty"));
        }
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Remote(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix("file://") {
            // `file:///abs/path` and `file://localhost/abs/path`.
            let rest = rest.strip_prefix("localhost").unwrap_or(rest);
            if !rest.starts_with('/') {
                return Err(ReelError::asset(format!(
                    "unsupported file uri '{s}' (expected file:///path)"
                )));
            }
            return Ok(Self::File(PathBuf::from(rest)));
        }
        if let Some((scheme, _)) = s.split_once("://") {
            return Err(ReelError::asset(format!(
                "unsupported media uri scheme '{scheme}'"
            )));
        }
        let p = Path::new(s);
        if p.is_absolute() {
            Ok(Self::File(p.to_path_buf()))
        } else {
            Ok(Self::File(assets_root.join(p)))
        }
    }

    /// Argument form understood by `ffmpeg -i`.
    pub fn ffmpeg_input(&self) -> String {
        match self {
            Self::File(p) => p.display().to_string(),
            Self::Remote(url) => url.clone(),
        }
    }

    /// Whether the location names an `.svg` file.
    pub fn has_svg_extension(&self) -> bool {
        let path = match self {
            Self::File(p) => p.to_string_lossy().to_string(),
            Self::Remote(url) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
        };
        path.to_ascii_lowercase().ends_with(".svg")
    }
}

/// Blocking byte fetcher for local and remote sources.
pub struct Fetcher {
    http: reqwest::blocking::Client,
    max_bytes: u64,
}

impl Fetcher {
    pub fn new(max_bytes: u64) -> ReelResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("reelkit/", env!("CARGO_PKG_VERSION")))
            // Loads are unbounded; callers wrap them if they need a deadline.
            .timeout(None)
            .build()
            .context("build http client")?;
        Ok(Self { http, max_bytes })
    }

    pub fn fetch(&self, loc: &SourceLocation) -> ReelResult<Vec<u8>> {
        match loc {
            SourceLocation::File(p) => std::fs::read(p).map_err(|e| {
                ReelError::asset(format!("failed to read media '{}': {e}", p.display()))
            }),
            SourceLocation::Remote(url) => self.fetch_remote(url),
        }
    }

    fn fetch_remote(&self, url: &str) -> ReelResult<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|e| ReelError::asset(format!("request for '{url}' failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReelError::asset(format!(
                "request for '{url}' returned status {status}"
            )));
        }
        if let Some(len) = resp.content_length()
            && len > self.max_bytes
        {
            return Err(ReelError::asset(format!(
                "media '{url}' is {len} bytes, over the {} byte limit",
                self.max_bytes
            )));
        }

        let mut body = Vec::new();
        resp.take(self.max_bytes + 1)
            .read_to_end(&mut body)
            .map_err(|e| ReelError::asset(format!("reading body of '{url}' failed: {e}")))?;
        if body.len() as u64 > self.max_bytes {
            return Err(ReelError::asset(format!(
                "media '{url}' exceeds the {} byte limit",
                self.max_bytes
            )));
        }
        Ok(body)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
