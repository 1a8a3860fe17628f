//! Background media: fetching, decoding, clip playback, and the loading rules.

/// Image and SVG decoding into premultiplied RGBA8.
pub mod decode;
/// Source resolution and byte fetching (paths, `file://`, `http(s)://`).
pub mod fetch;
/// Font discovery and Parley text layout.
pub mod font;
/// Linear gradients and the fallback background.
pub mod gradient;
/// Loader trait, default loader, and ordered loading with fallback.
pub mod loader;
/// Looping clip playback through `ffmpeg`.
pub mod media;
