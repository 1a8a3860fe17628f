//! Encoders consume captured frames in order and produce a container payload.

/// Encoder trait, config, and the in-memory digest encoder.
pub mod encoder;
/// `ffmpeg`-based encoder (WebM/MP4 to an in-memory buffer).
pub mod ffmpeg;
/// Encoder state machine.
pub mod lifecycle;
