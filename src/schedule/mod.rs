//! Frame timing: which script line and background are on screen, and when steps run.

/// Frame index to segment mapping.
pub mod frame;
/// Pacing policies for driving a render.
pub mod pacing;
