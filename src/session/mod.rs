//! Job-level API: start a render, step it, observe progress, and collect the result.

/// Progress stream and single-resolution result.
pub mod progress;
/// Compositor, render task, and driver.
pub mod render_task;
