//! Drawing: the surface capability, the per-frame pipeline, and the CPU rasterizer.

pub(crate) mod blur;
/// `vello_cpu` surface.
pub mod cpu;
/// Per-frame draw order and frame style.
pub mod pipeline;
/// Surface trait, captured frames, and the recording surface.
pub mod surface;
/// Word wrapping, text animation, and block layout.
pub mod text;
