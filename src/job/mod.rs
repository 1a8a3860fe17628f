/// Render job input model and JSON loading.
pub mod model;
