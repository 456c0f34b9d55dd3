//! Source rendering for the knit generator.
//!
//! Takes the fact tables produced by `knit_resolve` and renders the two
//! companion artifacts per module: the `M$` interface and the `M$$` class.
//! Rendering is deterministic; identical facts always produce byte-identical
//! sources.

pub mod output;
pub mod render;
pub mod templates;

pub use output::Output;
pub use render::{render_module, Artifact};
pub use templates::MethodTemplate;
