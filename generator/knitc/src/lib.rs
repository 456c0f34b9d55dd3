//! Driver for the knit companion generator.
//!
//! Loads a JSON declaration model, runs the multi-pass scheduler over
//! every module declaration, and writes the generated companion sources
//! to a sink.

pub mod input;
pub mod scheduler;
pub mod sink;

pub use input::{load_model, parse_model, InputError};
pub use scheduler::{run, GenerateOptions, RunSummary};
pub use sink::{ArtifactSink, DirSink, MemorySink};
