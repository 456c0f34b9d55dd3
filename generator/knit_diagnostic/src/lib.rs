//! Diagnostic system for the knit generator.
//!
//! - Error codes for searchability
//! - Element-attached locations (the inputs are declarations, not text)
//! - A collecting queue so one declaration's failure never blocks siblings

mod diagnostic;
mod error_code;
mod queue;

pub use diagnostic::{Diagnostic, Severity};
pub use error_code::ErrorCode;
pub use queue::DiagnosticQueue;
