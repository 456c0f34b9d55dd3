//! Resolution engine for the knit generator.
//!
//! Turns a declaration model ([`knit_ir::Host`]) into per-module fact
//! tables the emitter renders from:
//!
//! - [`classify`]: which members get generated implementations
//! - [`strategy`]: effective caching strategy selection
//! - [`resolve`]: dependency binding for make-type accessors
//! - [`make_type`]: the concrete type a provider instantiates
//! - [`facts`]: the per-module assembly of all of the above
//!
//! Analysis is total per declaration: it either produces facts, defers the
//! declaration to a later pass, or reports diagnostics and drops the
//! offending members. It never panics on malformed input.

pub mod classify;
pub mod facts;
pub mod make_type;
pub mod resolve;
pub mod strategy;

pub use classify::{Classification, Classified};
pub use facts::{analyze_module, validate_module, AccessorFacts, Analysis, ModuleFacts, ModuleMethodFacts};
pub use make_type::MakeType;
pub use resolve::{Binding, Resolution};
pub use strategy::EffectiveCaching;
