//! knit IR - declaration model and introspection facade.
//!
//! This crate contains the data the knit generator operates on:
//! - `Name` interned identifiers
//! - `ModifierSet` declaration modifiers
//! - `CachingStrategy` and annotation views
//! - `TypeRef` type references and the primitive table
//! - `TypeDecl` / `MethodDecl` / `FieldDecl` declaration arenas
//! - `Host`, the type introspection facade: member enumeration with
//!   override hiding, nominal subtyping, generic substitution, and the
//!   registry of generated companion types
//!
//! The resolution engine (`knit_resolve`) and the emitters (`knit_emit`)
//! consume declarations exclusively through `Host`; the facade is the only
//! seam between the engine and whatever produced the model.

mod builder;
mod caching;
mod decl;
mod host;
mod modifier;
mod name;
mod types;

pub use builder::{FieldSpec, HostBuilder, MethodSpec};
pub use caching::{CacheAnnotation, CachingStrategy, StrategyValue};
pub use decl::{
    Annotations, ElementRef, FieldDecl, FieldId, LookupSpec, MemberRef, MethodDecl, MethodId,
    MethodSig, ParamDecl, TypeDecl, TypeId, TypeKind, TypeParam,
};
pub use host::{EnclosingChain, Host, IncompatibleTypeParameters, Subst};
pub use modifier::ModifierSet;
pub use name::{Interner, Name};
pub use types::{Primitive, TypeRef};
