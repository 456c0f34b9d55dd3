//! Effective caching strategy lookup.
//!
//! Strategy selection is a total function of (method, enclosing chain): a
//! direct annotation wins; an abstract, unannotated method inherits from the
//! innermost annotated enclosing scope; the default is `Disabled`. It never
//! depends on the dependency binding, which is resolved separately.

use knit_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use knit_ir::{
    CacheAnnotation, CachingStrategy, ElementRef, Host, MemberRef, MethodId, StrategyValue,
};

/// The resolved caching behavior of a method.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct EffectiveCaching {
    pub strategy: CachingStrategy,
    /// Whether the cached value may be null (wraps the cache field in a
    /// supplier). Only meaningful for non-primitive returns.
    pub nullable: bool,
}

impl EffectiveCaching {
    pub const DISABLED: EffectiveCaching = EffectiveCaching {
        strategy: CachingStrategy::Disabled,
        nullable: false,
    };
}

/// The cache annotation in effect for a method: its own, or (when the
/// method is abstract and unannotated) the innermost annotated enclosing
/// scope's. Walks the whole enclosing chain.
pub fn effective_annotation(host: &Host, method: MethodId) -> Option<CacheAnnotation> {
    let decl = host.method(method);
    if let Some(cache) = decl.annotations.cache {
        return Some(cache);
    }
    if decl.is_abstract() {
        for scope in host.enclosing_chain(decl.owner) {
            if let Some(cache) = host.type_decl(scope).annotations.cache {
                return Some(cache);
            }
        }
    }
    None
}

/// The effective caching of a method. Unrecognized strategy values resolve
/// to `Disabled`; reporting them is [`check_strategy_value`]'s job so the
/// error appears exactly once per classification.
pub fn effective_caching(host: &Host, method: MethodId) -> EffectiveCaching {
    match effective_annotation(host, method) {
        Some(annotation) => EffectiveCaching {
            strategy: annotation.value.known().unwrap_or_default(),
            nullable: annotation.nullable,
        },
        None => EffectiveCaching::DISABLED,
    }
}

/// The effective caching of an arbitrary member, used when comparing an
/// accessor's strategy against its binding target's. Fields carry only
/// their own annotation.
pub fn member_effective_caching(host: &Host, member: MemberRef) -> EffectiveCaching {
    match member {
        MemberRef::Method(id) => effective_caching(host, id),
        MemberRef::Field(id) => match host.field(id).annotations.cache {
            Some(annotation) => EffectiveCaching {
                strategy: annotation.value.known().unwrap_or_default(),
                nullable: annotation.nullable,
            },
            None => EffectiveCaching::DISABLED,
        },
    }
}

/// Report an unrecognized caching-strategy value on a method, if any.
///
/// The fallback to `Disabled` happens in [`effective_caching`]; this adds
/// the diagnostic so the miscompile is never silent.
pub fn check_strategy_value(host: &Host, method: MethodId, diags: &mut DiagnosticQueue) {
    if let Some(annotation) = effective_annotation(host, method) {
        if let StrategyValue::Unknown(raw) = annotation.value {
            diags.emit(
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(format!(
                        "unknown caching strategy `{}` - caching is disabled",
                        host.name(raw)
                    ))
                    .with_origin(ElementRef::Method(method)),
            );
        }
    }
}
