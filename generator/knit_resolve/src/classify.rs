//! Member classification: which methods of a type the generator implements.
//!
//! A method is a candidate when it is abstract, or when it is parameterless
//! with caching enabled (a concrete method that only needs a caching
//! wrapper). Candidates then pass through processability checks, the void
//! policy, clash detection, and the lookup exemption, in that order.

use knit_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use knit_ir::{CachingStrategy, ElementRef, Host, MethodId, MethodSig, TypeId, TypeRef};

use crate::strategy::{check_strategy_value, effective_caching};

/// Classification result for one type.
#[derive(Clone, Debug)]
pub struct Classified {
    /// Surviving candidates with their signatures instantiated at the
    /// classified type, in member-enumeration order.
    pub candidates: Vec<(MethodId, MethodSig)>,
    /// Whether any abstract member remains unimplemented (void return or
    /// lookup-exempted). A type with abstract leftovers gets no factory.
    pub has_abstract_members: bool,
}

/// Outcome of classifying a type in the current pass.
#[derive(Clone, Debug)]
pub enum Classification {
    Ready(Classified),
    /// A referenced type is not processable yet (unresolved reference, or a
    /// module companion not generated in an earlier pass). Retry later.
    Deferred,
}

/// Classify the members of `owner`.
///
/// Structural errors (void caching, clashes) are emitted into `diags` and
/// the offending members dropped; only missing referenced types cause
/// deferral.
pub fn classify(host: &Host, owner: TypeId, diags: &mut DiagnosticQueue) -> Classification {
    let site = host.self_type(owner);
    let is_module = host.type_decl(owner).is_module();

    // A module inheriting from an unresolved or unprocessable supertype has
    // unknown members; wait for a later pass to resolve it.
    if is_module && !supertypes_processable(host, owner, &mut Vec::new()) {
        tracing::debug!(
            module = host.describe(ElementRef::Type(owner)),
            "supertype not processable yet, deferring"
        );
        return Classification::Deferred;
    }

    // Overridable methods, most-derived first.
    let mut selected: Vec<(MethodId, MethodSig)> = Vec::new();
    for member in host.members_of(owner) {
        let Some(mid) = member.as_method() else {
            continue;
        };
        let decl = host.method(mid);
        if decl.modifiers.is_static() || decl.modifiers.is_private() || decl.modifiers.is_final() {
            continue;
        }
        check_strategy_value(host, mid, diags);
        let caching = effective_caching(host, mid);
        let candidate = decl.is_abstract()
            || (decl.is_parameterless() && caching.strategy != CachingStrategy::Disabled);
        if !candidate {
            continue;
        }
        let sig = host.method_sig_in(&site, mid);
        if is_module && !method_processable(host, mid, &sig) {
            tracing::debug!(
                method = host.describe(ElementRef::Method(mid)),
                "referenced type not processable yet, deferring"
            );
            return Classification::Deferred;
        }
        selected.push((mid, sig));
    }

    // Void policy: an abstract void method stays abstract; a concrete one
    // reached this point only because caching was requested, which is
    // meaningless for void.
    let mut has_abstract_members = false;
    selected.retain(|(mid, sig)| {
        if !sig.ret.is_void() {
            return true;
        }
        if host.method(*mid).is_abstract() {
            has_abstract_members = true;
        } else {
            diags.emit(
                Diagnostic::error(ErrorCode::E1004)
                    .with_message("cannot cache a void return value")
                    .with_origin(ElementRef::Method(*mid)),
            );
        }
        false
    });

    detect_clashes(host, owner, &mut selected, diags);

    // Lookup-annotated methods are hand-written delegation points, not
    // generated ones. An abstract one keeps the type abstract.
    selected.retain(|(mid, _)| {
        let decl = host.method(*mid);
        if decl.annotations.lookup.is_some() && is_module {
            if decl.is_abstract() {
                has_abstract_members = true;
            }
            return false;
        }
        true
    });

    Classification::Ready(Classified {
        candidates: selected,
        has_abstract_members,
    })
}

/// Whether every type a candidate mentions can be handled: no unresolved
/// references, and module-typed references only once their companion class
/// exists (generated in an earlier pass).
fn method_processable(host: &Host, mid: MethodId, sig: &MethodSig) -> bool {
    if !type_processable(host, &sig.ret) {
        return false;
    }
    if sig.params.iter().any(|p| !type_processable(host, p)) {
        return false;
    }
    if let Some(make) = &host.method(mid).annotations.make {
        if !type_processable(host, make) {
            return false;
        }
    }
    true
}

/// Whether every supertype in the hierarchy of `t` resolves to a known
/// declaration.
fn supertypes_processable(host: &Host, t: TypeId, visited: &mut Vec<TypeId>) -> bool {
    if visited.contains(&t) {
        return true;
    }
    visited.push(t);
    for sup in &host.type_decl(t).supertypes {
        if sup.has_error() {
            return false;
        }
        if let Some(decl) = sup.decl() {
            if !supertypes_processable(host, decl, visited) {
                return false;
            }
        }
    }
    true
}

fn type_processable(host: &Host, ty: &TypeRef) -> bool {
    if ty.has_error() {
        return false;
    }
    match ty.decl() {
        Some(decl) if host.type_decl(decl).is_module() => {
            host.companion_class_of(decl).is_some()
        }
        _ => true,
    }
}

/// Remove pairs of same-name candidates whose parameter types are equal at
/// the classified type: neither overrides the other, so one generated
/// implementation cannot satisfy both. Reports on the type and on both
/// members.
fn detect_clashes(
    host: &Host,
    owner: TypeId,
    selected: &mut Vec<(MethodId, MethodSig)>,
    diags: &mut DiagnosticQueue,
) {
    let mut clashing: Vec<MethodId> = Vec::new();
    for i in 0..selected.len() {
        for j in (i + 1)..selected.len() {
            let (a, sig_a) = &selected[i];
            let (b, sig_b) = &selected[j];
            if host.method(*a).name != host.method(*b).name || sig_a.params != sig_b.params {
                continue;
            }
            // An override in either direction is legitimate; only equal
            // signatures from unrelated owners clash.
            let owner_a = host.self_type(host.method(*a).owner);
            let owner_b = host.self_type(host.method(*b).owner);
            if host.is_subtype(&owner_a, &owner_b) || host.is_subtype(&owner_b, &owner_a) {
                continue;
            }
            if clashing.contains(a) && clashing.contains(b) {
                continue;
            }
            let desc_a = host.describe(ElementRef::Method(*a));
            let desc_b = host.describe(ElementRef::Method(*b));
            diags.emit(
                Diagnostic::error(ErrorCode::E1003)
                    .with_message("cannot implement this interface because two members clash")
                    .with_origin(ElementRef::Type(owner))
                    .with_note(format!("`{desc_a}` and `{desc_b}` do not override each other")),
            );
            diags.emit(
                Diagnostic::error(ErrorCode::E1003)
                    .with_message(format!("this method clashes with `{desc_b}`"))
                    .with_origin(ElementRef::Method(*a)),
            );
            diags.emit(
                Diagnostic::error(ErrorCode::E1003)
                    .with_message(format!(
                        "this method clashes with `{desc_a}`; remove or override one of them"
                    ))
                    .with_origin(ElementRef::Method(*b)),
            );
            clashing.push(*a);
            clashing.push(*b);
        }
    }
    selected.retain(|(mid, _)| !clashing.contains(mid));
}

#[cfg(test)]
mod tests {
    use knit_ir::{
        CacheAnnotation, CachingStrategy, HostBuilder, MethodSpec, Primitive, TypeKind, TypeRef,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn ready(c: Classification) -> Classified {
        match c {
            Classification::Ready(c) => c,
            Classification::Deferred => panic!("expected Ready, got Deferred"),
        }
    }

    #[test]
    fn test_abstract_and_cached_concrete_are_candidates() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        let wanted = b.add_method(app, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let cached = b.add_method(
            app,
            MethodSpec::new("zone", TypeRef::declared(clock))
                .cache(CacheAnnotation::known(CachingStrategy::NotThreadSafe)),
        );
        // Concrete, uncached, parameterless: nothing for the generator to do.
        b.add_method(app, MethodSpec::new("noise", TypeRef::declared(clock)));
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let classified = ready(classify(&host, app, &mut diags));
        let ids: Vec<_> = classified.candidates.iter().map(|(m, _)| *m).collect();
        assert_eq!(ids, vec![wanted, cached]);
        assert!(!classified.has_abstract_members);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_abstract_void_stays_abstract() {
        let mut b = HostBuilder::new();
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(
            app,
            MethodSpec::abstract_("run", TypeRef::Primitive(Primitive::Void)),
        );
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let classified = ready(classify(&host, app, &mut diags));
        assert!(classified.candidates.is_empty());
        assert!(classified.has_abstract_members);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_cached_void_is_an_error() {
        let mut b = HostBuilder::new();
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(
            app,
            MethodSpec::new("run", TypeRef::Primitive(Primitive::Void))
                .cache(CacheAnnotation::known(CachingStrategy::ThreadSafe)),
        );
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let classified = ready(classify(&host, app, &mut diags));
        assert!(classified.candidates.is_empty());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn test_clashing_members_excluded_with_three_reports() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let left = b.declare_type("a.Left", TypeKind::Interface);
        b.add_method(left, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let right = b.declare_type("a.Right", TypeKind::Interface);
        b.add_method(right, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_supertype(app, TypeRef::declared(left));
        b.add_supertype(app, TypeRef::declared(right));
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let classified = ready(classify(&host, app, &mut diags));
        assert!(classified.candidates.is_empty());
        assert_eq!(diags.error_count(), 3);
    }

    #[test]
    fn test_override_pair_is_not_a_clash() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let base = b.declare_type("a.Base", TypeKind::Interface);
        b.add_method(base, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_supertype(app, TypeRef::declared(base));
        let wanted = b.add_method(app, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let classified = ready(classify(&host, app, &mut diags));
        let ids: Vec<_> = classified.candidates.iter().map(|(m, _)| *m).collect();
        assert_eq!(ids, vec![wanted]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unresolved_supertype_defers() {
        let mut b = HostBuilder::new();
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_supertype(app, TypeRef::Error);
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        assert!(matches!(
            classify(&host, app, &mut diags),
            Classification::Deferred
        ));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_lookup_annotated_method_is_exempt() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        let spec = b.lookup_spec("", "", "", "");
        b.add_method(
            app,
            MethodSpec::abstract_("clock", TypeRef::declared(clock)).lookup(spec),
        );
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let classified = ready(classify(&host, app, &mut diags));
        assert!(classified.candidates.is_empty());
        assert!(classified.has_abstract_members);
    }

    #[test]
    fn test_module_reference_defers_until_companion_exists() {
        let mut b = HostBuilder::new();
        let dep = b.declare_type("a.Dep", TypeKind::Interface);
        b.mark_module(dep);
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(app, MethodSpec::abstract_("dep", TypeRef::declared(dep)));
        let mut host = b.finish();

        let mut diags = DiagnosticQueue::new();
        assert!(matches!(
            classify(&host, app, &mut diags),
            Classification::Deferred
        ));

        host.register_companions(dep, &[], false);
        assert!(matches!(
            classify(&host, app, &mut diags),
            Classification::Ready(_)
        ));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unresolved_reference_defers() {
        let mut b = HostBuilder::new();
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(app, MethodSpec::abstract_("mystery", TypeRef::Error));
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        assert!(matches!(
            classify(&host, app, &mut diags),
            Classification::Deferred
        ));
    }
}
