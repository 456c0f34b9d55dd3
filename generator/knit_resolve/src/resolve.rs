//! Dependency binding resolution for accessor methods.
//!
//! An abstract accessor of a make type needs a value from somewhere. The
//! search order is fixed: a parameter of the enclosing provider method, the
//! accessor's own concrete implementation, then the enclosing module scopes
//! from innermost to outermost. Within one scope a member matching the
//! lookup name wins over injecting the scope itself, and a method wins over
//! a field of the same name. An unresolvable dependency is a soft failure:
//! a warning pair, and the bare lookup name is emitted so the generated
//! source points at the hole.

use knit_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use knit_ir::{
    CachingStrategy, ElementRef, Host, MemberRef, MethodId, Name, ParamDecl, TypeId, TypeRef,
};

use crate::strategy::{member_effective_caching, EffectiveCaching};

/// Where an accessor's value comes from.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Binding {
    /// A parameter of the enclosing provider method.
    Parameter(Name),
    /// The accessor's own inherited concrete implementation.
    Super,
    /// A member of an enclosing module scope.
    Member { scope: TypeId, member: MemberRef },
    /// An enclosing module scope itself (self injection).
    Module { scope: TypeId },
    /// Nowhere. Already reported as a warning pair.
    Missing,
}

/// A resolved accessor binding.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Resolution {
    pub binding: Binding,
    /// The name the dependency was searched under.
    pub lookup_name: Name,
    /// Whether the binding makes caching pointless and forcibly disables it.
    pub caching_disabled: bool,
}

/// The name an accessor's dependency is searched under: explicit field
/// override, explicit method override, fallback value, then the accessor's
/// own name.
pub fn lookup_name(host: &Host, accessor: MethodId) -> Name {
    let decl = host.method(accessor);
    if let Some(lookup) = decl.annotations.lookup {
        if let Some(field) = lookup.field {
            return field;
        }
        if let Some(method) = lookup.method {
            return method;
        }
        if let Some(value) = lookup.value {
            return value;
        }
    }
    decl.name
}

/// The parameter name an accessor matches against, when different from the
/// lookup name.
fn param_name(host: &Host, accessor: MethodId, lookup: Name) -> Name {
    host.method(accessor)
        .annotations
        .lookup
        .and_then(|l| l.param)
        .unwrap_or(lookup)
}

/// Resolve the binding for one accessor of a make type.
///
/// `module` is the module whose provider method is being generated,
/// `factory_params` that provider method's parameters, `accessor_ret` the
/// accessor's return type instantiated at the make type, and
/// `accessor_caching` the accessor's own effective caching (used for the
/// redundancy override).
pub fn resolve_dependency(
    host: &Host,
    module: TypeId,
    factory_params: &[ParamDecl],
    accessor: MethodId,
    accessor_ret: &TypeRef,
    accessor_caching: EffectiveCaching,
    diags: &mut DiagnosticQueue,
) -> Resolution {
    let lookup = lookup_name(host, accessor);
    let binding = find_binding(host, module, factory_params, accessor, accessor_ret, lookup);

    if binding == Binding::Missing {
        let name = host.name(lookup).to_owned();
        diags.emit(
            Diagnostic::warning(ErrorCode::W2101)
                .with_message(format!(
                    "this module is missing the dependency `{name}`"
                ))
                .with_origin(ElementRef::Type(module)),
        );
        diags.emit(
            Diagnostic::warning(ErrorCode::W2102)
                .with_message(format!(
                    "the dependency `{name}` returned by this accessor cannot be resolved"
                ))
                .with_origin(ElementRef::Method(accessor)),
        );
    }

    let caching_disabled = caching_overridden(host, &binding, accessor_caching);
    Resolution {
        binding,
        lookup_name: lookup,
        caching_disabled,
    }
}

fn find_binding(
    host: &Host,
    module: TypeId,
    factory_params: &[ParamDecl],
    accessor: MethodId,
    accessor_ret: &TypeRef,
    lookup: Name,
) -> Binding {
    let wanted_param = param_name(host, accessor, lookup);
    if let Some(p) = factory_params.iter().find(|p| p.name == wanted_param) {
        return Binding::Parameter(p.name);
    }

    if !host.method(accessor).is_abstract() {
        return Binding::Super;
    }

    for scope in host.enclosing_chain(module) {
        let members = host.members_of(scope);
        let hit = members
            .iter()
            .copied()
            .filter(|m| m.as_method().is_some())
            .chain(members.iter().copied().filter(|m| m.as_field().is_some()))
            .find(|m| host.member_name(*m) == lookup);
        if let Some(member) = hit {
            return Binding::Member { scope, member };
        }
        if host.is_subtype(&host.self_type(scope), accessor_ret) {
            return Binding::Module { scope };
        }
    }

    Binding::Missing
}

/// Whether the binding overrides the accessor's caching to `Disabled`.
///
/// Parameters and module self injection are already plain references.
/// A final field never changes. A target whose own effective strategy
/// equals the accessor's would cache the same value twice. A parameterized
/// method target cannot be cached at all.
fn caching_overridden(host: &Host, binding: &Binding, accessor_caching: EffectiveCaching) -> bool {
    match binding {
        Binding::Parameter(_) | Binding::Module { .. } => true,
        Binding::Member { member, .. } => {
            if host.member_modifiers(*member).is_final()
                && matches!(member, MemberRef::Field(_))
            {
                return true;
            }
            if member_effective_caching(host, *member).strategy == accessor_caching.strategy
                && accessor_caching.strategy != CachingStrategy::Disabled
            {
                return true;
            }
            match member {
                MemberRef::Method(m) => !host.method(*m).is_parameterless(),
                MemberRef::Field(_) => false,
            }
        }
        Binding::Super | Binding::Missing => false,
    }
}

#[cfg(test)]
mod tests {
    use knit_ir::{
        CacheAnnotation, FieldSpec, HostBuilder, MethodSpec, ModifierSet, TypeKind,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    struct Fixture {
        host: Host,
        module: TypeId,
        accessor: MethodId,
        clock: TypeId,
    }

    /// A module with a provider returning an abstract widget type whose one
    /// accessor `clock()` needs a `time.Clock`.
    fn fixture(build: impl FnOnce(&mut HostBuilder, TypeId, TypeId)) -> Fixture {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        let accessor = b.add_method(
            widget,
            MethodSpec::abstract_("clock", TypeRef::declared(clock)),
        );
        let module = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(module);
        build(&mut b, module, clock);
        Fixture {
            host: b.finish(),
            module,
            accessor,
            clock,
        }
    }

    fn resolve(f: &Fixture, factory_params: &[ParamDecl], diags: &mut DiagnosticQueue) -> Resolution {
        resolve_dependency(
            &f.host,
            f.module,
            factory_params,
            f.accessor,
            &TypeRef::declared(f.clock),
            EffectiveCaching::DISABLED,
            diags,
        )
    }

    #[test]
    fn test_parameter_reference_wins() {
        let f = fixture(|b, module, clock| {
            b.add_method(
                module,
                MethodSpec::new("clock", TypeRef::declared(clock)),
            );
        });
        // The provider parameter shares the accessor's name.
        let clock_param = ParamDecl {
            name: f.host.method(f.accessor).name,
            ty: TypeRef::declared(f.clock),
        };

        let mut diags = DiagnosticQueue::new();
        let res = resolve(&f, std::slice::from_ref(&clock_param), &mut diags);
        assert_eq!(res.binding, Binding::Parameter(clock_param.name));
        assert!(res.caching_disabled);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_module_method_preferred_over_field() {
        let f = fixture(|b, module, clock| {
            b.add_field(module, FieldSpec::new("clock", TypeRef::declared(clock)));
            b.add_method(module, MethodSpec::new("clock", TypeRef::declared(clock)));
        });

        let mut diags = DiagnosticQueue::new();
        let res = resolve(&f, &[], &mut diags);
        match res.binding {
            Binding::Member { scope, member } => {
                assert_eq!(scope, f.module);
                assert!(member.as_method().is_some());
            }
            other => panic!("expected member binding, got {other:?}"),
        }
    }

    #[test]
    fn test_enclosing_scope_searched_outermost_last() {
        let f = fixture(|b, module, clock| {
            let outer = b.declare_type("a.Outer", TypeKind::Interface);
            b.add_method(outer, MethodSpec::new("clock", TypeRef::declared(clock)));
            b.set_enclosing(module, outer);
        });

        let mut diags = DiagnosticQueue::new();
        let res = resolve(&f, &[], &mut diags);
        match res.binding {
            Binding::Member { scope, .. } => {
                assert_eq!(f.host.name(f.host.type_decl(scope).simple), "Outer");
            }
            other => panic!("expected member binding, got {other:?}"),
        }
    }

    #[test]
    fn test_module_self_injection() {
        let mut b = HostBuilder::new();
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        let module = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(module);
        b.add_supertype(module, TypeRef::declared(widget));
        let holder = b.declare_type("a.Holder", TypeKind::Interface);
        let accessor = b.add_method(
            holder,
            MethodSpec::abstract_("widget", TypeRef::declared(widget)),
        );
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let res = resolve_dependency(
            &host,
            module,
            &[],
            accessor,
            &TypeRef::declared(widget),
            EffectiveCaching::DISABLED,
            &mut diags,
        );
        assert_eq!(res.binding, Binding::Module { scope: module });
        assert!(res.caching_disabled);
    }

    #[test]
    fn test_missing_dependency_warns_twice_and_soft_fails() {
        let f = fixture(|_, _, _| {});

        let mut diags = DiagnosticQueue::new();
        let res = resolve(&f, &[], &mut diags);
        assert_eq!(res.binding, Binding::Missing);
        assert!(!diags.has_errors());
        assert_eq!(diags.warnings().count(), 2);
    }

    #[test]
    fn test_final_field_disables_caching() {
        let f = fixture(|b, module, clock| {
            b.add_field(
                module,
                FieldSpec::new("clock", TypeRef::declared(clock)).modifiers(ModifierSet::FINAL),
            );
        });

        let mut diags = DiagnosticQueue::new();
        let res = resolve(&f, &[], &mut diags);
        assert!(res.caching_disabled);
    }

    #[test]
    fn test_same_strategy_on_target_disables_caching() {
        let f = fixture(|b, module, clock| {
            b.add_method(
                module,
                MethodSpec::new("clock", TypeRef::declared(clock))
                    .cache(CacheAnnotation::known(CachingStrategy::ThreadSafe)),
            );
        });

        let mut diags = DiagnosticQueue::new();
        let res = resolve_dependency(
            &f.host,
            f.module,
            &[],
            f.accessor,
            &TypeRef::declared(f.clock),
            EffectiveCaching {
                strategy: CachingStrategy::ThreadSafe,
                nullable: false,
            },
            &mut diags,
        );
        assert!(res.caching_disabled);
    }

    #[test]
    fn test_parameterized_target_method_disables_caching() {
        let f = fixture(|b, module, clock| {
            b.add_method(
                module,
                MethodSpec::new("clock", TypeRef::declared(clock))
                    .param("zone", TypeRef::declared(clock)),
            );
        });

        let mut diags = DiagnosticQueue::new();
        let res = resolve_dependency(
            &f.host,
            f.module,
            &[],
            f.accessor,
            &TypeRef::declared(f.clock),
            EffectiveCaching {
                strategy: CachingStrategy::NotThreadSafe,
                nullable: false,
            },
            &mut diags,
        );
        assert!(res.caching_disabled);
    }

    #[test]
    fn test_lookup_name_chain() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        let spec = b.lookup_spec("fallback", "theField", "", "");
        let accessor = b.add_method(
            widget,
            MethodSpec::abstract_("clock", TypeRef::declared(clock)).lookup(spec),
        );
        let host = b.finish();

        assert_eq!(host.name(lookup_name(&host, accessor)), "theField");
    }
}
