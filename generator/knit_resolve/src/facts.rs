//! Per-module analysis: everything the emitter needs, resolved up front.
//!
//! `analyze_module` runs classification, make-type resolution, and accessor
//! binding for one module declaration and returns a flat fact table. The
//! emitter renders from facts only; it never queries the model again, so
//! rendering cannot observe a state the analysis did not.

use knit_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use knit_ir::{
    CachingStrategy, ElementRef, Host, MethodId, MethodSig, TypeId, TypeRef,
};

use crate::classify::{classify, Classification, Classified};
use crate::make_type::{resolve_make_type, MakeType};
use crate::resolve::{resolve_dependency, Resolution};
use crate::strategy::{effective_caching, EffectiveCaching};

/// One accessor of a make type, fully resolved.
#[derive(Clone, Debug)]
pub struct AccessorFacts {
    pub method: MethodId,
    /// Signature instantiated at the make type.
    pub sig: MethodSig,
    /// Caching strategy after binding overrides.
    pub caching: CachingStrategy,
    pub nullable: bool,
    pub resolution: Resolution,
}

/// One generated method of a module, fully resolved.
#[derive(Clone, Debug)]
pub struct ModuleMethodFacts {
    pub method: MethodId,
    /// Signature instantiated at the module.
    pub sig: MethodSig,
    pub is_abstract: bool,
    pub caching: CachingStrategy,
    pub nullable: bool,
    /// The type the provider instantiates (companion-substituted).
    pub make: TypeRef,
    /// Whether instantiation needs a local implementation class.
    pub make_is_abstract: bool,
    /// Whether the local class implements (vs extends) the make type.
    pub make_is_interface: bool,
    /// Accessors the local class must override. Empty for concrete makes.
    pub accessors: Vec<AccessorFacts>,
}

/// Everything needed to emit one module's companion pair.
#[derive(Clone, Debug)]
pub struct ModuleFacts {
    pub module: TypeId,
    pub methods: Vec<ModuleMethodFacts>,
    /// True when an abstract member remains unimplemented; suppresses the
    /// `new$` factory so the companion cannot be instantiated incomplete.
    pub has_abstract_members: bool,
}

/// Outcome of analyzing a module in the current pass.
#[derive(Clone, Debug)]
pub enum Analysis {
    Ready(ModuleFacts),
    /// A referenced declaration is not processable yet. Retry next pass.
    Deferred,
}

/// Structural requirements on a module declaration itself. Returns false
/// when the declaration cannot be processed at all.
pub fn validate_module(host: &Host, module: TypeId, diags: &mut DiagnosticQueue) -> bool {
    let decl = host.type_decl(module);
    let mut ok = true;
    if !decl.is_interface() {
        diags.emit(
            Diagnostic::error(ErrorCode::E1001)
                .with_message("a module must be an interface")
                .with_origin(ElementRef::Type(module)),
        );
        ok = false;
    }
    // Companions are emitted as top-level types in the module's package;
    // a nested module they must reach can only be package-local.
    if decl.is_nested() && !decl.modifiers.retain(knit_ir::ModifierSet::VISIBILITY).is_empty() {
        diags.emit(
            Diagnostic::error(ErrorCode::E1002)
                .with_message("a nested module must be package-local")
                .with_origin(ElementRef::Type(module)),
        );
        ok = false;
    }
    ok
}

/// Analyze one module declaration.
///
/// Structural errors land in `diags`; the caller checks the queue and
/// withholds both artifacts when any error was reported.
pub fn analyze_module(host: &Host, module: TypeId, diags: &mut DiagnosticQueue) -> Analysis {
    let Classification::Ready(classified) = classify(host, module, diags) else {
        return Analysis::Deferred;
    };
    let Classified {
        candidates,
        has_abstract_members,
    } = classified;

    let mut methods = Vec::with_capacity(candidates.len());
    for (mid, sig) in candidates {
        let decl = host.method(mid);
        let own_caching = effective_caching(host, mid);
        let nullable = !decl.is_abstract() && !sig.ret.is_primitive() && own_caching.nullable;

        if !decl.is_abstract() {
            // Concrete cached method: only the caching wrapper is
            // generated, delegating to the inherited implementation.
            let make = sig.ret.clone();
            methods.push(ModuleMethodFacts {
                method: mid,
                sig,
                is_abstract: false,
                caching: own_caching.strategy,
                nullable,
                make,
                make_is_abstract: false,
                make_is_interface: false,
                accessors: Vec::new(),
            });
            continue;
        }

        let MakeType::Resolved(make) = resolve_make_type(host, mid, &sig.ret, diags) else {
            // Reported on the method; the declaration fails without
            // poisoning the rest of the pass.
            continue;
        };
        let (make_is_abstract, make_is_interface) = match make.decl() {
            Some(d) => {
                let md = host.type_decl(d);
                (md.is_abstract(), md.is_interface())
            }
            None => (false, false),
        };

        let mut accessors = Vec::new();
        if make_is_abstract {
            let Some(resolved) = resolve_accessors(host, module, mid, &make, diags) else {
                return Analysis::Deferred;
            };
            accessors = resolved;
        }

        methods.push(ModuleMethodFacts {
            method: mid,
            sig,
            is_abstract: true,
            caching: own_caching.strategy,
            nullable,
            make,
            make_is_abstract,
            make_is_interface,
            accessors,
        });
    }

    Analysis::Ready(ModuleFacts {
        module,
        methods,
        has_abstract_members,
    })
}

/// Resolve the accessor overrides a local implementation class needs for
/// one provider method. `None` when the make type itself must be deferred.
fn resolve_accessors(
    host: &Host,
    module: TypeId,
    provider: MethodId,
    make: &TypeRef,
    diags: &mut DiagnosticQueue,
) -> Option<Vec<AccessorFacts>> {
    let make_decl = make.decl()?;
    let Classification::Ready(classified) = classify(host, make_decl, diags) else {
        return None;
    };

    let provider_params = &host.method(provider).params;
    let mut out = Vec::new();
    // Concrete candidates stay in: a cached concrete member of the make
    // type gets a caching override in the local class, resolved to a
    // `Super` binding.
    for (mid, _) in classified.candidates {
        let sig = host.method_sig_in(make, mid);
        let own_caching = effective_caching(host, mid);
        let resolution = resolve_dependency(
            host,
            module,
            provider_params,
            mid,
            &sig.ret,
            own_caching,
            diags,
        );
        // Only a parameterless accessor can hold a cache field.
        let caching = if resolution.caching_disabled || !host.method(mid).is_parameterless() {
            CachingStrategy::Disabled
        } else {
            own_caching.strategy
        };
        let nullable = accessor_nullable(host, &sig, own_caching, &resolution);
        out.push(AccessorFacts {
            method: mid,
            sig,
            caching,
            nullable,
            resolution,
        });
    }
    Some(out)
}

/// Whether an accessor's cached value may be null. A bound member decides
/// for itself: a concrete target annotated nullable. Otherwise the
/// accessor's own annotation decides, for non-primitive returns.
fn accessor_nullable(
    host: &Host,
    sig: &MethodSig,
    own_caching: EffectiveCaching,
    resolution: &Resolution,
) -> bool {
    if sig.ret.is_primitive() {
        return false;
    }
    match &resolution.binding {
        crate::resolve::Binding::Member { member, .. } => {
            let target_abstract = host.member_modifiers(*member).is_abstract();
            !target_abstract
                && host
                    .member_annotations(*member)
                    .cache
                    .is_some_and(|c| c.nullable)
        }
        _ => own_caching.nullable,
    }
}

#[cfg(test)]
mod tests {
    use knit_ir::{
        CacheAnnotation, HostBuilder, MethodSpec, ModifierSet, TypeKind,
    };
    use pretty_assertions::assert_eq;

    use crate::resolve::Binding;

    use super::*;

    fn ready(a: Analysis) -> ModuleFacts {
        match a {
            Analysis::Ready(f) => f,
            Analysis::Deferred => panic!("expected Ready, got Deferred"),
        }
    }

    #[test]
    fn test_validate_module_rejects_class() {
        let mut b = HostBuilder::new();
        let app = b.declare_type("a.App", TypeKind::Class);
        b.mark_module(app);
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        assert!(!validate_module(&host, app, &mut diags));
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn test_validate_module_rejects_public_nested() {
        let mut b = HostBuilder::new();
        let outer = b.declare_type("a.Outer", TypeKind::Interface);
        let inner = b.declare_type("a.Outer.App", TypeKind::Interface);
        b.set_enclosing(inner, outer);
        b.set_modifiers(inner, ModifierSet::PUBLIC);
        b.mark_module(inner);
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        assert!(!validate_module(&host, inner, &mut diags));
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn test_validate_module_accepts_package_local_nested() {
        let mut b = HostBuilder::new();
        let outer = b.declare_type("a.Outer", TypeKind::Interface);
        let inner = b.declare_type("a.Outer.App", TypeKind::Interface);
        b.set_enclosing(inner, outer);
        b.mark_module(inner);
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        assert!(validate_module(&host, inner, &mut diags));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_concrete_make_type_needs_no_accessors() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.RealClock", TypeKind::Class);
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(app, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let facts = ready(analyze_module(&host, app, &mut diags));
        assert_eq!(facts.methods.len(), 1);
        let m = &facts.methods[0];
        assert!(!m.make_is_abstract);
        assert!(m.accessors.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_abstract_make_type_resolves_accessors() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        b.add_method(widget, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(app, MethodSpec::new("clock", TypeRef::declared(clock)));
        b.add_method(app, MethodSpec::abstract_("widget", TypeRef::declared(widget)));
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let facts = ready(analyze_module(&host, app, &mut diags));
        let widget_method = facts
            .methods
            .iter()
            .find(|m| m.make_is_abstract)
            .unwrap_or_else(|| panic!("expected an abstract make"));
        assert_eq!(widget_method.accessors.len(), 1);
        let accessor = &widget_method.accessors[0];
        assert!(matches!(accessor.resolution.binding, Binding::Member { .. }));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_factory_parameter_binds_accessor() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        b.add_method(widget, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(
            app,
            MethodSpec::abstract_("widget", TypeRef::declared(widget))
                .param("clock", TypeRef::declared(clock)),
        );
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let facts = ready(analyze_module(&host, app, &mut diags));
        let accessor = &facts.methods[0].accessors[0];
        assert!(matches!(
            accessor.resolution.binding,
            Binding::Parameter(_)
        ));
        assert_eq!(accessor.caching, CachingStrategy::Disabled);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_accessor_inherits_nullability_from_target() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        b.add_method(
            widget,
            MethodSpec::abstract_("clock", TypeRef::declared(clock))
                .cache(CacheAnnotation::known(CachingStrategy::ThreadSafe)),
        );
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(
            app,
            MethodSpec::new("clock", TypeRef::declared(clock))
                .cache(CacheAnnotation::known_nullable(CachingStrategy::Disabled)),
        );
        b.add_method(app, MethodSpec::abstract_("widget", TypeRef::declared(widget)));
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let facts = ready(analyze_module(&host, app, &mut diags));
        let widget_method = facts
            .methods
            .iter()
            .find(|m| m.make_is_abstract)
            .unwrap_or_else(|| panic!("expected an abstract make"));
        assert!(widget_method.accessors[0].nullable);
    }

    #[test]
    fn test_missing_dependency_is_soft() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        b.add_method(widget, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(app, MethodSpec::abstract_("widget", TypeRef::declared(widget)));
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let facts = ready(analyze_module(&host, app, &mut diags));
        assert!(!diags.has_errors());
        assert_eq!(diags.warnings().count(), 2);
        assert!(matches!(
            facts.methods[0].accessors[0].resolution.binding,
            Binding::Missing
        ));
    }
}
