//! Companion source rendering.
//!
//! One module's facts become exactly two Java sources: the companion
//! interface `M$` (static factory plus default implementations of every
//! provider) and the companion class `M$$` (caching overrides). Rendering
//! is a pure function of the facts; running it twice, or in any
//! declaration order, yields byte-identical artifacts.

use knit_ir::{CachingStrategy, Host, MethodId, MethodSig, Name, TypeParam, TypeRef};
use knit_resolve::{AccessorFacts, Binding, ModuleFacts, ModuleMethodFacts};

use crate::output::Output;
use crate::templates::MethodTemplate;

/// A generated source file.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Artifact {
    /// File name, `<QualifiedName>$.java` or `<QualifiedName>$$.java`.
    pub file_name: String,
    pub source: String,
}

/// Render the companion pair for one module. Returns (interface, class).
pub fn render_module(host: &Host, facts: &ModuleFacts, version: &str) -> (Artifact, Artifact) {
    let renderer = Renderer::new(host, facts, version);
    let iface = renderer.render_interface();
    let class = renderer.render_class();
    tracing::debug!(
        module = renderer.qualified.as_str(),
        "rendered companion pair"
    );
    (iface, class)
}

struct Renderer<'a> {
    host: &'a Host,
    facts: &'a ModuleFacts,
    version: &'a str,
    package: Name,
    qualified: String,
    simple: String,
    visibility: String,
    /// `<T extends a.B>` or empty.
    tp_decl: String,
    /// `<T>` or empty.
    tp_args: String,
}

impl<'a> Renderer<'a> {
    fn new(host: &'a Host, facts: &'a ModuleFacts, version: &'a str) -> Self {
        let decl = host.type_decl(facts.module);
        let package = decl.package;
        Renderer {
            host,
            facts,
            version,
            package,
            qualified: host.name(decl.qualified).to_owned(),
            simple: host.name(decl.simple).to_owned(),
            visibility: decl
                .modifiers
                .retain(knit_ir::ModifierSet::VISIBILITY)
                .keywords(),
            tp_decl: type_params_decl(host, package, &decl.type_params),
            tp_args: type_args(host, &decl.type_params),
        }
    }

    fn header(&self, out: &mut Output) {
        out.line(&format!("// Generated by knit {}. Do not edit.", self.version));
        if self.package != Name::EMPTY {
            out.line(&format!("package {};", self.host.name(self.package)));
        }
        out.blank();
    }

    fn display(&self, ty: &TypeRef) -> String {
        self.host.display_type_in(self.package, ty)
    }

    /// The boxed field type for a cached value of `ty`.
    fn field_ty(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Primitive(p) => p.boxed_class().to_owned(),
            other => self.display(other),
        }
    }

    fn throws_clause(&self, sig: &MethodSig) -> String {
        if sig.throws.is_empty() {
            return String::new();
        }
        let list: Vec<String> = sig.throws.iter().map(|t| self.display(t)).collect();
        format!(" throws {}", list.join(", "))
    }

    fn params_list(&self, mid: MethodId, sig: &MethodSig) -> String {
        let decl = self.host.method(mid);
        decl.params
            .iter()
            .zip(sig.params.iter())
            .map(|(p, ty)| format!("{} {}", self.display(ty), self.host.name(p.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The expression an accessor override evaluates to.
    fn binding_expr(&self, make: &TypeRef, make_is_interface: bool, acc: &AccessorFacts) -> String {
        match &acc.resolution.binding {
            Binding::Parameter(name) => self.host.name(*name).to_owned(),
            Binding::Super => {
                let name = self.host.name(self.host.method(acc.method).name);
                if make_is_interface {
                    let iface = match make.decl() {
                        Some(d) => self.display(&TypeRef::declared(d)),
                        None => self.display(make),
                    };
                    format!("{iface}.super.{name}()")
                } else {
                    format!("super.{name}()")
                }
            }
            Binding::Member { scope, member } => {
                let name = self.host.name(self.host.member_name(*member));
                let call = if member.as_method().is_some() { "()" } else { "" };
                let scope_simple = self.host.name(self.host.type_decl(*scope).simple);
                if self.host.member_modifiers(*member).is_static() {
                    format!("{scope_simple}$.{name}{call}")
                } else {
                    format!("{scope_simple}$.this.{name}{call}")
                }
            }
            Binding::Module { scope } => {
                format!("{}$.this", self.host.name(self.host.type_decl(*scope).simple))
            }
            Binding::Missing => self.host.name(acc.resolution.lookup_name).to_owned(),
        }
    }

    fn render_interface(&self) -> Artifact {
        let mut out = Output::new();
        self.header(&mut out);

        let source_ty = self.display(&self.host.self_type(self.facts.module));
        out.line(&format!(
            "{}interface {}${} extends {} {{",
            self.visibility, self.simple, self.tp_decl, source_ty
        ));
        out.indent();

        if !self.facts.has_abstract_members {
            let tp = if self.tp_decl.is_empty() {
                String::new()
            } else {
                format!("{} ", self.tp_decl)
            };
            out.blank();
            out.line(&format!("static {tp}{source_ty} new$() {{"));
            out.indent();
            out.line(&format!("return new {}$${}();", self.simple, self.tp_args));
            out.dedent();
            out.line("}");
        }

        // One counter per declaration keeps local class names unique and
        // the output stable across reruns.
        let mut counter = 0u32;
        for m in &self.facts.methods {
            if !m.is_abstract {
                continue;
            }
            out.blank();
            self.render_provider(&mut out, m, &mut counter);
        }

        out.dedent();
        out.line("}");
        Artifact {
            file_name: format!("{}$.java", self.qualified),
            source: out.finish(),
        }
    }

    /// The generated default implementation of one provider method.
    fn render_provider(&self, out: &mut Output, m: &ModuleMethodFacts, counter: &mut u32) {
        let decl = self.host.method(m.method);
        let name = self.host.name(decl.name);
        let method_tp = type_params_decl(self.host, self.package, &decl.type_params);
        let method_tp = if method_tp.is_empty() {
            String::new()
        } else {
            format!("{method_tp} ")
        };
        out.line("@Override");
        out.line(&format!(
            "default {method_tp}{} {}({}){} {{",
            self.display(&m.sig.ret),
            name,
            self.params_list(m.method, &m.sig),
            self.throws_clause(&m.sig)
        ));
        out.indent();

        let make_ty = self.display(&m.make);
        if m.make_is_abstract {
            *counter += 1;
            let make_simple = match m.make.decl() {
                Some(d) => self.host.name(self.host.type_decl(d).simple).to_owned(),
                None => make_ty.clone(),
            };
            let local = format!("{make_simple}${counter}");
            let verb = if m.make_is_interface { "implements" } else { "extends" };
            out.line(&format!("final class {local} {verb} {make_ty} {{"));
            out.indent();

            // An accessor bound to its own inherited implementation with
            // caching disabled needs no override at all.
            let overrides: Vec<&AccessorFacts> = m
                .accessors
                .iter()
                .filter(|a| {
                    !(a.resolution.binding == Binding::Super
                        && a.caching == CachingStrategy::Disabled)
                })
                .collect();
            for acc in &overrides {
                if acc.caching != CachingStrategy::Disabled {
                    out.blank();
                    self.emit_accessor(out, m, acc, Part::Field);
                }
            }
            for acc in &overrides {
                out.blank();
                self.emit_accessor(out, m, acc, Part::Method);
            }

            out.dedent();
            out.line("}");
            out.line(&format!("return new {local}();"));
        } else {
            out.line(&format!("return new {make_ty}();"));
        }

        out.dedent();
        out.line("}");
    }

    /// Emit one accessor override (or its cache field) inside a local
    /// implementation class.
    fn emit_accessor(&self, out: &mut Output, m: &ModuleMethodFacts, acc: &AccessorFacts, part: Part) {
        let expr = self.binding_expr(&m.make, m.make_is_interface, acc);
        let ret = self.display(&acc.sig.ret);
        let field_ty = self.field_ty(&acc.sig.ret);
        let params = self.params_list(acc.method, &acc.sig);
        let throws = self.throws_clause(&acc.sig);
        let template = MethodTemplate {
            modifiers: "public ",
            ret: &ret,
            field_ty: &field_ty,
            name: self.host.name(self.host.method(acc.method).name),
            params: &params,
            throws: &throws,
            expr: &expr,
            strategy: acc.caching,
            nullable: acc.nullable,
        };
        match part {
            Part::Field => template.emit_field(out),
            Part::Method => template.emit_method(out),
        }
    }

    fn render_class(&self) -> Artifact {
        let mut out = Output::new();
        self.header(&mut out);

        let abstract_kw = if self.facts.has_abstract_members {
            "abstract "
        } else {
            ""
        };
        out.line(&format!(
            "{}{}class {}$${} implements {}${} {{",
            self.visibility, abstract_kw, self.simple, self.tp_decl, self.simple, self.tp_args
        ));
        out.indent();

        let cached: Vec<&ModuleMethodFacts> = self
            .facts
            .methods
            .iter()
            .filter(|m| {
                m.caching != CachingStrategy::Disabled
                    && self.host.method(m.method).is_parameterless()
            })
            .collect();

        for m in &cached {
            out.blank();
            self.emit_wrapper(&mut out, m, Part::Field);
        }
        for m in &cached {
            out.blank();
            self.emit_wrapper(&mut out, m, Part::Method);
        }

        if !self.facts.has_abstract_members {
            let tp = if self.tp_decl.is_empty() {
                String::new()
            } else {
                format!("{} ", self.tp_decl)
            };
            out.blank();
            out.line(&format!(
                "{}static {tp}{}$${} new$() {{",
                self.visibility, self.simple, self.tp_args
            ));
            out.indent();
            out.line(&format!("return new {}$${}();", self.simple, self.tp_args));
            out.dedent();
            out.line("}");
        }

        out.dedent();
        out.line("}");
        Artifact {
            file_name: format!("{}$$.java", self.qualified),
            source: out.finish(),
        }
    }

    /// The caching override a companion-class method delegates through:
    /// evaluate the interface default once, then serve the cached value.
    fn emit_wrapper(&self, out: &mut Output, m: &ModuleMethodFacts, part: Part) {
        let name = self.host.name(self.host.method(m.method).name);
        let expr = format!("{}$.super.{name}()", self.simple);
        let ret = self.display(&m.sig.ret);
        let field_ty = self.field_ty(&m.sig.ret);
        let throws = self.throws_clause(&m.sig);
        let template = MethodTemplate {
            modifiers: "public ",
            ret: &ret,
            field_ty: &field_ty,
            name,
            params: "",
            throws: &throws,
            expr: &expr,
            strategy: m.caching,
            nullable: m.nullable,
        };
        match part {
            Part::Field => template.emit_field(out),
            Part::Method => template.emit_method(out),
        }
    }
}

/// Which half of a cached method to emit.
#[derive(Copy, Clone, Eq, PartialEq)]
enum Part {
    Field,
    Method,
}

fn type_params_decl(host: &Host, package: Name, params: &[TypeParam]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = params
        .iter()
        .map(|p| {
            let name = host.name(p.name).to_owned();
            if p.bounds.is_empty() {
                name
            } else {
                let bounds: Vec<String> = p
                    .bounds
                    .iter()
                    .map(|b| host.display_type_in(package, b))
                    .collect();
                format!("{name} extends {}", bounds.join(" & "))
            }
        })
        .collect();
    format!("<{}>", rendered.join(", "))
}

fn type_args(host: &Host, params: &[TypeParam]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = params.iter().map(|p| host.name(p.name)).collect();
    format!("<{}>", names.join(", "))
}

#[cfg(test)]
mod tests {
    use knit_diagnostic::DiagnosticQueue;
    use knit_ir::{
        CacheAnnotation, CachingStrategy, HostBuilder, MethodSpec, TypeKind, TypeRef,
    };
    use knit_resolve::{analyze_module, Analysis};
    use pretty_assertions::assert_eq;

    use super::*;

    fn facts_for(host: &Host, module: knit_ir::TypeId) -> ModuleFacts {
        let mut diags = DiagnosticQueue::new();
        match analyze_module(host, module, &mut diags) {
            Analysis::Ready(facts) => {
                assert!(!diags.has_errors(), "unexpected errors: {diags:?}");
                facts
            }
            Analysis::Deferred => panic!("unexpected deferral"),
        }
    }

    #[test]
    fn test_companion_interface_shape() {
        let mut b = HostBuilder::new();
        let real = b.declare_type("time.RealClock", TypeKind::Class);
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(app, MethodSpec::abstract_("clock", TypeRef::declared(real)));
        let host = b.finish();

        let facts = facts_for(&host, app);
        let (iface, class) = render_module(&host, &facts, "0.1.0");

        assert_eq!(iface.file_name, "a.App$.java");
        assert!(iface.source.contains("interface App$ extends App {"));
        assert!(iface.source.contains("static App new$() {"));
        assert!(iface.source.contains("return new App$$();"));
        assert!(iface.source.contains("default time.RealClock clock() {"));
        assert!(iface.source.contains("return new time.RealClock();"));

        assert_eq!(class.file_name, "a.App$$.java");
        assert!(class.source.contains("class App$$ implements App$ {"));
        assert!(!class.source.contains("abstract"));
        assert!(class.source.contains("static App$$ new$() {"));
    }

    #[test]
    fn test_cached_wrapper_lives_in_class_only() {
        let mut b = HostBuilder::new();
        let real = b.declare_type("time.RealClock", TypeKind::Class);
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(
            app,
            MethodSpec::new("zone", TypeRef::declared(real))
                .cache(CacheAnnotation::known(CachingStrategy::ThreadSafe)),
        );
        let host = b.finish();

        let facts = facts_for(&host, app);
        let (iface, class) = render_module(&host, &facts, "0.1.0");

        assert!(!iface.source.contains("zone"));
        assert!(class.source.contains("private volatile time.RealClock zone;"));
        assert!(class.source.contains("synchronized (this) {"));
        assert!(class.source.contains("App$.super.zone()"));
    }

    #[test]
    fn test_local_class_for_abstract_make_type() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        b.add_method(widget, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(app, MethodSpec::new("clock", TypeRef::declared(clock)));
        b.add_method(app, MethodSpec::abstract_("widget", TypeRef::declared(widget)));
        let host = b.finish();

        let facts = facts_for(&host, app);
        let (iface, _) = render_module(&host, &facts, "0.1.0");

        assert!(iface.source.contains("final class Widget$1 implements Widget {"));
        assert!(iface.source.contains("return new Widget$1();"));
        assert!(iface.source.contains("return App$.this.clock();"));
    }

    #[test]
    fn test_static_member_renders_through_companion() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        b.add_method(widget, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(
            app,
            MethodSpec::new("clock", TypeRef::declared(clock))
                .modifiers(knit_ir::ModifierSet::STATIC),
        );
        b.add_method(app, MethodSpec::abstract_("widget", TypeRef::declared(widget)));
        let host = b.finish();

        let facts = facts_for(&host, app);
        let (iface, _) = render_module(&host, &facts, "0.1.0");

        // Static members are reached through the companion name, not an
        // instance reference.
        assert!(iface.source.contains("return App$.clock();"));
    }

    #[test]
    fn test_missing_dependency_renders_bare_name() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        b.add_method(widget, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(app, MethodSpec::abstract_("widget", TypeRef::declared(widget)));
        let host = b.finish();

        let mut diags = DiagnosticQueue::new();
        let Analysis::Ready(facts) = analyze_module(&host, app, &mut diags) else {
            panic!("unexpected deferral");
        };
        let (iface, _) = render_module(&host, &facts, "0.1.0");

        // Deliberately surfaces the hole at the next compilation stage.
        assert!(iface.source.contains("return clock;"));
    }

    #[test]
    fn test_abstract_members_suppress_factories() {
        let mut b = HostBuilder::new();
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(
            app,
            MethodSpec::abstract_("run", TypeRef::Primitive(knit_ir::Primitive::Void)),
        );
        let host = b.finish();

        let facts = facts_for(&host, app);
        let (iface, class) = render_module(&host, &facts, "0.1.0");

        assert!(!iface.source.contains("new$"));
        assert!(!class.source.contains("new$"));
        assert!(class.source.contains("abstract class App$$ implements App$ {"));
    }

    #[test]
    fn test_generic_module_renders_type_parameters() {
        let mut b = HostBuilder::new();
        let real = b.declare_type("time.RealClock", TypeKind::Class);
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_type_param(app, "T", vec![]);
        b.add_method(app, MethodSpec::abstract_("clock", TypeRef::declared(real)));
        let host = b.finish();

        let facts = facts_for(&host, app);
        let (iface, class) = render_module(&host, &facts, "0.1.0");

        assert!(iface.source.contains("interface App$<T> extends App<T> {"));
        assert!(iface.source.contains("static <T> App<T> new$() {"));
        assert!(iface.source.contains("return new App$$<T>();"));
        assert!(class.source.contains("class App$$<T> implements App$<T> {"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let mut b = HostBuilder::new();
        let clock = b.declare_type("time.Clock", TypeKind::Interface);
        let widget = b.declare_type("a.Widget", TypeKind::Interface);
        b.add_method(widget, MethodSpec::abstract_("clock", TypeRef::declared(clock)));
        let app = b.declare_type("a.App", TypeKind::Interface);
        b.mark_module(app);
        b.add_method(app, MethodSpec::new("clock", TypeRef::declared(clock)));
        b.add_method(app, MethodSpec::abstract_("widget", TypeRef::declared(widget)));
        let host = b.finish();

        let first = render_module(&host, &facts_for(&host, app), "0.1.0");
        let second = render_module(&host, &facts_for(&host, app), "0.1.0");
        assert_eq!(first, second);
    }
}
