//! Caching templates: the four generated state machines.
//!
//! Every template is a two-state machine (uninitialized, initialized); the
//! strategies differ only in the concurrency discipline guarding the
//! transition. Nullable values are wrapped in a `Supplier` holder so a
//! computed null is distinguishable from "not yet computed"; nullability
//! never changes the control-flow shape.

use knit_ir::CachingStrategy;

use crate::output::Output;

/// One method to emit with an optional caching wrapper.
pub struct MethodTemplate<'a> {
    /// Modifier prefix for the override, e.g. `"public "` or `"default "`.
    pub modifiers: &'a str,
    /// Rendered return type, exactly as declared.
    pub ret: &'a str,
    /// Rendered type of the backing field: the boxed form for primitives,
    /// otherwise the return type.
    pub field_ty: &'a str,
    pub name: &'a str,
    /// Rendered parameter list, without parentheses. Non-empty only for
    /// uncached methods.
    pub params: &'a str,
    /// Rendered throws clause including the leading keyword, or empty.
    pub throws: &'a str,
    /// The underlying expression producing the value.
    pub expr: &'a str,
    pub strategy: CachingStrategy,
    pub nullable: bool,
}

const SUPPLIER: &str = "java.util.function.Supplier";

impl MethodTemplate<'_> {
    fn supplier_ty(&self) -> String {
        format!("{SUPPLIER}<{}>", self.field_ty)
    }

    /// Emit the backing field declaration, if the strategy needs one.
    pub fn emit_field(&self, out: &mut Output) {
        match (self.strategy, self.nullable) {
            (CachingStrategy::Disabled, _) => {}
            (CachingStrategy::NotThreadSafe, false) => {
                out.line(&format!("private {} {};", self.field_ty, self.name));
            }
            (CachingStrategy::NotThreadSafe, true) => {
                out.line(&format!("private {} {};", self.supplier_ty(), self.name));
            }
            (CachingStrategy::ThreadSafe, false) => {
                out.line(&format!("private volatile {} {};", self.field_ty, self.name));
            }
            (CachingStrategy::ThreadSafe, true) => {
                out.line(&format!(
                    "private volatile {} {};",
                    self.supplier_ty(),
                    self.name
                ));
            }
            (CachingStrategy::ThreadLocal, false) => {
                out.line(&format!(
                    "private final java.lang.ThreadLocal<{}> {} = new java.lang.ThreadLocal<>();",
                    self.field_ty, self.name
                ));
            }
            (CachingStrategy::ThreadLocal, true) => {
                out.line(&format!(
                    "private final java.lang.ThreadLocal<{}> {} = new java.lang.ThreadLocal<>();",
                    self.supplier_ty(),
                    self.name
                ));
            }
        }
    }

    /// Emit the `@Override` method with the strategy's state machine.
    pub fn emit_method(&self, out: &mut Output) {
        out.line("@Override");
        out.line(&format!(
            "{}{} {}({}){} {{",
            self.modifiers, self.ret, self.name, self.params, self.throws
        ));
        out.indent();
        match self.strategy {
            CachingStrategy::Disabled => {
                out.line(&format!("return {};", self.expr));
            }
            CachingStrategy::NotThreadSafe | CachingStrategy::ThreadLocal => {
                self.emit_unsynchronized(out);
            }
            CachingStrategy::ThreadSafe => self.emit_double_checked(out),
        }
        out.dedent();
        out.line("}");
    }

    /// Shared shape for the unsynchronized strategies: read, test, assign.
    fn emit_unsynchronized(&self, out: &mut Output) {
        let name = self.name;
        let thread_local = self.strategy == CachingStrategy::ThreadLocal;
        let read = if thread_local {
            format!("this.{name}.get()")
        } else {
            format!("this.{name}")
        };
        if self.nullable {
            out.line(&format!("{} cache;", self.supplier_ty()));
            out.line(&format!("if (null == (cache = {read})) {{"));
            out.indent();
            out.line(&format!("final {} value = {};", self.field_ty, self.expr));
            if thread_local {
                out.line(&format!("this.{name}.set(cache = () -> value);"));
            } else {
                out.line(&format!("this.{name} = cache = () -> value;"));
            }
            out.dedent();
            out.line("}");
            out.line("return cache.get();");
        } else {
            out.line(&format!("{} value;", self.field_ty));
            out.line(&format!("if (null == (value = {read})) {{"));
            out.indent();
            if thread_local {
                out.line(&format!("this.{name}.set(value = {});", self.expr));
            } else {
                out.line(&format!("this.{name} = value = {};", self.expr));
            }
            out.dedent();
            out.line("}");
            out.line("return value;");
        }
    }

    /// Double-checked locking on the owning instance.
    fn emit_double_checked(&self, out: &mut Output) {
        let name = self.name;
        if self.nullable {
            out.line(&format!("{} cache;", self.supplier_ty()));
            out.line(&format!("if (null == (cache = this.{name})) {{"));
            out.indent();
            out.line("synchronized (this) {");
            out.indent();
            out.line(&format!("if (null == (cache = this.{name})) {{"));
            out.indent();
            out.line(&format!("final {} value = {};", self.field_ty, self.expr));
            out.line(&format!("this.{name} = cache = () -> value;"));
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.line("return cache.get();");
        } else {
            out.line(&format!("{} value;", self.field_ty));
            out.line(&format!("if (null == (value = this.{name})) {{"));
            out.indent();
            out.line("synchronized (this) {");
            out.indent();
            out.line(&format!("if (null == (value = this.{name})) {{"));
            out.indent();
            out.line(&format!("this.{name} = value = {};", self.expr));
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.line("return value;");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(strategy: CachingStrategy, nullable: bool) -> String {
        let template = MethodTemplate {
            modifiers: "public ",
            ret: "time.Clock",
            field_ty: "time.Clock",
            name: "clock",
            params: "",
            throws: "",
            expr: "App$.super.clock()",
            strategy,
            nullable,
        };
        let mut out = Output::new();
        template.emit_field(&mut out);
        template.emit_method(&mut out);
        out.finish()
    }

    #[test]
    fn test_disabled_has_no_state() {
        let rendered = render(CachingStrategy::Disabled, false);
        assert!(!rendered.contains("private"));
        assert!(!rendered.contains("synchronized"));
        assert!(rendered.contains("return App$.super.clock();"));
    }

    #[test]
    fn test_not_thread_safe_assigns_without_locking() {
        let rendered = render(CachingStrategy::NotThreadSafe, false);
        assert!(rendered.contains("private time.Clock clock;"));
        assert!(!rendered.contains("volatile"));
        assert!(!rendered.contains("synchronized"));
        assert!(rendered.contains("this.clock = value = App$.super.clock();"));
    }

    #[test]
    fn test_thread_safe_is_double_checked() {
        let rendered = render(CachingStrategy::ThreadSafe, false);
        assert!(rendered.contains("private volatile time.Clock clock;"));
        assert!(rendered.contains("synchronized (this) {"));
        // The volatile field is tested once before and once inside the
        // monitor.
        assert_eq!(
            rendered.matches("if (null == (value = this.clock))").count(),
            2
        );
    }

    #[test]
    fn test_thread_local_has_one_cell_and_no_monitor() {
        let rendered = render(CachingStrategy::ThreadLocal, false);
        assert_eq!(rendered.matches("java.lang.ThreadLocal").count(), 2);
        assert!(!rendered.contains("synchronized"));
        assert!(rendered.contains("this.clock.set(value = App$.super.clock());"));
    }

    #[test]
    fn test_nullable_wraps_in_supplier() {
        for strategy in [
            CachingStrategy::NotThreadSafe,
            CachingStrategy::ThreadSafe,
            CachingStrategy::ThreadLocal,
        ] {
            let rendered = render(strategy, true);
            assert!(
                rendered.contains("java.util.function.Supplier<time.Clock>"),
                "{strategy:?} should hold a supplier"
            );
            assert!(rendered.contains("return cache.get();"));
        }
    }

    #[test]
    fn test_boxed_field_for_primitive_returns() {
        let template = MethodTemplate {
            modifiers: "public ",
            ret: "long",
            field_ty: "java.lang.Long",
            name: "stamp",
            params: "",
            throws: "",
            expr: "App$.super.stamp()",
            strategy: CachingStrategy::NotThreadSafe,
            nullable: false,
        };
        let mut out = Output::new();
        template.emit_field(&mut out);
        template.emit_method(&mut out);
        let rendered = out.finish();
        assert!(rendered.contains("private java.lang.Long stamp;"));
        assert!(rendered.contains("public long stamp() {"));
    }
}
