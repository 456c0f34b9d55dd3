//! Make-type resolution: the concrete type a provider method instantiates.
//!
//! Defaults to the provider's instantiated return type. An explicit make
//! override is re-parameterized from the return type's arguments and must
//! remain a subtype of it. When the chosen type is itself a module, its
//! generated companion class is substituted so the instantiation picks up
//! the module's own generated behavior.

use knit_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use knit_ir::{ElementRef, Host, MethodId, Name, TypeId, TypeRef};

/// Outcome of make-type resolution for one provider method.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum MakeType {
    Resolved(TypeRef),
    /// Arity or bound mismatch, reported on the provider method. The caller
    /// skips the method instead of aborting the pass.
    Failed,
}

/// Resolve the type a provider method will instantiate. `ret` is the
/// provider's return type instantiated at the module.
pub fn resolve_make_type(
    host: &Host,
    method: MethodId,
    ret: &TypeRef,
    diags: &mut DiagnosticQueue,
) -> MakeType {
    let mut chosen = ret.clone();

    if let Some(make) = &host.method(method).annotations.make {
        if let Some(target) = make.decl() {
            match parameterize(host, target, ret) {
                Ok(made) => {
                    if host.is_subtype(&made, ret) {
                        chosen = made;
                    } else {
                        diags.emit(
                            Diagnostic::error(ErrorCode::E2002)
                                .with_message(format!(
                                    "`{}` is not a subtype of `{}`",
                                    host.display_type(&made),
                                    host.display_type(ret)
                                ))
                                .with_origin(ElementRef::Method(method)),
                        );
                        // Fall back to the return type; the error already
                        // blocks emission for this declaration.
                    }
                }
                Err(diag) => {
                    diags.emit(diag.with_origin(ElementRef::Method(method)));
                    return MakeType::Failed;
                }
            }
        }
    }

    // Module types are instantiated through their generated companion
    // class. Classification guarantees the companion exists by now.
    if let Some(decl) = chosen.decl() {
        if host.type_decl(decl).is_module() {
            if let Some(companion) = host.companion_class_of(decl) {
                match parameterize(host, companion, &chosen) {
                    Ok(made) => chosen = made,
                    Err(diag) => {
                        diags.emit(diag.with_origin(ElementRef::Method(method)));
                        return MakeType::Failed;
                    }
                }
            }
        }
    }

    MakeType::Resolved(chosen)
}

/// Instantiate `target` with arguments derived from `source`: variables of
/// `target` that share a name with a variable argument of `source` are
/// carried over; the remaining slots are filled positionally from the
/// non-variable arguments of `source`.
fn parameterize(host: &Host, target: TypeId, source: &TypeRef) -> Result<TypeRef, Diagnostic> {
    let mut by_name: Vec<(Name, TypeRef)> = Vec::new();
    let mut positional: Vec<TypeRef> = Vec::new();
    for arg in source.args() {
        match arg {
            TypeRef::Var(name) => by_name.push((*name, arg.clone())),
            other => positional.push(other.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let mut args: Vec<TypeRef> = Vec::new();
    for param in &host.type_decl(target).type_params {
        if let Some((_, var)) = by_name.iter().find(|(name, _)| *name == param.name) {
            args.push(var.clone());
        } else if let Some(next) = positional.next() {
            args.push(next);
        }
        // A short list is an arity error; substitute reports it.
    }

    host.substitute(target, &args).map_err(|e| {
        Diagnostic::error(ErrorCode::E2003).with_message(format!(
            "incompatible type parameters for `{}`: expected {}, got {}",
            host.name(host.type_decl(e.decl).qualified),
            e.expected,
            e.supplied
        ))
    })
}
