//! Programmatic model construction.
//!
//! Used by the driver's model loader and by tests. Types may be declared
//! before their members and supertypes are filled in, so forward references
//! work naturally.

use crate::{
    Annotations, CacheAnnotation, FieldDecl, FieldId, Host, LookupSpec, MethodDecl, MethodId,
    ModifierSet, Name, ParamDecl, TypeDecl, TypeId, TypeKind, TypeParam, TypeRef,
};

/// Builder for a [`Host`] declaration model.
pub struct HostBuilder {
    host: Host,
}

/// Specification of a method to add.
pub struct MethodSpec {
    name: String,
    modifiers: ModifierSet,
    type_params: Vec<TypeParam>,
    params: Vec<(String, TypeRef)>,
    ret: TypeRef,
    throws: Vec<TypeRef>,
    annotations: Annotations,
}

impl MethodSpec {
    pub fn new(name: &str, ret: TypeRef) -> Self {
        MethodSpec {
            name: name.to_owned(),
            modifiers: ModifierSet::empty(),
            type_params: Vec::new(),
            params: Vec::new(),
            ret,
            throws: Vec::new(),
            annotations: Annotations::default(),
        }
    }

    /// Shorthand for an abstract method.
    pub fn abstract_(name: &str, ret: TypeRef) -> Self {
        Self::new(name, ret).modifiers(ModifierSet::ABSTRACT)
    }

    #[must_use]
    pub fn modifiers(mut self, m: ModifierSet) -> Self {
        self.modifiers = m;
        self
    }

    #[must_use]
    pub fn param(mut self, name: &str, ty: TypeRef) -> Self {
        self.params.push((name.to_owned(), ty));
        self
    }

    #[must_use]
    pub fn throws(mut self, ty: TypeRef) -> Self {
        self.throws.push(ty);
        self
    }

    #[must_use]
    pub fn cache(mut self, annotation: CacheAnnotation) -> Self {
        self.annotations.cache = Some(annotation);
        self
    }

    #[must_use]
    pub fn lookup(mut self, spec: LookupSpec) -> Self {
        self.annotations.lookup = Some(spec);
        self
    }

    #[must_use]
    pub fn make(mut self, ty: TypeRef) -> Self {
        self.annotations.make = Some(ty);
        self
    }

    #[must_use]
    pub fn type_param(mut self, param: TypeParam) -> Self {
        self.type_params.push(param);
        self
    }
}

/// Specification of a field to add.
pub struct FieldSpec {
    name: String,
    modifiers: ModifierSet,
    ty: TypeRef,
    annotations: Annotations,
}

impl FieldSpec {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        FieldSpec {
            name: name.to_owned(),
            modifiers: ModifierSet::empty(),
            ty,
            annotations: Annotations::default(),
        }
    }

    #[must_use]
    pub fn modifiers(mut self, m: ModifierSet) -> Self {
        self.modifiers = m;
        self
    }

    #[must_use]
    pub fn cache(mut self, annotation: CacheAnnotation) -> Self {
        self.annotations.cache = Some(annotation);
        self
    }
}

impl HostBuilder {
    pub fn new() -> Self {
        HostBuilder { host: Host::empty() }
    }

    /// Intern a string in the model's interner.
    pub fn intern(&mut self, s: &str) -> Name {
        self.host.interner.intern(s)
    }

    /// A type-variable reference by name.
    pub fn type_var(&mut self, name: &str) -> TypeRef {
        TypeRef::Var(self.intern(name))
    }

    /// Declare a type by qualified name. The simple name is the segment
    /// after the last dot; everything before it is the package.
    pub fn declare_type(&mut self, qualified: &str, kind: TypeKind) -> TypeId {
        let (package, simple) = match qualified.rfind('.') {
            Some(i) => (&qualified[..i], &qualified[i + 1..]),
            None => ("", qualified),
        };
        let decl = TypeDecl {
            simple: self.intern(simple),
            qualified: self.intern(qualified),
            package: self.intern(package),
            kind,
            modifiers: ModifierSet::empty(),
            type_params: Vec::new(),
            supertypes: Vec::new(),
            enclosing: None,
            annotations: Annotations::default(),
            methods: Vec::new(),
            fields: Vec::new(),
        };
        self.host.add_type(decl)
    }

    pub fn mark_module(&mut self, t: TypeId) {
        self.host.types[t.index()].annotations.module = true;
    }

    pub fn set_modifiers(&mut self, t: TypeId, m: ModifierSet) {
        self.host.types[t.index()].modifiers = m;
    }

    pub fn set_type_cache(&mut self, t: TypeId, annotation: CacheAnnotation) {
        self.host.types[t.index()].annotations.cache = Some(annotation);
    }

    /// Mark `t` as lexically nested in `outer`. The nested type shares the
    /// outer type's package (its qualified name is dotted through the outer
    /// type, not through a deeper package).
    pub fn set_enclosing(&mut self, t: TypeId, outer: TypeId) {
        let package = self.host.types[outer.index()].package;
        let inner = &mut self.host.types[t.index()];
        inner.enclosing = Some(outer);
        inner.package = package;
    }

    pub fn add_supertype(&mut self, t: TypeId, sup: TypeRef) {
        self.host.types[t.index()].supertypes.push(sup);
    }

    pub fn add_type_param(&mut self, t: TypeId, name: &str, bounds: Vec<TypeRef>) {
        let name = self.intern(name);
        self.host.types[t.index()]
            .type_params
            .push(TypeParam { name, bounds });
    }

    pub fn add_method(&mut self, owner: TypeId, spec: MethodSpec) -> MethodId {
        let name = self.intern(&spec.name);
        let params = spec
            .params
            .into_iter()
            .map(|(n, ty)| ParamDecl {
                name: self.host.interner.intern(&n),
                ty,
            })
            .collect();
        self.host.add_method(MethodDecl {
            name,
            owner,
            modifiers: spec.modifiers,
            type_params: spec.type_params,
            params,
            ret: spec.ret,
            throws: spec.throws,
            annotations: spec.annotations,
        })
    }

    pub fn add_field(&mut self, owner: TypeId, spec: FieldSpec) -> FieldId {
        let name = self.intern(&spec.name);
        self.host.add_field(FieldDecl {
            name,
            owner,
            modifiers: spec.modifiers,
            ty: spec.ty,
            annotations: spec.annotations,
        })
    }

    /// A lookup spec with interned names; empty strings mean "not set".
    pub fn lookup_spec(&mut self, value: &str, field: &str, method: &str, param: &str) -> LookupSpec {
        let mut intern_opt = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(self.host.interner.intern(s))
            }
        };
        LookupSpec {
            value: intern_opt(value),
            field: intern_opt(field),
            method: intern_opt(method),
            param: intern_opt(param),
        }
    }

    pub fn finish(self) -> Host {
        self.host
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}
