//! The type introspection facade.
//!
//! `Host` owns the declaration arenas and answers the queries the resolution
//! engine needs: member enumeration with override hiding, nominal subtyping,
//! generic substitution, and companion lookup. The engine never touches raw
//! model storage except through this interface.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{
    Annotations, ElementRef, FieldDecl, FieldId, Interner, MemberRef, MethodDecl, MethodId,
    MethodSig, ModifierSet, Name, TypeDecl, TypeId, TypeKind, TypeRef,
};

/// Arity or bound mismatch during generic substitution.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct IncompatibleTypeParameters {
    /// The declaration being parameterized.
    pub decl: TypeId,
    /// Number of declared type parameters.
    pub expected: usize,
    /// Number of supplied arguments.
    pub supplied: usize,
}

impl fmt::Display for IncompatibleTypeParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "incompatible type parameters: expected {}, got {}",
            self.expected, self.supplied
        )
    }
}

impl std::error::Error for IncompatibleTypeParameters {}

/// Substitution environment: type-variable name to argument.
pub type Subst = FxHashMap<Name, TypeRef>;

/// The declaration model and introspection facade.
pub struct Host {
    pub(crate) interner: Interner,
    pub(crate) types: Vec<TypeDecl>,
    pub(crate) methods: Vec<MethodDecl>,
    pub(crate) fields: Vec<FieldDecl>,
    pub(crate) by_qualified: FxHashMap<Name, TypeId>,
}

impl Host {
    pub(crate) fn empty() -> Self {
        Host {
            interner: Interner::new(),
            types: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            by_qualified: FxHashMap::default(),
        }
    }

    // --- element access -------------------------------------------------

    pub fn type_decl(&self, id: TypeId) -> &TypeDecl {
        &self.types[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &MethodDecl {
        &self.methods[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &FieldDecl {
        &self.fields[id.index()]
    }

    /// Resolve an interned name to its string.
    pub fn name(&self, n: Name) -> &str {
        self.interner.resolve(n)
    }

    /// Look up a type by qualified name.
    pub fn type_by_qualified(&self, qualified: &str) -> Option<TypeId> {
        // Read-only lookup: an un-interned name cannot be registered.
        let name = self.interner.get(qualified)?;
        self.by_qualified.get(&name).copied()
    }

    /// All type declarations, in registration order.
    pub fn all_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len() as u32).map(TypeId::from_raw)
    }

    pub fn member_name(&self, m: MemberRef) -> Name {
        match m {
            MemberRef::Method(id) => self.method(id).name,
            MemberRef::Field(id) => self.field(id).name,
        }
    }

    pub fn member_modifiers(&self, m: MemberRef) -> ModifierSet {
        match m {
            MemberRef::Method(id) => self.method(id).modifiers,
            MemberRef::Field(id) => self.field(id).modifiers,
        }
    }

    pub fn member_annotations(&self, m: MemberRef) -> &Annotations {
        match m {
            MemberRef::Method(id) => &self.method(id).annotations,
            MemberRef::Field(id) => &self.field(id).annotations,
        }
    }

    /// Human-readable description of an element, for diagnostics.
    pub fn describe(&self, e: ElementRef) -> String {
        match e {
            ElementRef::Type(id) => self.name(self.type_decl(id).qualified).to_owned(),
            ElementRef::Method(id) => {
                let m = self.method(id);
                let owner = self.name(self.type_decl(m.owner).qualified);
                format!("{owner}.{}(..)", self.name(m.name))
            }
            ElementRef::Field(id) => {
                let f = self.field(id);
                let owner = self.name(self.type_decl(f.owner).qualified);
                format!("{owner}.{}", self.name(f.name))
            }
        }
    }

    // --- substitution ---------------------------------------------------

    /// Build the substitution environment for a declared type instantiated
    /// with the given arguments. Missing arguments leave variables free.
    pub fn subst_map(&self, decl: TypeId, args: &[TypeRef]) -> Subst {
        self.type_decl(decl)
            .type_params
            .iter()
            .zip(args.iter())
            .map(|(p, a)| (p.name, a.clone()))
            .collect()
    }

    /// Apply a substitution environment to a type reference.
    pub fn apply_subst(&self, ty: &TypeRef, subst: &Subst) -> TypeRef {
        match ty {
            TypeRef::Var(name) => subst.get(name).cloned().unwrap_or_else(|| ty.clone()),
            TypeRef::Declared { decl, args } => TypeRef::Declared {
                decl: *decl,
                args: args.iter().map(|a| self.apply_subst(a, subst)).collect(),
            },
            _ => ty.clone(),
        }
    }

    /// Parameterize a declaration, checking arity and bounds.
    pub fn substitute(
        &self,
        decl: TypeId,
        args: &[TypeRef],
    ) -> Result<TypeRef, IncompatibleTypeParameters> {
        let params = &self.type_decl(decl).type_params;
        if params.len() != args.len() {
            return Err(IncompatibleTypeParameters {
                decl,
                expected: params.len(),
                supplied: args.len(),
            });
        }
        let subst = self.subst_map(decl, args);
        for (param, arg) in params.iter().zip(args.iter()) {
            // Bound checks against free variables or error types are
            // undecidable here; they surface downstream instead.
            if matches!(arg, TypeRef::Var(_)) || arg.has_error() {
                continue;
            }
            for bound in &param.bounds {
                let bound = self.apply_subst(bound, &subst);
                if !self.is_subtype(arg, &bound) {
                    return Err(IncompatibleTypeParameters {
                        decl,
                        expected: params.len(),
                        supplied: args.len(),
                    });
                }
            }
        }
        Ok(TypeRef::Declared {
            decl,
            args: args.to_vec(),
        })
    }

    /// The declared type of `t` with its own variables as arguments.
    pub fn self_type(&self, t: TypeId) -> TypeRef {
        let decl = self.type_decl(t);
        TypeRef::Declared {
            decl: t,
            args: decl.type_params.iter().map(|p| TypeRef::Var(p.name)).collect(),
        }
    }

    // --- subtyping ------------------------------------------------------

    /// Reflexive nominal subtyping over declared supertypes.
    ///
    /// `Error` is never on either side of the relation. A raw reference to
    /// a declaration is compatible with any instantiation of it.
    pub fn is_subtype(&self, a: &TypeRef, b: &TypeRef) -> bool {
        if a.has_error() || b.has_error() {
            return false;
        }
        if a == b {
            return true;
        }
        if let (Some(ad), Some(bd)) = (a.decl(), b.decl()) {
            if ad == bd && (a.args().is_empty() || b.args().is_empty()) {
                return true;
            }
        }
        if let TypeRef::Declared { decl, args } = a {
            let subst = self.subst_map(*decl, args);
            return self
                .type_decl(*decl)
                .supertypes
                .iter()
                .any(|s| self.is_subtype(&self.apply_subst(s, &subst), b));
        }
        false
    }

    // --- member enumeration ----------------------------------------------

    /// All declared and inherited members of a type, most-derived first,
    /// in declaration order, with override hiding applied: a method is
    /// omitted when an already-collected method overrides it, meaning same
    /// name, same parameter types under the enumerating type's
    /// substitution, and a declaring type that subtypes the candidate's.
    /// Equal signatures from unrelated owners both survive; the classifier
    /// reports them as a clash. A field is hidden by name.
    pub fn members_of(&self, t: TypeId) -> Vec<MemberRef> {
        let mut out = Vec::new();
        let mut method_keys: Vec<(Name, Vec<TypeRef>, TypeId)> = Vec::new();
        let mut field_names: Vec<Name> = Vec::new();
        let mut visited: Vec<TypeId> = Vec::new();
        self.collect_members(
            &self.self_type(t),
            &mut out,
            &mut method_keys,
            &mut field_names,
            &mut visited,
        );
        out
    }

    fn collect_members(
        &self,
        site: &TypeRef,
        out: &mut Vec<MemberRef>,
        method_keys: &mut Vec<(Name, Vec<TypeRef>, TypeId)>,
        field_names: &mut Vec<Name>,
        visited: &mut Vec<TypeId>,
    ) {
        let Some(decl_id) = site.decl() else {
            return;
        };
        if visited.contains(&decl_id) {
            return;
        }
        visited.push(decl_id);

        let decl = self.type_decl(decl_id);
        let subst = self.subst_map(decl_id, site.args());

        for &mid in &decl.methods {
            let m = self.method(mid);
            let params: Vec<TypeRef> = m
                .params
                .iter()
                .map(|p| self.apply_subst(&p.ty, &subst))
                .collect();
            let hidden = method_keys.iter().any(|(name, key, owner)| {
                *name == m.name
                    && *key == params
                    && self.is_subtype(&self.self_type(*owner), &self.self_type(decl_id))
            });
            if !hidden {
                method_keys.push((m.name, params, decl_id));
                out.push(MemberRef::Method(mid));
            }
        }
        for &fid in &decl.fields {
            let f = self.field(fid);
            if !field_names.contains(&f.name) {
                field_names.push(f.name);
                out.push(MemberRef::Field(fid));
            }
        }
        for sup in &decl.supertypes {
            let sup = self.apply_subst(sup, &subst);
            self.collect_members(&sup, out, method_keys, field_names, visited);
        }
    }

    /// Instantiate a method's signature at a use site.
    pub fn method_sig_in(&self, site: &TypeRef, m: MethodId) -> MethodSig {
        let md = self.method(m);
        let subst = self.subst_to_owner(site, md.owner).unwrap_or_default();
        MethodSig {
            params: md
                .params
                .iter()
                .map(|p| self.apply_subst(&p.ty, &subst))
                .collect(),
            ret: self.apply_subst(&md.ret, &subst),
            throws: md
                .throws
                .iter()
                .map(|t| self.apply_subst(t, &subst))
                .collect(),
        }
    }

    fn subst_to_owner(&self, from: &TypeRef, owner: TypeId) -> Option<Subst> {
        let decl = from.decl()?;
        let subst = self.subst_map(decl, from.args());
        if decl == owner {
            return Some(subst);
        }
        for sup in &self.type_decl(decl).supertypes {
            let sup = self.apply_subst(sup, &subst);
            if let Some(found) = self.subst_to_owner(&sup, owner) {
                return Some(found);
            }
        }
        None
    }

    // --- enclosing scopes -------------------------------------------------

    /// The lexical enclosing-scope chain, starting at `t` itself.
    ///
    /// An explicit iterator rather than recursion: the walk is linear and
    /// trivially terminating.
    pub fn enclosing_chain(&self, t: TypeId) -> EnclosingChain<'_> {
        EnclosingChain {
            host: self,
            next: Some(t),
        }
    }

    // --- companions -------------------------------------------------------

    /// The generated companion class of a module type, if registered.
    pub fn companion_class_of(&self, source: TypeId) -> Option<TypeId> {
        let qualified = format!("{}$$", self.name(self.type_decl(source).qualified));
        self.type_by_qualified(&qualified)
    }

    /// Register the generated companion pair for a module type so later
    /// rounds can resolve references to it. Returns (interface, class).
    ///
    /// `implemented` lists the source methods the companion interface
    /// default-implements; they are re-declared as concrete members so a
    /// later pass sees only the genuinely unimplemented ones as abstract.
    /// `abstract_class` mirrors whether the emitted class kept abstract
    /// leftovers.
    pub fn register_companions(
        &mut self,
        source: TypeId,
        implemented: &[MethodId],
        abstract_class: bool,
    ) -> (TypeId, TypeId) {
        let src = self.type_decl(source);
        let visibility = src.modifiers.retain(ModifierSet::VISIBILITY);
        let package = src.package;
        let type_params = src.type_params.clone();
        let simple = self.interner.resolve(src.simple).to_owned();
        let qualified = self.interner.resolve(src.qualified).to_owned();

        let iface = TypeDecl {
            simple: self.interner.intern(&format!("{simple}$")),
            qualified: self.interner.intern(&format!("{qualified}$")),
            package,
            kind: TypeKind::Interface,
            modifiers: visibility,
            type_params: type_params.clone(),
            supertypes: vec![self.self_type(source)],
            enclosing: None,
            annotations: Annotations::default(),
            methods: Vec::new(),
            fields: Vec::new(),
        };
        let iface_id = self.add_type(iface);

        for &mid in implemented {
            let mut decl = self.method(mid).clone();
            decl.owner = iface_id;
            decl.modifiers = (decl.modifiers & !ModifierSet::ABSTRACT) | ModifierSet::DEFAULT;
            self.add_method(decl);
        }

        let class_modifiers = if abstract_class {
            visibility | ModifierSet::ABSTRACT
        } else {
            visibility
        };
        let class = TypeDecl {
            simple: self.interner.intern(&format!("{simple}$$")),
            qualified: self.interner.intern(&format!("{qualified}$$")),
            package,
            kind: TypeKind::Class,
            modifiers: class_modifiers,
            type_params,
            supertypes: vec![self.self_type(iface_id)],
            enclosing: None,
            annotations: Annotations::default(),
            methods: Vec::new(),
            fields: Vec::new(),
        };
        let class_id = self.add_type(class);
        (iface_id, class_id)
    }

    pub(crate) fn add_type(&mut self, decl: TypeDecl) -> TypeId {
        let id = TypeId::from_raw(self.types.len() as u32);
        self.by_qualified.insert(decl.qualified, id);
        self.types.push(decl);
        id
    }

    pub(crate) fn add_method(&mut self, decl: MethodDecl) -> MethodId {
        let id = MethodId::from_raw(self.methods.len() as u32);
        let owner = decl.owner;
        self.methods.push(decl);
        self.types[owner.index()].methods.push(id);
        id
    }

    pub(crate) fn add_field(&mut self, decl: FieldDecl) -> FieldId {
        let id = FieldId::from_raw(self.fields.len() as u32);
        let owner = decl.owner;
        self.fields.push(decl);
        self.types[owner.index()].fields.push(id);
        id
    }

    // --- rendering helpers -------------------------------------------------

    /// Fully qualified source rendering of a type reference.
    pub fn display_type(&self, ty: &TypeRef) -> String {
        self.display_type_in(Name::EMPTY, ty)
    }

    /// Source rendering of a type reference, with names in the given
    /// package shortened to their simple form.
    pub fn display_type_in(&self, package: Name, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Primitive(p) => p.as_str().to_owned(),
            TypeRef::Var(name) => self.name(*name).to_owned(),
            TypeRef::Error => "<error>".to_owned(),
            TypeRef::Declared { decl, args } => {
                let d = self.type_decl(*decl);
                let mut out = if package != Name::EMPTY && d.package == package {
                    self.name(d.simple).to_owned()
                } else {
                    self.name(d.qualified).to_owned()
                };
                if !args.is_empty() {
                    out.push('<');
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&self.display_type_in(package, a));
                    }
                    out.push('>');
                }
                out
            }
        }
    }
}

/// Iterator over the lexical enclosing-scope chain.
pub struct EnclosingChain<'h> {
    host: &'h Host,
    next: Option<TypeId>,
}

impl Iterator for EnclosingChain<'_> {
    type Item = TypeId;

    fn next(&mut self) -> Option<TypeId> {
        let current = self.next?;
        self.next = self.host.type_decl(current).enclosing;
        Some(current)
    }
}
