//! Declarations: types, methods, fields, parameters.
//!
//! Declarations live in flat arenas inside [`crate::Host`] and are addressed
//! by u32 index newtypes.

use crate::{CacheAnnotation, ModifierSet, Name, TypeRef};

macro_rules! decl_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                $name(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

decl_id!(
    /// Index of a type declaration.
    TypeId
);
decl_id!(
    /// Index of a method declaration.
    MethodId
);
decl_id!(
    /// Index of a field declaration.
    FieldId
);

/// Either member kind, as returned by member enumeration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MemberRef {
    Method(MethodId),
    Field(FieldId),
}

impl MemberRef {
    pub fn as_method(self) -> Option<MethodId> {
        match self {
            MemberRef::Method(m) => Some(m),
            MemberRef::Field(_) => None,
        }
    }

    pub fn as_field(self) -> Option<FieldId> {
        match self {
            MemberRef::Field(f) => Some(f),
            MemberRef::Method(_) => None,
        }
    }
}

/// A diagnostic location: the most specific program element responsible.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ElementRef {
    Type(TypeId),
    Method(MethodId),
    Field(FieldId),
}

impl From<MemberRef> for ElementRef {
    fn from(m: MemberRef) -> Self {
        match m {
            MemberRef::Method(id) => ElementRef::Method(id),
            MemberRef::Field(id) => ElementRef::Field(id),
        }
    }
}

/// Kind of a type declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    Interface,
    Class,
}

/// Dependency-lookup name overrides carried by an accessor method.
///
/// The first present non-empty choice wins: explicit field name, explicit
/// method name, fallback value, then the accessor's own name.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct LookupSpec {
    pub field: Option<Name>,
    pub method: Option<Name>,
    pub param: Option<Name>,
    pub value: Option<Name>,
}

/// The typed annotation view of an element.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Annotations {
    /// Marks a type as a module declaration to be processed.
    pub module: bool,
    /// Caching directive.
    pub cache: Option<CacheAnnotation>,
    /// Dependency lookup-name overrides.
    pub lookup: Option<LookupSpec>,
    /// Explicit make-type override for a provider method.
    pub make: Option<TypeRef>,
}

/// A declared type parameter with its bounds.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeParam {
    pub name: Name,
    pub bounds: Vec<TypeRef>,
}

/// A type declaration: the unit the generator processes.
#[derive(Clone, Debug)]
pub struct TypeDecl {
    /// Simple name, e.g. `App`.
    pub simple: Name,
    /// Qualified name, e.g. `com.acme.App`.
    pub qualified: Name,
    /// Enclosing package, e.g. `com.acme`.
    pub package: Name,
    pub kind: TypeKind,
    pub modifiers: ModifierSet,
    pub type_params: Vec<TypeParam>,
    /// Direct supertypes (extends and implements, flattened).
    pub supertypes: Vec<TypeRef>,
    /// Lexically enclosing type, for nested declarations.
    pub enclosing: Option<TypeId>,
    pub annotations: Annotations,
    /// Declared methods, in declaration order.
    pub methods: Vec<MethodId>,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldId>,
}

impl TypeDecl {
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == TypeKind::Interface || self.modifiers.is_abstract()
    }

    pub fn is_module(&self) -> bool {
        self.annotations.module
    }

    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }
}

/// A method parameter.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ParamDecl {
    pub name: Name,
    pub ty: TypeRef,
}

/// A method declaration.
#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub name: Name,
    pub owner: TypeId,
    pub modifiers: ModifierSet,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<ParamDecl>,
    pub ret: TypeRef,
    pub throws: Vec<TypeRef>,
    pub annotations: Annotations,
}

impl MethodDecl {
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }

    /// Parameterless and without own type parameters: eligible for caching.
    pub fn is_parameterless(&self) -> bool {
        self.params.is_empty() && self.type_params.is_empty()
    }
}

/// A field declaration.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: Name,
    pub owner: TypeId,
    pub modifiers: ModifierSet,
    pub ty: TypeRef,
    pub annotations: Annotations,
}

/// A method signature instantiated at a use site (type arguments applied).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct MethodSig {
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
    pub throws: Vec<TypeRef>,
}
