//! Type references.
//!
//! A `TypeRef` is a lightweight reference into the declaration arenas: it
//! never owns a declaration, only points at one (plus type arguments). The
//! `Error` variant models "not yet processable" types: references to
//! declarations that do not exist in the current round.

use crate::{Name, TypeId};

/// Primitive types of the target language, plus `void`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
    Void,
}

impl Primitive {
    /// Source-level keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Char => "char",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }

    /// Parse a primitive keyword.
    pub fn parse(s: &str) -> Option<Primitive> {
        match s {
            "boolean" => Some(Primitive::Boolean),
            "byte" => Some(Primitive::Byte),
            "short" => Some(Primitive::Short),
            "int" => Some(Primitive::Int),
            "long" => Some(Primitive::Long),
            "char" => Some(Primitive::Char),
            "float" => Some(Primitive::Float),
            "double" => Some(Primitive::Double),
            "void" => Some(Primitive::Void),
            _ => None,
        }
    }

    /// The boxed class used when a primitive value must live in a cache
    /// field (cache fields are compared against null).
    pub fn boxed_class(self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Short => "java.lang.Short",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Char => "java.lang.Character",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
            Primitive::Void => "java.lang.Void",
        }
    }
}

/// A reference to a type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeRef {
    Primitive(Primitive),
    /// A declared (class/interface) type, possibly parameterized.
    Declared { decl: TypeId, args: Vec<TypeRef> },
    /// A type variable, identified by its simple name.
    Var(Name),
    /// An unresolved or erroneous type. Not processable this round.
    Error,
}

impl TypeRef {
    /// A declared type with no arguments (raw reference).
    pub fn declared(decl: TypeId) -> TypeRef {
        TypeRef::Declared {
            decl,
            args: Vec::new(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Primitive(Primitive::Void))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeRef::Error)
    }

    /// The declaration this reference points at, if any.
    pub fn decl(&self) -> Option<TypeId> {
        match self {
            TypeRef::Declared { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    /// Type arguments, empty for non-declared references.
    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Declared { args, .. } => args,
            _ => &[],
        }
    }

    /// Whether this reference contains an `Error` anywhere.
    pub fn has_error(&self) -> bool {
        match self {
            TypeRef::Error => true,
            TypeRef::Declared { args, .. } => args.iter().any(TypeRef::has_error),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_parse() {
        assert_eq!(Primitive::parse("int"), Some(Primitive::Int));
        assert_eq!(Primitive::parse("java.lang.Integer"), None);
        assert_eq!(Primitive::Int.boxed_class(), "java.lang.Integer");
    }

    #[test]
    fn test_nested_error_detection() {
        let t = TypeRef::Declared {
            decl: TypeId::from_raw(0),
            args: vec![TypeRef::Error],
        };
        assert!(t.has_error());
        assert!(!t.is_error());
    }
}
