//! The type descriptor algebra.
//!
//! A [`Shape`] is the engine's answer to "what type is this": a closed,
//! hashable tagged union rather than host reflection. Converter resolution
//! dispatches on the variant tag, and registry caching keys on structural
//! equality: two parameterized shapes are equal iff the raw type name and all
//! type arguments are equal, positionally.
//!
//! User-defined types are described once, as data: a [`ProductDef`] names a
//! record's components and an [`EnumDef`] names its cases. Field shapes inside
//! a generic product may reference the product's declared type parameters
//! with [`Shape::Var`]; the resolver substitutes those at lookup time.
//!
//! Everything here is serde-derived so type bundles can live in JSON files.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// A type descriptor: either a built-in shape, a reference to a registered
/// product or enum type (possibly with type arguments), or a still-unbound
/// type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    Bool,
    I32,
    I64,
    F64,
    String,
    /// RFC 3339 timestamp text.
    Timestamp,
    /// Homogeneous ordered sequence.
    List(Box<Shape>),
    /// String-keyed mapping with homogeneous values.
    Map(Box<Shape>),
    /// Always present in JSON, but the value may be `null`.
    Nullable(Box<Shape>),
    /// May be absent entirely from an enclosing object. Only meaningful as a
    /// product component; see the optional converter for misuse handling.
    Optional(Box<Shape>),
    /// A registered product or enum type, by name, with positional type
    /// arguments for generic products.
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Shape>,
    },
    /// A reference to an enclosing product type's declared type parameter.
    /// Never valid at a registry lookup; resolved away beforehand.
    Var(String),
}

impl Shape {
    pub fn list(element: Shape) -> Self {
        Shape::List(Box::new(element))
    }

    pub fn map(value: Shape) -> Self {
        Shape::Map(Box::new(value))
    }

    pub fn nullable(inner: Shape) -> Self {
        Shape::Nullable(Box::new(inner))
    }

    pub fn optional(inner: Shape) -> Self {
        Shape::Optional(Box::new(inner))
    }

    /// A non-generic named type.
    pub fn named(name: impl Into<String>) -> Self {
        Shape::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A parameterized named type.
    pub fn generic(name: impl Into<String>, args: Vec<Shape>) -> Self {
        Shape::Named {
            name: name.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Shape::Var(name.into())
    }

    /// Whether the shape contains no unbound type parameters.
    pub fn is_concrete(&self) -> bool {
        match self {
            Shape::Bool
            | Shape::I32
            | Shape::I64
            | Shape::F64
            | Shape::String
            | Shape::Timestamp => true,
            Shape::List(inner)
            | Shape::Map(inner)
            | Shape::Nullable(inner)
            | Shape::Optional(inner) => inner.is_concrete(),
            Shape::Named { args, .. } => args.iter().all(Shape::is_concrete),
            Shape::Var(_) => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Bool => write!(f, "bool"),
            Shape::I32 => write!(f, "i32"),
            Shape::I64 => write!(f, "i64"),
            Shape::F64 => write!(f, "f64"),
            Shape::String => write!(f, "string"),
            Shape::Timestamp => write!(f, "timestamp"),
            Shape::List(inner) => write!(f, "list<{inner}>"),
            Shape::Map(inner) => write!(f, "map<string, {inner}>"),
            Shape::Nullable(inner) => write!(f, "nullable<{inner}>"),
            Shape::Optional(inner) => write!(f, "optional<{inner}>"),
            Shape::Named { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Shape::Var(name) => write!(f, "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Type definitions
// ---------------------------------------------------------------------------

/// One named component of a product type. The shape may reference the
/// product's type parameters via [`Shape::Var`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub shape: Shape,
}

/// A product (record) type: a fixed set of named components, with an
/// optional list of declared type parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    pub fields: Vec<FieldDef>,
}

impl ProductDef {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            fields,
        }
    }

    pub fn generic(
        name: impl Into<String>,
        params: Vec<impl Into<String>>,
        fields: Vec<FieldDef>,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            fields,
        }
    }

    pub fn field(name: impl Into<String>, shape: Shape) -> FieldDef {
        FieldDef {
            name: name.into(),
            shape,
        }
    }
}

/// An enum type: a closed set of case names, carried in JSON as exact
/// case-sensitive strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub cases: Vec<String>,
}

impl EnumDef {
    pub fn new(name: impl Into<String>, cases: Vec<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            cases: cases.into_iter().map(Into::into).collect(),
        }
    }
}

/// A loadable set of type definitions plus the root shape they describe.
/// This is the file format the CLI consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<ProductDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumDef>,
    pub root: Shape,
}

// ===========================================================================
// Tests
// ===========================================================================
