//! The typed in-memory value model.
//!
//! A [`Datum`] is what decoding produces and encoding consumes: a
//! strongly-shaped value whose structure mirrors a [`Shape`](crate::shape::Shape)
//! rather than raw JSON. Record fields are stored positionally in declaration
//! order; the matching `ProductDef` gives them their names.

use std::collections::BTreeMap;

use time::OffsetDateTime;

/// A typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Str(String),
    Timestamp(OffsetDateTime),
    List(Vec<Datum>),
    Map(BTreeMap<String, Datum>),
    /// Present-but-maybe-null. `None` is the "is-null" state.
    Nullable(Option<Box<Datum>>),
    /// Maybe-absent (vanishing). `None` is the "nothing" state.
    Optional(Option<Box<Datum>>),
    /// A product value: fields in declaration order of the matching
    /// `ProductDef`.
    Record { name: String, fields: Vec<Datum> },
    /// An enum value: one case of the matching `EnumDef`.
    Case { name: String, case: String },
}

impl Datum {
    pub fn str(value: impl Into<String>) -> Self {
        Datum::Str(value.into())
    }

    pub fn nullable(value: Option<Datum>) -> Self {
        Datum::Nullable(value.map(Box::new))
    }

    pub fn optional(value: Option<Datum>) -> Self {
        Datum::Optional(value.map(Box::new))
    }

    pub fn record(name: impl Into<String>, fields: Vec<Datum>) -> Self {
        Datum::Record {
            name: name.into(),
            fields,
        }
    }

    pub fn case(name: impl Into<String>, case: impl Into<String>) -> Self {
        Datum::Case {
            name: name.into(),
            case: case.into(),
        }
    }

    /// Short noun for error messages ("expected X value, found {kind}").
    pub fn kind(&self) -> &'static str {
        match self {
            Datum::Bool(_) => "boolean",
            Datum::I32(_) => "32-bit integer",
            Datum::I64(_) => "64-bit integer",
            Datum::F64(_) => "floating-point number",
            Datum::Str(_) => "string",
            Datum::Timestamp(_) => "timestamp",
            Datum::List(_) => "list",
            Datum::Map(_) => "map",
            Datum::Nullable(_) => "nullable value",
            Datum::Optional(_) => "optional value",
            Datum::Record { .. } => "record",
            Datum::Case { .. } => "enum case",
        }
    }
}
