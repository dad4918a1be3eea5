//! Converter implementations and the converter trait.
//!
//! Built-in shapes (scalars, containers, wrappers) each have a converter
//! here; product and enum converters are synthesized on demand by the
//! registry from their type definitions.

mod containers;
mod product;
mod scalars;

pub(crate) use containers::{ListConverter, MapConverter, NullableConverter, OptionalConverter};
pub(crate) use product::{EnumConverter, FieldPlan, ProductConverter};
pub(crate) use scalars::scalar_converter;

use serde_json::Value;

use crate::datum::Datum;
use crate::registry::Registry;
use crate::report::{ErrorTree, MISSING_PROPERTY};
use crate::shape::Shape;

/// Which half of a converter a lookup is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Decode,
    Encode,
}

/// Result of encoding in a vanishing-capable position.
#[derive(Debug)]
pub enum Encoded {
    /// A concrete JSON value to write under the component's key.
    Value(Value),
    /// Omit the component's key entirely.
    Vanish,
}

/// A converter between JSON values and typed values for some set of shapes.
///
/// A single implementation may provide one or both capabilities; the
/// [`supports`](Converter::supports) predicate is consulted per capability
/// before the registry selects it. Decode and encode report failures as an
/// [`ErrorTree`] so that enclosing converters can scope and aggregate them
/// instead of failing fast.
pub trait Converter: Send + Sync {
    /// Whether this converter handles `shape` for the given capability.
    fn supports(&self, shape: &Shape, capability: Capability) -> bool;

    /// Decode a JSON value into a typed value.
    fn decode(&self, value: &Value, shape: &Shape, registry: &Registry)
        -> Result<Datum, ErrorTree>;

    /// Produce a value for a product component whose key is absent from the
    /// JSON object. Almost every converter treats absence as an error; the
    /// optional wrapper instead succeeds with its "nothing" state.
    fn decode_absent(&self, _shape: &Shape, _registry: &Registry) -> Result<Datum, ErrorTree> {
        Err(ErrorTree::leaf(MISSING_PROPERTY))
    }

    /// Encode a typed value into a JSON value in a non-vanishing position
    /// (list element, map value, top-level value, nullable payload).
    fn encode(&self, datum: &Datum, shape: &Shape, registry: &Registry)
        -> Result<Value, ErrorTree>;

    /// Encode in a vanishing-capable position (a product component). Only
    /// the optional wrapper ever returns [`Encoded::Vanish`].
    fn encode_field(
        &self,
        datum: &Datum,
        shape: &Shape,
        registry: &Registry,
    ) -> Result<Encoded, ErrorTree> {
        self.encode(datum, shape, registry).map(Encoded::Value)
    }
}

/// Standard mismatch message for encode paths handed the wrong datum kind.
pub(crate) fn kind_mismatch(expected: &str, found: &Datum) -> ErrorTree {
    ErrorTree::leaf(format!("expected a {expected} value, found a {}", found.kind()))
}
