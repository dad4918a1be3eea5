//! Converters for composite shapes: lists, string-keyed maps, and the two
//! wrapper shapes (nullable and optional).
//!
//! Element converters are resolved once at synthesis time and held as
//! registry references; they are dereferenced only while converting, so a
//! self-referential element type is safe to hold even while its own
//! converter is still being synthesized.
//!
//! Error aggregation: element and entry failures never short-circuit. Each
//! is scoped under its index or key and combined, so one bad element does
//! not hide its siblings.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::datum::Datum;
use crate::registry::{ConvPair, Registry};
use crate::report::ErrorTree;
use crate::shape::Shape;
use crate::value;

use super::{kind_mismatch, Capability, Converter, Encoded};

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

pub(crate) struct ListConverter {
    pub element_shape: Shape,
    pub element: ConvPair,
}

impl Converter for ListConverter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::List(inner) if **inner == self.element_shape)
    }

    fn decode(&self, v: &Value, _shape: &Shape, reg: &Registry) -> Result<Datum, ErrorTree> {
        let items = value::expect_array(v)?;

        let mut errors = None;
        let mut decoded = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match self.element.decoder(reg).and_then(|conv| {
                conv.decode(item, &self.element_shape, reg)
            }) {
                Ok(datum) => decoded.push(datum),
                Err(e) => ErrorTree::merge(&mut errors, ErrorTree::scope(index.to_string(), e)),
            }
        }

        match errors {
            Some(tree) => Err(tree),
            None => Ok(Datum::List(decoded)),
        }
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, reg: &Registry) -> Result<Value, ErrorTree> {
        let Datum::List(items) = datum else {
            return Err(kind_mismatch("list", datum));
        };

        let mut errors = None;
        let mut encoded = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match self.element.encoder(reg).and_then(|conv| {
                conv.encode(item, &self.element_shape, reg)
            }) {
                Ok(value) => encoded.push(value),
                Err(e) => ErrorTree::merge(&mut errors, ErrorTree::scope(index.to_string(), e)),
            }
        }

        match errors {
            Some(tree) => Err(tree),
            None => Ok(Value::Array(encoded)),
        }
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

pub(crate) struct MapConverter {
    pub value_shape: Shape,
    pub value: ConvPair,
}

impl Converter for MapConverter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::Map(inner) if **inner == self.value_shape)
    }

    fn decode(&self, v: &Value, _shape: &Shape, reg: &Registry) -> Result<Datum, ErrorTree> {
        let entries = value::expect_object(v)?;

        let mut errors = None;
        let mut decoded = BTreeMap::new();
        for (key, entry) in entries {
            match self.value.decoder(reg).and_then(|conv| {
                conv.decode(entry, &self.value_shape, reg)
            }) {
                Ok(datum) => {
                    decoded.insert(key.clone(), datum);
                }
                Err(e) => ErrorTree::merge(&mut errors, ErrorTree::scope(key, e)),
            }
        }

        match errors {
            Some(tree) => Err(tree),
            None => Ok(Datum::Map(decoded)),
        }
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, reg: &Registry) -> Result<Value, ErrorTree> {
        let Datum::Map(entries) = datum else {
            return Err(kind_mismatch("map", datum));
        };

        let mut errors = None;
        let mut encoded = Map::new();
        for (key, entry) in entries {
            match self.value.encoder(reg).and_then(|conv| {
                conv.encode(entry, &self.value_shape, reg)
            }) {
                Ok(value) => {
                    encoded.insert(key.clone(), value);
                }
                Err(e) => ErrorTree::merge(&mut errors, ErrorTree::scope(key, e)),
            }
        }

        match errors {
            Some(tree) => Err(tree),
            None => Ok(Value::Object(encoded)),
        }
    }
}

// ---------------------------------------------------------------------------
// Nullable
// ---------------------------------------------------------------------------

/// Present-but-maybe-null. JSON `null` decodes to the "is-null" state; any
/// other value decodes as the inner shape. Never vanishes.
pub(crate) struct NullableConverter {
    pub inner_shape: Shape,
    pub inner: ConvPair,
}

impl Converter for NullableConverter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::Nullable(inner) if **inner == self.inner_shape)
    }

    fn decode(&self, v: &Value, _shape: &Shape, reg: &Registry) -> Result<Datum, ErrorTree> {
        if v.is_null() {
            return Ok(Datum::Nullable(None));
        }
        let conv = self.inner.decoder(reg)?;
        let inner = conv.decode(v, &self.inner_shape, reg)?;
        Ok(Datum::nullable(Some(inner)))
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, reg: &Registry) -> Result<Value, ErrorTree> {
        match datum {
            Datum::Nullable(None) => Ok(Value::Null),
            Datum::Nullable(Some(inner)) => {
                let conv = self.inner.encoder(reg)?;
                conv.encode(inner, &self.inner_shape, reg)
            }
            other => Err(kind_mismatch("nullable", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Optional
// ---------------------------------------------------------------------------

/// Maybe-absent (vanishing). Only meaningful as a product component: absence
/// decodes to the "nothing" state, and "nothing" suppresses the component's
/// key on encode. Encoding an optional anywhere else is a misuse and fails
/// loudly even when a value is present.
pub(crate) struct OptionalConverter {
    pub inner_shape: Shape,
    pub inner: ConvPair,
}

impl Converter for OptionalConverter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::Optional(inner) if **inner == self.inner_shape)
    }

    fn decode(&self, v: &Value, _shape: &Shape, reg: &Registry) -> Result<Datum, ErrorTree> {
        let conv = self.inner.decoder(reg)?;
        let inner = conv.decode(v, &self.inner_shape, reg)?;
        Ok(Datum::optional(Some(inner)))
    }

    fn decode_absent(&self, _shape: &Shape, _registry: &Registry) -> Result<Datum, ErrorTree> {
        Ok(Datum::Optional(None))
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, _reg: &Registry) -> Result<Value, ErrorTree> {
        Err(ErrorTree::leaf(format!(
            "optional value (currently holding {}) used outside a vanishing position",
            match datum {
                Datum::Optional(None) => "nothing".to_string(),
                Datum::Optional(Some(inner)) => format!("a {}", inner.kind()),
                other => format!("a {}", other.kind()),
            }
        )))
    }

    fn encode_field(
        &self,
        datum: &Datum,
        _shape: &Shape,
        reg: &Registry,
    ) -> Result<Encoded, ErrorTree> {
        match datum {
            Datum::Optional(None) => Ok(Encoded::Vanish),
            Datum::Optional(Some(inner)) => {
                let conv = self.inner.encoder(reg)?;
                conv.encode(inner, &self.inner_shape, reg).map(Encoded::Value)
            }
            other => Err(kind_mismatch("optional", other)),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
