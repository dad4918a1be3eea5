//! Converters for scalar shapes: booleans, exact-range integers, floats,
//! strings, and RFC 3339 timestamps.
//!
//! ## Integer semantics
//!
//! A JSON number decodes into an integral target iff it is an integral
//! literal within the target width's range, or a floating literal that is
//! exactly integral and survives a round-trip through the target width
//! value-for-value. `12.0` decodes to `12`; `12.34` is rejected for its
//! fractional digits; `2147483648` is out of bounds for i32 even though the
//! literal itself is valid JSON.

use std::sync::Arc;

use serde_json::{Number, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::datum::Datum;
use crate::registry::Registry;
use crate::report::ErrorTree;
use crate::shape::Shape;
use crate::value;

use super::{kind_mismatch, Capability, Converter};

/// The converter for a built-in scalar shape. Only called with shapes known
/// to be scalar tags.
pub(crate) fn scalar_converter(shape: &Shape) -> Option<Arc<dyn Converter>> {
    match shape {
        Shape::Bool => Some(Arc::new(BoolConverter)),
        Shape::I32 => Some(Arc::new(I32Converter)),
        Shape::I64 => Some(Arc::new(I64Converter)),
        Shape::F64 => Some(Arc::new(F64Converter)),
        Shape::String => Some(Arc::new(StringConverter)),
        Shape::Timestamp => Some(Arc::new(TimestampConverter)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Integer range checking
// ---------------------------------------------------------------------------

fn out_of_bounds(n: &Number, width: &str) -> ErrorTree {
    ErrorTree::leaf(format!("value {n} is out of bounds for {width}"))
}

/// Decode a JSON number into an integral value within `[min, max]`.
///
/// Accepts integral literals in range, and float literals that are exactly
/// integral and representable in the target width. `max` is at most
/// `i64::MAX`; the u64 branch is therefore always out of bounds.
fn decode_integer(n: &Number, width: &str, min: i64, max: i64) -> Result<i64, ErrorTree> {
    if let Some(i) = n.as_i64() {
        if i < min || i > max {
            return Err(out_of_bounds(n, width));
        }
        return Ok(i);
    }
    if n.as_u64().is_some() {
        return Err(out_of_bounds(n, width));
    }

    let Some(f) = n.as_f64() else {
        return Err(out_of_bounds(n, width));
    };
    if f.fract() != 0.0 {
        return Err(ErrorTree::leaf(format!(
            "unexpected fractional digits in value {n}"
        )));
    }
    // 2^63 is exactly representable as f64 while i64::MAX is not; an exact
    // comparison against `max as f64` would wrongly admit 2^63. Bounds are
    // checked half-open against the next power-of-two boundary instead.
    let upper_exclusive = (max as f64) + 1.0;
    if f < min as f64 || f >= upper_exclusive {
        return Err(out_of_bounds(n, width));
    }
    let i = f as i64;
    if i as f64 != f {
        return Err(out_of_bounds(n, width));
    }
    Ok(i)
}

// ---------------------------------------------------------------------------
// Scalar converters
// ---------------------------------------------------------------------------

pub(crate) struct BoolConverter;

impl Converter for BoolConverter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::Bool)
    }

    fn decode(&self, v: &Value, _shape: &Shape, _reg: &Registry) -> Result<Datum, ErrorTree> {
        value::expect_bool(v).map(Datum::Bool)
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, _reg: &Registry) -> Result<Value, ErrorTree> {
        match datum {
            Datum::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(kind_mismatch("boolean", other)),
        }
    }
}

pub(crate) struct I32Converter;

impl Converter for I32Converter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::I32)
    }

    fn decode(&self, v: &Value, _shape: &Shape, _reg: &Registry) -> Result<Datum, ErrorTree> {
        let n = value::expect_number(v)?;
        let i = decode_integer(n, "i32", i32::MIN as i64, i32::MAX as i64)?;
        Ok(Datum::I32(i as i32))
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, _reg: &Registry) -> Result<Value, ErrorTree> {
        match datum {
            Datum::I32(i) => Ok(Value::Number((*i).into())),
            other => Err(kind_mismatch("32-bit integer", other)),
        }
    }
}

pub(crate) struct I64Converter;

impl Converter for I64Converter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::I64)
    }

    fn decode(&self, v: &Value, _shape: &Shape, _reg: &Registry) -> Result<Datum, ErrorTree> {
        let n = value::expect_number(v)?;
        decode_integer(n, "i64", i64::MIN, i64::MAX).map(Datum::I64)
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, _reg: &Registry) -> Result<Value, ErrorTree> {
        match datum {
            Datum::I64(i) => Ok(Value::Number((*i).into())),
            other => Err(kind_mismatch("64-bit integer", other)),
        }
    }
}

pub(crate) struct F64Converter;

impl Converter for F64Converter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::F64)
    }

    fn decode(&self, v: &Value, _shape: &Shape, _reg: &Registry) -> Result<Datum, ErrorTree> {
        let n = value::expect_number(v)?;
        match n.as_f64() {
            Some(f) => Ok(Datum::F64(f)),
            None => Err(ErrorTree::leaf(format!(
                "value {n} is not representable as f64"
            ))),
        }
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, _reg: &Registry) -> Result<Value, ErrorTree> {
        match datum {
            Datum::F64(f) => Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| {
                    ErrorTree::leaf(format!("number {f} has no JSON representation"))
                }),
            other => Err(kind_mismatch("floating-point", other)),
        }
    }
}

pub(crate) struct StringConverter;

impl Converter for StringConverter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::String)
    }

    fn decode(&self, v: &Value, _shape: &Shape, _reg: &Registry) -> Result<Datum, ErrorTree> {
        value::expect_str(v).map(Datum::str)
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, _reg: &Registry) -> Result<Value, ErrorTree> {
        match datum {
            Datum::Str(s) => Ok(Value::String(s.clone())),
            other => Err(kind_mismatch("string", other)),
        }
    }
}

pub(crate) struct TimestampConverter;

impl Converter for TimestampConverter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::Timestamp)
    }

    fn decode(&self, v: &Value, _shape: &Shape, _reg: &Registry) -> Result<Datum, ErrorTree> {
        let text = value::expect_str(v)?;
        OffsetDateTime::parse(text, &Rfc3339)
            .map(Datum::Timestamp)
            .map_err(|_| {
                ErrorTree::leaf(format!(
                    "expected an RFC 3339 timestamp, found {}",
                    value::describe(v)
                ))
            })
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, _reg: &Registry) -> Result<Value, ErrorTree> {
        match datum {
            Datum::Timestamp(ts) => ts
                .format(&Rfc3339)
                .map(Value::String)
                .map_err(ErrorTree::internal),
            other => Err(kind_mismatch("timestamp", other)),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
