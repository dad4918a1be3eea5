//! Synthesized converters for product (record) and enum types.
//!
//! The registry builds one [`ProductConverter`] per concrete use of a
//! registered product type, with every component's shape already resolved
//! through the type parameter substitution of the use site.

use serde_json::{Map, Value};

use crate::datum::Datum;
use crate::registry::{ConvPair, Registry};
use crate::report::{ErrorTree, UNEXPECTED_PROPERTY};
use crate::shape::{EnumDef, Shape};
use crate::value;

use super::{kind_mismatch, Capability, Converter, Encoded};

/// One component of a synthesized product converter: the JSON key, the
/// concrete component shape, and the resolved converter references.
pub(crate) struct FieldPlan {
    pub name: String,
    pub shape: Shape,
    pub conv: ConvPair,
}

/// Converter for one concrete product type.
///
/// Decode requires a JSON object, decodes every component (continuing
/// through failures), delegates absent keys to the component converter's
/// absent handling, and rejects keys that match no declared component.
/// Encode produces one key per non-vanishing component.
pub(crate) struct ProductConverter {
    pub shape: Shape,
    pub type_name: String,
    pub fields: Vec<FieldPlan>,
    pub ignore_unknown: bool,
}

impl Converter for ProductConverter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        *shape == self.shape
    }

    fn decode(&self, v: &Value, _shape: &Shape, reg: &Registry) -> Result<Datum, ErrorTree> {
        let object = value::expect_object(v)?;

        let mut errors = None;
        let mut fields = Vec::with_capacity(self.fields.len());
        for plan in &self.fields {
            let outcome = plan.conv.decoder(reg).and_then(|conv| {
                match object.get(&plan.name) {
                    Some(value) => conv.decode(value, &plan.shape, reg),
                    None => conv.decode_absent(&plan.shape, reg),
                }
            });
            match outcome {
                Ok(datum) => fields.push(datum),
                Err(e) => ErrorTree::merge(&mut errors, ErrorTree::scope(&plan.name, e)),
            }
        }

        if !self.ignore_unknown {
            for key in object.keys() {
                if !self.fields.iter().any(|plan| plan.name == *key) {
                    ErrorTree::merge(
                        &mut errors,
                        ErrorTree::scope(key, ErrorTree::leaf(UNEXPECTED_PROPERTY)),
                    );
                }
            }
        }

        match errors {
            Some(tree) => Err(tree),
            None => Ok(Datum::Record {
                name: self.type_name.clone(),
                fields,
            }),
        }
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, reg: &Registry) -> Result<Value, ErrorTree> {
        let Datum::Record { name, fields } = datum else {
            return Err(kind_mismatch("record", datum));
        };
        if *name != self.type_name {
            return Err(ErrorTree::leaf(format!(
                "expected a {} record, found a {name} record",
                self.type_name
            )));
        }
        if fields.len() != self.fields.len() {
            return Err(ErrorTree::leaf(format!(
                "record {name} holds {} field(s), {} declared",
                fields.len(),
                self.fields.len()
            )));
        }

        let mut errors = None;
        let mut object = Map::new();
        for (plan, field) in self.fields.iter().zip(fields) {
            let outcome = plan
                .conv
                .encoder(reg)
                .and_then(|conv| conv.encode_field(field, &plan.shape, reg));
            match outcome {
                Ok(Encoded::Value(value)) => {
                    object.insert(plan.name.clone(), value);
                }
                Ok(Encoded::Vanish) => {}
                Err(e) => ErrorTree::merge(&mut errors, ErrorTree::scope(&plan.name, e)),
            }
        }

        match errors {
            Some(tree) => Err(tree),
            None => Ok(Value::Object(object)),
        }
    }
}

// ---------------------------------------------------------------------------
// Enum
// ---------------------------------------------------------------------------

/// Converter for a registered enum type: a JSON string exactly matching one
/// case name, case-sensitive, no trimming.
pub(crate) struct EnumConverter {
    pub def: EnumDef,
}

impl Converter for EnumConverter {
    fn supports(&self, shape: &Shape, _capability: Capability) -> bool {
        matches!(shape, Shape::Named { name, args } if *name == self.def.name && args.is_empty())
    }

    fn decode(&self, v: &Value, _shape: &Shape, _reg: &Registry) -> Result<Datum, ErrorTree> {
        let text = value::expect_str(v)?;
        if self.def.cases.iter().any(|case| case == text) {
            Ok(Datum::case(&self.def.name, text))
        } else {
            Err(ErrorTree::leaf(format!(
                "unknown value \"{text}\" for enum {}",
                self.def.name
            )))
        }
    }

    fn encode(&self, datum: &Datum, _shape: &Shape, _reg: &Registry) -> Result<Value, ErrorTree> {
        match datum {
            Datum::Case { case, .. } => Ok(Value::String(case.clone())),
            other => Err(kind_mismatch("enum case", other)),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
