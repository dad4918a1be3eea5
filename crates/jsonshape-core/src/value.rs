//! Shape-checked accessors over the JSON value model.
//!
//! The engine works on [`serde_json::Value`] trees supplied by the JSON
//! syntax layer. Scalar converters reach for these helpers to demand a
//! particular JSON shape; on mismatch they fail with a message naming the
//! expected shape and a compact rendering of what was actually found.

use serde_json::{Map, Number, Value};

use crate::report::ErrorTree;

const DESCRIBE_STRING_LIMIT: usize = 40;

/// Compact, human-readable rendering of a JSON value for error messages.
/// Long strings are truncated; composite values are summarized, not dumped.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => {
            if s.chars().count() > DESCRIBE_STRING_LIMIT {
                let prefix: String = s.chars().take(DESCRIBE_STRING_LIMIT).collect();
                format!("string \"{prefix}…\"")
            } else {
                format!("string \"{s}\"")
            }
        }
        Value::Array(items) => format!("an array of {} element(s)", items.len()),
        Value::Object(fields) => format!("an object with {} propert(ies)", fields.len()),
    }
}

fn wrong_shape(expected: &str, found: &Value) -> ErrorTree {
    ErrorTree::leaf(format!("expected {expected}, found {}", describe(found)))
}

pub fn expect_object(value: &Value) -> Result<&Map<String, Value>, ErrorTree> {
    value
        .as_object()
        .ok_or_else(|| wrong_shape("a JSON object", value))
}

pub fn expect_array(value: &Value) -> Result<&Vec<Value>, ErrorTree> {
    value
        .as_array()
        .ok_or_else(|| wrong_shape("a JSON array", value))
}

pub fn expect_str(value: &Value) -> Result<&str, ErrorTree> {
    value
        .as_str()
        .ok_or_else(|| wrong_shape("a JSON string", value))
}

pub fn expect_bool(value: &Value) -> Result<bool, ErrorTree> {
    value
        .as_bool()
        .ok_or_else(|| wrong_shape("a JSON boolean", value))
}

pub fn expect_number(value: &Value) -> Result<&Number, ErrorTree> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(wrong_shape("a JSON number", other)),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expect_object_accepts_object() {
        let value = json!({"a": 1});
        let object = expect_object(&value).expect("is an object");
        assert_eq!(object.len(), 1);
    }

    #[test]
    fn test_expect_object_names_found_shape() {
        let error = expect_object(&json!([1, 2])).expect_err("not an object");
        let flat = error.flatten();
        assert_eq!(flat.len(), 1);
        assert!(flat[0].message.contains("expected a JSON object"));
        assert!(flat[0].message.contains("array of 2 element(s)"));
    }

    #[test]
    fn test_expect_number_rejects_string() {
        let error = expect_number(&json!("12")).expect_err("not a number");
        assert!(error.flatten()[0].message.contains("string \"12\""));
    }

    #[test]
    fn test_describe_truncates_long_strings() {
        let long = "x".repeat(200);
        let rendered = describe(&json!(long));
        assert!(rendered.len() < 120);
        assert!(rendered.contains('…'));
    }

    #[test]
    fn test_describe_null_and_bool() {
        assert_eq!(describe(&json!(null)), "null");
        assert_eq!(describe(&json!(true)), "boolean true");
    }
}
