//! Lenient value conversion.
//!
//! YAML settings often carry scalars as strings ("true", "3"), so the
//! settings readers go through these instead of the strict `as_*` accessors.

use serde_json::Value;

/// Convert a JSON value to a string representation for messages and attributes.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(), // Arrays and objects as JSON strings
    }
}

/// Convert a scalar JSON value to a string, rejecting arrays and objects.
pub fn value_to_scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Convert a JSON value to an integer if possible.
pub fn value_to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert a JSON value to a boolean if possible.
pub fn value_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Short type name used in invalid-type findings.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("x")), "x");
        assert_eq!(value_to_string(&json!(3)), "3");
        assert_eq!(value_to_string(&json!(null)), "");
        assert_eq!(value_to_string(&json!(["a"])), "[\"a\"]");
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(value_to_int(&json!(42)), Some(42));
        assert_eq!(value_to_int(&json!(" 7 ")), Some(7));
        assert_eq!(value_to_int(&json!(1.5)), None);
        assert_eq!(value_to_bool(&json!(true)), Some(true));
        assert_eq!(value_to_bool(&json!("FALSE")), Some(false));
        assert_eq!(value_to_bool(&json!(1)), None);
        assert_eq!(value_to_scalar_string(&json!(false)), Some("false".to_string()));
        assert_eq!(value_to_scalar_string(&json!({})), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(json_type_name(&json!([])), "list");
        assert_eq!(json_type_name(&json!({})), "object");
        assert_eq!(json_type_name(&json!("s")), "string");
    }
}
