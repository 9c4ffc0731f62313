//! Decoding for loosely typed values that cross the boundary from scripts, hooks and stored
//! metadata. Everything past this module works with plain `bool`, `f64` and `String`.

use serde_json::{Map, Value};

/// Key under which collection records may nest their attributes.
pub const NESTED_METADATA_KEY: &str = "metadata";

/// Accepts bool `true`, the number `1` (integer or float) and the strings `"true"` / `"1"`.
/// Anything else, including `null`, decodes to `false`.
pub fn truthy(value: &Value) -> bool {
	match value {
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64() == Some(1.0),
		Value::String(text) => matches!(text.trim(), "true" | "1"),
		_ => false,
	}
}

/// Integer or float numbers as `f64`. Strings are not parsed.
pub fn number(value: &Value) -> Option<f64> {
	value.as_f64().filter(|number| number.is_finite())
}

/// Strings as-is and numbers rendered as text, so ids stored as integers still compare.
pub fn text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		_ => None,
	}
}

/// Looks `key` up under the nested metadata object first and falls back to the top level only
/// when the nested value is absent or `null`.
pub fn nested_or_top<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
	let nested = record
		.get(NESTED_METADATA_KEY)
		.and_then(Value::as_object)
		.and_then(|metadata| metadata.get(key))
		.filter(|value| !value.is_null());

	nested.or_else(|| record.get(key).filter(|value| !value.is_null()))
}
