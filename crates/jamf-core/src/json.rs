// Lenient readers for Classic API JSON payloads.
//
// The server is inconsistent about scalar types: ids arrive as numbers
// or strings, booleans sometimes as "true"/"false", and absent values as
// either a missing key, `null`, or an empty string. These helpers hide
// that so the resource parsers stay one line per field.

use chrono::{DateTime, Utc};
use serde_json::Value;

static NULL: Value = Value::Null;

/// The value at `key`, or `null`.
pub(crate) fn at<'a>(v: &'a Value, key: &str) -> &'a Value {
    v.get(key).unwrap_or(&NULL)
}

/// A scalar rendered as a string. Empty strings and `null` are `None`.
pub(crate) fn opt_str(v: &Value, key: &str) -> Option<String> {
    scalar_string(at(v, key)).filter(|s| !s.is_empty())
}

/// A scalar rendered as a string, defaulting to empty.
pub(crate) fn string(v: &Value, key: &str) -> String {
    scalar_string(at(v, key)).unwrap_or_default()
}

pub(crate) fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// An integer from a number or a numeric string.
pub(crate) fn opt_i64(v: &Value, key: &str) -> Option<i64> {
    as_i64(at(v, key))
}

pub(crate) fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn i64_or(v: &Value, key: &str, default: i64) -> i64 {
    opt_i64(v, key).unwrap_or(default)
}

/// A boolean from `true`/`false` or their string forms. Anything else is false.
pub(crate) fn bool(v: &Value, key: &str) -> bool {
    match at(v, key) {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// The array at `key`, or an empty slice.
pub(crate) fn array<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    at(v, key).as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// A `*_epoch` field (milliseconds, UTC). Zero means unset.
pub(crate) fn epoch(v: &Value, key: &str) -> Option<DateTime<Utc>> {
    opt_i64(v, key)
        .filter(|ms| *ms > 0)
        .and_then(DateTime::from_timestamp_millis)
}

/// Array of strings, skipping non-scalar members.
pub(crate) fn strings(v: &Value, key: &str) -> Vec<String> {
    array(v, key).iter().filter_map(scalar_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_are_read_leniently() {
        let v = json!({ "id": "12", "flag": "TRUE", "num": 3, "empty": "", "nothing": null });
        assert_eq!(opt_i64(&v, "id"), Some(12));
        assert!(bool(&v, "flag"));
        assert_eq!(string(&v, "num"), "3");
        assert_eq!(opt_str(&v, "empty"), None);
        assert_eq!(opt_str(&v, "nothing"), None);
        assert!(!bool(&v, "missing"));
    }

    #[test]
    fn missing_arrays_are_empty() {
        let v = json!({ "list": ["a", 2, {}] });
        assert!(array(&v, "absent").is_empty());
        assert_eq!(strings(&v, "list"), vec!["a", "2"]);
    }
}
