//! Compact JSON encoder.
//!
//! Output is a single line with no insignificant whitespace: no spaces after
//! `:` or `,`, object keys in the order the [`Value`] holds them, and
//! serde_json's standard string escaping. Integers are written as integer
//! literals and floats always keep a fraction or exponent (`1.0`, `1e300`).
//!
//! # Example
//! ```
//! use yaml2json_core::{encode, Mapping, Value};
//!
//! let mut map = Mapping::new();
//! map.insert("foo", Value::from("FOO"));
//! map.insert("n", Value::from(1i64));
//! assert_eq!(encode(&Value::Mapping(map)).unwrap(), r#"{"foo":"FOO","n":1}"#);
//! ```

use std::io::Write;

use crate::value::Value;

/// Encode a value as one compact JSON text.
///
/// # Errors
///
/// Fails for values with no JSON representation: `NaN` and infinite floats.
pub fn encode(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Encode a value as compact JSON straight into `writer`.
///
/// On error the writer may already hold a prefix of the output; callers that
/// need all-or-nothing lines should use [`encode`].
pub fn encode_to_writer<W: Write>(writer: W, value: &Value) -> serde_json::Result<()> {
    serde_json::to_writer(writer, value)
}
