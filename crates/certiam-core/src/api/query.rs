//! Query-string serialization in the style of the `qs` family of encoders.
//!
//! Nested objects use bracket keys (`a[b]=c`). Arrays use either the
//! repeated-key form (`tags=a&tags=b`) or the indexed form (`tags[0]=a`).
//! Spaces are written as `%20`, never `+`.

use serde_json::{Map, Value};
use url::form_urlencoded::{self, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayFormat {
    /// `key=v1&key=v2`
    Repeat,
    /// `key[0]=v1&key[1]=v2`
    Indices,
}

/// Serialize an object into a query string.
pub fn stringify(params: &Map<String, Value>, format: ArrayFormat) -> String {
    let mut serializer = Serializer::new(String::new());
    for (key, value) in params {
        append_value(&mut serializer, key, value, format);
    }
    space_as_percent(serializer.finish())
}

fn append_value(serializer: &mut Serializer<'_, String>, key: &str, value: &Value, format: ArrayFormat) {
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let child = match format {
                    ArrayFormat::Repeat => key.to_string(),
                    ArrayFormat::Indices => format!("{}[{}]", key, i),
                };
                append_value(serializer, &child, item, format);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                append_value(serializer, &format!("{}[{}]", key, k), v, format);
            }
        }
        scalar => {
            serializer.append_pair(key, &scalar_text(scalar));
        }
    }
}

/// Text form of a scalar parameter. Nulls become empty; objects fall back to JSON text.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Percent-encode a single query component.
pub fn encode_component(text: &str) -> String {
    space_as_percent(form_urlencoded::byte_serialize(text.as_bytes()).collect())
}

// form_urlencoded writes a space as `+` and a literal `+` as `%2B`, so any
// remaining `+` is a space.
fn space_as_percent(encoded: String) -> String {
    if encoded.contains('+') {
        encoded.replace('+', "%20")
    } else {
        encoded
    }
}

/// Build the query string for a read request.
///
/// Null values and empty arrays are skipped. Arrays are emitted in
/// repeated-key form; everything else as `key=encodedValue`. Returns an
/// empty string when nothing survives.
pub fn build_read_query(params: &Map<String, Value>) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => continue,
            Value::Array(items) => {
                if items.is_empty() {
                    continue;
                }
                let mut single = Map::new();
                single.insert(key.clone(), value.clone());
                let serialized = stringify(&single, ArrayFormat::Repeat);
                if !serialized.is_empty() {
                    parts.push(serialized);
                }
            }
            Value::Object(_) => {
                parts.push(format!("{}={}", key, encode_component(&value.to_string())));
            }
            scalar => {
                parts.push(format!("{}={}", key, encode_component(&scalar_text(scalar))));
            }
        }
    }
    parts.join("&")
}

/// Append a query string to a URL, respecting an existing `?`.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, query)
}
