//! Bracket-notation query string encoding.
//!
//! Nested objects and arrays are flattened into `key[child][0]=value` pairs in document order:
//!
//! ```text
//! { "pagination": { "page": 2 }, "sort": ["createdAt:desc"] }
//!   => pagination[page]=2&sort[0]=createdAt%3Adesc
//! ```
//!
//! Only values are percent-encoded; keys are written as-is so the bracket structure stays
//! readable. Values keep the RFC 3986 unreserved characters and encode everything else, so
//! spaces become `%20` and `&` becomes `%26`. Empty arrays and objects contribute nothing;
//! `null` becomes an empty value.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Everything except `ALPHA / DIGIT / "-" / "." / "_" / "~"`.
const VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Encodes a query object. Non-object input yields an empty string.
pub fn stringify(value: &Value) -> String {
    let Value::Object(map) = value else {
        return String::new();
    };

    let mut pairs = Vec::new();
    for (key, child) in map {
        push_pairs(key, child, &mut pairs);
    }
    pairs.join("&")
}

/// Percent-encodes a single value.
pub fn encode_value(raw: &str) -> String {
    utf8_percent_encode(raw, VALUE_ENCODE_SET).to_string()
}

fn push_pairs(prefix: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                push_pairs(&format!("{prefix}[{key}]"), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                push_pairs(&format!("{prefix}[{index}]"), child, out);
            }
        }
        Value::Null => out.push(format!("{prefix}=")),
        Value::Bool(b) => out.push(format!("{prefix}={b}")),
        Value::Number(n) => out.push(format!("{prefix}={n}")),
        Value::String(s) => out.push(format!("{prefix}={}", encode_value(s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_objects_in_order() {
        let query = json!({
            "pagination": { "page": 2, "pageSize": 12 },
            "filters": { "Name": { "$containsi": "li" } }
        });
        assert_eq!(
            stringify(&query),
            "pagination[page]=2&pagination[pageSize]=12&filters[Name][$containsi]=li"
        );
    }

    #[test]
    fn arrays_use_indexed_entries() {
        let query = json!({
            "filters": { "past_treatments": { "$contains": ["laser", "peel"] } }
        });
        assert_eq!(
            stringify(&query),
            "filters[past_treatments][$contains][0]=laser&filters[past_treatments][$contains][1]=peel"
        );
    }

    #[test]
    fn encodes_values_but_not_keys() {
        let query = json!({
            "filters": { "target": { "$eq": "Abdomen & Buttocks" } },
            "sort": ["createdAt:desc"]
        });
        assert_eq!(
            stringify(&query),
            "filters[target][$eq]=Abdomen%20%26%20Buttocks&sort[0]=createdAt%3Adesc"
        );
    }

    #[test]
    fn encodes_non_ascii_as_utf8() {
        assert_eq!(encode_value("张"), "%E5%BC%A0");
        assert_eq!(encode_value("a-b_c.d~e"), "a-b_c.d~e");
    }

    #[test]
    fn scalars_and_empty_containers() {
        let query = json!({
            "populate": { "avatar": true },
            "locale": null,
            "fields": [],
            "meta": {}
        });
        assert_eq!(stringify(&query), "populate[avatar]=true&locale=");
    }

    #[test]
    fn non_object_input_is_empty() {
        assert_eq!(stringify(&json!(["a"])), "");
        assert_eq!(stringify(&json!("a")), "");
    }
}
