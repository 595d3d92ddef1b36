//! Filter mappings: field path → comparison operator → value.
//!
//! Field paths use `.` to reach into relations (`patient.documentId`); each segment becomes one
//! level of nesting in the rendered query (`filters[patient][documentId][$eq]=...`). Logical
//! groups (`$or`, `$and`) hold a list of nested filter mappings and render as indexed entries.
//!
//! Insertion order is preserved so the encoded query string is deterministic.

use crate::{QueryError, QueryResult};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// Comparison operators understood by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    EqI,
    Ne,
    NeI,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    Contains,
    NotContains,
    ContainsI,
    NotContainsI,
    StartsWith,
    StartsWithI,
    EndsWith,
    EndsWithI,
    Null,
    NotNull,
    Between,
}

impl Operator {
    pub const ALL: [Operator; 21] = [
        Operator::Eq,
        Operator::EqI,
        Operator::Ne,
        Operator::NeI,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::NotContains,
        Operator::ContainsI,
        Operator::NotContainsI,
        Operator::StartsWith,
        Operator::StartsWithI,
        Operator::EndsWith,
        Operator::EndsWithI,
        Operator::Null,
        Operator::NotNull,
        Operator::Between,
    ];

    /// Wire key, including the leading `$`.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::EqI => "$eqi",
            Operator::Ne => "$ne",
            Operator::NeI => "$nei",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::In => "$in",
            Operator::NotIn => "$notIn",
            Operator::Contains => "$contains",
            Operator::NotContains => "$notContains",
            Operator::ContainsI => "$containsi",
            Operator::NotContainsI => "$notContainsi",
            Operator::StartsWith => "$startsWith",
            Operator::StartsWithI => "$startsWithi",
            Operator::EndsWith => "$endsWith",
            Operator::EndsWithI => "$endsWithi",
            Operator::Null => "$null",
            Operator::NotNull => "$notNull",
            Operator::Between => "$between",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    /// Accepts the wire key with or without the leading `$`.
    fn from_str(s: &str) -> QueryResult<Self> {
        let wanted = s.trim().trim_start_matches('$');
        Operator::ALL
            .into_iter()
            .find(|op| &op.as_str()[1..] == wanted)
            .ok_or_else(|| QueryError::UnknownOperator(s.to_owned()))
    }
}

/// Ordered filter mapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filters(Map<String, Value>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path op value` and returns `self` for chaining.
    pub fn with(mut self, path: &str, op: Operator, value: impl Into<Value>) -> Self {
        self.insert(path, op, value);
        self
    }

    /// Adds a condition for `path`. Repeating an operator on the same path replaces its value;
    /// different operators on one path accumulate (`$gte` and `$lte` for a range).
    ///
    /// Empty path segments are skipped; a path with no segments is ignored.
    pub fn insert(&mut self, path: &str, op: Operator, value: impl Into<Value>) {
        let segments: Vec<&str> = path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            tracing::warn!("ignoring filter {} with empty field path", op);
            return;
        }
        insert_at(&mut self.0, &segments, op, value.into());
    }

    /// Adds an `$or` group; a record matches when any member matches.
    pub fn any_of(mut self, groups: impl IntoIterator<Item = Filters>) -> Self {
        self.push_group("$or", groups);
        self
    }

    /// Adds an `$and` group; a record matches when every member matches.
    pub fn all_of(mut self, groups: impl IntoIterator<Item = Filters>) -> Self {
        self.push_group("$and", groups);
        self
    }

    fn push_group(&mut self, key: &str, groups: impl IntoIterator<Item = Filters>) {
        let members: Vec<Value> = groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(Filters::into_value)
            .collect();
        if !members.is_empty() {
            self.0.insert(key.to_owned(), Value::Array(members));
        }
    }

    /// Merges `other` into `self` key by key. Nested mappings merge recursively; any other
    /// value in `other` replaces the existing one.
    pub fn merge(&mut self, other: Filters) {
        merge_maps(&mut self.0, other.0);
    }

    /// Wraps an already-shaped filter object supplied by a caller.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidFilter`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> QueryResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(QueryError::InvalidFilter(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn insert_at(map: &mut Map<String, Value>, segments: &[&str], op: Operator, value: Value) {
    match segments.split_first() {
        None => {
            map.insert(op.as_str().to_owned(), value);
        }
        Some((head, rest)) => {
            let slot = map
                .entry(*head)
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                insert_at(child, rest, op, value);
            }
        }
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        let Value::Object(incoming) = value else {
            target.insert(key, value);
            continue;
        };
        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            merge_maps(existing, incoming);
            continue;
        }
        target.insert(key, Value::Object(incoming));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nests_dotted_paths() {
        let filters = Filters::new().with("patient.documentId", Operator::Eq, "abc123");
        assert_eq!(
            filters.into_value(),
            json!({ "patient": { "documentId": { "$eq": "abc123" } } })
        );
    }

    #[test]
    fn range_operators_share_one_field() {
        let filters = Filters::new()
            .with("Birthday", Operator::Gte, "1990-01-01")
            .with("Birthday", Operator::Lte, "1999-12-31");
        assert_eq!(
            filters.into_value(),
            json!({ "Birthday": { "$gte": "1990-01-01", "$lte": "1999-12-31" } })
        );
    }

    #[test]
    fn or_group_keeps_member_order_and_drops_empty_members() {
        let filters = Filters::new().any_of([
            Filters::new().with("Name", Operator::ContainsI, "li"),
            Filters::new(),
            Filters::new().with("documentId", Operator::Contains, "li"),
        ]);
        assert_eq!(
            filters.into_value(),
            json!({ "$or": [
                { "Name": { "$containsi": "li" } },
                { "documentId": { "$contains": "li" } }
            ] })
        );
    }

    #[test]
    fn merge_is_deep_for_objects() {
        let mut base = Filters::new().with("Gender", Operator::Eq, "male");
        base.merge(Filters::new().with("Gender", Operator::Ne, "female"));
        assert_eq!(
            base.into_value(),
            json!({ "Gender": { "$eq": "male", "$ne": "female" } })
        );
    }

    #[test]
    fn operator_parses_with_or_without_dollar() {
        assert_eq!("$containsi".parse::<Operator>().unwrap(), Operator::ContainsI);
        assert_eq!("notIn".parse::<Operator>().unwrap(), Operator::NotIn);
        assert!(matches!(
            "$like".parse::<Operator>(),
            Err(QueryError::UnknownOperator(_))
        ));
    }

    #[test]
    fn from_value_requires_object() {
        assert!(Filters::from_value(json!({ "Name": { "$eq": "x" } })).is_ok());
        assert!(matches!(
            Filters::from_value(json!(["Name"])),
            Err(QueryError::InvalidFilter(_))
        ));
    }
}
