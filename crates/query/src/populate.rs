//! Relation expansion ("populate") instructions.

use crate::sort::Sort;
use serde_json::{Map, Value};

/// One relation to expand, optionally restricted to a field subset, sorted, and with its own
/// nested expansions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    name: String,
    fields: Vec<String>,
    sort: Vec<Sort>,
    populate: Populate,
}

impl Relation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            sort: Vec::new(),
            populate: Populate::new(),
        }
    }

    /// Restricts the expanded entity to these fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Expands a relation of the related entity.
    pub fn populate(mut self, relation: Relation) -> Self {
        self.populate.insert(relation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the relation carries no field subset, sort or nested expansion.
    pub fn is_plain(&self) -> bool {
        self.fields.is_empty() && self.sort.is_empty() && self.populate.is_empty()
    }

    fn to_value(&self) -> Value {
        if self.is_plain() {
            return Value::Bool(true);
        }

        let mut map = Map::new();
        if !self.fields.is_empty() {
            map.insert(
                "fields".into(),
                Value::Array(self.fields.iter().cloned().map(Value::String).collect()),
            );
        }
        if !self.sort.is_empty() {
            map.insert(
                "sort".into(),
                Value::Array(self.sort.iter().map(|s| Value::String(s.to_string())).collect()),
            );
        }
        if let Some(nested) = self.populate.to_value() {
            map.insert("populate".into(), nested);
        }
        Value::Object(map)
    }
}

/// Ordered set of relations keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Populate(Vec<Relation>);

impl Populate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expands each named relation in full.
    pub fn relations<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut populate = Self::new();
        for name in names {
            populate.insert(Relation::new(name));
        }
        populate
    }

    pub fn with(mut self, relation: Relation) -> Self {
        self.insert(relation);
        self
    }

    /// Adds `relation`, replacing any earlier relation of the same name in place.
    pub fn insert(&mut self, relation: Relation) {
        match self.0.iter_mut().find(|r| r.name == relation.name) {
            Some(existing) => *existing = relation,
            None => self.0.push(relation),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.0.iter()
    }

    /// Query representation, or `None` when nothing is expanded.
    ///
    /// All-plain sets render as a list of names; otherwise an object keyed by relation name is
    /// produced and plain members render as `true`.
    pub fn to_value(&self) -> Option<Value> {
        if self.0.is_empty() {
            return None;
        }
        if self.0.iter().all(Relation::is_plain) {
            return Some(Value::Array(
                self.0.iter().map(|r| Value::String(r.name.clone())).collect(),
            ));
        }
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|r| (r.name.clone(), r.to_value()))
            .collect();
        Some(Value::Object(map))
    }
}
