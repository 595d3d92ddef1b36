//! Response envelope normalisation.
//!
//! The backend wraps list results as `{ data: [...], meta: { pagination: {...} } }`. Depending
//! on the transport the caller may see that envelope as-is or wrapped once more
//! (`{ data: { data: [...], meta: {...} } }`). [`normalize`] accepts either shape.
//!
//! Malformed or unexpected envelopes degrade to an empty result with a zero total. They never
//! raise.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination metadata reported by the backend. Absent fields read as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u64,
    pub page_size: u64,
    pub page_count: u64,
    pub total: u64,
}

impl PageInfo {
    fn from_meta(meta: Option<&Value>) -> Self {
        let Some(pagination) = meta.and_then(|m| m.get("pagination")) else {
            return Self::default();
        };
        let field = |key: &str| pagination.get(key).and_then(Value::as_u64).unwrap_or(0);
        Self {
            page: field("page"),
            page_size: field("pageSize"),
            page_count: field("pageCount"),
            total: field("total"),
        }
    }
}

/// Items and pagination extracted from a list envelope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Normalized {
    pub items: Vec<Value>,
    pub total: u64,
    pub pagination: PageInfo,
}

/// Extracts items and pagination from a list envelope of unknown wrapping depth.
pub fn normalize(response: &Value) -> Normalized {
    let Some(data) = response.get("data") else {
        return Normalized::default();
    };

    let (items, meta) = match data.get("data") {
        Some(Value::Array(items)) => (items, data.get("meta")),
        _ => match data {
            Value::Array(items) => (items, response.get("meta")),
            _ => return Normalized::default(),
        },
    };

    let pagination = PageInfo::from_meta(meta);
    Normalized {
        items: items.clone(),
        total: pagination.total,
        pagination,
    }
}

/// Extracts the entity from a single-entity envelope (`{data: {...}}`, possibly wrapped once
/// more). Returns `None` when no entity object is present.
pub fn unwrap_entity(response: &Value) -> Option<&Value> {
    let data = response.get("data")?;
    match data.get("data") {
        Some(inner @ Value::Object(_)) => Some(inner),
        _ if data.is_object() => Some(data),
        _ => None,
    }
}

/// Typed list result.
#[derive(Clone, Debug, PartialEq)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: PageInfo::default(),
        }
    }
}

impl<T> ListResponse<T> {
    pub fn total(&self) -> u64 {
        self.pagination.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: DeserializeOwned> ListResponse<T> {
    /// Normalises `response` and decodes each item as `T`.
    ///
    /// Items that do not match `T` are logged with the offending field path and skipped; the
    /// reported pagination is kept as the backend sent it.
    pub fn from_envelope(response: &Value) -> Self {
        let normalized = normalize(response);
        let mut items = Vec::with_capacity(normalized.items.len());

        for (index, item) in normalized.items.into_iter().enumerate() {
            match serde_path_to_error::deserialize::<_, T>(item) {
                Ok(decoded) => items.push(decoded),
                Err(err) => {
                    let path = err.path().to_string();
                    tracing::warn!(
                        "skipping list item {} (schema mismatch at {}): {}",
                        index,
                        if path.is_empty() { "<root>" } else { path.as_str() },
                        err.into_inner()
                    );
                }
            }
        }

        Self {
            items,
            pagination: normalized.pagination,
        }
    }
}
