//! List queries and the builder that shapes them for the backend.

use crate::filter::Filters;
use crate::populate::Populate;
use crate::qs;
use crate::sort::Sort;
use crate::{QueryError, QueryResult};
use serde_json::{Map, Value};

pub const DEFAULT_PAGE: u32 = 1;

/// Page size used by the console's list views.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Top-level names the builder writes itself.
const RESERVED_PARAMS: [&str; 6] = [
    "page",
    "pageSize",
    "pagination",
    "filters",
    "sort",
    "populate",
];

/// A caller's list intent: which page, which records, in what order, with which relations.
///
/// `sort` and `populate` left unset fall back to the resource's [`QueryDefaults`] when built.
#[derive(Clone, Debug, PartialEq)]
pub struct ListQuery {
    page: u32,
    page_size: u32,
    filters: Filters,
    sort: Vec<Sort>,
    populate: Option<Populate>,
    params: Map<String, Value>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            filters: Filters::new(),
            sort: Vec::new(),
            populate: None,
            params: Map::new(),
        }
    }

    /// Sets page and page size.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPagination`] if either value is zero.
    pub fn paginate(mut self, page: u32, page_size: u32) -> QueryResult<Self> {
        if page == 0 {
            return Err(QueryError::InvalidPagination {
                field: "page",
                value: page,
            });
        }
        if page_size == 0 {
            return Err(QueryError::InvalidPagination {
                field: "pageSize",
                value: page_size,
            });
        }
        self.page = page;
        self.page_size = page_size;
        Ok(self)
    }

    /// Merges `filters` into the query verbatim.
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters.merge(filters);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Overrides the default relation expansion. An empty [`Populate`] expands nothing.
    pub fn populate(mut self, populate: Populate) -> Self {
        self.populate = Some(populate);
        self
    }

    /// Attaches an extra top-level parameter (for example `fields` or `status`).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ReservedParameter`] when the key, or its first bracket segment
    /// (`pagination[page]`), is one the builder owns: `page`, `pageSize` and `pagination` are set
    /// through [`ListQuery::paginate`], `filters`, `sort` and `populate` through their own
    /// methods.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> QueryResult<Self> {
        let key = key.into();
        let head = key.split('[').next().unwrap_or_default().trim();
        if RESERVED_PARAMS.contains(&head) {
            return Err(QueryError::ReservedParameter(key));
        }
        self.params.insert(key, value.into());
        Ok(self)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filter_map(&self) -> &Filters {
        &self.filters
    }
}

/// Per-resource fallbacks applied when a [`ListQuery`] leaves sort or populate unset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryDefaults {
    pub sort: Vec<Sort>,
    pub populate: Populate,
}

/// Shapes [`ListQuery`] values into the backend's nested query object.
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    defaults: QueryDefaults,
}

impl QueryBuilder {
    pub fn new(defaults: QueryDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    /// Builds the query object.
    ///
    /// Keys appear in a fixed order: `pagination`, `filters`, `sort`, `populate`, then extra
    /// parameters in the order they were attached. Empty sections are omitted, except
    /// `pagination`, which is always present.
    pub fn build(&self, query: &ListQuery) -> Value {
        let mut out = Map::new();

        let mut pagination = Map::new();
        pagination.insert("page".into(), Value::from(query.page));
        pagination.insert("pageSize".into(), Value::from(query.page_size));
        out.insert("pagination".into(), Value::Object(pagination));

        if !query.filters.is_empty() {
            out.insert("filters".into(), query.filters.clone().into_value());
        }

        let sort = if query.sort.is_empty() {
            &self.defaults.sort
        } else {
            &query.sort
        };
        if !sort.is_empty() {
            out.insert(
                "sort".into(),
                Value::Array(sort.iter().map(|s| Value::String(s.to_string())).collect()),
            );
        }

        let populate = query.populate.as_ref().unwrap_or(&self.defaults.populate);
        if let Some(populate) = populate.to_value() {
            out.insert("populate".into(), populate);
        }

        for (key, value) in &query.params {
            out.insert(key.clone(), value.clone());
        }

        Value::Object(out)
    }

    /// Builds and encodes the query as a URL query string (without the leading `?`).
    pub fn to_query_string(&self, query: &ListQuery) -> String {
        qs::stringify(&self.build(query))
    }
}
