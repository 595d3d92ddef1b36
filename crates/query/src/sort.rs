//! Sort expressions in `field:direction` form.

use crate::{QueryError, QueryResult};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A single sort key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    field: String,
    order: SortOrder,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.order.as_str())
    }
}

impl FromStr for Sort {
    type Err = QueryError;

    /// Parses `field`, `field:asc` or `field:desc` (direction is case-insensitive).
    fn from_str(s: &str) -> QueryResult<Self> {
        let s = s.trim();
        let (field, order) = match s.rsplit_once(':') {
            Some((field, dir)) => {
                let order = match dir.trim().to_ascii_lowercase().as_str() {
                    "asc" => SortOrder::Asc,
                    "desc" => SortOrder::Desc,
                    _ => return Err(QueryError::InvalidSort(s.to_owned())),
                };
                (field.trim(), order)
            }
            None => (s, SortOrder::Asc),
        };

        if field.is_empty() || field.contains(char::is_whitespace) {
            return Err(QueryError::InvalidSort(s.to_owned()));
        }

        Ok(Self {
            field: field.to_owned(),
            order,
        })
    }
}
