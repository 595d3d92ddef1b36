//! Patient search form.
//!
//! The console offers a quick keyword box and an advanced form (name, gender, birthday range,
//! past treatments). [`PatientSearch`] holds both and translates them into filters for
//! [`crate::PatientService::search`].

use crate::models::Gender;
use crate::ClientResult;
use chrono::NaiveDate;
use cms_query::{Filters, ListQuery, Operator, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct PatientSearch {
    pub page: u32,
    pub page_size: u32,
    /// Quick-search text. Matches the name case-insensitively or the document id.
    pub keyword: Option<String>,
    /// Advanced-form name; takes precedence over `keyword`.
    pub name: Option<String>,
    pub gender: Option<Gender>,
    /// Inclusive birthday range. Applied only when both ends are set.
    pub birthday_range: Option<(NaiveDate, NaiveDate)>,
    pub past_treatments: Vec<String>,
}

impl Default for PatientSearch {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            keyword: None,
            name: None,
            gender: None,
            birthday_range: None,
            past_treatments: Vec::new(),
        }
    }
}

impl PatientSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text the name/id match uses, if any.
    fn effective_keyword(&self) -> Option<&str> {
        [self.name.as_deref(), self.keyword.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    pub fn to_filters(&self) -> Filters {
        let mut filters = Filters::new();

        if let Some(keyword) = self.effective_keyword() {
            filters = filters.any_of([
                Filters::new().with("Name", Operator::ContainsI, keyword),
                Filters::new().with("documentId", Operator::Contains, keyword),
            ]);
        }

        if let Some(gender) = self.gender {
            filters.insert("Gender", Operator::Eq, gender.as_str());
        }

        if let Some((from, to)) = self.birthday_range {
            filters.insert("Birthday", Operator::Gte, from.to_string());
            filters.insert("Birthday", Operator::Lte, to.to_string());
        }

        let past: Vec<Value> = self
            .past_treatments
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Value::from)
            .collect();
        if !past.is_empty() {
            filters.insert("past_treatments", Operator::Contains, Value::Array(past));
        }

        filters
    }

    /// Builds the list query for the current form state and page.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Query`] if the page or page size is zero.
    pub fn to_query(&self) -> ClientResult<ListQuery> {
        Ok(ListQuery::new()
            .paginate(self.page, self.page_size)?
            .filters(self.to_filters()))
    }

    /// Clears every criterion and returns to the first page. The page size is kept.
    pub fn reset(&mut self) {
        *self = Self {
            page_size: self.page_size,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cms_query::{QueryBuilder, QueryDefaults};
    use serde_json::json;

    #[test]
    fn empty_form_has_no_filters() {
        assert!(PatientSearch::new().to_filters().is_empty());
    }

    #[test]
    fn advanced_name_wins_over_quick_keyword() {
        let search = PatientSearch {
            keyword: Some("quick".into()),
            name: Some(" 王 ".into()),
            ..PatientSearch::default()
        };
        assert_eq!(
            search.to_filters().into_value(),
            json!({
                "$or": [
                    { "Name": { "$containsi": "王" } },
                    { "documentId": { "$contains": "王" } }
                ]
            })
        );
    }

    #[test]
    fn full_form_translates_every_field() {
        let search = PatientSearch {
            keyword: Some("li".into()),
            gender: Some(Gender::Male),
            birthday_range: Some((
                NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(1990, 12, 31).unwrap(),
            )),
            past_treatments: vec!["laser".into(), " ".into()],
            ..PatientSearch::default()
        };

        let filters = search.to_filters().into_value();
        assert_eq!(filters["Gender"], json!({ "$eq": "male" }));
        assert_eq!(
            filters["Birthday"],
            json!({ "$gte": "1980-01-01", "$lte": "1990-12-31" })
        );
        assert_eq!(filters["past_treatments"], json!({ "$contains": ["laser"] }));
    }

    #[test]
    fn query_string_carries_pagination_and_keyword() {
        let search = PatientSearch {
            page: 2,
            keyword: Some("li".into()),
            ..PatientSearch::default()
        };
        let qs = QueryBuilder::new(QueryDefaults::default())
            .to_query_string(&search.to_query().unwrap());
        assert!(qs.starts_with(
            "pagination[page]=2&pagination[pageSize]=12&filters[$or][0][Name][$containsi]=li"
        ));
    }

    #[test]
    fn reset_keeps_page_size_only() {
        let mut search = PatientSearch {
            page: 4,
            page_size: 50,
            keyword: Some("x".into()),
            gender: Some(Gender::Female),
            ..PatientSearch::default()
        };
        search.reset();
        assert_eq!(
            search,
            PatientSearch {
                page_size: 50,
                ..PatientSearch::default()
            }
        );
    }

    #[test]
    fn zero_page_is_rejected() {
        let search = PatientSearch {
            page: 0,
            ..PatientSearch::default()
        };
        assert!(search.to_query().is_err());
    }
}
