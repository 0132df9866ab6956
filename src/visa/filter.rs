use serde::Deserialize;

use super::fields;
use crate::errors::DbError;
use crate::query::{Filter, FindOptions, Order, SortSpec};
use crate::types::{DocumentId, ID_FIELD};

/// How many records `/latestVisas` returns.
pub const LATEST_LIMIT: usize = 8;

/// A filter plus the sort/limit to run it with.
#[derive(Debug, Clone, PartialEq)]
pub struct FindSpec {
    pub filter: Filter,
    pub options: FindOptions,
}

/// Query string of `GET /getVisas`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisaListQuery {
    #[serde(rename = "visaType")]
    pub visa_type: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `asc` sorts ascending, any other non-empty value descending, empty means no sort.
    #[must_use]
    pub fn from_param(raw: &str) -> Option<Self> {
        match raw {
            "" => None,
            "asc" => Some(Self::Asc),
            _ => Some(Self::Desc),
        }
    }
}

impl From<SortDirection> for Order {
    fn from(d: SortDirection) -> Self {
        match d {
            SortDirection::Asc => Self::Asc,
            SortDirection::Desc => Self::Desc,
        }
    }
}

fn present(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.is_empty())
}

/// Build the `getVisas` query: exact `visaType`, case-insensitive `countryName`
/// substring, both ANDed, ordered by `fee` when a direction is given.
#[must_use]
pub fn list_visas(query: &VisaListQuery) -> FindSpec {
    let mut conds = Vec::new();
    if let Some(visa_type) = present(query.visa_type.as_deref()) {
        conds.push(Filter::Eq { path: fields::VISA_TYPE.into(), value: visa_type.into() });
    }
    if let Some(search) = present(query.search.as_deref()) {
        conds.push(Filter::Regex {
            path: fields::COUNTRY_NAME.into(),
            pattern: regex::escape(search),
            case_insensitive: true,
        });
    }
    let filter = if conds.is_empty() { Filter::True } else { Filter::And(conds) };
    let sort = query
        .sort
        .as_deref()
        .and_then(SortDirection::from_param)
        .map(|d| vec![SortSpec { field: fields::FEE.into(), order: d.into() }]);
    FindSpec { filter, options: FindOptions { sort, limit: None } }
}

/// Records owned by `email`.
///
/// An absent or empty email yields the universal filter, so every record is
/// returned. Callers are expected to always pass one.
#[must_use]
pub fn owner(email: Option<&str>) -> Filter {
    match present(email) {
        Some(email) => Filter::Eq { path: fields::EMAIL.into(), value: email.into() },
        None => Filter::True,
    }
}

/// The most recently inserted visas, newest first.
#[must_use]
pub fn latest() -> FindSpec {
    FindSpec {
        filter: Filter::True,
        options: FindOptions {
            sort: Some(vec![SortSpec { field: ID_FIELD.into(), order: Order::Desc }]),
            limit: Some(LATEST_LIMIT),
        },
    }
}

/// Exact match on the record id.
///
/// # Errors
/// Returns `DbError::InvalidDocumentId` if `id` is not a well-formed ObjectId.
pub fn by_id(id: &str) -> Result<Filter, DbError> {
    let id = DocumentId::parse(id)?;
    Ok(Filter::Eq { path: ID_FIELD.into(), value: id.into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::Bson;

    fn q(visa_type: Option<&str>, search: Option<&str>, sort: Option<&str>) -> VisaListQuery {
        VisaListQuery {
            visa_type: visa_type.map(str::to_string),
            search: search.map(str::to_string),
            sort: sort.map(str::to_string),
        }
    }

    #[test]
    fn no_inputs_yield_universal_unsorted_unlimited() {
        let spec = list_visas(&q(None, None, None));
        assert_eq!(spec.filter, Filter::True);
        assert_eq!(spec.options, FindOptions::default());
        // Empty strings behave like absent parameters
        assert_eq!(list_visas(&q(Some(""), Some(""), Some(""))), spec);
    }

    #[test]
    fn visa_type_and_search_are_anded() {
        let spec = list_visas(&q(Some("Tourist"), Some("jap"), None));
        assert_eq!(
            spec.filter,
            Filter::And(vec![
                Filter::Eq { path: "visaType".into(), value: Bson::String("Tourist".into()) },
                Filter::Regex { path: "countryName".into(), pattern: "jap".into(), case_insensitive: true },
            ])
        );
    }

    #[test]
    fn search_text_is_literal() {
        let spec = list_visas(&q(None, Some("St. (Kitts)"), None));
        let Filter::And(conds) = spec.filter else { panic!("expected conjunction") };
        assert_eq!(
            conds,
            vec![Filter::Regex {
                path: "countryName".into(),
                pattern: r"St\. \(Kitts\)".into(),
                case_insensitive: true
            }]
        );
    }

    #[test]
    fn sort_direction_parsing() {
        assert_eq!(SortDirection::from_param("asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::from_param("desc"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::from_param("ASC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::from_param("anything"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::from_param(""), None);

        let spec = list_visas(&q(None, None, Some("asc")));
        assert_eq!(spec.options.sort, Some(vec![SortSpec { field: "fee".into(), order: Order::Asc }]));
        assert_eq!(spec.options.limit, None);
    }

    #[test]
    fn owner_filter_and_empty_email_gap() {
        assert_eq!(
            owner(Some("a@b.com")),
            Filter::Eq { path: "email".into(), value: Bson::String("a@b.com".into()) }
        );
        assert_eq!(owner(None), Filter::True);
        assert_eq!(owner(Some("")), Filter::True);
    }

    #[test]
    fn latest_sorts_by_id_desc_and_caps_at_eight() {
        let spec = latest();
        assert_eq!(spec.filter, Filter::True);
        assert_eq!(spec.options.limit, Some(8));
        assert_eq!(spec.options.sort, Some(vec![SortSpec { field: "_id".into(), order: Order::Desc }]));
    }

    #[test]
    fn by_id_validates_object_ids() {
        let f = by_id("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        assert!(matches!(f, Filter::Eq { ref path, value: Bson::ObjectId(_) } if path == "_id"));
        assert!(matches!(by_id("xyz"), Err(DbError::InvalidDocumentId(_))));
    }
}
