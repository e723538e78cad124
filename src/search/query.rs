//! Structured search queries and the allow-lists that bound them.
//!
//! Model output is parsed into [`RawSearchQuery`] and only becomes a
//! [`SearchQuery`] after [`RawSearchQuery::validate`] has checked every filter
//! against the target collection.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SearchError;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 50;

/// A searchable record collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Contacts,
    Interactions,
    FollowUps,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Interactions => "interactions",
            Self::FollowUps => "follow_ups",
        }
    }

    pub fn all() -> &'static [Collection] {
        &[Self::Contacts, Self::Interactions, Self::FollowUps]
    }

    /// Text fields this collection can be filtered on
    pub fn text_fields(&self) -> &'static [TextField] {
        match self {
            Self::Contacts => &[
                TextField::Name,
                TextField::Email,
                TextField::Company,
                TextField::Title,
            ],
            Self::Interactions | Self::FollowUps => &[TextField::Title],
        }
    }

    /// Date fields this collection can be filtered on
    pub fn date_fields(&self) -> &'static [DateField] {
        match self {
            Self::Contacts => &[DateField::CreatedAt],
            Self::Interactions => &[DateField::OccurredAt, DateField::CreatedAt],
            Self::FollowUps => &[DateField::DueDate, DateField::CreatedAt],
        }
    }

    pub fn allows(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Text(f) => self.text_fields().contains(&f.field),
            Filter::Date(f) => self.date_fields().contains(&f.field),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Name,
    Email,
    Company,
    Title,
}

impl TextField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Company => "company",
            Self::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    OccurredAt,
    CreatedAt,
    DueDate,
}

impl DateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OccurredAt => "occurred_at",
            Self::CreatedAt => "created_at",
            Self::DueDate => "due_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOperator {
    Eq,
    /// Case-insensitive substring match
    Ilike,
    Neq,
}

impl TextOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ilike => "ilike",
            Self::Neq => "neq",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOperator {
    Gte,
    Lte,
    Eq,
}

impl DateOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Eq => "eq",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFilter {
    pub field: TextField,
    pub operator: TextOperator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    pub field: DateField,
    pub operator: DateOperator,
    /// ISO date (`YYYY-MM-DD`) or date-time; checked by the backend
    pub value: String,
}

/// One predicate, tagged on the wire by `"kind": "text" | "date"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Filter {
    Text(TextFilter),
    Date(DateFilter),
}

impl Filter {
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Text(f) => f.field.as_str(),
            Self::Date(f) => f.field.as_str(),
        }
    }
}

/// A query as the model wrote it: well-typed but not yet checked against
/// the collection's fields or the limit range.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchQuery {
    pub table: Collection,
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub limit: Option<f64>,
}

/// A validated query, safe to hand to a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub table: Collection,
    pub filters: Vec<Filter>,
    pub limit: u32,
}

/// Strict JSON parse of model output. Anything that is not a single JSON
/// object of the right shape fails.
pub fn parse(text: &str) -> Result<RawSearchQuery, SearchError> {
    serde_json::from_str(text.trim()).map_err(|e| {
        tracing::warn!(error = %e, "search translation is not a valid query object");
        SearchError::Translation
    })
}

impl RawSearchQuery {
    pub fn validate(self) -> Result<SearchQuery, SearchError> {
        let limit = match self.limit {
            None => DEFAULT_LIMIT,
            Some(n) if n.fract() == 0.0 && (1.0..=f64::from(MAX_LIMIT)).contains(&n) => {
                n as u32
            }
            Some(n) => {
                tracing::warn!(limit = n, "search limit out of range");
                return Err(SearchError::Translation);
            }
        };

        if let Some(bad) = self.filters.iter().find(|f| !self.table.allows(f)) {
            tracing::warn!(
                table = %self.table,
                field = bad.field_name(),
                "search filter field not allowed for table"
            );
            return Err(SearchError::Translation);
        }

        Ok(SearchQuery {
            table: self.table,
            filters: self.filters,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(text: &str) -> Result<SearchQuery, SearchError> {
        parse(text)?.validate()
    }

    #[test]
    fn test_parse_acme_query() {
        let q = validate(
            r#"{"table":"contacts","filters":[{"kind":"text","field":"company","operator":"ilike","value":"Acme"}],"limit":20}"#,
        )
        .unwrap();
        assert_eq!(q.table, Collection::Contacts);
        assert_eq!(
            q.filters,
            vec![Filter::Text(TextFilter {
                field: TextField::Company,
                operator: TextOperator::Ilike,
                value: "Acme".to_string(),
            })]
        );
        assert_eq!(q.limit, 20);
    }

    #[test]
    fn test_limit_defaults_and_bounds() {
        let q = validate(r#"{"table":"interactions","filters":[]}"#).unwrap();
        assert_eq!(q.limit, DEFAULT_LIMIT);

        assert_eq!(validate(r#"{"table":"contacts","filters":[],"limit":50}"#).unwrap().limit, 50);
        assert_eq!(validate(r#"{"table":"contacts","filters":[],"limit":1.0}"#).unwrap().limit, 1);

        for bad in ["0", "51", "2.5", "-1", "\"20\""] {
            let text = format!(r#"{{"table":"contacts","filters":[],"limit":{}}}"#, bad);
            assert_eq!(validate(&text), Err(SearchError::Translation), "limit {}", bad);
        }
    }

    #[test]
    fn test_rejects_non_json_and_wrong_shapes() {
        for bad in [
            "Sure! Here are contacts at Acme.",
            "",
            "[]",
            r#"{"table":"users","filters":[]}"#,
            r#"{"table":"contacts"}"#,
            r#"{"table":"contacts","filters":[{"kind":"regex","field":"name","operator":"eq","value":"x"}]}"#,
            r#"{"table":"contacts","filters":[{"kind":"text","field":"name","operator":"like","value":"x"}]}"#,
            r#"{"table":"contacts","filters":[{"kind":"text","field":"name","operator":"eq"}]}"#,
        ] {
            assert_eq!(validate(bad), Err(SearchError::Translation), "{}", bad);
        }
    }

    #[test]
    fn test_text_filter_on_date_field_rejected() {
        let text = r#"{"table":"follow_ups","filters":[{"kind":"text","field":"due_date","operator":"eq","value":"2024-06-01"}]}"#;
        assert_eq!(validate(text), Err(SearchError::Translation));
    }

    #[test]
    fn test_type_field_rejected_for_interactions() {
        let text = r#"{"table":"interactions","filters":[{"kind":"text","field":"type","operator":"eq","value":"meeting"}]}"#;
        assert_eq!(validate(text), Err(SearchError::Translation));
    }

    #[test]
    fn test_field_must_belong_to_table() {
        let due_on_contacts = r#"{"table":"contacts","filters":[{"kind":"date","field":"due_date","operator":"gte","value":"2024-06-01"}]}"#;
        assert_eq!(validate(due_on_contacts), Err(SearchError::Translation));

        let company_on_follow_ups = r#"{"table":"follow_ups","filters":[{"kind":"text","field":"company","operator":"ilike","value":"Acme"}]}"#;
        assert_eq!(validate(company_on_follow_ups), Err(SearchError::Translation));

        let week = r#"{"table":"interactions","filters":[
            {"kind":"date","field":"occurred_at","operator":"gte","value":"2024-06-03"},
            {"kind":"date","field":"occurred_at","operator":"lte","value":"2024-06-09"}]}"#;
        assert_eq!(validate(week).unwrap().filters.len(), 2);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let q = validate(
            r#"{"table":"follow_ups","filters":[{"kind":"date","field":"due_date","operator":"lte","value":"2024-06-30"},{"kind":"text","field":"title","operator":"neq","value":"Lunch"}],"limit":7}"#,
        )
        .unwrap();
        let encoded = serde_json::to_string(&q).unwrap();
        let again = validate(&encoded).unwrap();
        assert_eq!(again, q);
    }

    #[test]
    fn test_every_table_allows_created_at() {
        for table in Collection::all() {
            assert!(table.date_fields().contains(&DateField::CreatedAt));
            assert!(!table.text_fields().is_empty());
        }
    }
}
