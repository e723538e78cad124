//! Natural-language search.
//!
//! A free-text query is translated by the model into a JSON query object,
//! checked against the per-collection allow-lists, and only then run against
//! a [`SearchBackend`]. Each stage short-circuits: nothing reaches the backend
//! unless translation and validation both succeed.

mod query;

pub use query::{
    parse, Collection, DateField, DateFilter, DateOperator, Filter, RawSearchQuery, SearchQuery,
    TextField, TextFilter, TextOperator, DEFAULT_LIMIT, MAX_LIMIT,
};

use chrono::NaiveDate;
use serde::Serialize;

use crate::ai::{prompts, AiProvider, CompletionRequest};
use crate::error::SearchError;

const MAX_TOKENS: u32 = 512;

/// One matched row, keyed by column name
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Something that can run a validated query
pub trait SearchBackend {
    fn execute(&self, query: &SearchQuery) -> anyhow::Result<Vec<Record>>;
}

/// What a successful search returns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub table: Collection,
    pub filters: Vec<Filter>,
    pub results: Vec<Record>,
}

/// User message for the translation request
pub fn translation_message(query: &str, today: NaiveDate) -> String {
    format!("Today's date: {}\n\nSearch query: {}", today.format("%Y-%m-%d"), query)
}

/// Translate `query` with `provider`, validate, then run it on `backend`.
///
/// `today` anchors relative dates in the query. Exactly one provider call is
/// made; the backend is called once, and only for a valid query.
pub fn translate_and_search(
    provider: &dyn AiProvider,
    backend: &dyn SearchBackend,
    query: &str,
    today: NaiveDate,
) -> Result<SearchOutcome, SearchError> {
    let request =
        CompletionRequest::new(prompts::SEARCH, translation_message(query, today), MAX_TOKENS);
    let text = provider.complete(&request).map_err(|e| {
        tracing::warn!(provider = provider.name(), error = %e, "search translation request failed");
        SearchError::Service(e.to_string())
    })?;
    tracing::debug!(response = %text, "search translation received");

    let validated = parse(&text)?.validate()?;
    tracing::debug!(
        table = %validated.table,
        filters = validated.filters.len(),
        limit = validated.limit,
        "running search"
    );

    let results = backend.execute(&validated).map_err(|e| {
        tracing::warn!(error = %e, "search execution failed");
        SearchError::Execution(e.to_string())
    })?;

    Ok(SearchOutcome {
        table: validated.table,
        filters: validated.filters,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::sync::Mutex;

    struct CannedProvider {
        reply: Result<String, String>,
        seen: Mutex<Vec<String>>,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl AiProvider for CannedProvider {
        fn complete(&self, request: &CompletionRequest<'_>) -> anyhow::Result<String> {
            assert_eq!(request.system, prompts::SEARCH);
            assert_eq!(request.max_tokens, 512);
            self.seen.lock().unwrap().push(request.user.clone());
            self.reply.clone().map_err(|e| anyhow!(e))
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    /// Counts calls and hands back fixed rows or an error
    struct CountingBackend {
        calls: RefCell<Vec<SearchQuery>>,
        fail_with: Option<&'static str>,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_with: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl SearchBackend for CountingBackend {
        fn execute(&self, query: &SearchQuery) -> anyhow::Result<Vec<Record>> {
            self.calls.borrow_mut().push(query.clone());
            if let Some(msg) = self.fail_with {
                return Err(anyhow!(msg));
            }
            let mut row = Record::new();
            row.insert("name".to_string(), "Wile E. Coyote".into());
            Ok(vec![row])
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_acme_scenario() {
        let provider = CannedProvider::new(
            r#"{"table":"contacts","filters":[{"kind":"text","field":"company","operator":"ilike","value":"Acme"}],"limit":20}"#,
        );
        let backend = CountingBackend::new();

        let today = date("2024-06-01");
        let outcome = translate_and_search(&provider, &backend, "contacts at Acme", today).unwrap();

        assert_eq!(outcome.table, Collection::Contacts);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(
            provider.seen.lock().unwrap()[0],
            "Today's date: 2024-06-01\n\nSearch query: contacts at Acme"
        );
        assert_eq!(backend.calls(), 1);
        assert_eq!(backend.calls.borrow()[0].limit, 20);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["table"], "contacts");
        assert_eq!(json["filters"][0]["kind"], "text");
        assert_eq!(json["filters"][0]["operator"], "ilike");
        assert_eq!(json["results"][0]["name"], "Wile E. Coyote");
    }

    #[test]
    fn test_non_json_reply_never_reaches_backend() {
        let provider = CannedProvider::new("I found three contacts at Acme!");
        let backend = CountingBackend::new();
        let err =
            translate_and_search(&provider, &backend, "acme", date("2024-06-01")).unwrap_err();
        assert_eq!(err, SearchError::Translation);
        assert_eq!(err.to_string(), "Could not understand search query. Try rephrasing.");
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_disallowed_field_never_reaches_backend() {
        let provider = CannedProvider::new(
            r#"{"table":"follow_ups","filters":[{"kind":"text","field":"due_date","operator":"eq","value":"2024-06-01"}]}"#,
        );
        let backend = CountingBackend::new();
        let err = translate_and_search(&provider, &backend, "due june 1", date("2024-06-01"))
            .unwrap_err();
        assert_eq!(err, SearchError::Translation);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_meetings_last_week() {
        let week = r#"{"table":"interactions","filters":[
            {"kind":"date","field":"occurred_at","operator":"gte","value":"2024-06-03"},
            {"kind":"date","field":"occurred_at","operator":"lte","value":"2024-06-09"}]}"#;
        let backend = CountingBackend::new();
        let outcome = translate_and_search(
            &CannedProvider::new(week),
            &backend,
            "meetings last week",
            date("2024-06-10"),
        )
        .unwrap();
        assert_eq!(outcome.table, Collection::Interactions);
        assert_eq!(outcome.filters.len(), 2);

        let with_type = r#"{"table":"interactions","filters":[
            {"kind":"text","field":"type","operator":"eq","value":"meeting"}]}"#;
        let err = translate_and_search(
            &CannedProvider::new(with_type),
            &backend,
            "meetings last week",
            date("2024-06-10"),
        )
        .unwrap_err();
        assert_eq!(err, SearchError::Translation);
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_backend_error_is_execution_error() {
        let provider = CannedProvider::new(
            r#"{"table":"interactions","filters":[{"kind":"date","field":"occurred_at","operator":"gte","value":"last tuesday"}]}"#,
        );
        let backend = CountingBackend {
            calls: RefCell::new(Vec::new()),
            fail_with: Some("invalid input syntax for type date: \"last tuesday\""),
        };
        let today = date("2024-06-10");
        let err =
            translate_and_search(&provider, &backend, "since last tuesday", today).unwrap_err();
        let expected = "invalid input syntax for type date: \"last tuesday\"";
        assert_eq!(err, SearchError::Execution(expected.to_string()));
    }

    #[test]
    fn test_provider_error_is_service_error() {
        let provider = CannedProvider {
            reply: Err("API error 401 Unauthorized: invalid x-api-key".to_string()),
            seen: Mutex::new(Vec::new()),
        };
        let backend = CountingBackend::new();
        let err =
            translate_and_search(&provider, &backend, "anyone", date("2024-06-10")).unwrap_err();
        assert!(matches!(err, SearchError::Service(ref m) if m.contains("401")));
        assert_eq!(backend.calls(), 0);
    }
}
