//! Contact-level AI features: history summary, call briefing and follow-up
//! suggestions.
//!
//! Each feature gathers records for one contact, renders them into a user
//! message with the pure `*_message` builders, and makes a single call to the
//! provider.

use chrono::{NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{prompts, AiProvider, CompletionRequest};
use crate::db::Database;
use crate::error::AssistError;
use crate::models::{Contact, FollowUp, FollowUpInput, Interaction, Priority, Tag};

/// Returned instead of a summary when there is nothing to summarize
pub const NO_INTERACTIONS_SUMMARY: &str = "No interactions recorded yet for this contact.";

const MAX_TOKENS: u32 = 1024;
const MAX_SUGGESTIONS: usize = 5;

const SUMMARY_INTERACTIONS: u32 = 50;
const SUMMARY_CONTENT_CHARS: usize = 2000;
const SUMMARY_TOTAL_CHARS: usize = 50_000;

const PREP_INTERACTIONS: u32 = 5;
const PREP_CONTENT_CHARS: usize = 1000;

const SUGGEST_INTERACTIONS: u32 = 20;
const SUGGEST_CONTENT_CHARS: usize = 500;

/// A follow-up proposed by the model, not yet saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpSuggestion {
    pub title: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub contact_id: Uuid,
    pub reasoning: String,
}

#[derive(Deserialize)]
struct SuggestionsResponse {
    suggestions: Vec<FollowUpSuggestion>,
}

// ==================== FEATURES ====================

/// Summarize the contact's recent interaction history.
pub fn summarize_contact(
    provider: &dyn AiProvider,
    db: &Database,
    contact_id: Uuid,
) -> Result<String, AssistError> {
    let contact = load_contact(db, contact_id)?;
    let interactions = db
        .get_interactions_for_contact(contact_id, Some(SUMMARY_INTERACTIONS))
        .map_err(backend)?;

    if interactions.is_empty() {
        return Ok(NO_INTERACTIONS_SUMMARY.to_string());
    }

    let request = CompletionRequest::new(
        prompts::SUMMARIZE,
        summary_message(&contact, &interactions),
        MAX_TOKENS,
    );
    complete(provider, &request, "summarize")
}

/// Briefing to read before talking to the contact.
pub fn prepare_conversation(
    provider: &dyn AiProvider,
    db: &Database,
    contact_id: Uuid,
) -> Result<String, AssistError> {
    let contact = load_contact(db, contact_id)?;
    let interactions = db
        .get_interactions_for_contact(contact_id, Some(PREP_INTERACTIONS))
        .map_err(backend)?;
    let open = db
        .get_follow_ups_for_contact(contact_id, true)
        .map_err(backend)?;
    let tags = db.get_tags_for_contact(contact_id).map_err(backend)?;

    let request = CompletionRequest::new(
        prompts::CONVERSATION_PREP,
        prep_message(&contact, &tags, &interactions, &open),
        MAX_TOKENS,
    );
    complete(provider, &request, "conversation prep")
}

/// Ask the model for follow-ups worth scheduling. Nothing is saved.
pub fn suggest_follow_ups(
    provider: &dyn AiProvider,
    db: &Database,
    contact_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<FollowUpSuggestion>, AssistError> {
    let contact = load_contact(db, contact_id)?;
    let interactions = db
        .get_interactions_for_contact(contact_id, Some(SUGGEST_INTERACTIONS))
        .map_err(backend)?;
    let open = db
        .get_follow_ups_for_contact(contact_id, true)
        .map_err(backend)?;

    let request = CompletionRequest::new(
        prompts::SUGGEST_FOLLOW_UPS,
        suggest_message(&contact, &interactions, &open, today),
        MAX_TOKENS,
    );
    let text = complete(provider, &request, "suggest follow-ups")?;
    parse_suggestions(&text)
}

/// Save a suggestion as a follow-up on `contact_id`. The suggestion's own
/// contact id is advisory; the caller decides whose follow-up it becomes.
pub fn accept_suggestion(
    db: &Database,
    contact_id: Uuid,
    suggestion: &FollowUpSuggestion,
) -> anyhow::Result<FollowUp> {
    let reasoning = clip(suggestion.reasoning.trim(), 2000);
    db.create_follow_up(&FollowUpInput {
        contact_id: Some(contact_id),
        title: suggestion.title.clone(),
        description: Some(reasoning.to_string()),
        due_date: Some(suggestion.due_date),
        priority: suggestion.priority,
    })
}

/// Strict parse of the suggestion reply.
pub fn parse_suggestions(text: &str) -> Result<Vec<FollowUpSuggestion>, AssistError> {
    let parsed: SuggestionsResponse = serde_json::from_str(text.trim()).map_err(|e| {
        tracing::warn!(error = %e, "follow-up suggestions are not valid JSON");
        AssistError::InvalidResponse
    })?;
    if parsed.suggestions.len() > MAX_SUGGESTIONS {
        tracing::warn!(count = parsed.suggestions.len(), "too many follow-up suggestions");
        return Err(AssistError::InvalidResponse);
    }
    Ok(parsed.suggestions)
}

fn load_contact(db: &Database, contact_id: Uuid) -> Result<Contact, AssistError> {
    db.get_contact(contact_id)
        .map_err(backend)?
        .ok_or_else(|| AssistError::NotFound(contact_id.to_string()))
}

fn complete(
    provider: &dyn AiProvider,
    request: &CompletionRequest<'_>,
    feature: &str,
) -> Result<String, AssistError> {
    tracing::debug!(feature, provider = provider.name(), "requesting completion");
    provider.complete(request).map_err(|e| {
        tracing::warn!(feature, error = %e, "AI request failed");
        AssistError::Service(e.to_string())
    })
}

fn backend(e: anyhow::Error) -> AssistError {
    AssistError::Backend(e.to_string())
}

// ==================== MESSAGE BUILDERS ====================

/// "Name at Company (Title)", leaving out what is missing
fn contact_line(contact: &Contact) -> String {
    let mut line = contact.name.clone();
    if let Some(company) = &contact.company {
        line.push_str(&format!(" at {}", company));
    }
    if let Some(title) = &contact.title {
        line.push_str(&format!(" ({})", title));
    }
    line
}

fn interaction_header(interaction: &Interaction) -> String {
    format!(
        "[{}] {}: {}",
        interaction
            .occurred_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        interaction.interaction_type,
        interaction.title.as_deref().unwrap_or("")
    )
}

fn follow_up_lines(open: &[FollowUp]) -> String {
    if open.is_empty() {
        return "None".to_string();
    }
    open.iter()
        .map(|f| format!("- {} (due {}, {})", f.title, f.due_date, f.priority))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn summary_message(contact: &Contact, interactions: &[Interaction]) -> String {
    let history = interactions
        .iter()
        .map(|i| {
            format!(
                "{} {}",
                interaction_header(i),
                clip(i.content.as_deref().unwrap_or(""), SUMMARY_CONTENT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Contact: {}\n\nInteraction history:\n{}",
        contact_line(contact),
        clip(&history, SUMMARY_TOTAL_CHARS)
    )
}

pub fn prep_message(
    contact: &Contact,
    tags: &[Tag],
    interactions: &[Interaction],
    open: &[FollowUp],
) -> String {
    let history = if interactions.is_empty() {
        "No interactions recorded.".to_string()
    } else {
        interactions
            .iter()
            .map(|i| {
                format!(
                    "{}\n{}",
                    interaction_header(i),
                    clip(i.content.as_deref().unwrap_or(""), PREP_CONTENT_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    let tags = if tags.is_empty() {
        "None".to_string()
    } else {
        tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", ")
    };

    format!(
        "Contact: {}\nEmail: {}\nPhone: {}\nNotes: {}\nTags: {}\n\nRecent interactions:\n{}\n\nOpen follow-ups:\n{}",
        contact_line(contact),
        contact.email.as_deref().unwrap_or("N/A"),
        contact.phone.as_deref().unwrap_or("N/A"),
        contact.notes.as_deref().unwrap_or("None"),
        tags,
        history,
        follow_up_lines(open)
    )
}

pub fn suggest_message(
    contact: &Contact,
    interactions: &[Interaction],
    open: &[FollowUp],
    today: NaiveDate,
) -> String {
    let history = if interactions.is_empty() {
        "No interactions recorded.".to_string()
    } else {
        interactions
            .iter()
            .map(|i| {
                format!(
                    "{} {}",
                    interaction_header(i),
                    clip(i.content.as_deref().unwrap_or(""), SUGGEST_CONTENT_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let company = contact
        .company
        .as_deref()
        .map(|c| format!(" at {}", c))
        .unwrap_or_default();

    format!(
        "Today: {}\nContact: {} (ID: {}){}\n\nRecent interactions:\n{}\n\nOpen follow-ups:\n{}",
        today,
        contact.name,
        contact.id,
        company,
        history,
        follow_up_lines(open)
    )
}

/// First `max` characters of `s`
fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactInput, InteractionInput, InteractionType};
    use anyhow::anyhow;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    /// Records every request and replies with a canned result
    struct ScriptedProvider {
        reply: Result<String, String>,
        requests: Mutex<Vec<(String, String, u32)>>,
    }

    impl ScriptedProvider {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_user(&self) -> String {
            self.requests.lock().unwrap().last().unwrap().1.clone()
        }
    }

    impl AiProvider for ScriptedProvider {
        fn complete(&self, request: &CompletionRequest<'_>) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push((
                request.system.to_string(),
                request.user.clone(),
                request.max_tokens,
            ));
            self.reply.clone().map_err(|e| anyhow!(e))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn setup() -> (Database, Contact) {
        let db = Database::open_memory().unwrap();
        let contact = db
            .create_contact(&ContactInput {
                name: "Grace Hopper".to_string(),
                company: Some("Navy".to_string()),
                title: Some("Rear Admiral".to_string()),
                ..Default::default()
            })
            .unwrap();
        (db, contact)
    }

    fn log(db: &Database, contact: &Contact, when: &str, content: &str) {
        db.create_interaction(&InteractionInput {
            interaction_type: InteractionType::Call,
            title: Some("Catch-up".to_string()),
            content: Some(content.to_string()),
            occurred_at: Some(at(when)),
            contact_ids: vec![contact.id],
        })
        .unwrap();
    }

    #[test]
    fn test_summarize_without_history_skips_provider() {
        let (db, contact) = setup();
        let provider = ScriptedProvider::replying("unused");
        let summary = summarize_contact(&provider, &db, contact.id).unwrap();
        assert_eq!(summary, NO_INTERACTIONS_SUMMARY);
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_summarize_sends_history() {
        let (db, contact) = setup();
        log(&db, &contact, "2024-06-01T10:00:00Z", "Talked about COBOL");
        let provider = ScriptedProvider::replying("A warm relationship.");

        let summary = summarize_contact(&provider, &db, contact.id).unwrap();
        assert_eq!(summary, "A warm relationship.");

        let requests = provider.requests.lock().unwrap();
        let (system, user, max_tokens) = &requests[0];
        assert_eq!(system, prompts::SUMMARIZE);
        assert_eq!(*max_tokens, 1024);
        assert!(user.starts_with("Contact: Grace Hopper at Navy (Rear Admiral)"));
        assert!(user.contains("[2024-06-01T10:00:00Z] call: Catch-up Talked about COBOL"));
    }

    #[test]
    fn test_unknown_contact() {
        let (db, _) = setup();
        let provider = ScriptedProvider::replying("unused");
        let err = summarize_contact(&provider, &db, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AssistError::NotFound(_)));
    }

    #[test]
    fn test_provider_failure_is_service_error() {
        let (db, contact) = setup();
        log(&db, &contact, "2024-06-01T10:00:00Z", "hi");
        let provider = ScriptedProvider::failing("API error 529: overloaded");
        let err = prepare_conversation(&provider, &db, contact.id).unwrap_err();
        match err {
            AssistError::Service(msg) => assert!(msg.contains("overloaded")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_prep_message_includes_open_items() {
        let (db, contact) = setup();
        db.create_follow_up(&FollowUpInput {
            contact_id: Some(contact.id),
            title: "Send slides".to_string(),
            due_date: Some(date("2024-06-20")),
            priority: Priority::High,
            ..Default::default()
        })
        .unwrap();
        let provider = ScriptedProvider::replying("Briefing");

        assert_eq!(prepare_conversation(&provider, &db, contact.id).unwrap(), "Briefing");
        let user = provider.last_user();
        assert!(user.contains("Email: N/A"));
        assert!(user.contains("Tags: None"));
        assert!(user.contains("No interactions recorded."));
        assert!(user.contains("- Send slides (due 2024-06-20, high)"));
    }

    #[test]
    fn test_suggest_parses_reply() {
        let (db, contact) = setup();
        let reply = format!(
            r#"{{"suggestions":[{{"title":"Book lunch","due_date":"2024-06-14","priority":"medium","contact_id":"{}","reasoning":"It has been a while"}}]}}"#,
            contact.id
        );
        let provider = ScriptedProvider::replying(&reply);

        let suggestions =
            suggest_follow_ups(&provider, &db, contact.id, date("2024-06-10")).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].due_date, date("2024-06-14"));
        let expected_head = format!(
            "Today: 2024-06-10\nContact: Grace Hopper (ID: {}) at Navy",
            contact.id
        );
        assert!(provider.last_user().starts_with(&expected_head));

        let saved = accept_suggestion(&db, contact.id, &suggestions[0]).unwrap();
        assert_eq!(saved.title, "Book lunch");
        assert_eq!(saved.description.as_deref(), Some("It has been a while"));
        assert_eq!(db.get_follow_ups_for_contact(contact.id, true).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_suggestions_rejects_bad_replies() {
        let id = Uuid::new_v4();
        let one = format!(
            r#"{{"title":"t","due_date":"2024-06-14","priority":"low","contact_id":"{}","reasoning":"r"}}"#,
            id
        );
        let six = format!(r#"{{"suggestions":[{}]}}"#, vec![one.as_str(); 6].join(","));

        for bad in [
            "Here are some ideas".to_string(),
            r#"{"suggestions":[{"title":"t","due_date":"2024-06-14","priority":"urgent","contact_id":"x","reasoning":"r"}]}"#.to_string(),
            r#"{"suggestions":[{"title":"t","due_date":"soon","priority":"low","contact_id":"00000000-0000-0000-0000-000000000000","reasoning":"r"}]}"#.to_string(),
            six,
        ] {
            assert!(
                matches!(parse_suggestions(&bad), Err(AssistError::InvalidResponse)),
                "{}",
                bad
            );
        }

        let five = format!(r#"{{"suggestions":[{}]}}"#, vec![one.as_str(); 5].join(","));
        assert_eq!(parse_suggestions(&five).unwrap().len(), 5);
        assert!(parse_suggestions(r#"{"suggestions":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_summary_truncation() {
        let contact = Contact::new("Ada".to_string());
        let mut long = Interaction::new(InteractionType::Note);
        long.content = Some("x".repeat(5000));
        let message = summary_message(&contact, &[long]);
        assert_eq!(message.matches('x').count(), SUMMARY_CONTENT_CHARS);

        let many: Vec<Interaction> = (0..40)
            .map(|_| {
                let mut i = Interaction::new(InteractionType::Note);
                i.content = Some("y".repeat(SUMMARY_CONTENT_CHARS));
                i
            })
            .collect();
        let message = summary_message(&contact, &many);
        assert!(message.matches('y').count() < SUMMARY_TOTAL_CHARS);
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        assert_eq!(clip("héllo", 2), "hé");
        assert_eq!(clip("abc", 10), "abc");
        assert_eq!(clip("", 3), "");
    }
}
