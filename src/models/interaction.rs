use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{non_empty, ContactRef};
use crate::error::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Meeting,
    Call,
    Email,
    Message,
    #[default]
    Note,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meeting => "meeting",
            Self::Call => "call",
            Self::Email => "email",
            Self::Message => "message",
            Self::Note => "note",
        }
    }

    pub fn all() -> &'static [InteractionType] {
        &[
            Self::Meeting,
            Self::Call,
            Self::Email,
            Self::Message,
            Self::Note,
        ]
    }
}

impl FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "meeting" => Ok(Self::Meeting),
            "call" => Ok(Self::Call),
            "email" => Ok(Self::Email),
            "message" | "text" | "sms" => Ok(Self::Message),
            "note" => Ok(Self::Note),
            other => Err(format!(
                "unknown interaction type '{}' (expected meeting, call, email, message or note)",
                other
            )),
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    pub title: Option<String>,
    pub content: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(interaction_type: InteractionType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            interaction_type,
            title: None,
            content: None,
            occurred_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Title if set, otherwise the first line of content
    pub fn label(&self) -> String {
        self.title
            .clone()
            .or_else(|| {
                self.content
                    .as_deref()
                    .and_then(|c| c.lines().next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("({})", self.interaction_type))
    }
}

/// An interaction together with the contacts it is linked to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionWithContacts {
    #[serde(flatten)]
    pub interaction: Interaction,
    pub contacts: Vec<ContactRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionInput {
    pub interaction_type: InteractionType,
    pub title: Option<String>,
    pub content: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub contact_ids: Vec<Uuid>,
}

impl InteractionInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_max("title", self.title.as_deref(), 200);
        errors.check_max("content", self.content.as_deref(), 10000);
        if self.occurred_at.is_none() {
            errors.add("occurred_at", "Date is required");
        }
        if self.contact_ids.is_empty() {
            errors.add("contact_ids", "Select at least one contact");
        }
        errors.into_result()
    }

    pub fn apply_to(&self, interaction: &mut Interaction) {
        interaction.interaction_type = self.interaction_type;
        interaction.title = non_empty(self.title.clone());
        interaction.content = non_empty(self.content.clone());
        if let Some(at) = self.occurred_at {
            interaction.occurred_at = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parse() {
        assert_eq!("Meeting".parse::<InteractionType>(), Ok(InteractionType::Meeting));
        assert_eq!("sms".parse::<InteractionType>(), Ok(InteractionType::Message));
        assert!("lunch".parse::<InteractionType>().is_err());
        for t in InteractionType::all() {
            assert_eq!(t.as_str().parse::<InteractionType>(), Ok(*t));
        }
    }

    #[test]
    fn test_requires_contact_and_date() {
        let input = InteractionInput::default();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.field("contact_ids"), ["Select at least one contact".to_string()]);
        assert_eq!(errors.field("occurred_at"), ["Date is required".to_string()]);
    }

    #[test]
    fn test_valid_input() {
        let input = InteractionInput {
            interaction_type: InteractionType::Call,
            title: Some("Intro call".to_string()),
            occurred_at: Some(Utc::now()),
            contact_ids: vec![Uuid::new_v4()],
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_label_falls_back_to_content() {
        let mut i = Interaction::new(InteractionType::Note);
        assert_eq!(i.label(), "(note)");
        i.content = Some("Talked about Q3\nand more".to_string());
        assert_eq!(i.label(), "Talked about Q3");
        i.title = Some("Sync".to_string());
        assert_eq!(i.label(), "Sync");
    }

    #[test]
    fn test_serializes_type_field() {
        let i = Interaction::new(InteractionType::Meeting);
        let json = serde_json::to_value(&i).unwrap();
        assert_eq!(json["type"], "meeting");
    }
}
