use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{non_empty, ContactRef};
use crate::error::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown priority '{}' (expected low, medium or high)",
                other
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dated reminder to get back to a contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub priority: Priority,
    /// Set when done; `None` means open
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FollowUp {
    pub fn new(contact_id: Uuid, title: String, due_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            contact_id,
            title,
            description: None,
            due_date,
            priority: Priority::default(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed() && self.due_date < today
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpWithContact {
    #[serde(flatten)]
    pub follow_up: FollowUp,
    pub contact: Option<ContactRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUpInput {
    pub contact_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

impl FollowUpInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.contact_id.is_none() {
            errors.add("contact_id", "Select a contact");
        }
        errors.check_required("title", &self.title, 200, "Title is required");
        errors.check_max("description", self.description.as_deref(), 2000);
        if self.due_date.is_none() {
            errors.add("due_date", "Due date is required");
        }
        errors.into_result()
    }

    pub fn apply_to(&self, follow_up: &mut FollowUp) {
        if let Some(contact_id) = self.contact_id {
            follow_up.contact_id = contact_id;
        }
        follow_up.title = self.title.trim().to_string();
        follow_up.description = non_empty(self.description.clone());
        if let Some(due) = self.due_date {
            follow_up.due_date = due;
        }
        follow_up.priority = self.priority;
    }
}
