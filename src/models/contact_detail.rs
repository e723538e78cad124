use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Contact, FollowUp, FollowUpWithContact, Interaction, InteractionWithContacts, Tag};

/// Full contact detail - aggregates contact with all related data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDetail {
    pub contact: Contact,
    /// Newest first
    pub interactions: Vec<Interaction>,
    /// Ordered by due date
    pub follow_ups: Vec<FollowUp>,
    pub tags: Vec<Tag>,
}

impl ContactDetail {
    /// Follow-ups not yet completed
    pub fn open_follow_ups(&self) -> impl Iterator<Item = &FollowUp> {
        self.follow_ups.iter().filter(|f| !f.is_completed())
    }

    pub fn last_interaction(&self) -> Option<&Interaction> {
        self.interactions.first()
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A contact row in list output, with its tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactWithTags {
    #[serde(flatten)]
    pub contact: Contact,
    pub tags: Vec<Tag>,
}

/// Everything the dashboard shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub contact_count: u32,
    pub overdue: Vec<FollowUpWithContact>,
    pub recent: Vec<InteractionWithContacts>,
    /// Contacts with no interaction within the attention window
    pub needs_attention: Vec<Contact>,
    pub attention_days: u32,
}
