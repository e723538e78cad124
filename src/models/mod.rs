mod contact;
mod contact_detail;
mod follow_up;
mod interaction;
mod tag;

pub use contact::{is_valid_email, Contact, ContactInput, ContactRef};
pub use contact_detail::{ContactDetail, ContactWithTags, Dashboard};
pub use follow_up::{FollowUp, FollowUpInput, FollowUpWithContact, Priority};
pub use interaction::{Interaction, InteractionInput, InteractionType, InteractionWithContacts};
pub use tag::{Tag, TagInput};

/// Trim an optional string, treating blank as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
