use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::non_empty;
use crate::error::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: None,
            phone: None,
            company: None,
            title: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// "Title at Company", or whichever half is present
    pub fn headline(&self) -> Option<String> {
        match (&self.title, &self.company) {
            (Some(t), Some(c)) => Some(format!("{} at {}", t, c)),
            (Some(t), None) => Some(t.clone()),
            (None, Some(c)) => Some(c.clone()),
            (None, None) => None,
        }
    }
}

/// Fields a user supplies when creating or editing a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
}

impl ContactInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_required("name", &self.name, 200, "Name is required");

        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            if !is_valid_email(email) {
                errors.add("email", "Invalid email");
            } else {
                errors.check_max("email", Some(email), 200);
            }
        }

        errors.check_max("phone", self.phone.as_deref(), 50);
        errors.check_max("company", self.company.as_deref(), 200);
        errors.check_max("title", self.title.as_deref(), 200);
        errors.check_max("notes", self.notes.as_deref(), 5000);
        errors.into_result()
    }

    /// Copy the input onto a contact, storing blank optionals as `None`.
    pub fn apply_to(&self, contact: &mut Contact) {
        contact.name = self.name.trim().to_string();
        contact.email = non_empty(self.email.clone());
        contact.phone = non_empty(self.phone.clone());
        contact.company = non_empty(self.company.clone());
        contact.title = non_empty(self.title.clone());
        contact.notes = non_empty(self.notes.clone());
    }

    pub fn into_contact(self) -> Contact {
        let mut contact = Contact::new(String::new());
        self.apply_to(&mut contact);
        contact
    }
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Minimal reference to a contact, used when listing linked records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    pub id: Uuid,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> ContactInput {
        ContactInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_name_required() {
        let errors = input("   ").validate().unwrap_err();
        assert_eq!(errors.field("name"), ["Name is required".to_string()]);
    }

    #[test]
    fn test_empty_email_is_allowed() {
        let mut i = input("Ada");
        i.email = Some(String::new());
        assert!(i.validate().is_ok());
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut i = input("Ada");
        i.email = Some("ada@invalid".to_string());
        let errors = i.validate().unwrap_err();
        assert_eq!(errors.field("email"), ["Invalid email".to_string()]);
    }

    #[test]
    fn test_length_limits() {
        let mut i = input("Ada");
        i.phone = Some("1".repeat(51));
        i.notes = Some("n".repeat(5001));
        let errors = i.validate().unwrap_err();
        assert_eq!(errors.field("phone").len(), 1);
        assert_eq!(errors.field("notes").len(), 1);
        assert!(errors.field("name").is_empty());
    }

    #[test]
    fn test_apply_blanks_become_none() {
        let i = ContactInput {
            name: " Ada Lovelace ".to_string(),
            email: Some(String::new()),
            company: Some("Analytical Engines".to_string()),
            title: Some("  ".to_string()),
            ..Default::default()
        };
        let contact = i.into_contact();
        assert_eq!(contact.name, "Ada Lovelace");
        assert_eq!(contact.email, None);
        assert_eq!(contact.title, None);
        assert_eq!(contact.headline(), Some("Analytical Engines".to_string()));
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@example."));
        assert!(!is_valid_email("ada lovelace@example.com"));
    }
}
