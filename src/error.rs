//! Error types callers need to tell apart.
//!
//! Storage and transport failures inside the crate travel as `anyhow::Error`;
//! the enums here are for outcomes a user sees as a distinct message.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// User-facing text for a search the model could not translate.
pub const TRANSLATION_ERROR_MESSAGE: &str = "Could not understand search query. Try rephrasing.";

/// Failure modes of the natural-language search pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Model output was not JSON or did not match the query schema.
    #[error("{}", TRANSLATION_ERROR_MESSAGE)]
    Translation,
    /// The data backend rejected or failed the validated query.
    #[error("{0}")]
    Execution(String),
    /// The text-generation service could not be reached or returned an error.
    #[error("AI service error: {0}")]
    Service(String),
}

/// Failures of the summarize / prep / suggest features.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("Contact not found: {0}")]
    NotFound(String),
    #[error("Failed to parse AI response")]
    InvalidResponse,
    #[error("AI service error: {0}")]
    Service(String),
    #[error("{0}")]
    Backend(String),
}

/// Per-field validation messages for entity input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for one field.
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reject a string longer than `max` characters.
    pub fn check_max(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.add(field, format!("Must be at most {} characters", max));
            }
        }
    }

    /// Reject a missing or blank string, then apply the length limit.
    pub fn check_required(
        &mut self,
        field: &'static str,
        value: &str,
        max: usize,
        message: &'static str,
    ) {
        if value.trim().is_empty() {
            self.add(field, message);
        } else {
            self.check_max(field, Some(value), max);
        }
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid form data")?;
        for (field, messages) in &self.fields {
            write!(f, "\n  {}: {}", field, messages.join("; "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_message() {
        assert_eq!(
            SearchError::Translation.to_string(),
            "Could not understand search query. Try rephrasing."
        );
    }

    #[test]
    fn test_execution_keeps_backend_text() {
        let err = SearchError::Execution("no such column: foo".to_string());
        assert_eq!(err.to_string(), "no such column: foo");
    }

    #[test]
    fn test_validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.check_required("name", "  ", 200, "Name is required");
        errors.check_max("phone", Some("1234567890"), 5);
        errors.check_max("notes", None, 5);

        assert_eq!(errors.field("name"), ["Name is required".to_string()]);
        assert_eq!(errors.field("phone").len(), 1);
        assert!(errors.field("notes").is_empty());

        let text = errors.clone().to_string();
        assert!(text.starts_with("Invalid form data"));
        assert!(text.contains("name: Name is required"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_empty_validation_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
