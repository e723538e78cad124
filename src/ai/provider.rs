//! AI provider trait definition
//!
//! Every feature that talks to a model (search translation, summaries,
//! briefings, follow-up suggestions) sends one system block and one user
//! message and reads back one text block.

use anyhow::Result;

/// A single-turn request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: String,
    pub max_tokens: u32,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(system: &'a str, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system,
            user: user.into(),
            max_tokens,
        }
    }
}

/// Trait for AI providers that can generate completions
pub trait AiProvider: Send + Sync {
    /// Text of the first content block of the reply; empty if the reply
    /// carried no text.
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;

    /// Get the name of this provider for display purposes
    fn name(&self) -> &str;
}
