//! AI providers and the features built on them.
//!
//! Providers are blocking HTTP clients behind the [`AiProvider`] trait:
//! - Anthropic Messages API (default)
//! - OpenAI-compatible chat completions endpoints
//!
//! Every call is single-turn and returns whole text; nothing is streamed.

mod anthropic;
mod assist;
mod config;
pub mod prompts;
mod provider;
mod remote;

pub use anthropic::AnthropicProvider;
pub use assist::{
    accept_suggestion, parse_suggestions, prepare_conversation, suggest_follow_ups,
    summarize_contact, FollowUpSuggestion, NO_INTERACTIONS_SUMMARY,
};
pub use config::{
    mask_key, validate_setting, AiConfig, AiProviderType, SETTING_AI_API_KEY, SETTING_AI_API_URL,
    SETTING_AI_MODEL, SETTING_AI_PROVIDER, SETTING_KEYS,
};
pub use provider::{AiProvider, CompletionRequest};
pub use remote::RemoteProvider;
