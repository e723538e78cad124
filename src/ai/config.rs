//! AI configuration management
//!
//! Handles loading and storing AI provider settings from environment
//! variables and database settings.

use super::{AiProvider, AnthropicProvider, RemoteProvider};
use crate::db::Database;
use anyhow::{anyhow, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

// Settings keys for database storage
pub const SETTING_AI_PROVIDER: &str = "ai_provider";
pub const SETTING_AI_API_KEY: &str = "ai_api_key";
pub const SETTING_AI_API_URL: &str = "ai_api_url";
pub const SETTING_AI_MODEL: &str = "ai_model";

/// Every stored AI setting, in display order
pub const SETTING_KEYS: &[&str] = &[
    SETTING_AI_PROVIDER,
    SETTING_AI_API_KEY,
    SETTING_AI_API_URL,
    SETTING_AI_MODEL,
];

// Environment variable names
const ENV_AI_PROVIDER: &str = "PCRM_AI_PROVIDER";
const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
const ENV_AI_API_KEY: &str = "AI_API_KEY";
const ENV_AI_API_URL: &str = "AI_API_URL";
const ENV_AI_MODEL: &str = "AI_MODEL";

/// Type of AI provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiProviderType {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// Any OpenAI-compatible chat completions endpoint
    OpenAi,
}

impl AiProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    fn default_api_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o-mini",
        }
    }
}

impl FromStr for AiProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" | "remote" => Ok(Self::OpenAi),
            other => Err(format!(
                "unknown AI provider '{}' (expected anthropic or openai)",
                other
            )),
        }
    }
}

impl fmt::Display for AiProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the AI provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiConfig {
    pub provider_type: AiProviderType,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub model: Option<String>,
}

impl AiConfig {
    /// Load configuration from environment variables and database settings.
    /// Environment variables take precedence over database settings.
    pub fn load(db: &Database) -> Result<Self> {
        Self::load_with(db, |name| env::var(name).ok())
    }

    /// [`AiConfig::load`] with an injectable environment lookup
    pub fn load_with<F>(db: &Database, env_var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env_var(name).filter(|v| !v.trim().is_empty());

        let provider_type = match lookup(ENV_AI_PROVIDER).or(db.get_setting(SETTING_AI_PROVIDER)?) {
            Some(s) => s.parse().map_err(|e: String| anyhow!(e))?,
            None => AiProviderType::default(),
        };

        // API key: provider-specific env var, then generic, then database
        let env_key = match provider_type {
            AiProviderType::Anthropic => {
                lookup(ENV_ANTHROPIC_API_KEY).or_else(|| lookup(ENV_AI_API_KEY))
            }
            AiProviderType::OpenAi => lookup(ENV_AI_API_KEY),
        };
        let api_key = match env_key {
            Some(key) => Some(key),
            None => db.get_setting(SETTING_AI_API_KEY)?,
        };

        let api_url = match lookup(ENV_AI_API_URL) {
            Some(url) => Some(url),
            None => db.get_setting(SETTING_AI_API_URL)?,
        };

        let model = match lookup(ENV_AI_MODEL) {
            Some(model) => Some(model),
            None => db.get_setting(SETTING_AI_MODEL)?,
        };

        Ok(Self {
            provider_type,
            api_key,
            api_url,
            model,
        })
    }

    /// Check if AI is configured and ready to use
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Get the effective API URL (with default)
    pub fn effective_api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(self.provider_type.default_api_url())
    }

    /// Get the effective model name (with default)
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or(self.provider_type.default_model())
    }

    /// API key with everything but the last four characters hidden
    pub fn masked_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_key)
    }

    /// Create the provider this configuration selects
    pub fn build_provider(&self) -> Result<Box<dyn AiProvider>> {
        if !self.is_configured() {
            return Err(anyhow!(
                "AI not configured. Set ANTHROPIC_API_KEY or run `pcrm config set ai_api_key <key>`"
            ));
        }
        tracing::debug!(
            provider = %self.provider_type,
            model = self.effective_model(),
            "building AI provider"
        );
        match self.provider_type {
            AiProviderType::Anthropic => Ok(Box::new(AnthropicProvider::new(self)?)),
            AiProviderType::OpenAi => Ok(Box::new(RemoteProvider::new(self)?)),
        }
    }

    /// Save the current configuration to the database
    pub fn save(&self, db: &Database) -> Result<()> {
        db.set_setting(SETTING_AI_PROVIDER, self.provider_type.as_str())?;

        if let Some(ref key) = self.api_key {
            db.set_setting(SETTING_AI_API_KEY, key)?;
        }

        if let Some(ref url) = self.api_url {
            db.set_setting(SETTING_AI_API_URL, url)?;
        }

        if let Some(ref model) = self.model {
            db.set_setting(SETTING_AI_MODEL, model)?;
        }

        Ok(())
    }

    /// Clear all AI configuration from the database
    pub fn clear(db: &Database) -> Result<()> {
        for key in SETTING_KEYS {
            db.delete_setting(key)?;
        }
        Ok(())
    }
}

/// Check a `config set` key/value pair before it is stored
pub fn validate_setting(key: &str, value: &str) -> Result<()> {
    if !SETTING_KEYS.contains(&key) {
        return Err(anyhow!(
            "Unknown setting '{}'. Valid keys: {}",
            key,
            SETTING_KEYS.join(", ")
        ));
    }
    if key == SETTING_AI_PROVIDER {
        value.parse::<AiProviderType>().map_err(|e| anyhow!(e))?;
    }
    if value.trim().is_empty() {
        return Err(anyhow!("Value for '{}' cannot be empty", key));
    }
    Ok(())
}

pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(8), tail)
}
