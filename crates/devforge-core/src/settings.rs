use crate::error::ForgeError;
use crate::payload::PromptPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// AiProvider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
}

impl AiProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o",
            AiProvider::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AiProvider {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(AiProvider::OpenAi),
            "anthropic" => Ok(AiProvider::Anthropic),
            _ => Err(ForgeError::InvalidProvider(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RulePreset / RepoSource
// ---------------------------------------------------------------------------

/// A named set of coding rules saved by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePreset {
    pub name: String,
    #[serde(default)]
    pub rules: PromptPolicy,
}

/// An existing repository connected for scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepoSource {
    Github { full_name: String },
    Local { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub ai_provider: AiProvider,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_presets: Vec<RulePreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_source: Option<RepoSource>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_provider(AiProvider::default())
    }
}

impl Settings {
    pub fn for_provider(provider: AiProvider) -> Self {
        Self {
            ai_provider: provider,
            model: provider.default_model().to_string(),
            rule_presets: Vec::new(),
            repo_source: None,
        }
    }

    /// Model to request, falling back to the provider default when unset.
    pub fn effective_model(&self) -> &str {
        if self.model.trim().is_empty() {
            self.ai_provider.default_model()
        } else {
            &self.model
        }
    }

    /// Switch provider; an absent model resets to the new provider's default.
    pub fn with_provider(mut self, provider: AiProvider, model: Option<String>) -> Self {
        self.ai_provider = provider;
        self.model = model.unwrap_or_else(|| provider.default_model().to_string());
        self
    }

    /// All preset rules merged into one policy.
    pub fn preset_rules(&self) -> PromptPolicy {
        let mut merged = PromptPolicy::default();
        for preset in &self.rule_presets {
            merged.merge(&preset.rules);
        }
        merged
    }
}
