use crate::error::{ForgeError, Result};
use crate::paths;
use crate::settings::{AiProvider, Settings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// redb file; relative paths resolve against the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: AiProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_openai_url")]
    pub openai_url: String,
    #[serde(default = "default_anthropic_url")]
    pub anthropic_url: String,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            model: None,
            temperature: default_temperature(),
            openai_url: default_openai_url(),
            anthropic_url: default_anthropic_url(),
        }
    }
}

// ---------------------------------------------------------------------------
// GithubConfig / NetlifyConfig / ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_url")]
    pub api_url: String,
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetlifyConfig {
    #[serde(default = "default_netlify_url")]
    pub api_url: String,
    /// Try a repository-linked site before falling back to direct deploys.
    #[serde(default = "default_true")]
    pub link_repository: bool,
}

fn default_netlify_url() -> String {
    "https://api.netlify.com/api/v1".to_string()
}

impl Default for NetlifyConfig {
    fn default() -> Self {
        Self {
            api_url: default_netlify_url(),
            link_repository: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    7788
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub netlify: NetlifyConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ForgeError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`] but an uninitialized root yields the defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(ForgeError::NotInitialized) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Resolved redb path, or `None` when the store is disabled.
    pub fn store_path(&self, root: &Path) -> Option<PathBuf> {
        if !self.store.enabled {
            return None;
        }
        Some(match &self.store.path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => paths::default_store_path(root),
        })
    }

    /// Settings applied to new projects when no global settings are stored.
    pub fn default_settings(&self) -> Settings {
        Settings::default().with_provider(self.ai.provider, self.ai.model.clone())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            warnings.push(format!(
                "ai.temperature {} is outside 0.0..=2.0",
                self.ai.temperature
            ));
        }
        for (key, url) in [
            ("ai.openai_url", &self.ai.openai_url),
            ("ai.anthropic_url", &self.ai.anthropic_url),
            ("github.api_url", &self.github.api_url),
            ("netlify.api_url", &self.netlify.api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                warnings.push(format!("{key} is not an http(s) URL: '{url}'"));
            }
        }
        if self.server.port == 0 {
            warnings.push("server.port is 0; an ephemeral port will be used".into());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_uninitialized_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ForgeError::NotInitialized)
        ));
        assert_eq!(Config::load_or_default(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.ai.provider = AiProvider::Anthropic;
        cfg.netlify.link_repository = false;
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("server:\n  port: 9000\n").unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert!(cfg.store.enabled);
        assert_eq!(cfg.github.api_url, "https://api.github.com");
        assert!((cfg.ai.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn store_path_resolution() {
        let root = Path::new("/work");
        let mut cfg = Config::default();
        assert_eq!(
            cfg.store_path(root),
            Some(PathBuf::from("/work/.devforge/state.redb"))
        );
        cfg.store.path = Some(PathBuf::from("data/x.redb"));
        assert_eq!(cfg.store_path(root), Some(PathBuf::from("/work/data/x.redb")));
        cfg.store.enabled = false;
        assert_eq!(cfg.store_path(root), None);
    }

    #[test]
    fn default_settings_follow_ai_section() {
        let mut cfg = Config::default();
        cfg.ai.provider = AiProvider::Anthropic;
        assert_eq!(cfg.default_settings().model, "claude-sonnet-4-20250514");
        cfg.ai.model = Some("claude-3-5-haiku-latest".into());
        assert_eq!(cfg.default_settings().model, "claude-3-5-haiku-latest");
    }

    #[test]
    fn validate_flags_bad_values() {
        let mut cfg = Config::default();
        assert!(cfg.validate().is_empty());
        cfg.ai.temperature = 5.0;
        cfg.github.api_url = "api.github.com".into();
        assert_eq!(cfg.validate().len(), 2);
    }
}
