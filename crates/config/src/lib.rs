//! Configuration loading, validation, and management for LocalChat.
//!
//! Loads configuration from `~/.localchat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Hard upper bound on search iterations per question.
pub const MAX_SEARCH_ITERATIONS: u32 = 3;

/// Hard upper bound on results kept from a single search.
pub const MAX_RESULTS_PER_SEARCH: usize = 5;

/// The root configuration structure.
///
/// Maps directly to `~/.localchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for OpenAI-compatible servers that require one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model server
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default answer model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Web search backend
    #[serde(default)]
    pub search: SearchConfig,

    /// Search agent tuning
    #[serde(default)]
    pub agent: AgentConfig,

    /// Chat context settings
    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama3.2".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_true() -> bool {
    true
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("providers", &self.providers)
            .field("search", &self.search)
            .field("agent", &self.agent)
            .field("chat", &self.chat)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// SearXNG connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether search mode is on by default
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// SearXNG base URL
    #[serde(default = "default_search_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_url() -> String {
    "http://localhost:8082".into()
}
fn default_search_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_search_url(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Search agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Small, fast model used for query generation and self-evaluation
    #[serde(default = "default_evaluator_model")]
    pub evaluator_model: String,

    /// Search attempts per question (at most 3)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Confidence at which searching stops (0.0–1.0)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Results kept per search (at most 5)
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_evaluator_model() -> String {
    "qwen2.5:1.5b".into()
}
fn default_max_iterations() -> u32 {
    MAX_SEARCH_ITERATIONS
}
fn default_confidence_threshold() -> f32 {
    0.8
}
fn default_max_results() -> usize {
    MAX_RESULTS_PER_SEARCH
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            evaluator_model: default_evaluator_model(),
            max_iterations: default_max_iterations(),
            confidence_threshold: default_confidence_threshold(),
            max_results: default_max_results(),
        }
    }
}

/// Plain chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Messages of history sent with a plain (non-search) reply
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_history_window() -> usize {
    11
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.localchat/config.toml).
    ///
    /// Environment variables override file values:
    /// - `LOCALCHAT_API_KEY`
    /// - `LOCALCHAT_PROVIDER`
    /// - `LOCALCHAT_MODEL`
    /// - `LOCALCHAT_EVALUATOR_MODEL`
    /// - `LOCALCHAT_SEARXNG_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("LOCALCHAT_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(provider) = lookup("LOCALCHAT_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("LOCALCHAT_MODEL") {
            self.default_model = model;
        }
        if let Some(model) = lookup("LOCALCHAT_EVALUATOR_MODEL") {
            self.agent.evaluator_model = model;
        }
        if let Some(url) = lookup("LOCALCHAT_SEARXNG_URL") {
            self.search.base_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".localchat")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.agent.confidence_threshold) {
            return Err(ConfigError::ValidationError(
                "agent.confidence_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 || self.agent.max_iterations > MAX_SEARCH_ITERATIONS {
            return Err(ConfigError::ValidationError(format!(
                "agent.max_iterations must be between 1 and {MAX_SEARCH_ITERATIONS}"
            )));
        }

        if self.agent.max_results == 0 || self.agent.max_results > MAX_RESULTS_PER_SEARCH {
            return Err(ConfigError::ValidationError(format!(
                "agent.max_results must be between 1 and {MAX_RESULTS_PER_SEARCH}"
            )));
        }

        if self.chat.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "chat.history_window must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Base URL configured for a provider, if any.
    pub fn provider_url(&self, name: &str) -> Option<&str> {
        self.providers.get(name).and_then(|p| p.api_url.as_deref())
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            providers: HashMap::new(),
            search: SearchConfig::default(),
            agent: AgentConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "ollama");
        assert_eq!(config.agent.evaluator_model, "qwen2.5:1.5b");
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.search.base_url, "http://localhost:8082");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.chat.history_window, config.chat.history_window);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn iteration_cap_enforced() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 4;
        assert!(config.validate().is_err());
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
        config.agent.max_iterations = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn result_cap_enforced() {
        let mut config = AppConfig::default();
        config.agent.max_results = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.agent.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.default_provider, "ollama");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "qwen3:8b"

[search]
base_url = "http://searx.lan:8080"

[agent]
max_iterations = 2
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "qwen3:8b");
        assert_eq!(config.search.base_url, "http://searx.lan:8080");
        assert!(config.search.enabled);
        assert_eq!(config.agent.max_iterations, 2);
        assert_eq!(config.agent.evaluator_model, "qwen2.5:1.5b");
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_model = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            "LOCALCHAT_MODEL" => Some("mistral".into()),
            "LOCALCHAT_EVALUATOR_MODEL" => Some("qwen2.5:0.5b".into()),
            "LOCALCHAT_SEARXNG_URL" => Some("http://127.0.0.1:9999".into()),
            _ => None,
        });
        assert_eq!(config.default_model, "mistral");
        assert_eq!(config.agent.evaluator_model, "qwen2.5:0.5b");
        assert_eq!(config.search.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.default_provider, "ollama");
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("ollama"));
        assert!(toml_str.contains("qwen2.5:1.5b"));
    }
}
