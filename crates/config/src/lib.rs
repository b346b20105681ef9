//! Configuration loading, validation, and management for Tandem.
//!
//! Loads configuration from `~/.tandem/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resulting
//! [`AppConfig`] is read-only for the life of the process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.tandem/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Pipeline and benchmark configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Envelope strategy configuration
    #[serde(default)]
    pub envelope: EnvelopeConfig,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

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
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("retrieval", &self.retrieval)
            .field("pipeline", &self.pipeline)
            .field("envelope", &self.envelope)
            .finish()
    }
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

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// How snippets are looked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Term-overlap scoring, no external calls
    #[default]
    Keyword,
    /// Cosine similarity over provider embeddings
    Vector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub mode: RetrievalMode,

    /// Directory of `.txt` / `.md` files loaded at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Minimum cosine similarity for vector matches
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_min_score() -> f32 {
    0.7
}
fn default_max_results() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::default(),
            documents_dir: None,
            embedding_model: default_embedding_model(),
            min_score: default_min_score(),
            default_max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Result limit used by every benchmark iteration
    #[serde(default = "default_max_results")]
    pub benchmark_max_results: usize,

    #[serde(default = "default_iterations")]
    pub default_iterations: usize,
}

fn default_iterations() -> usize {
    3
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            benchmark_max_results: default_max_results(),
            default_iterations: default_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Stamped into every envelope as `metadata.protocol`
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Stamped into every envelope as `metadata.version`
    #[serde(default = "default_protocol_version")]
    pub version: String,

    /// Buffer size of the event echo channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_protocol() -> String {
    "tandem-envelope".into()
}
fn default_protocol_version() -> String {
    "1.0".into()
}
fn default_event_buffer() -> usize {
    32
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            version: default_protocol_version(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.tandem/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `TANDEM_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("TANDEM_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("TANDEM_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("TANDEM_MODEL") {
            config.default_model = model;
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tandem")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(ConfigError::ValidationError(
                "retrieval.min_score must be between 0.0 and 1.0".into(),
            ));
        }

        if self.retrieval.default_max_results == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.default_max_results must be at least 1".into(),
            ));
        }

        if self.pipeline.benchmark_max_results == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.benchmark_max_results must be at least 1".into(),
            ));
        }

        if self.envelope.event_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "envelope.event_buffer must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            retrieval: RetrievalConfig::default(),
            pipeline: PipelineConfig::default(),
            envelope: EnvelopeConfig::default(),
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
        assert_eq!(config.default_provider, "openrouter");
        assert_eq!(config.retrieval.mode, RetrievalMode::Keyword);
        assert_eq!(config.pipeline.benchmark_max_results, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.envelope.protocol, config.envelope.protocol);
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
    fn zero_benchmark_limit_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.benchmark_max_results = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("benchmark_max_results"));
    }

    #[test]
    fn min_score_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.min_score = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "openrouter");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "gpt-4o-mini"

[retrieval]
mode = "vector"
min_score = 0.5

[envelope]
version = "2.0"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.retrieval.mode, RetrievalMode::Vector);
        assert!((config.retrieval.min_score - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.retrieval.default_max_results, 5);
        assert_eq!(config.envelope.version, "2.0");
        assert_eq!(config.envelope.protocol, "tandem-envelope");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_temperature = \"hot\"").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_redacts_api_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let text = format!("{config:?}");
        assert!(text.contains("[REDACTED]"));
        assert!(!text.contains("sk-secret"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openrouter"));
        assert!(toml_str.contains("tandem-envelope"));
    }

    #[test]
    fn to_toml_round_trips_custom_values() {
        let mut config = AppConfig::default();
        config.retrieval.documents_dir = Some("/srv/docs".into());
        config.pipeline.default_iterations = 10;

        let parsed: AppConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.retrieval.documents_dir.as_deref(), Some("/srv/docs"));
        assert_eq!(parsed.pipeline.default_iterations, 10);
    }
}
