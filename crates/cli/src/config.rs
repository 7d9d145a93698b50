//! Configuration loading and management

use anyhow::{Context, Result, anyhow};
use audience_tagger_adapters::llm::LlmConfig as AdapterLlmConfig;
use audience_tagger_domain::{ItemKind, ProviderConfig, RunSettings};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub classification: ClassificationConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_library_path")]
    pub library_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Classify automatically when a library scan finishes
    #[serde(default = "default_true")]
    pub run_on_scan: bool,

    #[serde(default)]
    pub overwrite_existing: bool,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_item_kind")]
    pub item_kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Blank selects the provider default
    #[serde(default)]
    pub model: String,

    /// Only used by OpenAI-compatible providers
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

// Default value functions
fn default_library_path() -> PathBuf {
    PathBuf::from("./library.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_item_kind() -> String {
    "movie".to_string()
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_timeout() -> u64 {
    30
}

fn default_max_output_tokens() -> u32 {
    10
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            run_on_scan: default_true(),
            overwrite_existing: false,
            delay_ms: default_delay_ms(),
            item_kind: default_item_kind(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: String::new(),
            endpoint: String::new(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("AUDIENCE_TAGGER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Request tuning handed to the provider factory
    pub fn adapter_llm_config(&self) -> AdapterLlmConfig {
        AdapterLlmConfig {
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            max_output_tokens: self.llm.max_output_tokens,
            timeout_secs: self.llm.timeout_secs,
        }
    }

    /// Provider snapshot, with the key read from the configured env var
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.llm.provider.clone(),
            credential: load_api_key(&self.llm.api_key_env),
            endpoint: non_empty(&self.llm.endpoint),
            model: self.llm.model.trim().to_string(),
        }
    }

    /// Snapshot everything a classification run needs
    pub fn run_settings(&self) -> Result<RunSettings> {
        let item_kind: ItemKind = self
            .classification
            .item_kind
            .parse()
            .map_err(|e: String| anyhow!(e))?;

        Ok(RunSettings {
            enabled: self.classification.enabled,
            run_on_trigger: self.classification.run_on_scan,
            overwrite_existing: self.classification.overwrite_existing,
            delay: Duration::from_millis(self.classification.delay_ms),
            item_kind,
            provider: self.provider_config(),
        })
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# audience-tagger configuration

[general]
library_path = "./library.json"
log_level = "info"

[classification]
enabled = true
# Classify when a library scan completes (the `run` command is the scan trigger)
run_on_scan = true
# Replace existing kids/teens/adults tags instead of skipping those items
overwrite_existing = false
# Pause between items, in milliseconds
delay_ms = 1000
item_kind = "movie"

[llm]
provider = "gemini"  # gemini, openai, openai_compat, stub
# Leave blank for the provider default (stub accepts rating, kids, teens, adults, fail)
model = ""
# Required for openai_compat, e.g. "http://localhost:8080" (LocalAI, Ollama, LM Studio)
endpoint = ""
api_key_env = "LLM_API_KEY"
temperature = 0.1
timeout_secs = 30
max_output_tokens = 10
"#
        .to_string()
    }
}

/// Read an API key from an env var; blank or unset means none
pub fn load_api_key(env_var: &str) -> Option<SecretString> {
    if env_var.trim().is_empty() {
        return None;
    }

    std::env::var(env_var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}

pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_parses_to_defaults() {
        let parsed: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(parsed.llm.provider, defaults.llm.provider);
        assert_eq!(parsed.llm.api_key_env, defaults.llm.api_key_env);
        assert_eq!(parsed.classification.delay_ms, 1000);
        assert!(parsed.classification.enabled);
        assert!(!parsed.classification.overwrite_existing);
        assert_eq!(parsed.general.library_path, defaults.general.library_path);
    }

    #[test]
    fn test_run_settings_snapshot() {
        let mut config = AppConfig::default();
        config.classification.overwrite_existing = true;
        config.classification.delay_ms = 250;
        config.llm.provider = "openai_compat".to_string();
        config.llm.endpoint = " http://localhost:8080 ".to_string();
        config.llm.api_key_env = String::new();

        let settings = config.run_settings().unwrap();
        assert!(settings.overwrite_existing);
        assert_eq!(settings.delay, Duration::from_millis(250));
        assert_eq!(settings.item_kind, ItemKind::Movie);
        assert_eq!(
            settings.provider.endpoint.as_deref(),
            Some("http://localhost:8080")
        );
        assert!(settings.provider.credential.is_none());
    }

    #[test]
    fn test_invalid_item_kind() {
        let mut config = AppConfig::default();
        config.classification.item_kind = "podcast".to_string();
        assert!(config.run_settings().is_err());
    }
}
