//! Trip planner configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Weather provider configuration
    pub weather: WeatherConfig,

    /// Travel search provider configuration
    pub search: SearchConfig,

    /// Workflow behavior
    pub workflow: WorkflowConfig,

    /// Session storage
    pub storage: StorageConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that every provider API key environment variable is set.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        for env_name in [&self.llm.api_key_env, &self.weather.api_key_env, &self.search.api_key_env] {
            if std::env::var(env_name).is_err() {
                return Err(eyre::eyre!("API key not found. Set the {} environment variable.", env_name));
            }
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .tripplanner.yml
        let local_config = PathBuf::from(".tripplanner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tripplanner/tripplanner.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tripplanner").join("tripplanner.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn read_env_key(env_name: &str) -> Result<String> {
    let key = std::env::var(env_name).context(format!("Environment variable {} is not set", env_name))?;
    if key.trim().is_empty() {
        return Err(eyre::eyre!("Environment variable {} is empty", env_name));
    }
    Ok(key)
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: gemini, anthropic, openai
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (provider default when unset)
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for the structured agents
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            base_url: None,
            max_tokens: 8192,
            temperature: 0.3,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        read_env_key(&self.api_key_env)
    }

    /// Base URL, falling back to the provider's public endpoint
    pub fn resolved_base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.provider.as_str() {
            "anthropic" => "https://api.anthropic.com",
            "openai" => "https://api.openai.com",
            _ => "https://generativelanguage.googleapis.com",
        }
        .to_string()
    }
}

/// Weather provider configuration (OpenWeatherMap)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Units system passed to the API
    pub units: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENWEATHERMAP_API_KEY".to_string(),
            base_url: "https://api.openweathermap.org".to_string(),
            units: "metric".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl WeatherConfig {
    pub fn get_api_key(&self) -> Result<String> {
        read_env_key(&self.api_key_env)
    }
}

/// Travel search configuration (SerpApi)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Search location used for flight queries
    pub location: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: "SERPAPI_KEY".to_string(),
            base_url: "https://serpapi.com".to_string(),
            location: "Austin, Texas, United States".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl SearchConfig {
    pub fn get_api_key(&self) -> Result<String> {
        read_env_key(&self.api_key_env)
    }
}

/// What the judge substitutes when it cannot produce a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JudgeFallback {
    /// Fail open: treat the weather as suitable
    #[default]
    Suitable,
    /// Fail closed: treat the weather as unsuitable and look for alternatives
    NotSuitable,
}

/// Workflow behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Pause between showing a SUITABLE decision and advancing to the itinerary
    #[serde(rename = "auto-advance-delay-ms")]
    pub auto_advance_delay_ms: u64,

    /// Upper bound on every external call (model, weather, search)
    #[serde(rename = "call-timeout-ms")]
    pub call_timeout_ms: u64,

    /// Fallback verdict when the judge fails
    #[serde(rename = "judge-fallback")]
    pub judge_fallback: JudgeFallback,

    /// Maximum number of alternatives kept from the finder
    #[serde(rename = "max-alternatives")]
    pub max_alternatives: usize,

    /// Directory with prompt template overrides (`<name>.hbs`)
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            auto_advance_delay_ms: 2_000,
            call_timeout_ms: 90_000,
            judge_fallback: JudgeFallback::Suitable,
            max_alternatives: 3,
            prompts_dir: None,
        }
    }
}

impl WorkflowConfig {
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per session
    #[serde(rename = "sessions-dir")]
    pub sessions_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/tripplanner on Linux)
        let sessions_dir = dirs::data_dir()
            .map(|d| d.join("tripplanner").join("sessions"))
            .unwrap_or_else(|| PathBuf::from(".tripplanner/sessions"));

        Self { sessions_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.workflow.max_alternatives, 3);
        assert_eq!(config.workflow.judge_fallback, JudgeFallback::Suitable);
        assert_eq!(config.workflow.auto_advance_delay(), Duration::from_secs(2));
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_resolved_base_url() {
        let mut config = LlmConfig::default();
        assert_eq!(config.resolved_base_url(), "https://generativelanguage.googleapis.com");

        config.provider = "anthropic".to_string();
        assert_eq!(config.resolved_base_url(), "https://api.anthropic.com");

        config.base_url = Some("http://localhost:8080/".to_string());
        assert_eq!(config.resolved_base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: anthropic
  model: claude-sonnet-4
  api-key-env: MY_API_KEY
  max-tokens: 4096
  timeout-ms: 60000

search:
  location: "London, United Kingdom"

workflow:
  auto-advance-delay-ms: 0
  call-timeout-ms: 5000
  judge-fallback: not-suitable

storage:
  sessions-dir: /tmp/trips

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "claude-sonnet-4");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.search.location, "London, United Kingdom");
        assert_eq!(config.workflow.auto_advance_delay_ms, 0);
        assert_eq!(config.workflow.judge_fallback, JudgeFallback::NotSuitable);
        assert_eq!(config.storage.sessions_dir, PathBuf::from("/tmp/trips"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: gemini-2.5-pro
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gemini-2.5-pro");
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.weather.api_key_env, "OPENWEATHERMAP_API_KEY");
        assert_eq!(config.workflow.call_timeout_ms, 90_000);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trip.yml");
        fs::write(&path, "workflow:\n  max-alternatives: 2\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.workflow.max_alternatives, 2);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/definitely/not/here.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    #[serial]
    fn test_validate_reports_missing_key() {
        let mut config = Config::default();
        config.llm.api_key_env = "TP_TEST_VALIDATE_LLM".to_string();
        config.weather.api_key_env = "TP_TEST_VALIDATE_WEATHER".to_string();
        config.search.api_key_env = "TP_TEST_VALIDATE_SEARCH".to_string();

        // SAFETY: serialized test, no other thread reads these variables
        unsafe {
            std::env::set_var("TP_TEST_VALIDATE_LLM", "k1");
            std::env::set_var("TP_TEST_VALIDATE_WEATHER", "k2");
            std::env::remove_var("TP_TEST_VALIDATE_SEARCH");
        }

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TP_TEST_VALIDATE_SEARCH"));

        unsafe {
            std::env::set_var("TP_TEST_VALIDATE_SEARCH", "k3");
        }
        assert!(config.validate().is_ok());

        unsafe {
            std::env::remove_var("TP_TEST_VALIDATE_LLM");
            std::env::remove_var("TP_TEST_VALIDATE_WEATHER");
            std::env::remove_var("TP_TEST_VALIDATE_SEARCH");
        }
    }
}
