#[cfg(feature = "cli")]
pub mod cli;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LexiconError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PROVIDER_ENDPOINT: &str =
    "https://dictionaryapi.com/api/v3/references/collegiate/json";
pub const DICTIONARY_API_KEY_ENV: &str = "DICTIONARY_API_KEY";
pub const LEXICON_API_KEY_ENV: &str = "LEXICON_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    File,
    Api,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    /// Directory holding the cache file (file backend).
    pub path: String,
    pub file_name: String,
    /// Base URL of the lexicon service (api backend).
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PROVIDER_ENDPOINT.to_string(),
            api_key: None,
            timeout_seconds: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::File,
            path: "./data".to_string(),
            file_name: crate::adapters::file_store::DEFAULT_FILE_NAME.to_string(),
            endpoint: None,
            api_key: None,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 100,
            max_delay_ms: 2100,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl CacheConfig {
    pub fn api_key(&self) -> Option<String> {
        usable_secret(self.api_key.as_deref()).map(str::to_string)
    }
}

impl LexiconConfig {
    /// 載入設定檔；檔案不存在時使用預設值
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_defaults();
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LexiconError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DICTIONARY_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LexiconError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Keys left empty or unresolved fall back to the conventional environment variables.
    fn apply_env_defaults(&mut self) {
        if usable_secret(self.provider.api_key.as_deref()).is_none() {
            self.provider.api_key = std::env::var(DICTIONARY_API_KEY_ENV).ok();
        }
        if usable_secret(self.cache.api_key.as_deref()).is_none() {
            self.cache.api_key = std::env::var(LEXICON_API_KEY_ENV).ok();
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("provider.endpoint", &self.provider.endpoint)?;
        validate_range("provider.timeout_seconds", self.provider.timeout_seconds, 1, 300)?;

        match self.cache.backend {
            CacheBackendKind::File => {
                validate_path("cache.path", &self.cache.path)?;
                validate_non_empty_string("cache.file_name", &self.cache.file_name)?;
            }
            CacheBackendKind::Api => {
                let endpoint = self.cache.endpoint.as_deref().unwrap_or_default();
                validate_url("cache.endpoint", endpoint)?;
            }
        }

        validate_range(
            "batch.min_delay_ms",
            self.batch.min_delay_ms,
            0,
            self.batch.max_delay_ms,
        )?;

        Ok(())
    }
}

/// An unresolved `${VAR}` placeholder or blank string is treated as no secret at all.
fn usable_secret(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !(v.starts_with("${") && v.ends_with('}')))
}

impl ConfigProvider for LexiconConfig {
    fn provider_endpoint(&self) -> &str {
        &self.provider.endpoint
    }

    fn api_key(&self) -> Option<&str> {
        usable_secret(self.provider.api_key.as_deref())
    }

    fn request_timeout(&self) -> Duration {
        self.provider.timeout()
    }

    fn throttle_window(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.batch.min_delay_ms),
            Duration::from_millis(self.batch.max_delay_ms),
        )
    }
}

impl Validate for LexiconConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
