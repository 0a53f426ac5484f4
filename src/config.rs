use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, TranslatorError};

// Defaults shared by `Default` impls and serde field defaults
fn default_source_language() -> String {
    "auto".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_libre_translate_url() -> String {
    "https://libretranslate.de".to_string()
}

fn default_request_delay_ms() -> u64 {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_history_capacity() -> usize {
    50
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Source language code, or "auto" to let the provider detect it
    #[serde(default = "default_source_language")]
    pub source_language: String,
    /// Target language code
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Translation backend
    #[serde(default)]
    pub provider: Provider,
    /// Base URL of the LibreTranslate instance (used when provider = libretranslate)
    #[serde(default = "default_libre_translate_url")]
    pub libre_translate_url: String,
    /// Pause between consecutive requests of a batch, in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Per-request HTTP timeout, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum number of cached translations
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Public, keyless Google Translate endpoint
    #[default]
    Google,
    /// Self-hosted or public LibreTranslate instance
    LibreTranslate,
}

impl Provider {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Google => "Google Translate",
            Self::LibreTranslate => "LibreTranslate",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = TranslatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "libretranslate" | "libre" => Ok(Self::LibreTranslate),
            other => Err(TranslatorError::Config(format!(
                "Unknown translation provider '{}' (expected 'google' or 'libretranslate')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of undoable translations kept
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Additional comment pattern table, merged over the built-in languages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages_file: Option<PathBuf>,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            target_language: default_target_language(),
            provider: Provider::default(),
            libre_translate_url: default_libre_translate_url(),
            request_delay_ms: default_request_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslatorError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TranslatorError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TranslatorError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslatorError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.translate.source_language, "auto");
        assert_eq!(config.translate.target_language, "en");
        assert_eq!(config.translate.provider, Provider::Google);
        assert_eq!(config.translate.libre_translate_url, "https://libretranslate.de");
        assert_eq!(config.translate.cache_capacity, 1000);
        assert_eq!(config.history.capacity, 50);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml_str(
            "[translate]\ntarget_language = \"fr\"\nprovider = \"libretranslate\"\n",
        )
        .unwrap();
        assert_eq!(config.translate.target_language, "fr");
        assert_eq!(config.translate.provider, Provider::LibreTranslate);
        assert_eq!(config.translate.source_language, "auto");
        assert_eq!(config.translate.request_delay_ms, 100);
        assert_eq!(config.history.capacity, 50);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = Config::from_toml_str("[translate]\nprovider = \"bing\"\n").unwrap_err();
        assert!(matches!(err, TranslatorError::Config(_)));
        assert!("bing".parse::<Provider>().is_err());
        assert_eq!("Google".parse::<Provider>().unwrap(), Provider::Google);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.translate.target_language = "ja".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.translate.target_language, "ja");
        assert_eq!(loaded.translate.provider, Provider::Google);
    }
}
