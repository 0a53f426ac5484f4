use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid comment pattern: {0}")]
    Regex(#[from] regex::Error),

    /// A provider call failed in transport, status or response shape.
    #[error("{provider} error: {message}")]
    Transport { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pattern table error: {0}")]
    Pattern(String),

    #[error("Line {line} is out of range (document has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl TranslatorError {
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslatorError>;
