// Translation providers
//
// Each remote backend implements `Translator`; the factory wires the concrete
// strategy for a `Provider` value:
// - Google: public keyless endpoint, nested-array response
// - LibreTranslate: configurable instance, JSON request/response
//
// `TranslationService` layers the FIFO cache and batch pacing on top.

pub mod cache;
pub mod google;
pub mod libre;
pub mod service;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub use cache::{cache_key, TranslationCache};
pub use google::GoogleTranslator;
pub use libre::LibreTranslator;
pub use service::TranslationService;
pub use crate::config::Provider;
use crate::config::TranslateConfig;
use crate::error::{Result, TranslatorError};

/// One text to translate, with everything a provider needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    /// Source language code, or "auto"
    pub source_lang: String,
    pub target_lang: String,
    pub provider: Provider,
    /// Base URL of the provider instance; required for LibreTranslate
    pub provider_endpoint: Option<String>,
}

/// Provider output normalized to one shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub translated_text: String,
    /// Detected or declared source language
    pub source_lang: Option<String>,
    pub target_lang: String,
}

/// Request settings shared by every text of a batch or document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    pub source_lang: String,
    pub target_lang: String,
    pub provider: Provider,
    pub provider_endpoint: Option<String>,
}

impl TranslateOptions {
    pub fn from_config(config: &TranslateConfig) -> Self {
        let provider_endpoint = match config.provider {
            Provider::LibreTranslate => Some(config.libre_translate_url.clone()),
            Provider::Google => None,
        };

        Self {
            source_lang: config.source_language.clone(),
            target_lang: config.target_language.clone(),
            provider: config.provider,
            provider_endpoint,
        }
    }

    pub fn request(&self, text: &str) -> TranslationRequest {
        TranslationRequest {
            text: text.to_string(),
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
            provider: self.provider,
            provider_endpoint: self.provider_endpoint.clone(),
        }
    }

    /// Result used in place of a failed translation: the input, unchanged
    pub fn passthrough(&self, text: &str) -> TranslationResult {
        TranslationResult {
            translated_text: text.to_string(),
            source_lang: Some(self.source_lang.clone()),
            target_lang: self.target_lang.clone(),
        }
    }
}

/// A remote translation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// The provider value this strategy serves
    fn provider(&self) -> Provider;

    /// Translate a single text. Transport and response-shape failures are
    /// reported as `TranslatorError::Transport` tagged with the provider name.
    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResult>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the translator for a provider, sharing one HTTP client
    pub fn create_translator(provider: Provider, client: Client) -> Box<dyn Translator> {
        match provider {
            Provider::Google => Box::new(GoogleTranslator::new(client)),
            Provider::LibreTranslate => Box::new(LibreTranslator::new(client)),
        }
    }

    /// One translator per known provider
    pub fn create_all(client: Client) -> Vec<Box<dyn Translator>> {
        [Provider::Google, Provider::LibreTranslate]
            .into_iter()
            .map(|provider| Self::create_translator(provider, client.clone()))
            .collect()
    }
}

/// HTTP client shared by the providers
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Read a failed response into a provider-tagged error
pub(crate) async fn status_error(provider: Provider, response: reqwest::Response) -> TranslatorError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    TranslatorError::transport(
        provider.display_name(),
        format!("API error {}: {}", status, body.trim()),
    )
}
