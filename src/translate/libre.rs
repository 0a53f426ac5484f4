use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TranslatorError};
use super::{status_error, Provider, TranslationRequest, TranslationResult, Translator};

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: String,
    detected_language: Option<DetectedLanguage>,
}

#[derive(Debug, Deserialize)]
struct DetectedLanguage {
    language: Option<String>,
}

/// Client for a LibreTranslate instance named by the request
pub struct LibreTranslator {
    client: Client,
}

impl LibreTranslator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn error(message: impl Into<String>) -> TranslatorError {
        TranslatorError::transport(Provider::LibreTranslate.display_name(), message)
    }
}

/// `{base}/translate`, or a configuration error when no base URL is set
pub fn translate_url(endpoint: Option<&str>) -> Result<String> {
    let base = endpoint.map(str::trim).unwrap_or("");
    if base.is_empty() {
        return Err(TranslatorError::Config(
            "LibreTranslate URL is not configured".to_string(),
        ));
    }
    Ok(format!("{}/translate", base.trim_end_matches('/')))
}

#[async_trait]
impl Translator for LibreTranslator {
    fn provider(&self) -> Provider {
        Provider::LibreTranslate
    }

    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResult> {
        let url = translate_url(request.provider_endpoint.as_deref())?;
        debug!("Sending translation request to: {}", url);

        let body = LibreRequest {
            q: &request.text,
            source: &request.source_lang,
            target: &request.target_lang,
            format: "text",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::error(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error(Provider::LibreTranslate, response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| Self::error(format!("Failed to read response: {}", e)))?;

        parse_response(&text, request)
    }
}

pub fn parse_response(body: &str, request: &TranslationRequest) -> Result<TranslationResult> {
    let parsed: LibreResponse = serde_json::from_str(body)
        .map_err(|e| LibreTranslator::error(format!("Failed to parse response: {}", e)))?;

    let source_lang = parsed
        .detected_language
        .and_then(|d| d.language)
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| request.source_lang.clone());

    Ok(TranslationResult {
        translated_text: parsed.translated_text,
        source_lang: Some(source_lang),
        target_lang: request.target_lang.clone(),
    })
}
