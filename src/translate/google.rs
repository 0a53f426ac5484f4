use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TranslatorError};
use super::{status_error, Provider, TranslationRequest, TranslationResult, Translator};

/// Public endpoint used by the Google Translate web widgets
pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Keyless Google Translate client
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, GOOGLE_TRANSLATE_URL)
    }

    pub fn with_endpoint(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn error(message: impl Into<String>) -> TranslatorError {
        TranslatorError::transport(Provider::Google.display_name(), message)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResult> {
        debug!("Sending translation request to: {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", request.source_lang.as_str()),
                ("tl", request.target_lang.as_str()),
                ("dt", "t"),
                ("q", request.text.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Self::error(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error(Provider::Google, response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Self::error(format!("Failed to parse response: {}", e)))?;

        parse_response(&body, request)
    }
}

/// Decode the nested-array payload.
///
/// `body[0]` lists translated segments, each with its text at index 0;
/// `body[2]` carries the detected source language.
pub fn parse_response(body: &Value, request: &TranslationRequest) -> Result<TranslationResult> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| GoogleTranslator::error("unexpected response shape: no translation segments"))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    let source_lang = body
        .get(2)
        .and_then(Value::as_str)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(request.source_lang.as_str())
        .to_string();

    Ok(TranslationResult {
        translated_text: translated.trim().to_string(),
        source_lang: Some(source_lang),
        target_lang: request.target_lang.clone(),
    })
}
