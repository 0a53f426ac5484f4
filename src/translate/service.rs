use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, TranslatorError};
use super::{
    build_http_client, Provider, TranslateOptions, TranslationCache, TranslationRequest,
    TranslationResult, Translator, TranslatorFactory,
};

/// Spaces out consecutive network requests
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    requests: usize,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, requests: 0 }
    }

    /// Wait before every request but the first. Returns false if cancelled
    /// while waiting.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        if self.requests > 0 && !self.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
        self.requests += 1;
        true
    }

    pub fn requests(&self) -> usize {
        self.requests
    }
}

/// Cache-aside translation over the registered providers
pub struct TranslationService {
    translators: HashMap<Provider, Box<dyn Translator>>,
    cache: TranslationCache,
    request_delay: Duration,
}

impl TranslationService {
    /// Service with both providers over one HTTP client
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = build_http_client(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::with_translators(
            TranslatorFactory::create_all(client),
            config.cache_capacity,
            Duration::from_millis(config.request_delay_ms),
        ))
    }

    pub fn with_translators(
        translators: Vec<Box<dyn Translator>>,
        cache_capacity: usize,
        request_delay: Duration,
    ) -> Self {
        let mut service = Self {
            translators: HashMap::new(),
            cache: TranslationCache::new(cache_capacity),
            request_delay,
        };
        for translator in translators {
            service.register(translator);
        }
        service
    }

    /// Add or replace the strategy for the translator's provider
    pub fn register(&mut self, translator: Box<dyn Translator>) {
        self.translators.insert(translator.provider(), translator);
    }

    /// Translate one text, answering from the cache when possible and
    /// caching every fresh result
    pub async fn translate(&mut self, request: &TranslationRequest) -> Result<TranslationResult> {
        if let Some(cached) = self.cache.get(&request.text, &request.target_lang) {
            debug!("Translation cache hit for target {}", request.target_lang);
            return Ok(cached.clone());
        }

        let translator = self.translators.get(&request.provider).ok_or_else(|| {
            TranslatorError::Config(format!(
                "No translator registered for {}",
                request.provider.display_name()
            ))
        })?;

        let result = translator.translate(request).await?;
        self.cache.set(&request.text, &request.target_lang, result.clone());
        Ok(result)
    }

    /// Translate unless cancelled, pausing before each network request.
    /// Returns `None` once cancellation is observed.
    pub async fn translate_paced(
        &mut self,
        request: &TranslationRequest,
        pacer: &mut Pacer,
        cancel: &CancellationToken,
    ) -> Option<Result<TranslationResult>> {
        if cancel.is_cancelled() {
            return None;
        }
        if !self.cache.contains(&request.text, &request.target_lang) && !pacer.wait(cancel).await {
            return None;
        }
        Some(self.translate(request).await)
    }

    /// Translate every text in order. A failed text yields itself back.
    pub async fn translate_batch(
        &mut self,
        texts: &[String],
        options: &TranslateOptions,
    ) -> Vec<TranslationResult> {
        self.translate_batch_cancellable(texts, options, &CancellationToken::new())
            .await
    }

    /// Like `translate_batch`, but stops issuing requests once `cancel`
    /// fires; results cover only the texts handled before that.
    pub async fn translate_batch_cancellable(
        &mut self,
        texts: &[String],
        options: &TranslateOptions,
        cancel: &CancellationToken,
    ) -> Vec<TranslationResult> {
        let mut pacer = Pacer::new(self.request_delay);
        let mut results = Vec::with_capacity(texts.len());

        for (idx, text) in texts.iter().enumerate() {
            let request = options.request(text);
            match self.translate_paced(&request, &mut pacer, cancel).await {
                Some(Ok(result)) => results.push(result),
                Some(Err(e)) => {
                    warn!("Translation {}/{} failed, keeping original: {}", idx + 1, texts.len(), e);
                    results.push(options.passthrough(text));
                }
                None => {
                    info!("Batch cancelled after {}/{} texts", idx, texts.len());
                    break;
                }
            }
        }

        results
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        info!("Translation cache cleared");
    }

    pub fn cache_size(&self) -> usize {
        self.cache.size()
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::MockTranslator;

    fn options(provider: Provider) -> TranslateOptions {
        TranslateOptions {
            source_lang: "auto".to_string(),
            target_lang: "en".to_string(),
            provider,
            provider_endpoint: None,
        }
    }

    fn echo(request: &TranslationRequest) -> Result<TranslationResult> {
        Ok(TranslationResult {
            translated_text: format!("[en] {}", request.text),
            source_lang: Some("es".to_string()),
            target_lang: request.target_lang.clone(),
        })
    }

    fn service_with(mock: MockTranslator) -> TranslationService {
        TranslationService::with_translators(vec![Box::new(mock)], 100, Duration::ZERO)
    }

    fn google_mock() -> MockTranslator {
        let mut mock = MockTranslator::new();
        mock.expect_provider().return_const(Provider::Google);
        mock
    }

    #[tokio::test]
    async fn test_second_identical_request_hits_cache() {
        let mut mock = google_mock();
        mock.expect_translate().times(1).returning(echo);
        let mut service = service_with(mock);

        let request = options(Provider::Google).request("Hola");
        let first = service.translate(&request).await.unwrap();
        let second = service.translate(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.translated_text, "[en] Hola");
        assert_eq!(service.cache_size(), 1);
    }

    #[tokio::test]
    async fn test_normalized_text_shares_cache_entry() {
        let mut mock = google_mock();
        mock.expect_translate().times(1).returning(echo);
        let mut service = service_with(mock);

        let opts = options(Provider::Google);
        service.translate(&opts.request("Hola")).await.unwrap();
        let hit = service.translate(&opts.request("  hola ")).await.unwrap();
        assert_eq!(hit.translated_text, "[en] Hola");
    }

    #[tokio::test]
    async fn test_errors_propagate_and_are_not_cached() {
        let mut mock = google_mock();
        mock.expect_translate()
            .times(2)
            .returning(|_| Err(TranslatorError::transport("Google Translate", "HTTP 503")));
        let mut service = service_with(mock);

        let request = options(Provider::Google).request("Hola");
        assert!(matches!(
            service.translate(&request).await,
            Err(TranslatorError::Transport { .. })
        ));
        assert!(service.translate(&request).await.is_err());
        assert_eq!(service.cache_size(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_provider_is_config_error() {
        let mut service = service_with(google_mock());
        let request = options(Provider::LibreTranslate).request("Hola");
        assert!(matches!(
            service.translate(&request).await,
            Err(TranslatorError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_fails_open_per_item() {
        let mut mock = google_mock();
        mock.expect_translate().times(3).returning(|request| {
            if request.text == "roto" {
                Err(TranslatorError::transport("Google Translate", "boom"))
            } else {
                echo(request)
            }
        });
        let mut service = service_with(mock);

        let texts = vec!["uno".to_string(), "roto".to_string(), "tres".to_string()];
        let results = service.translate_batch(&texts, &options(Provider::Google)).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].translated_text, "[en] uno");
        assert_eq!(results[1].translated_text, "roto");
        assert_eq!(results[1].source_lang.as_deref(), Some("auto"));
        assert_eq!(results[1].target_lang, "en");
        assert_eq!(results[2].translated_text, "[en] tres");
    }

    #[tokio::test]
    async fn test_batch_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let mut mock = google_mock();
        mock.expect_translate().times(1).returning(move |request| {
            trigger.cancel();
            echo(request)
        });
        let mut service = service_with(mock);

        let texts = vec!["uno".to_string(), "dos".to_string(), "tres".to_string()];
        let results = service
            .translate_batch_cancellable(&texts, &options(Provider::Google), &cancel)
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].translated_text, "[en] uno");
    }

    #[tokio::test]
    async fn test_pacer_skips_delay_for_first_request() {
        let cancel = CancellationToken::new();
        let mut pacer = Pacer::new(Duration::from_secs(60));
        assert!(pacer.wait(&cancel).await);
        cancel.cancel();
        // Second request would wait; cancellation cuts the wait short
        assert!(!pacer.wait(&cancel).await);
        assert_eq!(pacer.requests(), 1);
    }

    #[tokio::test]
    async fn test_batch_pauses_between_network_requests() {
        let mut mock = google_mock();
        mock.expect_translate().times(3).returning(echo);
        let mut service =
            TranslationService::with_translators(vec![Box::new(mock)], 100, Duration::from_millis(100));

        let texts: Vec<String> = ["a", "b", "c", "a"].iter().map(|t| t.to_string()).collect();
        let started = tokio::time::Instant::now();
        let results = service.translate_batch(&texts, &options(Provider::Google)).await;
        let elapsed = started.elapsed();

        assert_eq!(results.len(), 4);
        assert_eq!(results[3].translated_text, "[en] a");
        // Three misses wait twice; the cached repeat does not wait
        assert!(elapsed >= Duration::from_millis(200), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let mut mock = google_mock();
        mock.expect_translate().times(2).returning(echo);
        let mut service = service_with(mock);

        let request = options(Provider::Google).request("Hola");
        service.translate(&request).await.unwrap();
        service.clear_cache();
        assert_eq!(service.cache_size(), 0);
        service.translate(&request).await.unwrap();
    }
}
