use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

use super::TranslationResult;

pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Cache key: trimmed, lowercased text joined with the target language
pub fn cache_key(text: &str, target_language: &str) -> String {
    format!("{}::{}", text.trim().to_lowercase(), target_language)
}

/// Size-capped translation cache with first-in-first-out eviction.
///
/// Reads go through `peek`, so they never promote an entry; only insertion
/// order decides what is evicted. A zero capacity disables caching.
#[derive(Debug)]
pub struct TranslationCache {
    inner: Option<LruCache<String, TranslationResult>>,
    capacity: usize,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(LruCache::new),
            capacity,
        }
    }

    pub fn get(&self, text: &str, target_language: &str) -> Option<&TranslationResult> {
        self.inner.as_ref()?.peek(&cache_key(text, target_language))
    }

    pub fn contains(&self, text: &str, target_language: &str) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.contains(&cache_key(text, target_language)))
    }

    /// Store a result. A new key on a full cache evicts the oldest entry;
    /// an existing key is overwritten in place.
    pub fn set(&mut self, text: &str, target_language: &str, result: TranslationResult) {
        let Some(inner) = self.inner.as_mut() else {
            return;
        };

        let key = cache_key(text, target_language);
        if let Some(slot) = inner.peek_mut(&key) {
            *slot = result;
            return;
        }

        if let Some((evicted, _)) = inner.push(key, result) {
            debug!("Evicting cached translation: {}", evicted);
        }
    }

    pub fn clear(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.clear();
        }
    }

    pub fn size(&self) -> usize {
        self.inner.as_ref().map_or(0, LruCache::len)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str) -> TranslationResult {
        TranslationResult {
            translated_text: text.to_string(),
            source_lang: Some("es".to_string()),
            target_lang: "en".to_string(),
        }
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(cache_key("Hello ", "fr"), cache_key("hello", "fr"));
        assert_eq!(cache_key("  HELLO\t", "fr"), "hello::fr");
        assert_ne!(cache_key("hello", "fr"), cache_key("hello", "de"));
    }

    #[test]
    fn test_get_hits_across_case_and_whitespace() {
        let mut cache = TranslationCache::new(10);
        cache.set("Hola Mundo", "en", result("Hello world"));
        assert_eq!(cache.get("  hola mundo ", "en").unwrap().translated_text, "Hello world");
        assert!(cache.get("hola mundo", "fr").is_none());
    }

    #[test]
    fn test_evicts_oldest_inserted() {
        let mut cache = TranslationCache::new(3);
        for text in ["a", "b", "c"] {
            cache.set(text, "en", result(text));
        }
        // Reading does not refresh an entry
        assert!(cache.get("a", "en").is_some());

        cache.set("d", "en", result("d"));
        assert_eq!(cache.size(), 3);
        assert!(cache.get("a", "en").is_none());
        for text in ["b", "c", "d"] {
            assert!(cache.contains(text, "en"), "{} should remain", text);
        }
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut cache = TranslationCache::new(DEFAULT_CACHE_CAPACITY);
        for i in 0..=DEFAULT_CACHE_CAPACITY {
            cache.set(&format!("text {}", i), "en", result("x"));
        }
        assert_eq!(cache.size(), DEFAULT_CACHE_CAPACITY);
        assert!(!cache.contains("text 0", "en"));
        assert!(cache.contains("text 1", "en"));
        assert!(cache.contains(&format!("text {}", DEFAULT_CACHE_CAPACITY), "en"));
    }

    #[test]
    fn test_overwrite_keeps_size_and_slot() {
        let mut cache = TranslationCache::new(2);
        cache.set("a", "en", result("first"));
        cache.set("b", "en", result("b"));
        cache.set("A ", "en", result("second"));
        assert_eq!(cache.size(), 2);
        assert_eq!(cache.get("a", "en").unwrap().translated_text, "second");

        cache.set("c", "en", result("c"));
        assert!(!cache.contains("a", "en"));
        assert!(cache.contains("b", "en"));
    }

    #[test]
    fn test_contains_does_not_refresh_entry() {
        let mut cache = TranslationCache::new(2);
        cache.set("a", "en", result("a"));
        cache.set("b", "en", result("b"));
        assert!(cache.contains("a", "en"));
        assert!(cache.get("a", "en").is_some());

        cache.set("c", "en", result("c"));
        assert!(!cache.contains("a", "en"));
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let mut cache = TranslationCache::new(5);
        cache.set("a", "en", result("a"));
        cache.clear();
        assert_eq!(cache.size(), 0);
        cache.set("b", "en", result("b"));
        assert_eq!(cache.size(), 1);

        let mut disabled = TranslationCache::new(0);
        disabled.set("a", "en", result("a"));
        assert_eq!(disabled.size(), 0);
    }
}
