//! In-memory translation cache keyed by `locale:namespace`.
//!
//! Entries expire lazily: a read that finds an expired entry evicts it and
//! reports a miss. Nothing sweeps in the background.

use crate::i18n::dictionary::Dictionary;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_NAMESPACE: &str = "common";
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    dictionary: Dictionary,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    /// Entries past their TTL that no read has evicted yet
    pub expired: usize,
    pub keys: Vec<String>,
}

#[derive(Debug)]
pub struct TranslationCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

fn cache_key(locale: &str, namespace: &str) -> String {
    format!("{}:{}", locale, namespace)
}

impl TranslationCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock cannot leave the map half-written
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached dictionary, or `None` when absent or expired.
    pub fn get(&self, locale: &str, namespace: &str) -> Option<Dictionary> {
        let key = cache_key(locale, namespace);
        let mut entries = self.lock();

        let expired = entries.get(&key)?.is_expired(Instant::now());
        if expired {
            entries.remove(&key);
            debug!("Translation cache entry {} expired", key);
            return None;
        }
        entries.get(&key).map(|entry| entry.dictionary.clone())
    }

    /// Store a dictionary, replacing any previous entry.
    ///
    /// `max_age` defaults to the cache's TTL (one hour unless configured).
    pub fn set(
        &self,
        locale: &str,
        dictionary: Dictionary,
        namespace: &str,
        max_age: Option<Duration>,
    ) {
        let ttl = max_age.unwrap_or(self.default_ttl);
        self.lock().insert(
            cache_key(locale, namespace),
            CacheEntry {
                dictionary,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
    }

    pub fn has(&self, locale: &str, namespace: &str) -> bool {
        self.get(locale, namespace).is_some()
    }

    /// Clear entries.
    ///
    /// No arguments clears everything, a locale alone clears all of its
    /// namespaces, and both clear a single entry.
    pub fn clear(&self, locale: Option<&str>, namespace: Option<&str>) {
        let mut entries = self.lock();
        match (locale, namespace) {
            (Some(locale), Some(namespace)) => {
                entries.remove(&cache_key(locale, namespace));
            }
            (Some(locale), None) => {
                let prefix = format!("{}:", locale);
                entries.retain(|key, _| !key.starts_with(&prefix));
            }
            (None, Some(namespace)) => {
                let suffix = format!(":{}", namespace);
                entries.retain(|key, _| !key.ends_with(&suffix));
            }
            (None, None) => entries.clear(),
        }
    }

    /// Namespaces currently cached for a locale, sorted.
    pub fn namespaces(&self, locale: &str) -> Vec<String> {
        let prefix = format!("{}:", locale);
        let mut namespaces: Vec<String> = self
            .lock()
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect();
        namespaces.sort();
        namespaces
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.lock();
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            entries: entries.len(),
            expired: entries.values().filter(|e| e.is_expired(now)).count(),
            keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Dictionary {
        match json!({ "nav": { "home": "Home" } }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_set_then_get_returns_same_dictionary() {
        let cache = TranslationCache::default();
        cache.set("en", sample(), DEFAULT_NAMESPACE, None);

        assert_eq!(cache.get("en", "common"), Some(sample()));
        assert!(cache.has("en", "common"));
        assert!(!cache.has("ja", "common"));
    }

    #[test]
    fn test_set_overwrites() {
        let cache = TranslationCache::default();
        cache.set("en", sample(), "common", None);
        cache.set("en", Dictionary::new(), "common", None);

        assert_eq!(cache.get("en", "common"), Some(Dictionary::new()));
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let cache = TranslationCache::default();
        cache.set("en", sample(), "common", Some(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.stats().expired, 1);
        assert_eq!(cache.get("en", "common"), None);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let cache = TranslationCache::new(Duration::from_secs(u64::MAX));
        cache.set("en", sample(), "common", None);
        cache.set("ja", sample(), "common", Some(Duration::MAX));

        assert_eq!(cache.get("en", "common"), Some(sample()));
        assert!(cache.has("ja", "common"));
        assert_eq!(cache.stats().expired, 0);
    }

    #[test]
    fn test_clear_by_locale_keeps_other_locales() {
        let cache = TranslationCache::default();
        cache.set("en", sample(), "common", None);
        cache.set("en", sample(), "admin", None);
        cache.set("ja", sample(), "common", None);

        cache.clear(Some("en"), None);

        assert_eq!(cache.namespaces("en"), Vec::<String>::new());
        assert_eq!(cache.namespaces("ja"), vec!["common"]);
    }

    #[test]
    fn test_clear_single_entry() {
        let cache = TranslationCache::default();
        cache.set("en", sample(), "common", None);
        cache.set("en", sample(), "admin", None);

        cache.clear(Some("en"), Some("admin"));

        assert_eq!(cache.namespaces("en"), vec!["common"]);
    }

    #[test]
    fn test_clear_all() {
        let cache = TranslationCache::default();
        cache.set("en", sample(), "common", None);
        cache.set("ja", sample(), "common", None);

        cache.clear(None, None);

        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_locale_prefix_does_not_match_longer_locale() {
        let cache = TranslationCache::default();
        cache.set("en", sample(), "common", None);
        cache.set("en-GB", sample(), "common", None);

        cache.clear(Some("en"), None);

        assert_eq!(cache.stats().keys, vec!["en-GB:common"]);
    }

    #[test]
    fn test_namespaces_sorted() {
        let cache = TranslationCache::default();
        cache.set("en", sample(), "home", None);
        cache.set("en", sample(), "admin", None);
        cache.set("en", sample(), "common", None);

        assert_eq!(cache.namespaces("en"), vec!["admin", "common", "home"]);
    }
}
