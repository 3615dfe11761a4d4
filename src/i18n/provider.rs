//! Translation session: loads namespaces for the active locale and resolves
//! keys against everything loaded so far.
//!
//! # Lifecycle
//!
//! ```text
//! NoNamespaceLoaded --set_locale--> CommonLoading --ok--> CommonLoaded
//!        ^                                |
//!        +-------------error--------------+
//! ```
//!
//! Other namespaces load independently once `common` is in; a failed
//! namespace is marked `Error` and never disturbs the ones already loaded.
//! Every locale switch and successful load is published to a [`TranslationContext`] so code
//! outside the session can translate too.

use crate::i18n::cache::{TranslationCache, DEFAULT_NAMESPACE};
use crate::i18n::dictionary::{interpolate, lookup, merge, Dictionary};
use crate::i18n::optimizer::{optimize, OptimizeOptions};
use crate::i18n::source::{is_valid_identifier, SourceError, TranslationSource};
use crate::i18n::{Locale, TranslationMetrics};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How unresolved keys are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Missing keys render as `[key]` so they stand out
    Development,
    /// Missing keys render as the bare key
    #[default]
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    NoNamespaceLoaded,
    CommonLoading,
    CommonLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceStatus {
    Loading,
    Loaded,
    Error(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid namespace '{0}'")]
    InvalidNamespace(String),

    #[error("failed to load namespace '{namespace}' for locale {locale}: {source}")]
    Load {
        locale: Locale,
        namespace: String,
        #[source]
        source: SourceError,
    },
}

fn resolve(dictionary: &Dictionary, key: &str, params: &[(&str, &str)], mode: Mode) -> String {
    match lookup(dictionary, key) {
        Some(Value::String(text)) => interpolate(text, params),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => match mode {
            Mode::Development => format!("[{}]", key),
            Mode::Production => key.to_string(),
        },
    }
}

#[derive(Debug, Default)]
struct Published {
    locale: Option<Locale>,
    dictionary: Dictionary,
}

/// Shared, read-mostly view of the latest merged translations.
///
/// Clone it into anything that needs to translate outside the session that
/// owns the provider (background jobs, log formatting).
#[derive(Debug, Clone, Default)]
pub struct TranslationContext {
    inner: Arc<RwLock<Published>>,
    mode: Mode,
}

impl TranslationContext {
    pub fn new(mode: Mode) -> Self {
        Self {
            inner: Arc::default(),
            mode,
        }
    }

    /// Locale of the last published dictionary.
    pub fn locale(&self) -> Option<Locale> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).locale
    }

    pub fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let published = self.inner.read().unwrap_or_else(|e| e.into_inner());
        resolve(&published.dictionary, key, params, self.mode)
    }

    fn publish(&self, locale: Locale, dictionary: Dictionary) {
        let mut published = self.inner.write().unwrap_or_else(|e| e.into_inner());
        published.locale = Some(locale);
        published.dictionary = dictionary;
    }
}

pub struct TranslationProvider<S> {
    source: S,
    cache: Arc<TranslationCache>,
    metrics: &'static TranslationMetrics,
    optimize_options: OptimizeOptions,
    mode: Mode,
    context: TranslationContext,

    locale: Locale,
    state: ProviderState,
    /// Loaded namespaces in load order; `common` is always first
    namespaces: Vec<String>,
    statuses: HashMap<String, NamespaceStatus>,
    dictionaries: HashMap<String, Dictionary>,
    merged: Dictionary,
    memo: Mutex<HashMap<String, String>>,
}

impl<S: TranslationSource> TranslationProvider<S> {
    pub fn new(source: S, cache: Arc<TranslationCache>, mode: Mode) -> Self {
        Self {
            source,
            cache,
            metrics: TranslationMetrics::global(),
            optimize_options: OptimizeOptions::default(),
            mode,
            context: TranslationContext::new(mode),
            locale: Locale::default(),
            state: ProviderState::NoNamespaceLoaded,
            namespaces: Vec::new(),
            statuses: HashMap::new(),
            dictionaries: HashMap::new(),
            merged: Dictionary::new(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: &'static TranslationMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_optimize_options(mut self, options: OptimizeOptions) -> Self {
        self.optimize_options = options;
        self
    }

    /// Publish into an existing context instead of a private one.
    pub fn with_context(mut self, context: TranslationContext) -> Self {
        self.context = context;
        self
    }

    /// Finish construction by loading `common` for `locale`.
    pub async fn start(mut self, locale: Locale) -> Result<Self, ProviderError> {
        self.set_locale(locale).await?;
        Ok(self)
    }

    pub fn context(&self) -> TranslationContext {
        self.context.clone()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn status(&self, namespace: &str) -> Option<&NamespaceStatus> {
        self.statuses.get(namespace)
    }

    /// Switch locale: drop every loaded namespace and load `common` again.
    pub async fn set_locale(&mut self, locale: Locale) -> Result<(), ProviderError> {
        info!("Switching translations to {}", locale);
        self.locale = locale;
        self.state = ProviderState::NoNamespaceLoaded;
        self.namespaces.clear();
        self.statuses.clear();
        self.dictionaries.clear();
        self.merged = Dictionary::new();
        self.clear_memo();
        self.context.publish(locale, Dictionary::new());

        self.load_namespace(DEFAULT_NAMESPACE).await
    }

    /// Load a namespace for the current locale, from cache when possible.
    pub async fn load_namespace(&mut self, namespace: &str) -> Result<(), ProviderError> {
        if !is_valid_identifier(namespace) {
            return Err(ProviderError::InvalidNamespace(namespace.to_string()));
        }
        if self.statuses.get(namespace) == Some(&NamespaceStatus::Loaded) {
            return Ok(());
        }

        let is_common = namespace == DEFAULT_NAMESPACE;
        self.statuses
            .insert(namespace.to_string(), NamespaceStatus::Loading);
        if is_common {
            self.state = ProviderState::CommonLoading;
        }

        let dictionary = match self.fetch(namespace).await {
            Ok(dictionary) => dictionary,
            Err(source) => {
                warn!(
                    "Failed to load translations {}/{}: {}",
                    self.locale, namespace, source
                );
                self.statuses.insert(
                    namespace.to_string(),
                    NamespaceStatus::Error(source.to_string()),
                );
                if is_common {
                    self.state = ProviderState::NoNamespaceLoaded;
                }
                return Err(ProviderError::Load {
                    locale: self.locale,
                    namespace: namespace.to_string(),
                    source,
                });
            }
        };

        self.dictionaries.insert(namespace.to_string(), dictionary);
        if !self.namespaces.iter().any(|ns| ns == namespace) {
            if is_common {
                self.namespaces.insert(0, namespace.to_string());
            } else {
                self.namespaces.push(namespace.to_string());
            }
        }
        self.statuses
            .insert(namespace.to_string(), NamespaceStatus::Loaded);
        if is_common {
            self.state = ProviderState::CommonLoaded;
        }
        self.rebuild();
        Ok(())
    }

    /// Drop a namespace. `common` stays loaded; returns whether anything
    /// was removed.
    pub fn unload_namespace(&mut self, namespace: &str) -> bool {
        if namespace == DEFAULT_NAMESPACE {
            return false;
        }

        self.statuses.remove(namespace);
        let removed = self.dictionaries.remove(namespace).is_some();
        self.namespaces.retain(|ns| ns != namespace);
        if removed {
            self.rebuild();
        }
        removed
    }

    /// Translate a dot-path key with `{{param}}` substitution.
    ///
    /// Parameter-free lookups are memoized until the loaded set changes.
    pub fn t(&self, key: &str, params: &[(&str, &str)]) -> String {
        if !params.is_empty() {
            return resolve(&self.merged, key, params, self.mode);
        }

        let mut memo = self.memo.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = memo.get(key) {
            return hit.clone();
        }
        let value = resolve(&self.merged, key, params, self.mode);
        memo.insert(key.to_string(), value.clone());
        value
    }

    async fn fetch(&self, namespace: &str) -> Result<Dictionary, SourceError> {
        let locale = self.locale.code();

        if let Some(cached) = self.cache.get(locale, namespace) {
            self.metrics.record_cache_hit();
            debug!("Translation cache hit for {}/{}", locale, namespace);
            return Ok(cached);
        }
        self.metrics.record_cache_miss();
        self.metrics.record_load();

        let raw = self.source.load(locale, namespace).await.map_err(|e| {
            self.metrics.record_load_failure();
            e
        })?;

        let result = optimize(&raw, &self.optimize_options);
        debug!(
            "Optimized {}/{}: {} -> {} bytes ({:.1}% saved, {} duplicates, {} empty)",
            locale,
            namespace,
            result.stats.original_size,
            result.stats.optimized_size,
            result.stats.percent_saved,
            result.stats.duplicates_removed,
            result.stats.empty_removed
        );

        self.cache
            .set(locale, result.optimized.clone(), namespace, None);
        Ok(result.optimized)
    }

    fn rebuild(&mut self) {
        let mut merged = Dictionary::new();
        for namespace in &self.namespaces {
            if let Some(dictionary) = self.dictionaries.get(namespace) {
                merge(&mut merged, dictionary);
            }
        }
        self.merged = merged;
        self.clear_memo();
        self.context.publish(self.locale, self.merged.clone());
    }

    fn clear_memo(&self) {
        self.memo.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeSource {
        files: HashMap<String, Dictionary>,
        loads: AtomicUsize,
    }

    impl FakeSource {
        fn with(mut self, locale: &str, namespace: &str, content: Value) -> Self {
            let dict = match content {
                Value::Object(map) => map,
                _ => panic!("fixture must be an object"),
            };
            self.files.insert(format!("{}/{}", locale, namespace), dict);
            self
        }
    }

    #[async_trait]
    impl TranslationSource for Arc<FakeSource> {
        async fn load(&self, locale: &str, namespace: &str) -> Result<Dictionary, SourceError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let key = format!("{}/{}", locale, namespace);
            self.files
                .get(&key)
                .cloned()
                .ok_or(SourceError::NotFound(key))
        }
    }

    fn site_source() -> Arc<FakeSource> {
        Arc::new(
            FakeSource::default()
                .with(
                    "en",
                    "common",
                    json!({
                        "a": { "b": { "c": "X" } },
                        "greeting": "Hello, {{ name }}!",
                        "nav": { "home": "Home" }
                    }),
                )
                .with("en", "admin", json!({ "admin": { "title": "  Dashboard  " } }))
                .with("ja", "common", json!({ "nav": { "home": "ホーム" } })),
        )
    }

    fn metrics() -> &'static TranslationMetrics {
        Box::leak(Box::new(TranslationMetrics::new()))
    }

    fn provider(source: Arc<FakeSource>, mode: Mode) -> TranslationProvider<Arc<FakeSource>> {
        TranslationProvider::new(source, Arc::new(TranslationCache::default()), mode)
            .with_metrics(metrics())
    }

    #[tokio::test]
    async fn test_set_locale_loads_common() {
        let mut p = provider(site_source(), Mode::Production);
        assert_eq!(p.state(), ProviderState::NoNamespaceLoaded);

        p.set_locale(Locale::ENGLISH).await.unwrap();

        assert_eq!(p.state(), ProviderState::CommonLoaded);
        assert_eq!(p.namespaces(), ["common"]);
        assert_eq!(p.status("common"), Some(&NamespaceStatus::Loaded));
        assert_eq!(p.t("a.b.c", &[]), "X");
    }

    #[tokio::test]
    async fn test_missing_key_rendering_by_mode() {
        let mut production = provider(site_source(), Mode::Production);
        production.set_locale(Locale::ENGLISH).await.unwrap();
        assert_eq!(production.t("a.b.missing", &[]), "a.b.missing");

        let mut development = provider(site_source(), Mode::Development);
        development.set_locale(Locale::ENGLISH).await.unwrap();
        assert_eq!(development.t("a.b.missing", &[]), "[a.b.missing]");
    }

    #[tokio::test]
    async fn test_params_are_interpolated_after_normalization() {
        let mut p = provider(site_source(), Mode::Production);
        p.set_locale(Locale::ENGLISH).await.unwrap();

        assert_eq!(p.t("greeting", &[("name", "Ana")]), "Hello, Ana!");
    }

    #[tokio::test]
    async fn test_second_provider_hits_shared_cache() {
        let source = site_source();
        let cache = Arc::new(TranslationCache::default());
        let m = metrics();

        let mut first = TranslationProvider::new(source.clone(), cache.clone(), Mode::Production)
            .with_metrics(m);
        first.set_locale(Locale::ENGLISH).await.unwrap();

        let mut second = TranslationProvider::new(source.clone(), cache, Mode::Production)
            .with_metrics(m);
        second.set_locale(Locale::ENGLISH).await.unwrap();

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(m.cache_hits(), 1);
        assert_eq!(m.cache_misses(), 1);
        assert_eq!(second.t("a.b.c", &[]), "X");
    }

    #[tokio::test]
    async fn test_failed_namespace_keeps_loaded_ones() {
        let mut p = provider(site_source(), Mode::Production);
        p.set_locale(Locale::ENGLISH).await.unwrap();

        let err = p.load_namespace("blog").await.unwrap_err();

        assert!(matches!(err, ProviderError::Load { .. }));
        assert!(matches!(p.status("blog"), Some(NamespaceStatus::Error(_))));
        assert_eq!(p.state(), ProviderState::CommonLoaded);
        assert_eq!(p.namespaces(), ["common"]);
        assert_eq!(p.t("nav.home", &[]), "Home");
    }

    #[tokio::test]
    async fn test_common_failure_resets_state() {
        let source = Arc::new(FakeSource::default());
        let mut p = provider(source, Mode::Production);

        assert!(p.set_locale(Locale::JAPANESE).await.is_err());
        assert_eq!(p.state(), ProviderState::NoNamespaceLoaded);
    }

    #[tokio::test]
    async fn test_loading_namespace_invalidates_memo() {
        let mut p = provider(site_source(), Mode::Development);
        p.set_locale(Locale::ENGLISH).await.unwrap();

        assert_eq!(p.t("admin.title", &[]), "[admin.title]");
        p.load_namespace("admin").await.unwrap();

        assert_eq!(p.namespaces(), ["common", "admin"]);
        assert_eq!(p.t("admin.title", &[]), "Dashboard");
    }

    #[tokio::test]
    async fn test_locale_switch_drops_namespaces() {
        let mut p = provider(site_source(), Mode::Production);
        p.set_locale(Locale::ENGLISH).await.unwrap();
        p.load_namespace("admin").await.unwrap();

        p.set_locale(Locale::JAPANESE).await.unwrap();

        assert_eq!(p.locale(), Locale::JAPANESE);
        assert_eq!(p.namespaces(), ["common"]);
        assert_eq!(p.status("admin"), None);
        assert_eq!(p.t("nav.home", &[]), "ホーム");
        assert_eq!(p.t("a.b.c", &[]), "a.b.c");
    }

    #[tokio::test]
    async fn test_unload_namespace() {
        let mut p = provider(site_source(), Mode::Production);
        p.set_locale(Locale::ENGLISH).await.unwrap();
        p.load_namespace("admin").await.unwrap();

        assert!(!p.unload_namespace("common"));
        assert!(p.unload_namespace("admin"));
        assert!(!p.unload_namespace("admin"));
        assert_eq!(p.t("admin.title", &[]), "admin.title");
        assert_eq!(p.t("nav.home", &[]), "Home");
    }

    #[tokio::test]
    async fn test_invalid_namespace_rejected() {
        let mut p = provider(site_source(), Mode::Production);
        let err = p.load_namespace("../secrets").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidNamespace(_)));
    }

    #[tokio::test]
    async fn test_context_receives_published_translations() {
        let context = TranslationContext::new(Mode::Development);
        let mut p = provider(site_source(), Mode::Development).with_context(context.clone());

        assert_eq!(context.locale(), None);
        assert_eq!(context.translate("nav.home", &[]), "[nav.home]");

        p.set_locale(Locale::JAPANESE).await.unwrap();

        assert_eq!(context.locale(), Some(Locale::JAPANESE));
        assert_eq!(context.translate("nav.home", &[]), "ホーム");
    }

    #[tokio::test]
    async fn test_failed_switch_does_not_leave_context_on_old_locale() {
        let source = Arc::new(FakeSource::default().with(
            "en",
            "common",
            json!({ "nav": { "home": "Home" } }),
        ));
        let mut p = provider(source, Mode::Production);
        let context = p.context();
        p.set_locale(Locale::ENGLISH).await.unwrap();
        assert_eq!(context.translate("nav.home", &[]), "Home");

        assert!(p.set_locale(Locale::JAPANESE).await.is_err());

        assert_eq!(context.locale(), Some(p.locale()));
        assert_eq!(context.translate("nav.home", &[]), p.t("nav.home", &[]));
        assert_eq!(context.translate("nav.home", &[]), "nav.home");
    }
}
