//! Internationalization: loading, caching and resolving site translations.
//!
//! # Architecture
//!
//! - `registry` / `locale`: supported locales; `en` is the default and the
//!   reference for validation
//! - `dictionary`: nested dictionaries and dot-path helpers
//! - `source`: where translation files come from (directory or HTTP)
//! - `optimizer`: shrinks dictionaries before caching or serving
//! - `cache`: TTL cache keyed by locale and namespace
//! - `validator`: key-set diff of each locale against the default
//! - `provider`: per-session state machine and `t()` lookup
//! - `metrics`: cache and load counters
//!
//! # Example
//!
//! ```rust,ignore
//! use portfolio_server::i18n::{HttpSource, Locale, Mode, TranslationCache, TranslationProvider};
//!
//! let source = HttpSource::new(reqwest::Client::new(), "https://example.com");
//! let mut provider = TranslationProvider::new(source, Arc::new(TranslationCache::default()), Mode::Production);
//! provider.set_locale(Locale::JAPANESE).await?;
//! let title = provider.t("hero.title", &[]);
//! ```

pub mod cache;
pub mod dictionary;
mod locale;
mod metrics;
pub mod optimizer;
pub mod provider;
mod registry;
pub mod source;
pub mod validator;

pub use cache::{CacheStats, TranslationCache, DEFAULT_NAMESPACE};
pub use dictionary::Dictionary;
pub use locale::{Locale, LocaleError};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use optimizer::{optimize, OptimizationResult, OptimizationStats, OptimizeOptions};
pub use provider::{
    Mode, NamespaceStatus, ProviderError, ProviderState, TranslationContext, TranslationProvider,
};
pub use registry::{LocaleConfig, LocaleRegistry};
pub use source::{DirectorySource, HttpSource, SourceError, TranslationSource};
pub use validator::{compare_translations, validate_namespace, validate_translations, ComparisonResult};
