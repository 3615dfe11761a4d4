//! Locale registry: single source of truth for supported site locales.
//!
//! The registry is a lazily initialised singleton (`OnceLock`). The default
//! locale doubles as the reference locale for translation validation.

use std::sync::OnceLock;

/// Configuration for a supported locale.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// Locale identifier used in translation file paths (e.g., "en", "ja")
    pub code: &'static str,

    /// English name of the language
    pub name: &'static str,

    /// Native name of the language (e.g., "日本語")
    pub native_name: &'static str,

    /// Whether this is the default/reference locale (only one should be true)
    pub is_default: bool,

    /// Whether this locale is served
    pub enabled: bool,
}

/// Global locale registry singleton.
#[derive(Debug)]
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global locale registry instance.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry::new(default_locales()))
    }

    /// Build a registry from an explicit list (tests and tools).
    pub fn new(locales: Vec<LocaleConfig>) -> Self {
        Self { locales }
    }

    /// Get a locale configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// Get all enabled locales, in registry order.
    pub fn list_enabled(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().filter(|locale| locale.enabled).collect()
    }

    /// Get the default (reference) locale configuration.
    ///
    /// # Panics
    /// Panics if the registry does not define exactly one default locale.
    pub fn default_locale(&self) -> &LocaleConfig {
        let defaults: Vec<_> = self
            .locales
            .iter()
            .filter(|locale| locale.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default locale found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default locales found in registry"),
        }
    }

    /// Check if a locale code is supported and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|locale| locale.enabled)
            .unwrap_or(false)
    }
}

fn default_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_default: true,
            enabled: true,
        },
        LocaleConfig {
            code: "ja",
            name: "Japanese",
            native_name: "日本語",
            is_default: false,
            enabled: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LocaleRegistry::get();
        let registry2 = LocaleRegistry::get();
        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_get_by_code_japanese() {
        let config = LocaleRegistry::get().get_by_code("ja").unwrap();
        assert_eq!(config.name, "Japanese");
        assert_eq!(config.native_name, "日本語");
        assert!(!config.is_default);
        assert!(config.enabled);
    }

    #[test]
    fn test_get_by_code_nonexistent() {
        assert!(LocaleRegistry::get().get_by_code("fr").is_none());
    }

    #[test]
    fn test_list_enabled_contains_english_and_japanese() {
        let enabled = LocaleRegistry::get().list_enabled();
        let codes: Vec<_> = enabled.iter().map(|l| l.code).collect();
        assert_eq!(codes, vec!["en", "ja"]);
    }

    #[test]
    fn test_default_locale_is_english() {
        assert_eq!(LocaleRegistry::get().default_locale().code, "en");
    }

    #[test]
    fn test_disabled_locale_is_not_enabled() {
        let registry = LocaleRegistry::new(vec![
            LocaleConfig {
                code: "en",
                name: "English",
                native_name: "English",
                is_default: true,
                enabled: true,
            },
            LocaleConfig {
                code: "de",
                name: "German",
                native_name: "Deutsch",
                is_default: false,
                enabled: false,
            },
        ]);

        assert!(registry.is_enabled("en"));
        assert!(!registry.is_enabled("de"));
        assert!(!registry.is_enabled("xx"));
        assert_eq!(registry.list_enabled().len(), 1);
    }

    #[test]
    #[should_panic(expected = "No default locale")]
    fn test_default_locale_panics_without_default() {
        LocaleRegistry::new(vec![]).default_locale();
    }
}
