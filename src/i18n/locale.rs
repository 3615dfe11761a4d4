//! Locale type: a locale code validated against the registry.

use crate::i18n::{LocaleConfig, LocaleRegistry};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocaleError {
    #[error("Unknown locale code: '{0}'")]
    Unknown(String),

    #[error("Locale '{0}' is not enabled")]
    Disabled(String),
}

/// A supported, enabled locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    code: &'static str,
}

impl Locale {
    pub const ENGLISH: Locale = Locale { code: "en" };
    pub const JAPANESE: Locale = Locale { code: "ja" };

    /// Create a Locale from a code string.
    ///
    /// # Example
    /// ```ignore
    /// let japanese = Locale::from_code("ja")?;
    /// ```
    pub fn from_code(code: &str) -> Result<Locale, LocaleError> {
        match LocaleRegistry::get().get_by_code(code) {
            Some(config) if config.enabled => Ok(Locale { code: config.code }),
            Some(_) => Err(LocaleError::Disabled(code.to_string())),
            None => Err(LocaleError::Unknown(code.to_string())),
        }
    }

    /// The default locale; also the reference for validation.
    pub fn default_locale() -> Locale {
        Locale {
            code: LocaleRegistry::get().default_locale().code,
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for values built through `from_code` or the constants.
    pub fn config(&self) -> &'static LocaleConfig {
        LocaleRegistry::get()
            .get_by_code(self.code)
            .expect("Locale code should always be valid")
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    pub fn is_default(&self) -> bool {
        self.config().is_default
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::default_locale()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_japanese() {
        let locale = Locale::from_code("ja").expect("Should succeed");
        assert_eq!(locale, Locale::JAPANESE);
        assert_eq!(locale.native_name(), "日本語");
        assert!(!locale.is_default());
    }

    #[test]
    fn test_from_code_unknown() {
        assert_eq!(
            Locale::from_code("fr"),
            Err(LocaleError::Unknown("fr".to_string()))
        );
        assert!(Locale::from_code("").is_err());
    }

    #[test]
    fn test_default_locale_is_english() {
        assert_eq!(Locale::default(), Locale::ENGLISH);
        assert!(Locale::ENGLISH.is_default());
    }

    #[test]
    fn test_display_is_code() {
        assert_eq!(Locale::JAPANESE.to_string(), "ja");
    }
}
