//! Translation completeness validation.
//!
//! Every non-default locale is compared key-by-key against the default
//! locale. A locale whose file cannot be loaded is reported as invalid rather
//! than aborting the run.

use crate::i18n::cache::DEFAULT_NAMESPACE;
use crate::i18n::dictionary::{flat_keys, Dictionary};
use crate::i18n::source::{SourceError, TranslationSource};
use crate::i18n::LocaleRegistry;
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Sentinel missing key reported for a locale whose file failed to load.
pub const LOAD_FAILURE_KEY: &str = "Failed to load translation file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub missing_keys: Vec<String>,
    pub extra_keys: Vec<String>,
    pub is_valid: bool,
}

impl ComparisonResult {
    fn load_failure() -> Self {
        Self {
            missing_keys: vec![LOAD_FAILURE_KEY.to_string()],
            extra_keys: Vec::new(),
            is_valid: false,
        }
    }
}

/// Diff the flattened key sets of `target` against `reference`.
pub fn compare_translations(reference: &Dictionary, target: &Dictionary) -> ComparisonResult {
    let reference_keys = flat_keys(reference);
    let target_keys = flat_keys(target);

    let reference_set: HashSet<&String> = reference_keys.iter().collect();
    let target_set: HashSet<&String> = target_keys.iter().collect();

    let missing_keys: Vec<String> = reference_keys
        .iter()
        .filter(|key| !target_set.contains(key))
        .cloned()
        .collect();
    let extra_keys: Vec<String> = target_keys
        .iter()
        .filter(|key| !reference_set.contains(key))
        .cloned()
        .collect();

    let is_valid = missing_keys.is_empty() && extra_keys.is_empty();
    ComparisonResult {
        missing_keys,
        extra_keys,
        is_valid,
    }
}

/// Validate the `common` namespace of every enabled locale.
pub async fn validate_translations<S>(
    source: &S,
    registry: &LocaleRegistry,
) -> Result<BTreeMap<String, ComparisonResult>, SourceError>
where
    S: TranslationSource + ?Sized,
{
    validate_namespace(source, registry, DEFAULT_NAMESPACE).await
}

/// Validate one namespace of every enabled locale against the default
/// locale. Fails only when the reference file itself cannot be loaded.
pub async fn validate_namespace<S>(
    source: &S,
    registry: &LocaleRegistry,
    namespace: &str,
) -> Result<BTreeMap<String, ComparisonResult>, SourceError>
where
    S: TranslationSource + ?Sized,
{
    let reference_locale = registry.default_locale().code;
    let reference = source.load(reference_locale, namespace).await?;

    let targets: Vec<&str> = registry
        .list_enabled()
        .into_iter()
        .map(|locale| locale.code)
        .filter(|code| *code != reference_locale)
        .collect();

    let loads = join_all(targets.iter().map(|code| source.load(code, namespace))).await;

    let mut results = BTreeMap::new();
    for (code, loaded) in targets.into_iter().zip(loads) {
        let result = match loaded {
            Ok(target) => compare_translations(&reference, &target),
            Err(e) => {
                warn!("Could not load {}/{} for validation: {}", code, namespace, e);
                ComparisonResult::load_failure()
            }
        };

        if result.is_valid {
            info!("Translations for {}/{} are complete", code, namespace);
        } else {
            warn!(
                "Translations for {}/{}: {} missing, {} extra",
                code,
                namespace,
                result.missing_keys.len(),
                result.extra_keys.len()
            );
        }
        results.insert(code.to_string(), result);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::source::DirectorySource;
    use crate::i18n::LocaleConfig;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn dict(value: Value) -> Dictionary {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    fn three_locale_registry() -> LocaleRegistry {
        let locale = |code, is_default| LocaleConfig {
            code,
            name: code,
            native_name: code,
            is_default,
            enabled: true,
        };
        LocaleRegistry::new(vec![locale("en", true), locale("ja", false), locale("ko", false)])
    }

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_compare_reports_missing_and_extra() {
        let reference = dict(json!({ "nav": { "home": "Home", "blog": "Blog" }, "title": "T" }));
        let target = dict(json!({ "nav": { "home": "ホーム", "shop": "店" }, "title": "T" }));

        let result = compare_translations(&reference, &target);

        assert_eq!(result.missing_keys, vec!["nav.blog"]);
        assert_eq!(result.extra_keys, vec!["nav.shop"]);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_compare_sorted_output() {
        let reference = dict(json!({ "z": "1", "b": "2", "a": "3" }));
        let result = compare_translations(&reference, &Dictionary::new());
        assert_eq!(result.missing_keys, vec!["a", "b", "z"]);
    }

    proptest! {
        #[test]
        fn prop_compare_with_self_is_valid(keys in prop::collection::vec("[a-z]{1,4}(\\.[a-z]{1,4}){0,2}", 0..12)) {
            let pairs = keys.into_iter().map(|k| (k, Value::String("v".to_string())));
            let d = crate::i18n::dictionary::unflatten(pairs);

            let result = compare_translations(&d, &d);
            prop_assert!(result.is_valid);
            prop_assert!(result.missing_keys.is_empty());
            prop_assert!(result.extra_keys.is_empty());
        }
    }

    #[tokio::test]
    async fn test_validate_translations_isolates_load_failures() {
        let dir = TempDir::new().unwrap();
        write(&dir, "en/common.json", r#"{"nav":{"home":"Home"}}"#);
        write(&dir, "ja/common.json", r#"{"nav":{"home":"ホーム"}}"#);
        write(&dir, "ko/common.json", "{ broken");

        let results = validate_translations(&DirectorySource::new(dir.path()), &three_locale_registry())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results["ja"].is_valid);
        assert_eq!(results["ko"].missing_keys, vec![LOAD_FAILURE_KEY]);
        assert!(!results["ko"].is_valid);
        assert!(!results.contains_key("en"));
    }

    #[tokio::test]
    async fn test_validate_fails_without_reference() {
        let dir = TempDir::new().unwrap();
        write(&dir, "ja/common.json", "{}");

        let result = validate_translations(&DirectorySource::new(dir.path()), &three_locale_registry()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_validate_namespace() {
        let dir = TempDir::new().unwrap();
        write(&dir, "en/admin.json", r#"{"login":"Log in","logout":"Log out"}"#);
        write(&dir, "ja/admin.json", r#"{"login":"ログイン"}"#);
        write(&dir, "ko/admin.json", r#"{"login":"로그인","logout":"로그아웃"}"#);

        let results = validate_namespace(&DirectorySource::new(dir.path()), &three_locale_registry(), "admin")
            .await
            .unwrap();

        assert_eq!(results["ja"].missing_keys, vec!["logout"]);
        assert!(results["ko"].is_valid);
    }
}
