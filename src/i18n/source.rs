//! Where translation files come from.
//!
//! Files live at `{locale}/{namespace}.json`, either under a local directory
//! or behind an HTTP base URL serving `/locales/...`.

use crate::i18n::dictionary::Dictionary;
use crate::retry::{fetch_json_with_retry, FetchError, RetryOptions};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid translation identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("translation file not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        match self {
            SourceError::NotFound(_) | SourceError::InvalidIdentifier(_) => true,
            SourceError::Fetch(e) => e.status() == Some(404),
            _ => false,
        }
    }
}

/// Loads one namespace of one locale.
#[async_trait]
pub trait TranslationSource: Send + Sync {
    async fn load(&self, locale: &str, namespace: &str) -> Result<Dictionary, SourceError>;
}

/// Locale and namespace identifiers end up in paths and URLs, so only
/// `[A-Za-z0-9_-]` is accepted.
pub fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn check_identifiers(locale: &str, namespace: &str) -> Result<(), SourceError> {
    for id in [locale, namespace] {
        if !is_valid_identifier(id) {
            return Err(SourceError::InvalidIdentifier(id.to_string()));
        }
    }
    Ok(())
}

/// Reads translation files from a directory tree.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, locale: &str, namespace: &str) -> PathBuf {
        self.root.join(locale).join(format!("{}.json", namespace))
    }

    /// Namespaces present for a locale, sorted. Files whose stem is not a
    /// valid identifier are skipped.
    pub async fn namespaces(&self, locale: &str) -> Result<Vec<String>, SourceError> {
        if !is_valid_identifier(locale) {
            return Err(SourceError::InvalidIdentifier(locale.to_string()));
        }
        let dir = self.root.join(locale);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SourceError::NotFound(dir.display().to_string()));
            }
            Err(source) => return Err(SourceError::Io { path: dir, source }),
        };

        let mut namespaces = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => return Err(SourceError::Io { path: dir, source }),
            };
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if is_valid_identifier(stem) {
                    namespaces.push(stem.to_string());
                }
            }
        }

        namespaces.sort();
        Ok(namespaces)
    }
}

#[async_trait]
impl TranslationSource for DirectorySource {
    async fn load(&self, locale: &str, namespace: &str) -> Result<Dictionary, SourceError> {
        check_identifiers(locale, namespace)?;
        let path = self.path_for(locale, namespace);
        debug!("Reading translation file {}", path.display());

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SourceError::NotFound(path.display().to_string()));
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };

        serde_json::from_slice(&bytes).map_err(|source| SourceError::Parse { path, source })
    }
}

/// Fetches translation files over HTTP with retries.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    retry: RetryOptions,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryOptions::translation_file(),
        }
    }

    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    pub fn url_for(&self, locale: &str, namespace: &str) -> String {
        format!("{}/locales/{}/{}.json", self.base_url, locale, namespace)
    }
}

#[async_trait]
impl TranslationSource for HttpSource {
    async fn load(&self, locale: &str, namespace: &str) -> Result<Dictionary, SourceError> {
        check_identifiers(locale, namespace)?;
        let url = self.url_for(locale, namespace);
        Ok(fetch_json_with_retry(&self.client, &url, &self.retry).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("en"));
        assert!(is_valid_identifier("blog_posts-2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("../etc"));
        assert!(!is_valid_identifier("a/b"));
        assert!(!is_valid_identifier("common.json"));
    }

    #[tokio::test]
    async fn test_directory_source_reads_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("ja")).unwrap();
        std::fs::write(dir.path().join("ja/common.json"), r#"{"nav":{"home":"ホーム"}}"#).unwrap();

        let source = DirectorySource::new(dir.path());
        let dict = source.load("ja", "common").await.unwrap();

        assert_eq!(dict["nav"]["home"], "ホーム");
    }

    #[tokio::test]
    async fn test_directory_source_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = DirectorySource::new(dir.path())
            .load("en", "absent")
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::NotFound(_)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_directory_source_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let err = DirectorySource::new(dir.path())
            .load("..", "common")
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn test_directory_source_rejects_non_object() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("en")).unwrap();
        std::fs::write(dir.path().join("en/common.json"), r#"["not", "a", "map"]"#).unwrap();

        let err = DirectorySource::new(dir.path())
            .load("en", "common")
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_directory_namespaces_lists_json_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("en")).unwrap();
        for name in ["common.json", "admin.json", "notes.txt", "bad name.json"] {
            std::fs::write(dir.path().join("en").join(name), "{}").unwrap();
        }

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.namespaces("en").await.unwrap(), vec!["admin", "common"]);
        assert!(source.namespaces("fr").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_http_source_fetches_locale_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locales/en/admin.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"title": "Admin"})),
            )
            .mount(&server)
            .await;

        let source = HttpSource::new(reqwest::Client::new(), &format!("{}/", server.uri()));
        let dict = source.load("en", "admin").await.unwrap();

        assert_eq!(dict["title"], "Admin");
    }

    #[tokio::test]
    async fn test_http_source_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSource::new(reqwest::Client::new(), &server.uri())
            .with_retry(RetryOptions::new(0, Duration::from_millis(1)));
        let err = source.load("en", "missing").await.unwrap_err();

        assert!(err.is_not_found());
    }
}
