use anyhow::{bail, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "test" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => bail!("Unknown environment '{}'", other),
        }
    }

    pub fn is_development(&self) -> bool {
        *self == Environment::Development
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub port: u16,

    // Database (in-memory store when unset)
    pub database_url: Option<String>,

    // Admin panel
    pub admin_key: Option<String>,
    pub admin_email: Option<String>,

    // CORS
    pub frontend_url: Option<String>,

    // Translations
    pub locales_dir: String,
    pub translation_cache_ttl: Duration,

    // Email
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from any variable lookup; blank values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match var("APP_ENV").or_else(|| var("NODE_ENV")) {
            Some(value) => Environment::parse(&value).context("APP_ENV/NODE_ENV is invalid")?,
            None => Environment::Production,
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: var("SMTP_PORT")
                    .map(|v| v.parse())
                    .transpose()
                    .context("SMTP_PORT must be a port number")?
                    .unwrap_or(587),
                user: var("SMTP_USER"),
                pass: var("SMTP_PASS"),
                from: var("SMTP_FROM")
                    .or_else(|| var("SMTP_USER"))
                    .context("SMTP_FROM (or SMTP_USER) must be set when SMTP_HOST is set")?,
            }),
            None => None,
        };

        Ok(Self {
            environment,
            port: var("PORT")
                .map(|v| v.parse())
                .transpose()
                .context("PORT must be a port number")?
                .unwrap_or(5000),

            database_url: var("DATABASE_URL"),

            admin_key: var("ADMIN_KEY"),
            admin_email: var("ADMIN_EMAIL"),

            frontend_url: var("FRONTEND_URL"),

            locales_dir: var("LOCALES_DIR").unwrap_or_else(|| "locales".to_string()),
            translation_cache_ttl: Duration::from_secs(
                var("TRANSLATION_CACHE_TTL_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600),
            ),

            smtp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.port, 5000);
        assert!(config.database_url.is_none());
        assert!(config.admin_key.is_none());
        assert_eq!(config.locales_dir, "locales");
        assert_eq!(config.translation_cache_ttl, Duration::from_secs(3600));
        assert!(config.smtp.is_none());
    }

    #[test]
    fn test_node_env_is_accepted() {
        let config = config_from(&[("NODE_ENV", "development")]).unwrap();
        assert!(config.environment.is_development());
    }

    #[test]
    fn test_environment_names() {
        assert_eq!(Environment::Development.as_str(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::parse("dev").unwrap().as_str(), "development");
    }

    #[test]
    fn test_app_env_wins_over_node_env() {
        let config = config_from(&[("APP_ENV", "production"), ("NODE_ENV", "development")]).unwrap();
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = config_from(&[("ADMIN_KEY", "  "), ("DATABASE_URL", "")]).unwrap();
        assert!(config.admin_key.is_none());
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_smtp_settings() {
        let config = config_from(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "465"),
            ("SMTP_USER", "mailer@example.com"),
            ("SMTP_PASS", "secret"),
        ])
        .unwrap();

        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 465);
        assert_eq!(smtp.from, "mailer@example.com");
    }

    #[test]
    fn test_smtp_requires_sender() {
        assert!(config_from(&[("SMTP_HOST", "smtp.example.com")]).is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("PORT", "8123");
        std::env::set_var("LOCALES_DIR", "/srv/locales");

        let config = Config::from_env().unwrap();

        std::env::remove_var("PORT");
        std::env::remove_var("LOCALES_DIR");

        assert_eq!(config.port, 8123);
        assert_eq!(config.locales_dir, "/srv/locales");
    }
}
