//! Configuration management for likeflow using the prefer crate.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::transport::http_client::DEFAULT_CSRF_HEADER;
use crate::transport::CsrfSource;

/// Where a locally run Flask portfolio listens by default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Site root the toggle endpoint hangs off.
    pub base_url: String,
    /// Custom user agent (None = default likeflow agent).
    pub user_agent: Option<String>,
    /// Request timeout in seconds. Expiry rolls the toggle back.
    pub request_timeout: u64,
    /// Header carrying the CSRF token.
    pub csrf_header: String,
    /// Where the CSRF token comes from.
    pub csrf: CsrfSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            csrf: CsrfSource::None,
        }
    }
}

impl Settings {
    /// Parsed base URL.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Reject settings no toggle could succeed with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be at least 1 second");
        }
        self.base_url()
            .map_err(|e| anyhow::anyhow!("invalid base_url {:?}: {}", self.base_url, e))?;
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Site root, e.g. "https://portfolio.example.com".
    #[serde(default)]
    pub base_url: Option<String>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// CSRF header name.
    #[serde(default)]
    pub csrf_header: Option<String>,
    /// CSRF token source.
    /// - source = "none": no token
    /// - source = "static", value = "...": fixed token
    /// - source = "meta", page = "/": read the page's csrf-token meta tag
    /// - source = "cookie", cookie = "csrftoken": read a session cookie
    #[serde(default)]
    pub csrf: Option<CsrfSource>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers likeflow config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("likeflow").await {
            Ok(pref_config) => {
                let base_url: Option<String> = pref_config.get("base_url").ok();
                let user_agent: Option<String> = pref_config.get("user_agent").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let csrf_header: Option<String> = pref_config.get("csrf_header").ok();
                let csrf: Option<CsrfSource> = pref_config.get("csrf").ok();

                Config {
                    base_url,
                    user_agent,
                    request_timeout,
                    csrf_header,
                    csrf,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref header) = self.csrf_header {
            settings.csrf_header = header.clone();
        }
        if let Some(ref csrf) = self.csrf {
            settings.csrf = csrf.clone();
        }
    }
}

/// Load settings from discovered configuration, or from an explicit file.
pub async fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::load().await,
    };
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.base_url().unwrap().as_str(), "http://localhost:5000/");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.csrf_header, "X-CSRFToken");
        assert_eq!(settings.csrf, CsrfSource::None);
    }

    #[test]
    fn test_apply_overlays_only_set_fields() {
        let config = Config::from_toml(
            r#"
            base_url = "https://folio.example.com"
            request_timeout = 5

            [csrf]
            source = "cookie"
            cookie = "csrftoken"
            "#,
        )
        .unwrap();

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);

        assert_eq!(settings.base_url, "https://folio.example.com");
        assert_eq!(settings.request_timeout, 5);
        assert_eq!(settings.csrf_header, "X-CSRFToken");
        assert_eq!(settings.user_agent, None);
        assert_eq!(
            settings.csrf,
            CsrfSource::Cookie {
                cookie: "csrftoken".to_string()
            }
        );
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_csrf_source_rejected() {
        let result = Config::from_toml(
            r#"
            [csrf]
            source = "header"
            "#,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("likeflow.toml");
        std::fs::write(
            &path,
            "base_url = \"http://127.0.0.1:8080\"\ncsrf_header = \"X-CSRF-Token\"\n",
        )
        .unwrap();

        let settings = load_settings(Some(&path)).await.unwrap();
        assert_eq!(settings.base_url, "http://127.0.0.1:8080");
        assert_eq!(settings.csrf_header, "X-CSRF-Token");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = Settings {
            request_timeout: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let settings = Settings {
            base_url: "not a url".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_settings_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("likeflow.toml");
        std::fs::write(&path, "request_timeout = 0\n").unwrap();

        assert!(load_settings(Some(&path)).await.is_err());
    }

    #[tokio::test]
    async fn test_load_settings_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(Some(&dir.path().join("nope.toml"))).await.is_err());
    }
}
