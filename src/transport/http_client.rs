//! HTTP transport for the toggle endpoint.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::csrf::{extract_meta_csrf_token, CsrfProvider, CsrfSource};
use super::{parse_toggle_response, LikeTransport, ToggleOutcome};
use crate::config::Settings;
use crate::error::ToggleError;
use crate::models::ContentId;

const USER_AGENT: &str = "likeflow/0.1";

/// Header the portfolio's Flask-WTF setup reads the token from.
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";

/// Resolve user agent from config value.
/// - None => default likeflow user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    config.unwrap_or(USER_AGENT).to_string()
}

/// Toggle transport over `reqwest`, with a session cookie jar.
#[derive(Clone)]
pub struct HttpLikeTransport {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
    csrf: CsrfProvider,
    csrf_header: String,
}

impl HttpLikeTransport {
    /// Create a transport with no CSRF token.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, reqwest::Error> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent_config))
            .timeout(timeout)
            .cookie_provider(jar.clone())
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            jar,
            csrf: CsrfProvider::None,
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
        })
    }

    /// Build a transport from settings, resolving the CSRF source.
    ///
    /// A `meta` source fetches its page once here; the token is reused for
    /// every toggle afterwards.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let transport = Self::new(
            settings.base_url()?,
            settings.request_timeout(),
            settings.user_agent.as_deref(),
        )?
        .with_csrf_header(&settings.csrf_header);

        let provider = transport.resolve_csrf(&settings.csrf).await?;
        Ok(transport.with_csrf(provider))
    }

    pub fn with_csrf(mut self, csrf: CsrfProvider) -> Self {
        self.csrf = csrf;
        self
    }

    pub fn with_csrf_header(mut self, header: &str) -> Self {
        self.csrf_header = header.to_string();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The session cookie jar shared by every request from this transport.
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    /// The token the next toggle would send.
    pub fn current_csrf_token(&self) -> Option<String> {
        self.csrf.token(&self.jar, &self.base_url)
    }

    /// Endpoint URL for one content item.
    ///
    /// Ids that cannot stay a single path segment fail before anything is sent.
    pub fn toggle_url(&self, content_id: &ContentId) -> Result<Url, ToggleError> {
        let segment = content_id.path_segment().ok_or_else(|| {
            ToggleError::TransportFailure(format!(
                "content id {:?} cannot be used as a path segment",
                content_id.as_str()
            ))
        })?;
        let base = self.base_url.as_str().trim_end_matches('/');
        let raw = format!("{}/toggle_like/{}", base, segment);
        Url::parse(&raw).map_err(|e| ToggleError::TransportFailure(format!("{}: {}", raw, e)))
    }

    /// Turn a configured source into a provider.
    pub async fn resolve_csrf(&self, source: &CsrfSource) -> anyhow::Result<CsrfProvider> {
        let provider = match source {
            CsrfSource::None => CsrfProvider::None,
            CsrfSource::Static { value } => CsrfProvider::Fixed(value.clone()),
            CsrfSource::Cookie { cookie } => CsrfProvider::Cookie(cookie.clone()),
            CsrfSource::Meta { page } => match self.fetch_meta_token(page).await? {
                Some(token) => CsrfProvider::Fixed(token),
                None => {
                    warn!("No csrf-token meta tag on {}, sending toggles without one", page);
                    CsrfProvider::None
                }
            },
        };
        Ok(provider)
    }

    /// GET a page (relative to the base URL) and read its CSRF meta tag.
    ///
    /// Cookies the page sets land in the jar, so the session that issued the
    /// token is the one the toggle request carries.
    pub async fn fetch_meta_token(&self, page: &str) -> anyhow::Result<Option<String>> {
        let url = self.base_url.join(page)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        let html = response.text().await?;
        debug!("Fetched {} for CSRF token ({} bytes)", url, html.len());
        Ok(extract_meta_csrf_token(&html))
    }
}

#[async_trait]
impl LikeTransport for HttpLikeTransport {
    async fn toggle_like(&self, content_id: &ContentId) -> Result<ToggleOutcome, ToggleError> {
        let url = self.toggle_url(content_id)?;

        let mut request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(token) = self.csrf.token(&self.jar, &url) {
            request = request.header(self.csrf_header.as_str(), token);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(
            "POST {} -> {} in {}ms",
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        parse_toggle_response(status.as_u16(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpLikeTransport {
        HttpLikeTransport::new(Url::parse(base).unwrap(), Duration::from_secs(5), None).unwrap()
    }

    #[test]
    fn test_resolve_user_agent_default() {
        let ua = resolve_user_agent(None);
        assert!(ua.contains("likeflow"));
    }

    #[test]
    fn test_resolve_user_agent_custom() {
        assert_eq!(resolve_user_agent(Some("MyBot/1.0")), "MyBot/1.0");
    }

    #[test]
    fn test_toggle_url() {
        let t = transport("http://portfolio.test");
        let url = t.toggle_url(&ContentId::new("42")).unwrap();
        assert_eq!(url.as_str(), "http://portfolio.test/toggle_like/42");
    }

    #[test]
    fn test_toggle_url_keeps_base_path() {
        let t = transport("http://portfolio.test/app/");
        let url = t.toggle_url(&ContentId::new("42")).unwrap();
        assert_eq!(url.path(), "/app/toggle_like/42");
    }

    #[test]
    fn test_toggle_url_encodes_segment() {
        let t = transport("http://portfolio.test");
        let url = t.toggle_url(&ContentId::new("a/b?c")).unwrap();
        assert_eq!(url.path(), "/toggle_like/a%2Fb%3Fc");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_toggle_url_rejects_dot_segments() {
        let t = transport("http://portfolio.test");
        for id in ["..", ".", ""] {
            let err = t.toggle_url(&ContentId::new(id)).unwrap_err();
            assert!(matches!(err, ToggleError::TransportFailure(_)), "id {:?}", id);
        }
    }

    #[test]
    fn test_toggle_url_allows_dotted_ids() {
        let t = transport("http://portfolio.test");
        let url = t.toggle_url(&ContentId::new("...")).unwrap();
        assert_eq!(url.path(), "/toggle_like/...");
        let url = t.toggle_url(&ContentId::new("v1.2")).unwrap();
        assert_eq!(url.path(), "/toggle_like/v1.2");
    }

    #[test]
    fn test_current_csrf_token() {
        let t = transport("http://portfolio.test").with_csrf(CsrfProvider::Fixed("tok".into()));
        assert_eq!(t.current_csrf_token(), Some("tok".to_string()));
    }
}
