//! Anti-forgery token sources.
//!
//! The token is opaque: it is read from wherever the site publishes it and
//! forwarded in a request header without inspection.

use reqwest::cookie::{CookieStore, Jar};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Where the CSRF token comes from, as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, prefer::FromValue)]
#[serde(tag = "source", rename_all = "snake_case")]
#[prefer(tag = "source")]
pub enum CsrfSource {
    /// Send no token.
    #[default]
    #[prefer(rename = "none")]
    None,
    /// A fixed token value.
    #[prefer(rename = "static")]
    Static { value: String },
    /// Fetch a page and read `<meta name="csrf-token" content="...">`.
    /// Relative paths resolve against the base URL.
    #[prefer(rename = "meta")]
    Meta { page: String },
    /// Read the named cookie from the session cookie jar on every request.
    #[prefer(rename = "cookie")]
    Cookie { cookie: String },
}

/// A resolved token supplier attached to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsrfProvider {
    None,
    Fixed(String),
    Cookie(String),
}

impl CsrfProvider {
    /// Current token value, if any.
    pub fn token(&self, jar: &Jar, url: &Url) -> Option<String> {
        match self {
            Self::None => None,
            Self::Fixed(value) => Some(value.clone()),
            Self::Cookie(name) => cookie_value(jar, url, name),
        }
    }
}

/// Read `<meta name="csrf-token">` from an HTML page.
///
/// Returns `None` when the tag or its `content` attribute is absent.
pub fn extract_meta_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="csrf-token"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.to_string())
}

/// Find a cookie by name in the jar's `Cookie` header for `url`.
fn cookie_value(jar: &Jar, url: &Url, name: &str) -> Option<String> {
    let header = jar.cookies(url)?;
    let header = header.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
