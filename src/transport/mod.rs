//! The seam between the controller and the toggle endpoint.
//!
//! The controller only sees [`LikeTransport`]. The HTTP implementation lives
//! in [`http_client`]; tests plug in scripted transports.

pub mod csrf;
pub mod http_client;

pub use csrf::{extract_meta_csrf_token, CsrfProvider, CsrfSource};
pub use http_client::{resolve_user_agent, HttpLikeTransport};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ToggleError;
use crate::models::ContentId;

/// A server-confirmed toggle result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub liked: bool,
    pub like_count: u64,
}

/// Sends one toggle request for a content item.
#[async_trait]
pub trait LikeTransport: Send + Sync {
    async fn toggle_like(&self, content_id: &ContentId) -> Result<ToggleOutcome, ToggleError>;
}

/// Wire shape of the toggle endpoint's JSON body.
#[derive(Debug, Deserialize)]
struct ToggleResponseBody {
    success: bool,
    #[serde(default)]
    liked: Option<bool>,
    #[serde(default)]
    like_count: Option<i64>,
}

/// Classify a toggle endpoint response.
///
/// `status` is the HTTP status code; `body` is the raw response text.
pub fn parse_toggle_response(status: u16, body: &str) -> Result<ToggleOutcome, ToggleError> {
    if !(200..300).contains(&status) {
        return Err(ToggleError::ServerRejected {
            status: Some(status),
        });
    }

    let parsed: ToggleResponseBody = serde_json::from_str(body)
        .map_err(|e| ToggleError::MalformedResponse(e.to_string()))?;

    if !parsed.success {
        return Err(ToggleError::ServerRejected { status: None });
    }

    let liked = parsed
        .liked
        .ok_or_else(|| ToggleError::MalformedResponse("missing field `liked`".to_string()))?;
    let like_count = parsed
        .like_count
        .ok_or_else(|| ToggleError::MalformedResponse("missing field `like_count`".to_string()))?;
    let like_count = u64::try_from(like_count).map_err(|_| {
        ToggleError::MalformedResponse(format!("negative like_count {}", like_count))
    })?;

    Ok(ToggleOutcome { liked, like_count })
}
