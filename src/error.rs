//! Error types for the like-toggle protocol.

use thiserror::Error;

use crate::models::ContentId;

/// Why a toggle did not reconcile to a server-confirmed state.
///
/// Every kind except [`ToggleError::Busy`] is reported after the controller
/// has rolled back to the pre-intent state. `Busy` is raised before anything
/// is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    /// A toggle for the same item is already in flight.
    #[error("a toggle is already in flight")]
    Busy,

    /// The request never produced a response (connect error, timeout, body read).
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// The server answered with a failure status or `success: false`.
    #[error("server rejected the toggle{}", status_suffix(.status))]
    ServerRejected { status: Option<u16> },

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl ToggleError {
    /// Whether this error was raised after a speculative update was rolled back.
    pub fn rolled_back(&self) -> bool {
        !matches!(self, ToggleError::Busy)
    }
}

impl From<reqwest::Error> for ToggleError {
    fn from(err: reqwest::Error) -> Self {
        ToggleError::TransportFailure(err.to_string())
    }
}

/// Errors raised by [`crate::services::LikeRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no like control is bound for content {0}")]
    Unbound(ContentId),

    #[error(transparent)]
    Toggle(#[from] ToggleError),
}
