//! Per-item like state and the notifications emitted when it changes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a likeable content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier as a single percent-encoded URL path segment.
    ///
    /// `None` for ids no URL can carry as a segment: empty, `.` and `..`.
    /// URL parsing collapses those (percent-encoded or not) into the parent path.
    pub fn path_segment(&self) -> Option<String> {
        match self.0.as_str() {
            "" | "." | ".." => None,
            id => Some(urlencoding::encode(id).into_owned()),
        }
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ContentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ContentId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// What the client currently believes about one item's likes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub content_id: ContentId,
    pub liked: bool,
    pub count: u64,
    /// A confirmation request is in flight.
    pub pending: bool,
}

impl LikeState {
    /// Create an idle state as rendered by the page.
    pub fn new(content_id: impl Into<ContentId>, liked: bool, count: u64) -> Self {
        Self {
            content_id: content_id.into(),
            liked,
            count,
            pending: false,
        }
    }

    /// The speculative state for flipping `liked`.
    ///
    /// Unliking at a count of zero stays at zero.
    pub fn predicted(&self) -> Self {
        let liked = !self.liked;
        let count = if liked {
            self.count.saturating_add(1)
        } else {
            self.count.saturating_sub(1)
        };
        Self {
            content_id: self.content_id.clone(),
            liked,
            count,
            pending: true,
        }
    }

    /// `(liked, count)` as a pair, for comparisons that ignore `pending`.
    pub fn values(&self) -> (bool, u64) {
        (self.liked, self.count)
    }
}

/// Where a controller is in its toggle cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TogglePhase {
    Idle,
    Predicting,
    AwaitingServer,
    Reconciled,
    RolledBack,
}

impl TogglePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Predicting => "predicting",
            Self::AwaitingServer => "awaiting_server",
            Self::Reconciled => "reconciled",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for TogglePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeEvent {
    /// The speculative state was applied; the request is about to be sent.
    Predicted(LikeState),
    /// The server confirmed; state now holds its values.
    Reconciled(LikeState),
    /// Confirmation failed; state was restored to the pre-intent values.
    RolledBack { state: LikeState, error: String },
}

impl LikeEvent {
    pub fn state(&self) -> &LikeState {
        match self {
            Self::Predicted(state) | Self::Reconciled(state) => state,
            Self::RolledBack { state, .. } => state,
        }
    }

    pub fn phase(&self) -> TogglePhase {
        match self {
            Self::Predicted(_) => TogglePhase::AwaitingServer,
            Self::Reconciled(_) => TogglePhase::Reconciled,
            Self::RolledBack { .. } => TogglePhase::RolledBack,
        }
    }
}
