//! Page-level map from content id to its like controller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tracing::info;

use super::like_toggle::LikeToggleController;
use crate::error::RegistryError;
use crate::models::{ContentId, LikeEvent, LikeState};
use crate::transport::LikeTransport;

/// Holds one independent controller per bound content item.
///
/// Controllers share the transport (and so its connection pool) but nothing
/// else. The map lock is released before any toggle awaits the server.
pub struct LikeRegistry {
    transport: Arc<dyn LikeTransport>,
    timeout: Option<Duration>,
    events: Option<mpsc::UnboundedSender<LikeEvent>>,
    controllers: RwLock<HashMap<ContentId, Arc<LikeToggleController>>>,
}

impl LikeRegistry {
    pub fn new(transport: Arc<dyn LikeTransport>) -> Self {
        Self {
            transport,
            timeout: None,
            events: None,
            controllers: RwLock::new(HashMap::new()),
        }
    }

    /// Timeout applied to every controller bound afterwards.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Event sink shared by every controller bound afterwards.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<LikeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Bind a control with its rendered state, replacing any previous binding.
    pub async fn bind(
        &self,
        content_id: impl Into<ContentId>,
        liked: bool,
        count: u64,
    ) -> Arc<LikeToggleController> {
        let state = LikeState::new(content_id, liked, count);
        let id = state.content_id.clone();

        let mut controller = LikeToggleController::new(state, self.transport.clone());
        if let Some(timeout) = self.timeout {
            controller = controller.with_timeout(timeout);
        }
        if let Some(events) = &self.events {
            controller = controller.with_events(events.clone());
        }
        let controller = Arc::new(controller);

        let replaced = self
            .controllers
            .write()
            .await
            .insert(id.clone(), controller.clone());
        info!(
            "Bound like control for {} (liked={}, count={}{})",
            id,
            liked,
            count,
            if replaced.is_some() { ", rebound" } else { "" }
        );
        controller
    }

    pub async fn get(&self, content_id: &ContentId) -> Option<Arc<LikeToggleController>> {
        self.controllers.read().await.get(content_id).cloned()
    }

    /// Drop a binding. An in-flight toggle on it still completes.
    pub async fn unbind(&self, content_id: &ContentId) -> Option<Arc<LikeToggleController>> {
        self.controllers.write().await.remove(content_id)
    }

    pub async fn len(&self) -> usize {
        self.controllers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.controllers.read().await.is_empty()
    }

    /// Current state of every bound control, ordered by id.
    pub async fn snapshot(&self) -> Vec<LikeState> {
        let controllers = self.controllers.read().await;
        let mut states: Vec<LikeState> = controllers.values().map(|c| c.state()).collect();
        states.sort_by(|a, b| a.content_id.cmp(&b.content_id));
        states
    }

    /// Toggle the control bound to `content_id`.
    pub async fn toggle(&self, content_id: &ContentId) -> Result<LikeState, RegistryError> {
        let controller = self
            .get(content_id)
            .await
            .ok_or_else(|| RegistryError::Unbound(content_id.clone()))?;
        Ok(controller.toggle().await?)
    }
}
