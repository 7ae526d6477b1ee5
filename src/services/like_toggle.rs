//! Optimistic like toggling for a single content item.
//!
//! A toggle publishes the predicted state immediately, sends exactly one
//! confirmation request, then either adopts the server's values or restores
//! the exact pre-intent state. No path leaves the state pending.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::error::ToggleError;
use crate::models::{ContentId, LikeEvent, LikeState, TogglePhase};
use crate::transport::{LikeTransport, ToggleOutcome};

/// Owns one item's [`LikeState`] and the protocol that mutates it.
pub struct LikeToggleController {
    state: watch::Sender<LikeState>,
    transport: Arc<dyn LikeTransport>,
    timeout: Option<Duration>,
    events: Option<mpsc::UnboundedSender<LikeEvent>>,
}

impl LikeToggleController {
    pub fn new(initial: LikeState, transport: Arc<dyn LikeTransport>) -> Self {
        Self {
            state: watch::Sender::new(initial),
            transport,
            timeout: None,
            events: None,
        }
    }

    /// Bound the confirmation request; expiry counts as a transport failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send [`LikeEvent`]s to a presentation layer.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<LikeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn content_id(&self) -> ContentId {
        self.state.borrow().content_id.clone()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LikeState {
        self.state.borrow().clone()
    }

    /// Receiver that always holds the latest state, including the speculative one.
    pub fn subscribe(&self) -> watch::Receiver<LikeState> {
        self.state.subscribe()
    }

    pub fn phase(&self) -> TogglePhase {
        if self.state.borrow().pending {
            TogglePhase::AwaitingServer
        } else {
            TogglePhase::Idle
        }
    }

    /// Toggle the like.
    ///
    /// Returns the server-confirmed state, or the error that caused a rollback.
    /// Fails with [`ToggleError::Busy`] without side effects if a toggle is
    /// already in flight. If the returned future is dropped before the server
    /// answers, the state is rolled back.
    pub async fn toggle(&self) -> Result<LikeState, ToggleError> {
        let (previous, predicted) = self.begin()?;
        self.emit(LikeEvent::Predicted(predicted.clone()));

        let guard = AbandonGuard {
            controller: self,
            previous: &previous,
            armed: true,
        };
        let result = self.confirm(&predicted.content_id).await;
        guard.disarm();

        match result {
            Ok(outcome) => Ok(self.reconcile(outcome)),
            Err(err) => {
                self.rollback(&previous, err.to_string());
                Err(err)
            }
        }
    }

    /// Check the pending guard and apply the prediction in one critical section.
    fn begin(&self) -> Result<(LikeState, LikeState), ToggleError> {
        let mut transition = None;
        self.state.send_if_modified(|state| {
            if state.pending {
                return false;
            }
            let predicted = state.predicted();
            transition = Some((state.clone(), predicted.clone()));
            *state = predicted;
            true
        });

        match transition {
            Some((previous, predicted)) => {
                debug!(
                    "{}: {} -> {} (liked={}, count={})",
                    predicted.content_id,
                    TogglePhase::Predicting,
                    TogglePhase::AwaitingServer,
                    predicted.liked,
                    predicted.count
                );
                Ok((previous, predicted))
            }
            None => {
                debug!("{}: toggle rejected, request in flight", self.content_id());
                Err(ToggleError::Busy)
            }
        }
    }

    async fn confirm(&self, content_id: &ContentId) -> Result<ToggleOutcome, ToggleError> {
        let request = self.transport.toggle_like(content_id);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.map_err(|_| {
                ToggleError::TransportFailure(format!(
                    "no response within {}ms",
                    limit.as_millis()
                ))
            })?,
            None => request.await,
        }
    }

    fn reconcile(&self, outcome: ToggleOutcome) -> LikeState {
        self.state.send_modify(|state| {
            state.liked = outcome.liked;
            state.count = outcome.like_count;
            state.pending = false;
        });
        let state = self.state();
        debug!(
            "{}: {} (liked={}, count={})",
            state.content_id,
            TogglePhase::Reconciled,
            state.liked,
            state.count
        );
        self.emit(LikeEvent::Reconciled(state.clone()));
        state
    }

    fn rollback(&self, previous: &LikeState, error: String) {
        self.state.send_modify(|state| {
            state.liked = previous.liked;
            state.count = previous.count;
            state.pending = false;
        });
        let state = self.state();
        warn!(
            "{}: {} to liked={}, count={}: {}",
            state.content_id,
            TogglePhase::RolledBack,
            state.liked,
            state.count,
            error
        );
        self.emit(LikeEvent::RolledBack { state, error });
    }

    fn emit(&self, event: LikeEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

/// Rolls back if a toggle future is dropped mid-flight.
struct AbandonGuard<'a> {
    controller: &'a LikeToggleController,
    previous: &'a LikeState,
    armed: bool,
}

impl AbandonGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller
                .rollback(self.previous, "toggle abandoned before the server answered".into());
        }
    }
}
