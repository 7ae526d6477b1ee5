//! Test transports for driving the toggle protocol.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use likeflow::{ContentId, LikeTransport, ToggleError, ToggleOutcome};

pub fn confirmed(liked: bool, like_count: u64) -> Result<ToggleOutcome, ToggleError> {
    Ok(ToggleOutcome { liked, like_count })
}

/// Replies from a queue, immediately.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ToggleOutcome, ToggleError>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<ToggleOutcome, ToggleError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LikeTransport for ScriptedTransport {
    async fn toggle_like(&self, _: &ContentId) -> Result<ToggleOutcome, ToggleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ToggleError::TransportFailure("script exhausted".into())))
    }
}

/// Holds every request until the test answers it.
pub struct GatedTransport {
    started: mpsc::UnboundedSender<ContentId>,
    replies: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<ToggleOutcome, ToggleError>>>,
    calls: AtomicUsize,
}

/// The test's side of a [`GatedTransport`].
pub struct Server {
    started: mpsc::UnboundedReceiver<ContentId>,
    replies: mpsc::UnboundedSender<Result<ToggleOutcome, ToggleError>>,
}

impl GatedTransport {
    pub fn new() -> (Arc<Self>, Server) {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            started: started_tx,
            replies: tokio::sync::Mutex::new(reply_rx),
            calls: AtomicUsize::new(0),
        });
        let server = Server {
            started: started_rx,
            replies: reply_tx,
        };
        (transport, server)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LikeTransport for GatedTransport {
    async fn toggle_like(&self, content_id: &ContentId) -> Result<ToggleOutcome, ToggleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.started.send(content_id.clone());
        self.replies
            .lock()
            .await
            .recv()
            .await
            .unwrap_or_else(|| Err(ToggleError::TransportFailure("server gone".into())))
    }
}

impl Server {
    /// Wait until a request reaches the transport.
    pub async fn next_request(&mut self) -> ContentId {
        self.started.recv().await.unwrap()
    }

    pub fn reply(&self, reply: Result<ToggleOutcome, ToggleError>) {
        self.replies.send(reply).unwrap();
    }
}
