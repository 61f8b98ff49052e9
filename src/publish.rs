//! Outbound updates toward display clients.
//!
//! Publishing is fire-and-forget: the engine never blocks a sync cycle on a
//! slow or absent consumer. The wire form is a tagged envelope so clients
//! can dispatch on `kind` without inspecting the payload.

use serde::{Deserialize, Serialize};

use crate::model::{Issue, PullRequest, Snapshot};

/// One update pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Update {
    /// Account-level view: user, owned repos, starred repos.
    Snapshot(Snapshot),
    /// Combined open and closed pull requests of one repo.
    PullRequests(Vec<PullRequest>),
    /// Combined open and closed issues of one repo.
    Issues(Vec<Issue>),
}

/// Sink for outbound updates.
pub trait Publisher: Send + Sync {
    /// Deliver one update. Must not block and must not fail the caller.
    fn publish(&self, update: Update);
}

/// Publisher backed by an unbounded tokio channel.
///
/// A dropped receiver is tolerated silently; the engine keeps syncing even
/// when nobody is listening.
#[derive(Clone)]
pub struct ChannelPublisher {
    tx: tokio::sync::mpsc::UnboundedSender<Update>,
}

impl ChannelPublisher {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<Update>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Publisher for ChannelPublisher {
    fn publish(&self, update: Update) {
        let _ = self.tx.send(update);
    }
}

/// Publisher that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPublisher;

impl Publisher for NullPublisher {
    fn publish(&self, _update: Update) {}
}
