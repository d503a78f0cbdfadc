//! Remote store port - abstraction over the managed realtime database.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// Handle identifying one live subscription on a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Full point-in-time view of a remote collection.
///
/// Entries keep the connector's enumeration order. Each record is the flat
/// keyed object stored under `key`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub path: String,
    pub entries: Vec<(String, Value)>,
}

impl RemoteSnapshot {
    pub fn new(path: impl Into<String>, entries: Vec<(String, Value)>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Notification delivered on a subscription channel.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    Snapshot(RemoteSnapshot),
    Error(RemoteError),
}

/// A live subscription: its id (for cancellation) and its event channel.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: mpsc::UnboundedReceiver<SnapshotEvent>,
}

/// Remote store trait - a keyed collection with push-based change notification.
///
/// Writes resolve when the connector accepted them. Their effect becomes
/// visible to subscribers only through a later snapshot.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Subscribe to a collection path. The first event is the current snapshot.
    async fn subscribe(&self, path: &str) -> Result<Subscription, RemoteError>;

    /// Cancel a subscription. Unknown or already cancelled ids are ignored.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), RemoteError>;

    /// Append a record and return the key the store assigned to it.
    async fn create(&self, path: &str, record: Value) -> Result<String, RemoteError>;

    /// Merge `record` into the record stored under `id`.
    async fn update(&self, path: &str, id: &str, record: Value) -> Result<(), RemoteError>;

    /// Remove the record stored under `id`.
    async fn delete(&self, path: &str, id: &str) -> Result<(), RemoteError>;
}

/// Remote store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Subscription failed: {0}")]
    Subscription(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}
