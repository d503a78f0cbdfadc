//! In-memory remote store implementation.
//!
//! Stands in for the managed realtime database in development and tests.
//! Works within a single process only; data is lost on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{RwLock, mpsc};

use scribe_core::ports::{
    RemoteError, RemoteSnapshot, RemoteStore, SnapshotEvent, Subscription, SubscriptionId,
};

struct Subscriber {
    path: String,
    sender: mpsc::UnboundedSender<SnapshotEvent>,
}

#[derive(Default)]
struct Inner {
    /// Records per collection path, in insertion (enumeration) order.
    collections: HashMap<String, Vec<(String, Value)>>,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    /// When set, every write is rejected with this reason.
    rejecting: Option<String>,
}

impl Inner {
    fn snapshot(&self, path: &str) -> RemoteSnapshot {
        let entries = self.collections.get(path).cloned().unwrap_or_default();
        RemoteSnapshot::new(path, entries)
    }

    /// Send `event` to every subscriber of `path`, dropping closed ones.
    fn notify(&mut self, path: &str, event: SnapshotEvent) {
        self.subscribers.retain(|id, sub| {
            if sub.path != path {
                return true;
            }
            match sub.sender.send(event.clone()) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!(subscription = %id, path = %path, "Dropping closed subscriber");
                    false
                }
            }
        });
    }

    fn publish(&mut self, path: &str) {
        let event = SnapshotEvent::Snapshot(self.snapshot(path));
        self.notify(path, event);
    }

    fn check_writable(&self) -> Result<(), RemoteError> {
        match &self.rejecting {
            Some(reason) => Err(RemoteError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}

/// In-memory keyed collection store with push notifications.
///
/// Every subscriber of a path receives the full collection after each change.
pub struct InMemoryRemoteStore {
    inner: RwLock<Inner>,
    next_subscription: AtomicU64,
    next_key: AtomicU64,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_subscription: AtomicU64::new(1),
            next_key: AtomicU64::new(1),
        }
    }

    /// Chronologically increasing, otherwise opaque key.
    fn generate_key(&self) -> String {
        let seq = self.next_key.fetch_add(1, Ordering::Relaxed);
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("-{:08}{}", seq, &suffix[..8])
    }

    /// Write a record directly, as another client of the database would.
    pub async fn put_record(&self, path: &str, key: &str, record: Value) {
        let mut inner = self.inner.write().await;
        let entries = inner.collections.entry(path.to_string()).or_default();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = record,
            None => entries.push((key.to_string(), record)),
        }
        inner.publish(path);
    }

    /// Current records under `path`, in enumeration order.
    pub async fn records(&self, path: &str) -> Vec<(String, Value)> {
        self.inner.read().await.snapshot(path).entries
    }

    /// Reject all writes with `reason` until [`accept_writes`](Self::accept_writes).
    pub async fn reject_writes(&self, reason: impl Into<String>) {
        self.inner.write().await.rejecting = Some(reason.into());
    }

    pub async fn accept_writes(&self) {
        self.inner.write().await.rejecting = None;
    }

    /// Deliver a failure notification to every subscriber of `path`.
    pub async fn fail_subscribers(&self, path: &str, message: impl Into<String>) {
        let event = SnapshotEvent::Error(RemoteError::Subscription(message.into()));
        self.inner.write().await.notify(path, event);
    }

    /// Send the current snapshot of `path` again.
    pub async fn republish(&self, path: &str) {
        self.inner.write().await.publish(path);
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.read().await.subscribers.len()
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn subscribe(&self, path: &str) -> Result<Subscription, RemoteError> {
        let mut inner = self.inner.write().await;

        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();

        // Initial snapshot, before any later change can be published
        tx.send(SnapshotEvent::Snapshot(inner.snapshot(path)))
            .map_err(|e| RemoteError::Subscription(e.to_string()))?;

        inner.subscribers.insert(
            id,
            Subscriber {
                path: path.to_string(),
                sender: tx,
            },
        );
        tracing::info!(path = %path, subscription = %id, "Subscribed to collection");

        Ok(Subscription { id, events: rx })
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), RemoteError> {
        if self.inner.write().await.subscribers.remove(&id).is_some() {
            tracing::info!(subscription = %id, "Unsubscribed from collection");
        }
        Ok(())
    }

    async fn create(&self, path: &str, record: Value) -> Result<String, RemoteError> {
        let mut inner = self.inner.write().await;
        inner.check_writable()?;

        let key = self.generate_key();
        inner
            .collections
            .entry(path.to_string())
            .or_default()
            .push((key.clone(), record));
        tracing::debug!(path = %path, key = %key, "Record created");

        inner.publish(path);
        Ok(key)
    }

    async fn update(&self, path: &str, id: &str, record: Value) -> Result<(), RemoteError> {
        let mut inner = self.inner.write().await;
        inner.check_writable()?;

        let existing = inner
            .collections
            .get_mut(path)
            .and_then(|entries| entries.iter_mut().find(|(k, _)| k == id))
            .map(|(_, value)| value)
            .ok_or_else(|| RemoteError::Rejected(format!("no record at {}/{}", path, id)))?;

        match (existing, record) {
            (Value::Object(current), Value::Object(changes)) => {
                for (field, value) in changes {
                    current.insert(field, value);
                }
            }
            (slot, replacement) => *slot = replacement,
        }
        tracing::debug!(path = %path, key = %id, "Record updated");

        inner.publish(path);
        Ok(())
    }

    async fn delete(&self, path: &str, id: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.write().await;
        inner.check_writable()?;

        let removed = match inner.collections.get_mut(path) {
            Some(entries) => {
                let before = entries.len();
                entries.retain(|(k, _)| k != id);
                entries.len() != before
            }
            None => false,
        };

        if removed {
            tracing::debug!(path = %path, key = %id, "Record deleted");
            inner.publish(path);
        }
        Ok(())
    }
}
