//! Realtime-database REST connector.
//!
//! Talks to a Firebase-style JSON tree over HTTP: `POST` appends and returns
//! `{"name": key}`, `PATCH` merges, `DELETE` removes, `GET` reads a path.
//! Subscriptions poll the collection and emit a snapshot whenever it changed.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Notify, RwLock, mpsc};

use scribe_core::ports::{
    RemoteError, RemoteSnapshot, RemoteStore, SnapshotEvent, Subscription, SubscriptionId,
};

/// REST connector configuration.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Database root, e.g. `https://example-default-rtdb.firebaseio.com`.
    pub base_url: String,
    /// Sent as the `auth` query parameter when present.
    pub auth_token: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            auth_token: None,
            poll_interval: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

struct Shared {
    client: Client,
    config: RestStoreConfig,
    /// Woken after local writes so pollers refresh without waiting.
    refresh: Notify,
}

impl Shared {
    fn url(&self, path: &str) -> String {
        collection_url(&self.config.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = self
            .authorize(request)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::Rejected(format!("{}: {}", status, body.trim())))
        }
    }

    async fn fetch(&self, path: &str) -> Result<Vec<(String, Value)>, RemoteError> {
        let response = self.send(self.client.get(self.url(path))).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Serialization(e.to_string()))?;
        snapshot_entries(body)
    }
}

/// Firebase-style REST remote store.
pub struct RestRemoteStore {
    shared: Arc<Shared>,
    subscriptions: RwLock<HashMap<SubscriptionId, tokio::task::JoinHandle<()>>>,
    next_subscription: AtomicU64,
}

impl RestRemoteStore {
    pub fn new(config: RestStoreConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                client: Client::new(),
                config,
                refresh: Notify::new(),
            }),
            subscriptions: RwLock::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    async fn subscribe(&self, path: &str) -> Result<Subscription, RemoteError> {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = self.shared.clone();
        let path = path.to_string();

        let handle = tokio::spawn(async move {
            tracing::debug!(path = %path, subscription = %id, "Polling collection");
            let mut last: Option<Vec<(String, Value)>> = None;

            loop {
                let event = match shared.fetch(&path).await {
                    Ok(entries) if last.as_ref() == Some(&entries) => None,
                    Ok(entries) => {
                        last = Some(entries.clone());
                        Some(SnapshotEvent::Snapshot(RemoteSnapshot::new(&path, entries)))
                    }
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "Collection poll failed");
                        // Deliver the next successful read even if unchanged
                        last = None;
                        Some(SnapshotEvent::Error(e))
                    }
                };

                if let Some(event) = event {
                    if tx.send(event).is_err() {
                        break;
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(shared.config.poll_interval) => {}
                    _ = shared.refresh.notified() => {}
                }
            }

            tracing::info!(path = %path, subscription = %id, "Subscriber gone, polling stopped");
        });

        let mut subscriptions = self.subscriptions.write().await;
        // Poll loops whose receiver was dropped have already exited
        subscriptions.retain(|_, task| !task.is_finished());
        subscriptions.insert(id, handle);
        Ok(Subscription { id, events: rx })
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), RemoteError> {
        if let Some(handle) = self.subscriptions.write().await.remove(&id) {
            handle.abort();
            tracing::debug!(subscription = %id, "Unsubscribed from collection");
        }
        Ok(())
    }

    async fn create(&self, path: &str, record: Value) -> Result<String, RemoteError> {
        let shared = &self.shared;
        let response = shared
            .send(shared.client.post(shared.url(path)).json(&record))
            .await?;
        let pushed: PushResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Serialization(e.to_string()))?;

        shared.refresh.notify_waiters();
        Ok(pushed.name)
    }

    async fn update(&self, path: &str, id: &str, record: Value) -> Result<(), RemoteError> {
        let shared = &self.shared;
        let url = shared.url(&format!("{}/{}", path, id));
        shared.send(shared.client.patch(url).json(&record)).await?;

        shared.refresh.notify_waiters();
        Ok(())
    }

    async fn delete(&self, path: &str, id: &str) -> Result<(), RemoteError> {
        let shared = &self.shared;
        let url = shared.url(&format!("{}/{}", path, id));
        shared.send(shared.client.delete(url)).await?;

        shared.refresh.notify_waiters();
        Ok(())
    }
}

fn collection_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}.json",
        base_url.trim_end_matches('/'),
        path.trim_matches('/')
    )
}

fn map_transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_connect() || e.is_timeout() {
        RemoteError::Connection(e.to_string())
    } else {
        RemoteError::Rejected(e.to_string())
    }
}

/// Turn the JSON stored at a collection path into keyed entries.
///
/// `null` is an empty collection. Object entries come out sorted by key, which
/// for push keys is creation order. Arrays (what the database returns for
/// integer-like keys) use the index as key and skip holes.
fn snapshot_entries(body: Value) -> Result<Vec<(String, Value)>, RemoteError> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect()),
        other => Err(RemoteError::Serialization(format!(
            "expected a collection, got {}",
            other
        ))),
    }
}
