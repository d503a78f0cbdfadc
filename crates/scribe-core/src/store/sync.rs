//! The content store: one subscription, one reducer, many readers.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::state::{FailedMutation, MutationKind, StoreAction, StoreSnapshot, reduce};
use crate::domain::{CategoryList, Post, PostDraft, PostId, PostRecord};
use crate::error::{DomainError, StoreError};
use crate::ports::{
    Clock, IdentityProvider, RemoteError, RemoteSnapshot, RemoteStore, SnapshotEvent,
    SubscriptionId, SystemClock,
};

/// Error recorded when the remote store ends a subscription on its own.
pub const SUBSCRIPTION_CLOSED: &str = "subscription closed";

/// How a remote snapshot is turned into display order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotOrdering {
    /// Newest date first; posts sharing a date keep reverse enumeration order.
    #[default]
    DateDescending,
    /// Reverse of the connector's enumeration order, dates ignored.
    ReverseEnumeration,
}

impl FromStr for SnapshotOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" | "date_desc" => Ok(SnapshotOrdering::DateDescending),
            "reverse" | "enumeration" => Ok(SnapshotOrdering::ReverseEnumeration),
            other => Err(format!("unknown snapshot ordering '{}'", other)),
        }
    }
}

/// Content store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Remote collection holding the posts.
    pub collection_path: String,
    pub categories: CategoryList,
    pub ordering: SnapshotOrdering,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection_path: "posts".to_string(),
            categories: CategoryList::default(),
            ordering: SnapshotOrdering::default(),
        }
    }
}

struct Listener {
    id: SubscriptionId,
    task: JoinHandle<()>,
}

/// Local mirror of the remote post collection.
///
/// Every change, local or remote, goes through [`reduce`]. Readers get whole
/// [`StoreSnapshot`] values and never observe a half-applied update.
///
/// Writes are forwarded to the remote store and become visible only when the
/// next snapshot notification arrives.
pub struct ContentStore {
    remote: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    state: Arc<watch::Sender<StoreSnapshot>>,
    listener: Mutex<Option<Listener>>,
}

impl fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ContentStore {
    pub fn new(remote: Arc<dyn RemoteStore>, config: StoreConfig) -> Self {
        Self::with_clock(remote, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        remote: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        config: StoreConfig,
    ) -> Self {
        let (state, _) = watch::channel(StoreSnapshot::new(config.categories.clone()));
        Self {
            remote,
            clock,
            config,
            state: Arc::new(state),
            listener: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Start mirroring the remote collection.
    ///
    /// Only one subscription lives per store; calls while it is live are
    /// no-ops. A subscription the remote store closed is replaced.
    pub async fn subscribe(&self) -> Result<(), StoreError> {
        let mut listener = self.listener.lock().await;
        if let Some(live) = listener.as_ref().filter(|l| !l.task.is_finished()) {
            tracing::warn!(subscription = %live.id, "Store already subscribed");
            return Ok(());
        }
        if let Some(closed) = listener.take() {
            tracing::info!(subscription = %closed.id, "Replacing closed subscription");
            if let Err(e) = self.remote.unsubscribe(closed.id).await {
                tracing::warn!(subscription = %closed.id, error = %e, "Failed to unsubscribe");
            }
        }

        self.dispatch(StoreAction::Subscribed);

        let path = self.config.collection_path.clone();
        let subscription = match self.remote.subscribe(&path).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to subscribe to collection");
                self.dispatch(StoreAction::DeliveryFailed(e.to_string()));
                return Err(e.into());
            }
        };

        let id = subscription.id;
        let mut events = subscription.events;
        let state = self.state.clone();
        let ordering = self.config.ordering;

        let task = tokio::spawn(async move {
            tracing::info!(path = %path, subscription = %id, "Subscribed to collection");

            while let Some(event) = events.recv().await {
                match event {
                    SnapshotEvent::Snapshot(snapshot) => {
                        let posts = materialize(snapshot, ordering);
                        tracing::debug!(path = %path, posts = posts.len(), "Snapshot received");
                        state.send_modify(|s| reduce(s, StoreAction::SnapshotApplied(posts)));
                    }
                    SnapshotEvent::Error(e) => {
                        tracing::warn!(path = %path, error = %e, "Snapshot delivery failed");
                        state.send_modify(|s| reduce(s, StoreAction::DeliveryFailed(e.to_string())));
                    }
                }
            }

            // Reached only when the remote store dropped the channel
            tracing::warn!(path = %path, subscription = %id, "Subscription closed by remote store");
            state.send_modify(|s| {
                reduce(s, StoreAction::DeliveryFailed(SUBSCRIPTION_CLOSED.to_string()))
            });
        });

        *listener = Some(Listener { id, task });
        Ok(())
    }

    /// Cancel the subscription. Safe to call more than once.
    ///
    /// This is the teardown to use. Dropping a subscribed store only schedules
    /// the unsubscribe, and only when a tokio runtime is running.
    pub async fn shutdown(&self) {
        let Some(listener) = self.listener.lock().await.take() else {
            return;
        };

        listener.task.abort();
        if let Err(e) = self.remote.unsubscribe(listener.id).await {
            tracing::warn!(subscription = %listener.id, error = %e, "Failed to unsubscribe");
        }
        tracing::info!(subscription = %listener.id, "Store shut down");
    }

    /// Whether a subscription is live. False once the remote store closed it.
    pub async fn is_subscribed(&self) -> bool {
        self.listener
            .lock()
            .await
            .as_ref()
            .is_some_and(|listener| !listener.task.is_finished())
    }

    /// Current state of the store.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn watch(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    pub fn post(&self, id: &PostId) -> Option<Post> {
        self.state.borrow().post(id).cloned()
    }

    /// Validate `draft` and ask the remote store to create it.
    ///
    /// Author, author id and date come from `actor` and the clock. The returned
    /// key is not readable from the store until a snapshot containing it lands.
    pub async fn add_post(
        &self,
        actor: &dyn IdentityProvider,
        draft: PostDraft,
    ) -> Result<PostId, StoreError> {
        let identity = actor.current().ok_or(DomainError::Unauthenticated)?;
        draft.validate(&self.config.categories)?;

        let record = draft.into_record(&identity, self.clock.today());
        let value = encode(&record)?;

        let key = self
            .track(
                MutationKind::Create,
                None,
                self.remote.create(&self.config.collection_path, value),
            )
            .await?;

        tracing::info!(post_id = %key, author_id = %identity.user_id, "Post created");
        Ok(PostId::new(key))
    }

    /// Replace the editable fields of post `id` with `draft`.
    pub async fn update_post(
        &self,
        actor: &dyn IdentityProvider,
        id: &PostId,
        draft: PostDraft,
    ) -> Result<(), StoreError> {
        let identity = actor.current().ok_or(DomainError::Unauthenticated)?;
        draft.validate(&self.config.categories)?;

        let existing = self.post(id).ok_or_else(|| DomainError::NotFound {
            entity_type: "post",
            id: id.to_string(),
        })?;
        let value = encode(&existing.with_edits(draft).to_record())?;

        self.track(
            MutationKind::Update,
            Some(id),
            self.remote
                .update(&self.config.collection_path, id.as_str(), value),
        )
        .await?;

        tracing::info!(post_id = %id, editor_id = %identity.user_id, "Post updated");
        Ok(())
    }

    /// Ask the remote store to delete post `id`.
    pub async fn delete_post(
        &self,
        actor: &dyn IdentityProvider,
        id: &PostId,
    ) -> Result<(), StoreError> {
        let identity = actor.current().ok_or(DomainError::Unauthenticated)?;

        self.track(
            MutationKind::Delete,
            Some(id),
            self.remote.delete(&self.config.collection_path, id.as_str()),
        )
        .await?;

        tracing::info!(post_id = %id, editor_id = %identity.user_id, "Post deleted");
        Ok(())
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.dispatch(StoreAction::SearchQueryChanged(query.into()));
    }

    pub fn set_selected_category(&self, category: Option<String>) {
        self.dispatch(StoreAction::CategorySelected(category));
    }

    pub fn clear_failed_mutations(&self) {
        self.dispatch(StoreAction::FailedMutationsCleared);
    }

    fn dispatch(&self, action: StoreAction) {
        self.state.send_modify(|state| reduce(state, action));
    }

    async fn track<T>(
        &self,
        kind: MutationKind,
        post_id: Option<&PostId>,
        request: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, StoreError> {
        self.dispatch(StoreAction::MutationStarted);

        match request.await {
            Ok(value) => {
                self.dispatch(StoreAction::MutationSucceeded);
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(kind = %kind, post_id = ?post_id, error = %e, "Remote write rejected");
                self.dispatch(StoreAction::MutationFailed(FailedMutation {
                    kind,
                    post_id: post_id.cloned(),
                    error: e.to_string(),
                    at: Utc::now(),
                }));
                Err(e.into())
            }
        }
    }
}

impl Drop for ContentStore {
    fn drop(&mut self) {
        let Some(listener) = self.listener.get_mut().take() else {
            return;
        };
        listener.task.abort();

        let id = listener.id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let remote = self.remote.clone();
                handle.spawn(async move {
                    if let Err(e) = remote.unsubscribe(id).await {
                        tracing::warn!(subscription = %id, error = %e, "Failed to unsubscribe");
                    }
                });
                tracing::debug!(subscription = %id, "Store dropped while subscribed");
            }
            Err(_) => {
                tracing::warn!(subscription = %id, "Store dropped outside a runtime; subscription left open");
            }
        }
    }
}

fn encode(record: &PostRecord) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(record).map_err(|e| RemoteError::Serialization(e.to_string()).into())
}

/// Decode a remote snapshot into posts in display order.
///
/// Records that do not decode are skipped.
pub fn materialize(snapshot: RemoteSnapshot, ordering: SnapshotOrdering) -> Vec<Post> {
    let mut posts: Vec<Post> = Vec::with_capacity(snapshot.entries.len());

    for (key, value) in snapshot.entries {
        match serde_json::from_value::<PostRecord>(value) {
            Ok(record) => posts.push(Post::from_record(PostId::new(key), record)),
            Err(e) => {
                tracing::warn!(path = %snapshot.path, key = %key, error = %e, "Skipping malformed post record");
            }
        }
    }

    posts.reverse();
    if ordering == SnapshotOrdering::DateDescending {
        posts.sort_by(|a, b| b.date.cmp(&a.date));
    }
    posts
}
