//! Store state and the reducer that is the only way to change it.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{CategoryList, Post, PostId};
use crate::search::{SearchParams, SortMode};

/// How many failed mutations are remembered.
pub const FAILED_MUTATION_HISTORY: usize = 20;

/// Synchronization status of the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    /// No snapshot has arrived yet.
    #[default]
    Loading,
    /// At least one snapshot has been applied.
    Ready,
    /// The last delivery failed. Cached posts are still served.
    Error,
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreStatus::Loading => "loading",
            StoreStatus::Ready => "ready",
            StoreStatus::Error => "error",
        })
    }
}

/// Kind of remote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        })
    }
}

/// A remote write the connector rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMutation {
    pub kind: MutationKind,
    /// Target post; `None` for a create that never got a key.
    pub post_id: Option<PostId>,
    pub error: String,
    pub at: DateTime<Utc>,
}

/// Immutable view of the whole store at one point in time.
///
/// Posts sit behind an `Arc`, so cloning a snapshot never copies them.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub posts: Arc<Vec<Post>>,
    pub categories: Arc<CategoryList>,
    pub status: StoreStatus,
    pub error: Option<String>,
    pub search_query: String,
    pub selected_category: Option<String>,
    pub in_flight: usize,
    /// Most recent first.
    pub failed_mutations: Vec<FailedMutation>,
    /// Number of snapshots applied so far.
    pub revision: u64,
}

impl StoreSnapshot {
    pub fn new(categories: CategoryList) -> Self {
        Self {
            categories: Arc::new(categories),
            ..Self::default()
        }
    }

    /// Loading before the first snapshot, and while any write is in flight.
    pub fn is_loading(&self) -> bool {
        self.status == StoreStatus::Loading || self.in_flight > 0
    }

    pub fn post(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == id)
    }

    /// Search parameters built from the shared query state.
    pub fn search_params(&self, sort: SortMode) -> SearchParams {
        SearchParams {
            query: self.search_query.clone(),
            category: self.selected_category.clone(),
            sort,
        }
    }
}

/// Everything that can happen to the store.
#[derive(Debug, Clone)]
pub enum StoreAction {
    /// A new subscription started; nothing is known yet.
    Subscribed,
    /// A decoded remote snapshot, already in display order.
    SnapshotApplied(Vec<Post>),
    /// Remote delivery failed.
    DeliveryFailed(String),
    SearchQueryChanged(String),
    CategorySelected(Option<String>),
    MutationStarted,
    MutationSucceeded,
    MutationFailed(FailedMutation),
    FailedMutationsCleared,
}

/// Pure transition function: previous state plus action gives the next state.
pub fn reduce(state: &mut StoreSnapshot, action: StoreAction) {
    match action {
        StoreAction::Subscribed => {
            if state.revision == 0 {
                state.status = StoreStatus::Loading;
            }
        }
        StoreAction::SnapshotApplied(posts) => {
            state.posts = Arc::new(posts);
            state.status = StoreStatus::Ready;
            state.error = None;
            state.revision += 1;
        }
        StoreAction::DeliveryFailed(message) => {
            state.status = StoreStatus::Error;
            state.error = Some(message);
        }
        StoreAction::SearchQueryChanged(query) => {
            state.search_query = query;
        }
        StoreAction::CategorySelected(category) => {
            state.selected_category = category;
        }
        StoreAction::MutationStarted => {
            state.in_flight += 1;
        }
        StoreAction::MutationSucceeded => {
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        StoreAction::MutationFailed(failure) => {
            state.in_flight = state.in_flight.saturating_sub(1);
            state.failed_mutations.insert(0, failure);
            state.failed_mutations.truncate(FAILED_MUTATION_HISTORY);
        }
        StoreAction::FailedMutationsCleared => {
            state.failed_mutations.clear();
        }
    }
}
