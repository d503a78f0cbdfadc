//! Application state - shared across all handlers.

use std::sync::Arc;

use scribe_core::ContentStore;
use scribe_core::ports::{RemoteStore, TokenService};
use scribe_infra::InMemoryRemoteStore;

use crate::config::{AppConfig, RemoteBackend, RemoteConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    /// `None` when built without token authentication; writes are then refused.
    pub tokens: Option<Arc<dyn TokenService>>,
}

impl AppState {
    /// Build the application state with the configured implementations.
    ///
    /// The store is not subscribed yet.
    pub fn new(config: &AppConfig) -> Self {
        let remote = build_remote(&config.remote);
        let store = Arc::new(ContentStore::new(remote, config.store.clone()));

        tracing::info!(
            backend = %config.remote.backend,
            collection = %config.store.collection_path,
            ordering = ?config.store.ordering,
            categories = config.store.categories.len(),
            "Application state initialized"
        );

        Self::from_parts(store, build_token_service())
    }

    pub fn from_parts(store: Arc<ContentStore>, tokens: Option<Arc<dyn TokenService>>) -> Self {
        Self { store, tokens }
    }
}

fn build_remote(config: &RemoteConfig) -> Arc<dyn RemoteStore> {
    match config.backend {
        RemoteBackend::Memory => {
            tracing::warn!("Using the in-memory remote store. Posts are lost on restart.");
            Arc::new(InMemoryRemoteStore::new())
        }
        #[cfg(feature = "rest")]
        RemoteBackend::Rest => {
            use scribe_infra::{RestRemoteStore, RestStoreConfig};

            let defaults = RestStoreConfig::default();
            let rest = RestStoreConfig {
                base_url: config.url.clone().unwrap_or(defaults.base_url),
                auth_token: config.auth_token.clone(),
                poll_interval: config.poll_interval,
                ..defaults
            };
            tracing::info!(url = %rest.base_url, "Using the REST remote store");
            Arc::new(RestRemoteStore::new(rest))
        }
        #[cfg(not(feature = "rest"))]
        RemoteBackend::Rest => {
            tracing::error!("REST backend requested but the rest feature is disabled. Using in-memory store.");
            Arc::new(InMemoryRemoteStore::new())
        }
    }
}

#[cfg(feature = "auth")]
fn build_token_service() -> Option<Arc<dyn TokenService>> {
    Some(Arc::new(scribe_infra::JwtTokenService::from_env()))
}

#[cfg(not(feature = "auth"))]
fn build_token_service() -> Option<Arc<dyn TokenService>> {
    tracing::warn!("Token authentication disabled. Write endpoints will refuse every request.");
    None
}
