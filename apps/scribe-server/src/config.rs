//! Application configuration loaded from environment variables.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use scribe_core::domain::CategoryList;
use scribe_core::{SnapshotOrdering, StoreConfig};

/// Which remote store connector backs the content store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemoteBackend {
    /// Process-local store, lost on restart.
    #[default]
    Memory,
    /// Realtime database over its REST interface.
    Rest,
}

impl FromStr for RemoteBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(RemoteBackend::Memory),
            "rest" | "firebase" => Ok(RemoteBackend::Rest),
            other => Err(format!("unknown remote backend '{}'", other)),
        }
    }
}

impl fmt::Display for RemoteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteBackend::Memory => write!(f, "memory"),
            RemoteBackend::Rest => write!(f, "rest"),
        }
    }
}

/// Connection settings for the remote store.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub backend: RemoteBackend,
    pub url: Option<String>,
    pub auth_token: Option<String>,
    pub poll_interval: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub remote: RemoteConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("REMOTE_BACKEND") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to the in-memory remote store");
                RemoteBackend::Memory
            }),
            None => RemoteBackend::default(),
        };

        let ordering = match lookup("SNAPSHOT_ORDERING") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Using date ordering");
                SnapshotOrdering::DateDescending
            }),
            None => SnapshotOrdering::default(),
        };

        let categories = lookup("BLOG_CATEGORIES")
            .map(|csv| CategoryList::from_csv(&csv))
            .filter(|list| !list.is_empty())
            .unwrap_or_default();

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            remote: RemoteConfig {
                backend,
                url: lookup("REMOTE_URL"),
                auth_token: lookup("REMOTE_AUTH_TOKEN"),
                poll_interval: lookup("REMOTE_POLL_INTERVAL_MS")
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(Duration::from_millis(2000)),
            },
            store: StoreConfig {
                collection_path: lookup("COLLECTION_PATH")
                    .map(|p| p.trim_matches('/').to_string())
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| "posts".to_string()),
                categories,
                ordering,
            },
        }
    }
}
