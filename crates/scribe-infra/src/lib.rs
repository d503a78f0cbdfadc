//! # Scribe Infrastructure
//!
//! Concrete implementations of the ports defined in `scribe-core`.
//! This crate contains the remote store connectors and identity adapters.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `auth` - JWT bearer tokens
//! - `rest` - Realtime-database REST connector via reqwest

pub mod identity;
pub mod remote;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use identity::SessionIdentityProvider;
pub use remote::InMemoryRemoteStore;

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

#[cfg(feature = "rest")]
pub use remote::{RestRemoteStore, RestStoreConfig};
