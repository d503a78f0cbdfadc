//! # Scribe Core
//!
//! The domain layer of the Scribe blog engine.
//! This crate holds the post model, the reducer-backed content store that mirrors
//! the remote collection, and the relevance search engine. Infrastructure is only
//! reached through the traits in [`ports`].

pub mod browse;
pub mod domain;
pub mod error;
pub mod ports;
pub mod search;
pub mod store;

pub use error::{DomainError, FieldErrors, StoreError};
pub use search::{SearchParams, SortMode};
pub use store::{ContentStore, SnapshotOrdering, StoreConfig, StoreSnapshot, StoreStatus};
