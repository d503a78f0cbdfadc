//! Remote store connectors.

mod memory;

pub use memory::InMemoryRemoteStore;

#[cfg(feature = "rest")]
mod rest;
#[cfg(feature = "rest")]
pub use self::rest::{RestRemoteStore, RestStoreConfig};
