//! Content synchronization store.

mod state;
mod sync;

pub use state::{
    FAILED_MUTATION_HISTORY, FailedMutation, MutationKind, StoreAction, StoreSnapshot, StoreStatus,
    reduce,
};
pub use sync::{ContentStore, SUBSCRIPTION_CLOSED, SnapshotOrdering, StoreConfig, materialize};
