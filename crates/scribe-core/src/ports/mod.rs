//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod clock;
mod identity;
mod remote_store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use identity::{AuthError, IdentityProvider, TokenService};
pub use remote_store::{
    RemoteError, RemoteSnapshot, RemoteStore, SnapshotEvent, Subscription, SubscriptionId,
};
