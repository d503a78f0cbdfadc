//! Identity providers.

mod session;

pub use session::SessionIdentityProvider;
