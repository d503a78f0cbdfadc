//! Identity ports - the "current user" capability and token handling.

use crate::domain::Identity;

/// Source of the acting identity.
///
/// Authentication itself happens elsewhere; the store only asks who is acting.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in identity, or `None` for anonymous callers.
    fn current(&self) -> Option<Identity>;
}

impl IdentityProvider for Identity {
    fn current(&self) -> Option<Identity> {
        Some(self.clone())
    }
}

impl IdentityProvider for Option<Identity> {
    fn current(&self) -> Option<Identity> {
        self.clone()
    }
}

/// Token service trait for bearer token operations.
pub trait TokenService: Send + Sync {
    /// Issue a token carrying `identity`.
    fn generate_token(&self, identity: &Identity) -> Result<String, AuthError>;

    /// Validate a token and recover the identity it carries.
    fn validate_token(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,
}
