//! Session-scoped identity: whoever signed in last on this client.

use std::sync::RwLock;

use scribe_core::domain::Identity;
use scribe_core::ports::IdentityProvider;

/// Holds the signed-in identity of an interactive session.
///
/// Sign-in itself happens in the authentication service; this only remembers
/// its outcome so the content store can ask who is acting.
#[derive(Debug, Default)]
pub struct SessionIdentityProvider {
    current: RwLock<Option<Identity>>,
}

impl SessionIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            current: RwLock::new(Some(identity)),
        }
    }

    pub fn sign_in(&self, identity: Identity) {
        tracing::debug!(user_id = %identity.user_id, "Session signed in");
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(identity);
    }

    pub fn sign_out(&self) {
        if let Some(identity) = self.current.write().unwrap_or_else(|e| e.into_inner()).take() {
            tracing::debug!(user_id = %identity.user_id, "Session signed out");
        }
    }

    /// Change the display name of the signed-in identity.
    pub fn set_display_name(&self, name: impl Into<String>) {
        if let Some(identity) = self
            .current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .as_mut()
        {
            identity.display_name = Some(name.into());
        }
    }
}

impl IdentityProvider for SessionIdentityProvider {
    fn current(&self) -> Option<Identity> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_and_out() {
        let session = SessionIdentityProvider::new();
        assert!(session.current().is_none());

        session.sign_in(Identity::new("u1").with_email("amy@example.com"));
        assert_eq!(session.current().unwrap().author_name(), "amy@example.com");

        session.set_display_name("Amy");
        assert_eq!(session.current().unwrap().author_name(), "Amy");

        session.sign_out();
        assert!(session.current().is_none());
    }
}
