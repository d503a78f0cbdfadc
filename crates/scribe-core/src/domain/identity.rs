use serde::{Deserialize, Serialize};

/// Author name used when an identity has neither a display name nor an email.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// The acting user, as reported by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable unique reference, stored on posts as `author_id`.
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            email: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Display name, then email, then "Anonymous".
    pub fn author_name(&self) -> &str {
        [self.display_name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR)
    }
}
