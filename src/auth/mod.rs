//! In-memory authorization session.

pub mod client;

pub use client::{AuthClient, AuthError};

use parking_lot::RwLock;

/// Holds the bearer token for the review backend.
///
/// The token only ever lives in memory; nothing here touches disk. A
/// session without a token fails the authorization predicate and the
/// dispatcher discards diffs instead of forwarding them.
#[derive(Default)]
pub struct AuthSession {
    token: RwLock<Option<String>>,
}

impl AuthSession {
    /// A session with no token; authorization fails until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session with a token already in hand (e.g. from the environment).
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// The authorization predicate the dispatcher gates on.
    pub fn is_authorized(&self) -> bool {
        self.token.read().is_some()
    }

    /// Install a token, e.g. after a successful login.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Drop the token, ending the session.
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Current token, for request authorization headers.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_starts_unauthorized() {
        let session = AuthSession::new();
        assert!(!session.is_authorized());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_token_authorizes_and_clear_revokes() {
        let session = AuthSession::new();

        session.set_token("jwt-abc");
        assert!(session.is_authorized());
        assert_eq!(session.token().as_deref(), Some("jwt-abc"));

        session.clear();
        assert!(!session.is_authorized());
    }
}
