//! Shared session token.

use tokio::sync::RwLock;

/// Bearer token shared by the table and auth adapters.
///
/// The token is only ever cleared after a successful logout; a failed
/// logout leaves the session intact.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    /// Create a session, optionally already holding a token.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    /// Current bearer token, if any.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Replace the bearer token.
    pub async fn set_token(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    /// Drop the bearer token.
    pub async fn clear(&self) {
        self.token.write().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_lifecycle() {
        let session = Session::default();
        assert!(session.token().await.is_none());

        session.set_token("jwt".to_string()).await;
        assert_eq!(session.token().await.as_deref(), Some("jwt"));

        session.clear().await;
        assert!(session.token().await.is_none());
    }
}
