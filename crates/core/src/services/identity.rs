//! Identity provider abstraction.
//!
//! Authentication is owned by an external provider; core services only
//! read the current actor and trigger sign-out. The provider-held
//! credential record is never touched from here.

use async_trait::async_trait;
use amoria_common::AppResult;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// The authenticated end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique identifier assigned by the identity provider.
    pub id: String,
    /// Email address, when the provider exposes one.
    #[serde(default)]
    pub email: Option<String>,
}

impl Actor {
    /// Create an actor with an id and no email.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

/// Trait for the external identity provider.
///
/// This allows core services to read the session without depending on
/// the auth backend implementation.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the currently authenticated actor, if any.
    async fn current_actor(&self) -> AppResult<Option<Actor>>;

    /// Terminate the current session.
    ///
    /// On failure the session is left intact.
    async fn sign_out(&self) -> AppResult<()>;
}

/// Wrapper for boxed `IdentityProvider` trait object.
pub type IdentityService = Arc<dyn IdentityProvider>;

/// An in-memory identity provider holding a fixed actor.
///
/// Signing out drops the actor, after which `current_actor` returns
/// `None`. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    actor: RwLock<Option<Actor>>,
}

impl StaticIdentity {
    /// Create a provider holding `actor` (or no session at all).
    #[must_use]
    pub fn new(actor: Option<Actor>) -> Self {
        Self {
            actor: RwLock::new(actor),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_actor(&self) -> AppResult<Option<Actor>> {
        Ok(self
            .actor
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.actor
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        Ok(())
    }
}
