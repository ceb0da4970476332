//! Hosted backend adapter for amoria-rs.
//!
//! Implements the core capability traits against a hosted
//! backend-as-a-service: a PostgREST-style table API for the
//! [`amoria_core::DataStore`] contract and a GoTrue-style auth API for
//! the [`amoria_core::IdentityProvider`] contract. Both halves share
//! one bearer-token [`Session`].

pub mod identity;
pub mod rest;
pub mod session;

pub use identity::RestIdentity;
pub use rest::RestStore;
pub use session::Session;

use amoria_common::{AppResult, config::BackendConfig};
use std::sync::Arc;

/// Both halves of the backend connection.
pub struct Backend {
    /// Table API adapter.
    pub store: RestStore,
    /// Auth API adapter.
    pub identity: RestIdentity,
    /// The session both adapters read.
    pub session: Arc<Session>,
}

/// Initialize a backend connection.
///
/// `access_token` is the bearer token of an already-authenticated
/// session, when one exists; without it the store operates with the
/// project API key only and the identity half reports no actor.
pub fn init(config: &BackendConfig, access_token: Option<String>) -> AppResult<Backend> {
    let session = Arc::new(Session::new(access_token));
    let store = RestStore::new(config, Arc::clone(&session))?;
    let identity = RestIdentity::new(config, Arc::clone(&session))?;

    Ok(Backend {
        store,
        identity,
        session,
    })
}
