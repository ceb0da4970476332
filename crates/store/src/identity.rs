//! Auth API adapter.
//!
//! Implements the identity contract over a GoTrue-style auth API:
//! `GET /auth/v1/user` resolves the session to an actor and
//! `POST /auth/v1/logout` terminates it. The provider-held credential
//! record is never touched from here.

use crate::session::Session;
use amoria_common::{AppError, AppResult, config::BackendConfig};
use amoria_core::{Actor, IdentityProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// User payload returned by the auth API.
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// `IdentityProvider` implementation over the hosted auth API.
#[derive(Clone)]
pub struct RestIdentity {
    client: Client,
    base_url: String,
    api_key: String,
    session: Arc<Session>,
}

impl RestIdentity {
    /// Create a new auth API adapter.
    pub fn new(config: &BackendConfig, session: Arc<Session>) -> AppResult<Self> {
        Url::parse(&config.url).map_err(|e| AppError::Config(format!("invalid backend URL: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            session,
        })
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl IdentityProvider for RestIdentity {
    async fn current_actor(&self) -> AppResult<Option<Actor>> {
        let Some(token) = self.session.token().await else {
            return Ok(None);
        };

        let response = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        let status = response.status();

        // A rejected token means the session expired server-side;
        // that is "no actor", not a fault.
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Identity(format!(
                "user lookup failed: {status} {body}"
            )));
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        Ok(Some(Actor {
            id: user.id,
            email: user.email,
        }))
    }

    async fn sign_out(&self) -> AppResult<()> {
        let Some(token) = self.session.token().await else {
            return Err(AppError::Unauthorized);
        };

        let response = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Identity(format!(
                "logout failed: {status} {body}"
            )));
        }

        // Clear only after the provider confirmed termination.
        self.session.clear().await;

        tracing::debug!("Session terminated");

        Ok(())
    }
}
