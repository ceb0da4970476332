//! Table API adapter.
//!
//! Speaks a PostgREST-style REST dialect: collections live under
//! `/rest/v1/{collection}`, row scoping goes through query-string
//! predicates, and `Prefer: return=minimal` suppresses response
//! bodies. Deletes against rows that no longer exist succeed with
//! zero affected rows, which keeps them idempotent.

use crate::session::Session;
use amoria_common::{AppError, AppResult, config::BackendConfig};
use amoria_core::{DataStore, Filter};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Render a predicate into the query-string dialect.
///
/// `Eq` becomes `field=eq.value`; `Or` becomes
/// `or=(a.eq.v,b.eq.v)`. Values are URL-encoded, field names are
/// trusted (they are fixed policy in `amoria-core`).
fn render_filter(filter: &Filter) -> String {
    match filter {
        Filter::Eq(clause) => {
            format!("{}=eq.{}", clause.field, urlencoding::encode(&clause.value))
        }
        Filter::Or(first, second) => format!(
            "or=({}.eq.{},{}.eq.{})",
            first.field,
            urlencoding::encode(&first.value),
            second.field,
            urlencoding::encode(&second.value)
        ),
    }
}

/// `DataStore` implementation over the hosted table API.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    session: Arc<Session>,
}

impl RestStore {
    /// Create a new table API adapter.
    pub fn new(config: &BackendConfig, session: Arc<Session>) -> AppResult<Self> {
        // Validate the base URL up front so later format! calls can't
        // produce garbage endpoints.
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

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    async fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("apikey", &self.api_key);
        match self.session.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl DataStore for RestStore {
    async fn delete(&self, collection: &str, filter: &Filter) -> AppResult<()> {
        let url = format!("{}?{}", self.collection_url(collection), render_filter(filter));

        tracing::debug!(collection = collection, "Deleting rows");

        let response = self
            .authed(self.client.delete(&url))
            .await
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "delete from {collection} failed: {status} {body}"
            )));
        }

        Ok(())
    }

    async fn insert(&self, collection: &str, record: Value) -> AppResult<()> {
        let url = self.collection_url(collection);

        tracing::debug!(collection = collection, "Inserting record");

        let response = self
            .authed(self.client.post(&url))
            .await
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "insert into {collection} failed: {status} {body}"
            )));
        }

        Ok(())
    }
}
