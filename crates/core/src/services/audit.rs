//! Append-only audit log.
//!
//! Audit entries record security/privacy-relevant events. They are
//! written once and never mutated or deleted; this module exposes no
//! update or delete path.

use crate::services::store::StoreService;
use amoria_common::{AppResult, IdGenerator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// An actor's owned data was purged on request.
    AccountPurge,
}

/// Severity of an audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

/// Structured detail payload of an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDetail {
    /// Why the event happened (for purges: who asked and why).
    pub reason: String,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
}

/// An audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry ID.
    pub id: String,
    /// Actor the event concerns.
    pub actor_id: String,
    /// Event kind.
    pub kind: AuditEventKind,
    /// Event severity.
    pub severity: AuditSeverity,
    /// Structured detail payload.
    pub detail: AuditDetail,
}

/// Append-only writer over the configured audit collection.
#[derive(Clone)]
pub struct AuditLog {
    store: StoreService,
    collection: String,
    id_gen: IdGenerator,
}

impl AuditLog {
    /// Create a new audit log over `collection`.
    #[must_use]
    pub fn new(store: StoreService, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Append one entry and return its generated id.
    pub async fn record(
        &self,
        actor_id: &str,
        kind: AuditEventKind,
        severity: AuditSeverity,
        reason: impl Into<String>,
    ) -> AppResult<String> {
        let entry = AuditEntry {
            id: self.id_gen.generate(),
            actor_id: actor_id.to_string(),
            kind,
            severity,
            detail: AuditDetail {
                reason: reason.into(),
                timestamp: Utc::now(),
            },
        };

        let id = entry.id.clone();
        self.store
            .insert(&self.collection, serde_json::to_value(&entry)?)
            .await?;

        tracing::debug!(
            entry_id = %id,
            actor_id = actor_id,
            kind = ?kind,
            "Audit entry recorded"
        );

        Ok(id)
    }
}
