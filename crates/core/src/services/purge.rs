//! Guarded account purge.
//!
//! Irreversibly removes an actor's owned data across the profile,
//! message, and match collections, writes one audit entry, then ends
//! the session. The typed confirmation phrase is the only safety gate:
//! there is no dry run and no soft delete.
//!
//! The purge order is fixed and must stay deterministic. No cascading
//! constraints are assumed between the collections.

use crate::services::audit::{AuditEventKind, AuditLog, AuditSeverity};
use crate::services::identity::{Actor, IdentityService};
use crate::services::notifier::{NotificationKind, NotifierService};
use crate::services::store::{Filter, StoreService};
use amoria_common::{AppError, AppResult, config::PurgeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The exact phrase an actor must type to arm the purge.
///
/// Compared verbatim: case- and whitespace-sensitive.
pub const CONFIRMATION_PHRASE: &str = "DELETE MY DATA";

/// Profile rows are keyed directly by the actor id.
const PROFILE_ID_FIELD: &str = "id";
/// Message rows are scoped to the actor as sender.
const MESSAGE_SENDER_FIELD: &str = "sender_id";
/// Match rows may carry the actor on either side.
const MATCH_SIDE_A_FIELD: &str = "user_a_id";
const MATCH_SIDE_B_FIELD: &str = "user_b_id";

/// Phase of a deletion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgePhase {
    /// No purge has been requested.
    Idle,
    /// The confirmation panel is open; waiting for the typed phrase.
    AwaitingConfirmation,
    /// The remote sequence is in flight.
    Executing,
    /// The purge completed; the session is gone.
    Done,
}

/// One step of the purge sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeStep {
    /// Profile record delete.
    Profile,
    /// Authored-message delete.
    Messages,
    /// Match-record delete (either participant role).
    Matches,
    /// Audit entry insert.
    Audit,
}

/// Per-step completion ledger.
///
/// Deletes are idempotent, so a failed run can be resumed: completed
/// steps are never reissued on a later `execute`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StepLedger {
    profile: bool,
    messages: bool,
    matches: bool,
    audit: bool,
}

/// Collections the purge touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeTables {
    /// Profile records, keyed by actor id.
    pub profiles: String,
    /// Authored messages.
    pub messages: String,
    /// Match records.
    pub matches: String,
    /// Append-only audit entries.
    pub audit: String,
}

impl Default for PurgeTables {
    fn default() -> Self {
        Self::from(&PurgeConfig::default())
    }
}

impl From<&PurgeConfig> for PurgeTables {
    fn from(config: &PurgeConfig) -> Self {
        Self {
            profiles: config.profiles_table.clone(),
            messages: config.messages_table.clone(),
            matches: config.matches_table.clone(),
            audit: config.audit_table.clone(),
        }
    }
}

/// Summary of one completed `execute` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// Actor whose data was purged.
    pub actor_id: String,
    /// Audit entry id, when the entry was written by this invocation.
    pub audit_id: Option<String>,
    /// When the purge finished.
    pub completed_at: DateTime<Utc>,
    /// Steps this invocation actually ran (resumed runs skip the rest).
    pub steps: Vec<PurgeStep>,
}

/// Guarded destructive purge of an actor's owned data.
///
/// One `PurgeService` models one deletion request: single writer, one
/// user-triggered operation at a time. Mutating operations take
/// exclusive access, so overlapping executions cannot be expressed.
pub struct PurgeService {
    identity: IdentityService,
    store: StoreService,
    notifier: NotifierService,
    audit: AuditLog,
    tables: PurgeTables,
    phase: PurgePhase,
    confirmation: String,
    reason: Option<String>,
    ledger: StepLedger,
}

impl PurgeService {
    /// Create a new purge service over the injected capabilities.
    #[must_use]
    pub fn new(
        identity: IdentityService,
        store: StoreService,
        notifier: NotifierService,
        tables: PurgeTables,
    ) -> Self {
        let audit = AuditLog::new(Arc::clone(&store), tables.audit.clone());
        Self {
            identity,
            store,
            notifier,
            audit,
            tables,
            phase: PurgePhase::Idle,
            confirmation: String::new(),
            reason: None,
            ledger: StepLedger::default(),
        }
    }

    /// Current phase of the deletion request.
    #[must_use]
    pub const fn phase(&self) -> PurgePhase {
        self.phase
    }

    /// Open the confirmation gate.
    ///
    /// Requires an authenticated actor; no remote effect.
    pub async fn request_confirmation(&mut self) -> AppResult<()> {
        match self.phase {
            PurgePhase::Executing => {
                return Err(AppError::Conflict("purge already in flight".to_string()));
            }
            PurgePhase::Done => {
                return Err(AppError::Conflict("purge already completed".to_string()));
            }
            PurgePhase::Idle | PurgePhase::AwaitingConfirmation => {}
        }

        if self.identity.current_actor().await?.is_none() {
            return Err(AppError::Unauthorized);
        }

        self.phase = PurgePhase::AwaitingConfirmation;
        Ok(())
    }

    /// Store the typed confirmation text verbatim.
    ///
    /// No validation happens here; `execute` compares against
    /// [`CONFIRMATION_PHRASE`].
    pub fn update_confirmation_text(&mut self, text: &str) {
        self.confirmation = text.to_string();
    }

    /// Attach a reason to be carried into the audit entry.
    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = Some(reason.into());
    }

    /// Discard pending confirmation state and return to idle.
    ///
    /// No remote effect. A cancelled request issues no remote call,
    /// ever; a fresh `request_confirmation` starts over.
    pub fn cancel(&mut self) {
        self.phase = PurgePhase::Idle;
        self.confirmation.clear();
        self.reason = None;
        self.ledger = StepLedger::default();
    }

    /// Run the purge sequence.
    ///
    /// Guards first: the request must be awaiting confirmation, an
    /// actor must be present (silent no-op otherwise), and the stored
    /// text must equal the confirmation phrase exactly. Then, in fixed
    /// order: profile delete, authored-message delete, match delete,
    /// audit insert, sign-out, short-circuiting on the first failure.
    ///
    /// There is no rollback. On failure the request returns to the
    /// confirmation phase with its completion ledger intact, and a
    /// later `execute` resumes at the first unfinished step.
    pub async fn execute(&mut self) -> AppResult<PurgeReport> {
        match self.phase {
            PurgePhase::Idle => {
                return Err(AppError::Conflict(
                    "confirmation has not been requested".to_string(),
                ));
            }
            PurgePhase::Executing => {
                return Err(AppError::Conflict("purge already in flight".to_string()));
            }
            PurgePhase::Done => {
                return Err(AppError::Conflict("purge already completed".to_string()));
            }
            PurgePhase::AwaitingConfirmation => {}
        }

        let Some(actor) = self.identity.current_actor().await? else {
            return Err(AppError::Unauthorized);
        };

        if self.confirmation != CONFIRMATION_PHRASE {
            self.notifier
                .notify(
                    NotificationKind::Destructive,
                    "Confirmation required",
                    "Type DELETE MY DATA exactly to confirm.",
                )
                .await;
            return Err(AppError::Validation(
                "confirmation text does not match".to_string(),
            ));
        }

        self.phase = PurgePhase::Executing;

        match self.run(&actor).await {
            Ok(report) => {
                self.phase = PurgePhase::Done;
                tracing::info!(
                    actor_id = %actor.id,
                    steps = ?report.steps,
                    "Account purge completed"
                );
                self.notifier
                    .notify(
                        NotificationKind::Info,
                        "Your data has been deleted",
                        "All of your data has been removed and you have been signed out.",
                    )
                    .await;
                Ok(report)
            }
            Err(e) => {
                // No rollback; completed steps stay in the ledger so a
                // retry does not reissue them.
                self.phase = PurgePhase::AwaitingConfirmation;
                tracing::error!(
                    actor_id = %actor.id,
                    error = %e,
                    code = e.error_code(),
                    "Account purge failed"
                );
                self.notifier
                    .notify(
                        NotificationKind::Destructive,
                        "Deletion failed",
                        "Something went wrong while deleting your data. Please try again or contact support.",
                    )
                    .await;
                Err(e)
            }
        }
    }

    async fn run(&mut self, actor: &Actor) -> AppResult<PurgeReport> {
        let mut steps = Vec::new();

        if !self.ledger.profile {
            self.store
                .delete(
                    &self.tables.profiles,
                    &Filter::eq(PROFILE_ID_FIELD, &actor.id),
                )
                .await?;
            self.ledger.profile = true;
            steps.push(PurgeStep::Profile);
        }

        if !self.ledger.messages {
            self.store
                .delete(
                    &self.tables.messages,
                    &Filter::eq(MESSAGE_SENDER_FIELD, &actor.id),
                )
                .await?;
            self.ledger.messages = true;
            steps.push(PurgeStep::Messages);
        }

        if !self.ledger.matches {
            self.store
                .delete(
                    &self.tables.matches,
                    &Filter::either(
                        (MATCH_SIDE_A_FIELD, &actor.id),
                        (MATCH_SIDE_B_FIELD, &actor.id),
                    ),
                )
                .await?;
            self.ledger.matches = true;
            steps.push(PurgeStep::Matches);
        }

        let audit_id = if self.ledger.audit {
            None
        } else {
            let reason = self
                .reason
                .clone()
                .unwrap_or_else(|| "user_requested".to_string());
            let id = self
                .audit
                .record(
                    &actor.id,
                    AuditEventKind::AccountPurge,
                    AuditSeverity::Critical,
                    reason,
                )
                .await?;
            self.ledger.audit = true;
            steps.push(PurgeStep::Audit);
            Some(id)
        };

        self.identity.sign_out().await?;

        Ok(PurgeReport {
            actor_id: actor.id.clone(),
            audit_id,
            completed_at: Utc::now(),
            steps,
        })
    }
}
