//! Business logic services.

#![allow(missing_docs)]

pub mod audit;
pub mod identity;
pub mod notifier;
pub mod purge;
pub mod store;

pub use audit::{AuditDetail, AuditEntry, AuditEventKind, AuditLog, AuditSeverity};
pub use identity::{Actor, IdentityProvider, IdentityService, StaticIdentity};
pub use notifier::{LogNotifier, NoOpNotifier, NotificationKind, Notifier, NotifierService};
pub use purge::{
    CONFIRMATION_PHRASE, PurgePhase, PurgeReport, PurgeService, PurgeStep, PurgeTables,
};
pub use store::{DataStore, Filter, StoreService};
