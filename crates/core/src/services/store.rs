//! Remote data store abstraction.
//!
//! The hosted backend exposes table-like collections with filtered
//! delete and plain insert. Core services stay backend-agnostic by
//! going through [`DataStore`]; the concrete adapter lives in
//! `amoria-store`.

use async_trait::async_trait;
use amoria_common::AppResult;
use serde_json::Value;
use std::sync::Arc;

/// A single field-equality clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEq {
    /// Field (column) name.
    pub field: String,
    /// Value the field must equal.
    pub value: String,
}

/// Filter predicate for row-scoped operations.
///
/// Only the two shapes the purge sequence needs are representable:
/// a single equality, and a disjunction of two equalities (used for
/// match records where the actor may be either participant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Field equals value.
    Eq(FieldEq),
    /// Either of two equality clauses holds.
    Or(FieldEq, FieldEq),
}

impl Filter {
    /// Build an equality filter.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq(FieldEq {
            field: field.into(),
            value: value.into(),
        })
    }

    /// Build a disjunction of two equality clauses.
    #[must_use]
    pub fn either(
        (first_field, first_value): (&str, &str),
        (second_field, second_value): (&str, &str),
    ) -> Self {
        Self::Or(
            FieldEq {
                field: first_field.to_string(),
                value: first_value.to_string(),
            },
            FieldEq {
                field: second_field.to_string(),
                value: second_value.to_string(),
            },
        )
    }
}

/// Trait for the remote data store.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Delete all rows in `collection` matching `filter`.
    ///
    /// Deleting rows that no longer exist is not an error; deletes are
    /// idempotent and safely re-runnable.
    async fn delete(&self, collection: &str, filter: &Filter) -> AppResult<()>;

    /// Insert a single record into `collection`.
    async fn insert(&self, collection: &str, record: Value) -> AppResult<()>;
}

/// Wrapper for boxed `DataStore` trait object.
pub type StoreService = Arc<dyn DataStore>;
