//! Action store abstraction and backend implementations.
//!
//! The store owns the persisted `ActionDoc` records. Implementations must
//! provide `update_status_if` as a true compare-and-set so the execute and
//! revert guards cannot race: two concurrent executors of the same action
//! both observe `proposed`, but only one transition wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wattwise_core::{ActionDoc, ActionStatus};

use crate::Result;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redb")]
pub mod redb;

/// Result of a guarded status transition.
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    /// Transition applied; carries the updated doc.
    Updated(ActionDoc),
    /// No doc with that id.
    NotFound,
    /// Current status was not in the expected set; no change made.
    Conflict(ActionStatus),
}

/// Persistence contract for action documents.
#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Persist a new action document.
    async fn insert(&self, doc: &ActionDoc) -> Result<()>;

    /// Fetch a document by id.
    async fn get(&self, id: &str) -> Result<Option<ActionDoc>>;

    /// List a home's documents, most recent first, up to `limit`.
    async fn list_for_home(&self, home_id: &str, limit: usize) -> Result<Vec<ActionDoc>>;

    /// All of a home's documents currently in the given status.
    async fn find_by_status(&self, home_id: &str, status: ActionStatus)
        -> Result<Vec<ActionDoc>>;

    /// Atomically set `new_status` if and only if the doc's current status
    /// is one of `expected`. Also stamps `executedAt`/`revertedAt` when
    /// transitioning to `Executed`/`Reverted`.
    async fn update_status_if(
        &self,
        id: &str,
        expected: &[ActionStatus],
        new_status: ActionStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusUpdate>;
}

/// Apply a status transition to a doc in place (shared by backends once
/// the guard has passed).
pub(crate) fn apply_transition(doc: &mut ActionDoc, new_status: ActionStatus, at: DateTime<Utc>) {
    doc.status = new_status;
    match new_status {
        ActionStatus::Executed => doc.executed_at = Some(at),
        ActionStatus::Reverted => doc.reverted_at = Some(at),
        // The executor claims a doc as `executed` before running the side
        // effect; rolling over to `failed` must undo that stamp.
        ActionStatus::Failed => doc.executed_at = None,
        _ => {}
    }
}
