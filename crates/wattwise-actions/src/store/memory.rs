//! In-memory action store.
//!
//! Non-persistent fallback with the same contract as the redb backend;
//! selected at startup when no database path is configured (tests use it
//! heavily). The compare-and-set guard holds the write lock for the whole
//! read-check-write sequence.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use wattwise_core::{ActionDoc, ActionStatus};

use super::{apply_transition, ActionStore, StatusUpdate};
use crate::Result;

/// Dict-backed action store.
#[derive(Default)]
pub struct MemoryActionStore {
    docs: RwLock<HashMap<String, ActionDoc>>,
}

impl MemoryActionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActionStore for MemoryActionStore {
    async fn insert(&self, doc: &ActionDoc) -> Result<()> {
        self.docs.write().await.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ActionDoc>> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn list_for_home(&self, home_id: &str, limit: usize) -> Result<Vec<ActionDoc>> {
        let docs = self.docs.read().await;
        let mut results: Vec<ActionDoc> = docs
            .values()
            .filter(|d| d.home_id == home_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results.truncate(limit);
        Ok(results)
    }

    async fn find_by_status(
        &self,
        home_id: &str,
        status: ActionStatus,
    ) -> Result<Vec<ActionDoc>> {
        let docs = self.docs.read().await;
        Ok(docs
            .values()
            .filter(|d| d.home_id == home_id && d.status == status)
            .cloned()
            .collect())
    }

    async fn update_status_if(
        &self,
        id: &str,
        expected: &[ActionStatus],
        new_status: ActionStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusUpdate> {
        let mut docs = self.docs.write().await;
        let Some(doc) = docs.get_mut(id) else {
            return Ok(StatusUpdate::NotFound);
        };
        if !expected.contains(&doc.status) {
            return Ok(StatusUpdate::Conflict(doc.status));
        }
        apply_transition(doc, new_status, at);
        Ok(StatusUpdate::Updated(doc.clone()))
    }
}
