//! Redb action store.
//!
//! Persistent backend using the redb embedded database. Documents are
//! JSON-encoded under their id; the compare-and-set guard runs inside a
//! single write transaction, which is what makes it atomic (redb allows
//! one writer at a time).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};

use wattwise_core::{ActionDoc, ActionStatus};

use super::{apply_transition, ActionStore, StatusUpdate};
use crate::Result;

const ACTIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("actions");

/// redb-backed action store.
pub struct RedbActionStore {
    db: Arc<Database>,
}

impl RedbActionStore {
    /// Open or create an action store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let db = if path_ref.exists() {
            Database::open(path_ref)?
        } else {
            if let Some(parent) = path_ref.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Database::create(path_ref)?
        };

        // Ensure the table exists so first reads don't fail.
        let txn = db.begin_write()?;
        txn.open_table(ACTIONS_TABLE)?;
        txn.commit()?;

        tracing::info!("Opened action store at {}", path_ref.display());
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl ActionStore for RedbActionStore {
    async fn insert(&self, doc: &ActionDoc) -> Result<()> {
        let value = serde_json::to_vec(doc)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ACTIONS_TABLE)?;
            table.insert(doc.id.as_str(), &*value)?;
        }
        txn.commit()?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ActionDoc>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ACTIONS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    async fn list_for_home(&self, home_id: &str, limit: usize) -> Result<Vec<ActionDoc>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ACTIONS_TABLE)?;

        let mut results: Vec<ActionDoc> = Vec::new();
        for entry in table.iter()? {
            let (_key, value) = entry?;
            if let Ok(doc) = serde_json::from_slice::<ActionDoc>(value.value()) {
                if doc.home_id == home_id {
                    results.push(doc);
                }
            }
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results.truncate(limit);
        Ok(results)
    }

    async fn find_by_status(
        &self,
        home_id: &str,
        status: ActionStatus,
    ) -> Result<Vec<ActionDoc>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ACTIONS_TABLE)?;

        let mut results: Vec<ActionDoc> = Vec::new();
        for entry in table.iter()? {
            let (_key, value) = entry?;
            if let Ok(doc) = serde_json::from_slice::<ActionDoc>(value.value()) {
                if doc.home_id == home_id && doc.status == status {
                    results.push(doc);
                }
            }
        }
        Ok(results)
    }

    async fn update_status_if(
        &self,
        id: &str,
        expected: &[ActionStatus],
        new_status: ActionStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusUpdate> {
        let txn = self.db.begin_write()?;
        let update = {
            let mut table = txn.open_table(ACTIONS_TABLE)?;

            let mut doc: ActionDoc = match table.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Ok(StatusUpdate::NotFound),
            };

            if !expected.contains(&doc.status) {
                return Ok(StatusUpdate::Conflict(doc.status));
            }

            apply_transition(&mut doc, new_status, at);
            let value = serde_json::to_vec(&doc)?;
            table.insert(id, &*value)?;
            StatusUpdate::Updated(doc)
        };
        txn.commit()?;
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wattwise_core::{ActionParameters, ActionType, SavingsSnapshot, AGENT_ID};

    fn doc(id: &str, status: ActionStatus) -> ActionDoc {
        ActionDoc {
            id: id.to_string(),
            home_id: "home1".to_string(),
            device_id: "dev1".to_string(),
            label: "TV".to_string(),
            action_type: ActionType::Schedule,
            parameters: ActionParameters::default(),
            status,
            agent_id: AGENT_ID.to_string(),
            estimated_savings: SavingsSnapshot {
                dollars_per_year: 3.5,
                kwh_per_year: 11.68,
                co2_kg_per_year: 2.92,
                cost_usd: 15.0,
                payback_months: 51.4,
            },
            feasibility_score: 0.85,
            rationale: "quiet hours".to_string(),
            safety_flags: Vec::new(),
            created_at: Utc::now(),
            executed_at: None,
            reverted_at: None,
        }
    }

    fn open_store() -> (tempfile::TempDir, RedbActionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbActionStore::open(dir.path().join("actions.redb")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_round_trip_preserves_snapshot() {
        let (_dir, store) = open_store();
        store.insert(&doc("a1", ActionStatus::Proposed)).await.unwrap();

        let loaded = store.get("a1").await.unwrap().unwrap();
        assert_eq!(loaded.estimated_savings.kwh_per_year, 11.68);
        assert_eq!(loaded.action_type, ActionType::Schedule);
    }

    #[tokio::test]
    async fn test_cas_executes_once() {
        let (_dir, store) = open_store();
        store.insert(&doc("a1", ActionStatus::Proposed)).await.unwrap();

        let expected = [ActionStatus::Proposed, ActionStatus::Scheduled];
        let first = store
            .update_status_if("a1", &expected, ActionStatus::Executed, Utc::now())
            .await
            .unwrap();
        let StatusUpdate::Updated(updated) = first else {
            panic!("expected update");
        };
        assert!(updated.executed_at.is_some());

        let second = store
            .update_status_if("a1", &expected, ActionStatus::Executed, Utc::now())
            .await
            .unwrap();
        assert!(matches!(second, StatusUpdate::Conflict(ActionStatus::Executed)));

        // Snapshot unchanged by the transition.
        let loaded = store.get("a1").await.unwrap().unwrap();
        assert_eq!(loaded.estimated_savings.dollars_per_year, 3.5);
    }

    #[tokio::test]
    async fn test_missing_doc_is_not_found() {
        let (_dir, store) = open_store();
        let update = store
            .update_status_if("ghost", &[ActionStatus::Proposed], ActionStatus::Executed, Utc::now())
            .await
            .unwrap();
        assert!(matches!(update, StatusUpdate::NotFound));
    }
}
