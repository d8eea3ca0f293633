//! Action lifecycle service.
//!
//! Drives stored actions through propose → execute → revert and keeps the
//! savings ledger. Batch execution is per-action independent: one failure
//! never aborts the rest of the batch, and each transition goes through
//! the store's compare-and-set guard so a concurrent duplicate request
//! resolves to a conflict instead of a double execution.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use wattwise_core::{ActionDoc, ActionProposal, ActionStatus};

use crate::executor::DeviceCommander;
use crate::store::{ActionStore, StatusUpdate};
use crate::Result;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-action result of a batch execute call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Side effect applied and the doc transitioned to `executed`.
    Executed { action_id: String, details: Value },
    /// Side effect failed; the doc transitioned to `failed`.
    Failed { action_id: String, error: String },
    /// No action with that id.
    NotFound { action_id: String },
    /// The action was not in an executable state.
    Conflict { action_id: String, error: String },
}

/// Result of a revert request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RevertOutcome {
    /// Side effect undone and the doc transitioned to `reverted`.
    Reverted { action_id: String, details: Value },
    /// Undo failed; the doc stays `executed`.
    Failed { action_id: String, error: String },
    /// No action with that id.
    NotFound { action_id: String },
    /// Only executed actions can be reverted.
    Conflict { action_id: String, error: String },
}

/// Aggregate realized savings for a home, summed over executed actions.
#[derive(Debug, Clone, Serialize)]
pub struct ActionSavings {
    pub executed_actions: usize,
    pub total_annual_kwh_saved: f64,
    pub total_annual_dollars_saved: f64,
    pub total_annual_co2_kg_saved: f64,
}

/// Lifecycle engine over an action store and a device commander.
pub struct ActionService {
    store: Arc<dyn ActionStore>,
    commander: Arc<dyn DeviceCommander>,
}

impl ActionService {
    pub fn new(store: Arc<dyn ActionStore>, commander: Arc<dyn DeviceCommander>) -> Self {
        Self { store, commander }
    }

    /// Persist accepted proposals as `proposed` action documents.
    ///
    /// Returns the generated ids in the same order as the input.
    pub async fn store_proposals(
        &self,
        home_id: &str,
        proposals: &[ActionProposal],
    ) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let id = Uuid::new_v4().to_string();
            let doc = ActionDoc::from_proposal(id.clone(), home_id, proposal);
            self.store.insert(&doc).await?;
            ids.push(id);
        }
        tracing::info!("Stored {} proposed actions for home {}", ids.len(), home_id);
        Ok(ids)
    }

    /// Fetch a single action document.
    pub async fn get_action(&self, id: &str) -> Result<Option<ActionDoc>> {
        self.store.get(id).await
    }

    /// List a home's actions, most recent first.
    pub async fn list_actions(&self, home_id: &str, limit: usize) -> Result<Vec<ActionDoc>> {
        self.store.list_for_home(home_id, limit).await
    }

    /// Execute a batch of actions, one outcome per id.
    pub async fn execute_actions(&self, ids: &[String]) -> Vec<ExecutionOutcome> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            outcomes.push(self.execute_one(id).await);
        }
        outcomes
    }

    async fn execute_one(&self, id: &str) -> ExecutionOutcome {
        let doc = match self.store.get(id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                return ExecutionOutcome::NotFound {
                    action_id: id.to_string(),
                }
            }
            Err(e) => {
                return ExecutionOutcome::Failed {
                    action_id: id.to_string(),
                    error: e.to_string(),
                }
            }
        };

        if !doc.status.is_executable() {
            return ExecutionOutcome::Conflict {
                action_id: id.to_string(),
                error: format!("Cannot execute action in state '{}'", doc.status),
            };
        }

        const EXECUTABLE: [ActionStatus; 2] = [ActionStatus::Proposed, ActionStatus::Scheduled];

        // Claim the doc through the compare-and-set guard before touching
        // the device: of two concurrent requests for the same id, only the
        // winner reaches the commander, so the side effect cannot
        // double-fire. A commander failure then rolls the claim over to
        // `failed`.
        let claimed = match self
            .store
            .update_status_if(id, &EXECUTABLE, ActionStatus::Executed, Utc::now())
            .await
        {
            Ok(StatusUpdate::Updated(doc)) => doc,
            Ok(StatusUpdate::Conflict(current)) => {
                return ExecutionOutcome::Conflict {
                    action_id: id.to_string(),
                    error: format!("Cannot execute action in state '{current}'"),
                }
            }
            Ok(StatusUpdate::NotFound) => {
                return ExecutionOutcome::NotFound {
                    action_id: id.to_string(),
                }
            }
            Err(e) => {
                return ExecutionOutcome::Failed {
                    action_id: id.to_string(),
                    error: e.to_string(),
                }
            }
        };

        let applied = self
            .commander
            .apply(claimed.action_type, &claimed.device_id, &claimed.parameters)
            .await;

        match applied {
            Ok(outcome) if outcome.success => {
                tracing::info!("Executed action {} on device {}", id, claimed.device_id);
                ExecutionOutcome::Executed {
                    action_id: id.to_string(),
                    details: outcome.details,
                }
            }
            Ok(outcome) => {
                let error = outcome
                    .error
                    .unwrap_or_else(|| "command failed".to_string());
                self.mark_failed(id).await;
                tracing::warn!("Action {} failed: {}", id, error);
                ExecutionOutcome::Failed {
                    action_id: id.to_string(),
                    error,
                }
            }
            Err(e) => {
                self.mark_failed(id).await;
                tracing::warn!("Action {} failed: {}", id, e);
                ExecutionOutcome::Failed {
                    action_id: id.to_string(),
                    error: e.to_string(),
                }
            }
        }
    }

    async fn mark_failed(&self, id: &str) {
        if let Err(e) = self
            .store
            .update_status_if(id, &[ActionStatus::Executed], ActionStatus::Failed, Utc::now())
            .await
        {
            tracing::error!("Could not mark action {} as failed: {}", id, e);
        }
    }

    /// Undo an executed action.
    pub async fn revert_action(&self, id: &str) -> RevertOutcome {
        let doc = match self.store.get(id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                return RevertOutcome::NotFound {
                    action_id: id.to_string(),
                }
            }
            Err(e) => {
                return RevertOutcome::Failed {
                    action_id: id.to_string(),
                    error: e.to_string(),
                }
            }
        };

        if doc.status != ActionStatus::Executed {
            return RevertOutcome::Conflict {
                action_id: id.to_string(),
                error: format!("Cannot revert action in state '{}'", doc.status),
            };
        }

        let undone = self.commander.undo(doc.action_type, &doc.device_id).await;

        match undone {
            Ok(outcome) if outcome.success => {
                match self
                    .store
                    .update_status_if(
                        id,
                        &[ActionStatus::Executed],
                        ActionStatus::Reverted,
                        Utc::now(),
                    )
                    .await
                {
                    Ok(StatusUpdate::Updated(_)) => {
                        tracing::info!("Reverted action {} on device {}", id, doc.device_id);
                        RevertOutcome::Reverted {
                            action_id: id.to_string(),
                            details: outcome.details,
                        }
                    }
                    Ok(StatusUpdate::Conflict(current)) => RevertOutcome::Conflict {
                        action_id: id.to_string(),
                        error: format!("Cannot revert action in state '{current}'"),
                    },
                    Ok(StatusUpdate::NotFound) => RevertOutcome::NotFound {
                        action_id: id.to_string(),
                    },
                    Err(e) => RevertOutcome::Failed {
                        action_id: id.to_string(),
                        error: e.to_string(),
                    },
                }
            }
            Ok(outcome) => RevertOutcome::Failed {
                action_id: id.to_string(),
                error: outcome
                    .error
                    .unwrap_or_else(|| "undo failed".to_string()),
            },
            Err(e) => RevertOutcome::Failed {
                action_id: id.to_string(),
                error: e.to_string(),
            },
        }
    }

    /// Sum estimated savings over the home's currently executed actions.
    ///
    /// Reverted and failed actions contribute nothing; the sums are
    /// recomputed from stored snapshots on every call.
    pub async fn compute_action_savings(&self, home_id: &str) -> Result<ActionSavings> {
        let executed = self
            .store
            .find_by_status(home_id, ActionStatus::Executed)
            .await?;

        let mut kwh = 0.0;
        let mut dollars = 0.0;
        let mut co2 = 0.0;
        for doc in &executed {
            kwh += doc.estimated_savings.kwh_per_year;
            dollars += doc.estimated_savings.dollars_per_year;
            co2 += doc.estimated_savings.co2_kg_per_year;
        }

        Ok(ActionSavings {
            executed_actions: executed.len(),
            total_annual_kwh_saved: round2(kwh),
            total_annual_dollars_saved: round2(dollars),
            total_annual_co2_kg_saved: round2(co2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use wattwise_core::{ActionParameters, ActionType, AGENT_ID};

    use crate::executor::{CommandOutcome, SimulatedCommander};
    use crate::store::memory::MemoryActionStore;

    /// Commander that counts applies and holds each one open briefly, so
    /// concurrent requests overlap.
    #[derive(Default)]
    struct CountingCommander {
        applies: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl DeviceCommander for CountingCommander {
        async fn apply(
            &self,
            _action_type: ActionType,
            _device_id: &str,
            _parameters: &ActionParameters,
        ) -> Result<CommandOutcome> {
            self.applies
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(CommandOutcome::ok(serde_json::json!({"simulated": true})))
        }

        async fn undo(
            &self,
            _action_type: ActionType,
            _device_id: &str,
        ) -> Result<CommandOutcome> {
            Ok(CommandOutcome::ok(serde_json::Value::Null))
        }
    }

    /// Commander that fails every apply, for failure-path tests.
    struct FailingCommander;

    #[async_trait]
    impl DeviceCommander for FailingCommander {
        async fn apply(
            &self,
            _action_type: ActionType,
            _device_id: &str,
            _parameters: &ActionParameters,
        ) -> Result<CommandOutcome> {
            Ok(CommandOutcome::failure("device unreachable"))
        }

        async fn undo(
            &self,
            _action_type: ActionType,
            _device_id: &str,
        ) -> Result<CommandOutcome> {
            Ok(CommandOutcome::failure("device unreachable"))
        }
    }

    fn proposal(device_id: &str, dollars: f64, kwh: f64) -> ActionProposal {
        ActionProposal {
            device_id: device_id.to_string(),
            label: format!("Device {device_id}"),
            action_type: ActionType::SmartPlug,
            parameters: ActionParameters::default(),
            estimated_annual_kwh_saved: kwh,
            estimated_annual_dollars_saved: dollars,
            estimated_co2_kg_saved: round2(kwh * 0.25),
            estimated_cost_usd: 15.0,
            payback_months: 51.4,
            feasibility_score: 0.9,
            rationale: "standby waste".to_string(),
            safety_flags: vec!["requires_purchase".to_string()],
        }
    }

    fn service() -> ActionService {
        ActionService::new(
            Arc::new(MemoryActionStore::new()),
            Arc::new(SimulatedCommander),
        )
    }

    #[tokio::test]
    async fn test_store_and_execute() {
        let svc = service();
        let ids = svc
            .store_proposals("home1", &[proposal("dev1", 3.5, 11.68)])
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);

        let stored = svc.get_action(&ids[0]).await.unwrap().unwrap();
        assert_eq!(stored.status, ActionStatus::Proposed);
        assert_eq!(stored.agent_id, AGENT_ID);
        assert!(stored.executed_at.is_none());

        let outcomes = svc.execute_actions(&ids).await;
        assert!(matches!(outcomes[0], ExecutionOutcome::Executed { .. }));

        let executed = svc.get_action(&ids[0]).await.unwrap().unwrap();
        assert_eq!(executed.status, ActionStatus::Executed);
        assert!(executed.executed_at.is_some());
    }

    #[tokio::test]
    async fn test_execute_twice_conflicts_without_touching_timestamp() {
        let svc = service();
        let ids = svc
            .store_proposals("home1", &[proposal("dev1", 3.5, 11.68)])
            .await
            .unwrap();

        svc.execute_actions(&ids).await;
        let first = svc.get_action(&ids[0]).await.unwrap().unwrap();
        let stamped = first.executed_at;

        let outcomes = svc.execute_actions(&ids).await;
        match &outcomes[0] {
            ExecutionOutcome::Conflict { error, .. } => {
                assert!(error.contains("executed"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        let second = svc.get_action(&ids[0]).await.unwrap().unwrap();
        assert_eq!(second.executed_at, stamped);
    }

    #[tokio::test]
    async fn test_revert_requires_executed() {
        let svc = service();
        let ids = svc
            .store_proposals("home1", &[proposal("dev1", 3.5, 11.68)])
            .await
            .unwrap();

        let outcome = svc.revert_action(&ids[0]).await;
        assert!(matches!(outcome, RevertOutcome::Conflict { .. }));

        let doc = svc.get_action(&ids[0]).await.unwrap().unwrap();
        assert_eq!(doc.status, ActionStatus::Proposed);
        assert!(doc.reverted_at.is_none());
    }

    #[tokio::test]
    async fn test_revert_removes_action_from_savings() {
        let svc = service();
        let ids = svc
            .store_proposals(
                "home1",
                &[proposal("dev1", 3.5, 11.68), proposal("dev2", 10.0, 33.33)],
            )
            .await
            .unwrap();
        svc.execute_actions(&ids).await;

        let before = svc.compute_action_savings("home1").await.unwrap();
        assert_eq!(before.executed_actions, 2);
        assert_eq!(before.total_annual_dollars_saved, 13.5);

        let outcome = svc.revert_action(&ids[0]).await;
        assert!(matches!(outcome, RevertOutcome::Reverted { .. }));
        let reverted = svc.get_action(&ids[0]).await.unwrap().unwrap();
        assert!(reverted.reverted_at.is_some());

        let after = svc.compute_action_savings("home1").await.unwrap();
        assert_eq!(after.executed_actions, 1);
        assert_eq!(after.total_annual_dollars_saved, 10.0);
        assert_eq!(after.total_annual_kwh_saved, 33.33);
    }

    #[tokio::test]
    async fn test_failing_commander_marks_failed_and_continues() {
        let svc = ActionService::new(
            Arc::new(MemoryActionStore::new()),
            Arc::new(FailingCommander),
        );
        let ids = svc
            .store_proposals(
                "home1",
                &[proposal("dev1", 3.5, 11.68), proposal("dev2", 10.0, 33.33)],
            )
            .await
            .unwrap();

        let outcomes = svc.execute_actions(&ids).await;
        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            match outcome {
                ExecutionOutcome::Failed { error, .. } => {
                    assert!(error.contains("unreachable"));
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }

        for id in &ids {
            let doc = svc.get_action(id).await.unwrap().unwrap();
            assert_eq!(doc.status, ActionStatus::Failed);
            assert!(doc.executed_at.is_none());
        }

        let savings = svc.compute_action_savings("home1").await.unwrap();
        assert_eq!(savings.executed_actions, 0);
        assert_eq!(savings.total_annual_dollars_saved, 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_execute_fires_side_effect_once() {
        let commander = Arc::new(CountingCommander::default());
        let svc = Arc::new(ActionService::new(
            Arc::new(MemoryActionStore::new()),
            commander.clone(),
        ));
        let ids = svc
            .store_proposals("home1", &[proposal("dev1", 3.5, 11.68)])
            .await
            .unwrap();

        let first = tokio::spawn({
            let svc = svc.clone();
            let ids = ids.clone();
            async move { svc.execute_actions(&ids).await }
        });
        let second = tokio::spawn({
            let svc = svc.clone();
            let ids = ids.clone();
            async move { svc.execute_actions(&ids).await }
        });
        let outcomes = [
            first.await.unwrap().remove(0),
            second.await.unwrap().remove(0),
        ];

        // The claim happens before the commander runs, so exactly one
        // request reaches the device; the loser sees a state conflict.
        let executed = outcomes
            .iter()
            .filter(|o| matches!(o, ExecutionOutcome::Executed { .. }))
            .count();
        let conflicts = outcomes
            .iter()
            .filter(|o| matches!(o, ExecutionOutcome::Conflict { .. }))
            .count();
        assert_eq!(executed, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(
            commander.applies.load(std::sync::atomic::Ordering::SeqCst),
            1
        );

        let doc = svc.get_action(&ids[0]).await.unwrap().unwrap();
        assert_eq!(doc.status, ActionStatus::Executed);
    }

    #[tokio::test]
    async fn test_unknown_id_reports_not_found() {
        let svc = service();
        let outcomes = svc.execute_actions(&["ghost".to_string()]).await;
        assert!(matches!(outcomes[0], ExecutionOutcome::NotFound { .. }));
        assert!(matches!(
            svc.revert_action("ghost").await,
            RevertOutcome::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_actions_scoped_to_home() {
        let svc = service();
        svc.store_proposals("home1", &[proposal("dev1", 3.5, 11.68)])
            .await
            .unwrap();
        svc.store_proposals("home2", &[proposal("dev2", 10.0, 33.33)])
            .await
            .unwrap();

        let listed = svc.list_actions("home1", 50).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].device_id, "dev1");
    }
}
