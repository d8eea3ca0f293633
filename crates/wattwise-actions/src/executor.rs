//! Per-kind action side effects.
//!
//! `DeviceCommander` is the seam between the lifecycle engine and real
//! hardware integrations (Home Assistant, Matter, vendor APIs). The
//! simulated implementation only logs; swap it for a real one without
//! touching the state machine.

use async_trait::async_trait;
use serde_json::{json, Value};

use wattwise_core::{ActionParameters, ActionType};

use crate::Result;

/// Outcome of applying or undoing one action's side effect.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Whether the side effect was applied.
    pub success: bool,
    /// Failure description when `success` is false.
    pub error: Option<String>,
    /// Integration-specific detail payload.
    pub details: Value,
}

impl CommandOutcome {
    /// Successful outcome with detail payload.
    pub fn ok(details: Value) -> Self {
        Self {
            success: true,
            error: None,
            details,
        }
    }

    /// Failed outcome.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: Value::Null,
        }
    }
}

/// Side-effect integration for executing and reverting actions.
#[async_trait]
pub trait DeviceCommander: Send + Sync {
    /// Apply the side effect for one action.
    async fn apply(
        &self,
        action_type: ActionType,
        device_id: &str,
        parameters: &ActionParameters,
    ) -> Result<CommandOutcome>;

    /// Undo a previously applied side effect.
    async fn undo(&self, action_type: ActionType, device_id: &str) -> Result<CommandOutcome>;
}

/// Logging-only commander used until a real integration is wired up.
///
/// Integration points for a real implementation:
/// - Home Assistant: POST /api/services/switch/turn_off
/// - TP-Link Kasa / Shelly: vendor HTTP APIs
/// - Matter: via a matter controller
#[derive(Debug, Default, Clone)]
pub struct SimulatedCommander;

#[async_trait]
impl DeviceCommander for SimulatedCommander {
    async fn apply(
        &self,
        action_type: ActionType,
        device_id: &str,
        parameters: &ActionParameters,
    ) -> Result<CommandOutcome> {
        let outcome = match action_type {
            ActionType::TurnOff => {
                tracing::info!("SIMULATED: turning off device {}", device_id);
                CommandOutcome::ok(json!({"action": "turn_off", "simulated": true}))
            }
            ActionType::Schedule => {
                let start = parameters.schedule_off_start.as_deref().unwrap_or("23:00");
                let end = parameters.schedule_off_end.as_deref().unwrap_or("07:00");
                tracing::info!(
                    "SIMULATED: scheduling device {} off from {} to {}",
                    device_id,
                    start,
                    end
                );
                CommandOutcome::ok(json!({
                    "action": "schedule",
                    "schedule": format!("{start}-{end}"),
                    "simulated": true,
                }))
            }
            ActionType::SmartPlug => {
                tracing::info!("SIMULATED: configuring smart plug for device {}", device_id);
                CommandOutcome::ok(json!({"action": "smart_plug", "simulated": true}))
            }
            ActionType::SetMode => {
                let mode = parameters.eco_mode.as_deref().unwrap_or("eco");
                tracing::info!("SIMULATED: setting device {} to mode '{}'", device_id, mode);
                CommandOutcome::ok(json!({
                    "action": "set_mode",
                    "mode": mode,
                    "simulated": true,
                }))
            }
            ActionType::Replace => {
                // Informational: the user replaces the device themselves.
                tracing::info!("SIMULATED: marked device {} for replacement", device_id);
                CommandOutcome::ok(json!({
                    "action": "replace",
                    "note": "User to replace device",
                    "simulated": true,
                }))
            }
            ActionType::SuggestManual => {
                // Just a suggestion, no device contacted.
                CommandOutcome::ok(json!({
                    "action": "suggest_manual",
                    "note": "Manual action suggested to user",
                    "simulated": true,
                }))
            }
        };
        Ok(outcome)
    }

    async fn undo(&self, action_type: ActionType, device_id: &str) -> Result<CommandOutcome> {
        tracing::info!(
            "SIMULATED: reverting action (type={}) on device {}",
            action_type,
            device_id
        );
        Ok(CommandOutcome::ok(json!({
            "action": "revert",
            "reverted_action": action_type.as_str(),
            "simulated": true,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_commander_succeeds_per_kind() {
        let commander = SimulatedCommander;
        let params = ActionParameters::default();
        for kind in [
            ActionType::TurnOff,
            ActionType::Schedule,
            ActionType::SmartPlug,
            ActionType::SetMode,
            ActionType::Replace,
            ActionType::SuggestManual,
        ] {
            let outcome = commander.apply(kind, "dev1", &params).await.unwrap();
            assert!(outcome.success, "kind {kind} should simulate successfully");
            assert_eq!(outcome.details["simulated"], true);
        }
    }

    #[tokio::test]
    async fn test_schedule_details_include_window() {
        let commander = SimulatedCommander;
        let params = ActionParameters {
            schedule_off_start: Some("22:00".to_string()),
            schedule_off_end: Some("06:00".to_string()),
            ..Default::default()
        };
        let outcome = commander
            .apply(ActionType::Schedule, "dev1", &params)
            .await
            .unwrap();
        assert_eq!(outcome.details["schedule"], "22:00-06:00");
    }
}
