//! Action domain model: proposals, persisted action documents, and the
//! action status state machine.
//!
//! `ActionProposal` is the ephemeral output of the optimizer; `ActionDoc`
//! is the persisted form owned by the action store. The savings snapshot
//! frozen onto a doc at proposal time is never recomputed afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agent identifier recorded on every stored action.
pub const AGENT_ID: &str = "ai_agent_v1";

/// Kind of energy-saving action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Manually turn the device off when not in use.
    TurnOff,
    /// Schedule the device off during quiet hours.
    Schedule,
    /// Install a smart plug that auto-cuts standby draw.
    SmartPlug,
    /// Switch the device to an eco/power-save mode.
    SetMode,
    /// Replace with an energy-efficient model.
    Replace,
    /// Informational suggestion requiring manual user review.
    SuggestManual,
}

impl ActionType {
    /// Wire-format string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::TurnOff => "turn_off",
            ActionType::Schedule => "schedule",
            ActionType::SmartPlug => "smart_plug",
            ActionType::SetMode => "set_mode",
            ActionType::Replace => "replace",
            ActionType::SuggestManual => "suggest_manual",
        }
    }

    /// Parse a wire-format string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "turn_off" => Some(ActionType::TurnOff),
            "schedule" => Some(ActionType::Schedule),
            "smart_plug" => Some(ActionType::SmartPlug),
            "set_mode" => Some(ActionType::SetMode),
            "replace" => Some(ActionType::Replace),
            "suggest_manual" => Some(ActionType::SuggestManual),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a stored action.
///
/// Legal transitions: Proposed/Scheduled → Executed or Failed (executor),
/// Executed → Reverted (revert handler). Failed and Reverted are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Created from an accepted proposal; awaiting execution.
    Proposed,
    /// Queued for a later execution window.
    Scheduled,
    /// Side effect applied; counted in the savings ledger.
    Executed,
    /// Previously executed action was undone.
    Reverted,
    /// Execution was attempted and failed.
    Failed,
}

impl ActionStatus {
    /// Whether the executor may act on a doc in this state.
    pub fn is_executable(&self) -> bool {
        matches!(self, ActionStatus::Proposed | ActionStatus::Scheduled)
    }

    /// Whether no further transitions are legal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Reverted | ActionStatus::Failed)
    }

    /// Wire-format string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Proposed => "proposed",
            ActionStatus::Scheduled => "scheduled",
            ActionStatus::Executed => "executed",
            ActionStatus::Reverted => "reverted",
            ActionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific parameters of a proposed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionParameters {
    /// Smart plug hardware model, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plug_model: Option<String>,
    /// Upfront cost of the action in dollars.
    #[serde(default)]
    pub cost_usd: f64,
    /// Fraction of standby draw eliminated.
    #[serde(default = "ActionParameters::default_standby_reduction")]
    pub standby_reduction: f64,
    /// Daily off-schedule start, e.g. "23:00".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_off_start: Option<String>,
    /// Daily off-schedule end, e.g. "07:00".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_off_end: Option<String>,
    /// Target power mode for set_mode actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eco_mode: Option<String>,
    /// Suggested replacement model for replace actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_model: Option<String>,
    /// Replacement purchase cost in dollars.
    #[serde(default)]
    pub replacement_cost_usd: f64,
}

impl ActionParameters {
    fn default_standby_reduction() -> f64 {
        0.8
    }
}

impl Default for ActionParameters {
    fn default() -> Self {
        Self {
            plug_model: None,
            cost_usd: 0.0,
            standby_reduction: Self::default_standby_reduction(),
            schedule_off_start: None,
            schedule_off_end: None,
            eco_mode: None,
            replacement_model: None,
            replacement_cost_usd: 0.0,
        }
    }
}

/// A candidate energy-saving action produced by the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionProposal {
    /// Target device id.
    #[serde(rename = "deviceId")]
    pub device_id: String,
    /// Target device label.
    pub label: String,
    /// Kind of action.
    pub action_type: ActionType,
    /// Kind-specific parameters.
    pub parameters: ActionParameters,
    /// Estimated annual energy saved in kWh.
    pub estimated_annual_kwh_saved: f64,
    /// Estimated annual savings in dollars.
    pub estimated_annual_dollars_saved: f64,
    /// Estimated annual CO2 avoided in kg.
    pub estimated_co2_kg_saved: f64,
    /// Upfront cost in dollars.
    pub estimated_cost_usd: f64,
    /// Months for cumulative savings to repay the upfront cost.
    pub payback_months: f64,
    /// Heuristic confidence (0-1) that the action is practical.
    pub feasibility_score: f64,
    /// Human-readable justification.
    pub rationale: String,
    /// Safety tags such as `critical_device` or `requires_purchase`.
    #[serde(default)]
    pub safety_flags: Vec<String>,
}

/// Estimated savings frozen onto an action document at proposal time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavingsSnapshot {
    /// Annual dollar savings.
    pub dollars_per_year: f64,
    /// Annual energy savings in kWh.
    pub kwh_per_year: f64,
    /// Annual CO2 avoided in kg.
    pub co2_kg_per_year: f64,
    /// Upfront cost in dollars.
    pub cost_usd: f64,
    /// Payback period in months.
    pub payback_months: f64,
}

impl From<&ActionProposal> for SavingsSnapshot {
    fn from(p: &ActionProposal) -> Self {
        Self {
            dollars_per_year: p.estimated_annual_dollars_saved,
            kwh_per_year: p.estimated_annual_kwh_saved,
            co2_kg_per_year: p.estimated_co2_kg_saved,
            cost_usd: p.estimated_cost_usd,
            payback_months: p.payback_months,
        }
    }
}

/// A persisted action, owned by the action store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDoc {
    /// Store-assigned identifier.
    pub id: String,
    /// Home the action belongs to.
    #[serde(rename = "homeId")]
    pub home_id: String,
    /// Target device id.
    #[serde(rename = "deviceId")]
    pub device_id: String,
    /// Target device label.
    pub label: String,
    /// Kind of action.
    pub action_type: ActionType,
    /// Kind-specific parameters.
    pub parameters: ActionParameters,
    /// Current lifecycle state.
    pub status: ActionStatus,
    /// Agent that proposed the action.
    #[serde(rename = "agentId")]
    pub agent_id: String,
    /// Savings snapshot, immutable after creation.
    pub estimated_savings: SavingsSnapshot,
    /// Feasibility score carried over from the proposal.
    pub feasibility_score: f64,
    /// Rationale carried over from the proposal.
    pub rationale: String,
    /// Safety tags carried over from the proposal.
    #[serde(default)]
    pub safety_flags: Vec<String>,
    /// When the doc was created.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// When the action was executed, if it was.
    #[serde(rename = "executedAt", skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
    /// When the action was reverted, if it was.
    #[serde(rename = "revertedAt", skip_serializing_if = "Option::is_none")]
    pub reverted_at: Option<DateTime<Utc>>,
}

impl ActionDoc {
    /// Build a new `proposed` doc from a proposal, snapshotting its
    /// estimated savings.
    pub fn from_proposal(id: String, home_id: impl Into<String>, proposal: &ActionProposal) -> Self {
        Self {
            id,
            home_id: home_id.into(),
            device_id: proposal.device_id.clone(),
            label: proposal.label.clone(),
            action_type: proposal.action_type,
            parameters: proposal.parameters.clone(),
            status: ActionStatus::Proposed,
            agent_id: AGENT_ID.to_string(),
            estimated_savings: SavingsSnapshot::from(proposal),
            feasibility_score: proposal.feasibility_score,
            rationale: proposal.rationale.clone(),
            safety_flags: proposal.safety_flags.clone(),
            created_at: Utc::now(),
            executed_at: None,
            reverted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_round_trip() {
        for t in [
            ActionType::TurnOff,
            ActionType::Schedule,
            ActionType::SmartPlug,
            ActionType::SetMode,
            ActionType::Replace,
            ActionType::SuggestManual,
        ] {
            assert_eq!(ActionType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::parse("defrost"), None);
    }

    #[test]
    fn test_action_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&ActionType::SmartPlug).unwrap();
        assert_eq!(json, "\"smart_plug\"");
    }

    #[test]
    fn test_status_predicates() {
        assert!(ActionStatus::Proposed.is_executable());
        assert!(ActionStatus::Scheduled.is_executable());
        assert!(!ActionStatus::Executed.is_executable());
        assert!(ActionStatus::Failed.is_terminal());
        assert!(ActionStatus::Reverted.is_terminal());
        assert!(!ActionStatus::Executed.is_terminal());
    }

    #[test]
    fn test_doc_from_proposal_snapshots_savings() {
        let proposal = ActionProposal {
            device_id: "dev1".to_string(),
            label: "TV".to_string(),
            action_type: ActionType::SmartPlug,
            parameters: ActionParameters {
                cost_usd: 15.0,
                ..Default::default()
            },
            estimated_annual_kwh_saved: 11.68,
            estimated_annual_dollars_saved: 3.5,
            estimated_co2_kg_saved: 2.92,
            estimated_cost_usd: 15.0,
            payback_months: 51.4,
            feasibility_score: 0.9,
            rationale: "standby cut".to_string(),
            safety_flags: vec![],
        };

        let doc = ActionDoc::from_proposal("a1".to_string(), "home1", &proposal);
        assert_eq!(doc.status, ActionStatus::Proposed);
        assert_eq!(doc.agent_id, AGENT_ID);
        assert_eq!(doc.estimated_savings.dollars_per_year, 3.5);
        assert_eq!(doc.estimated_savings.kwh_per_year, 11.68);
        assert!(doc.executed_at.is_none());
    }
}
