//! LLM-backed proposal planner.
//!
//! Delegates ranking to an external reasoning model and validates
//! everything it returns. The model's output is an untrusted-input
//! boundary: every numeric field is coerced before it can reach budget
//! arithmetic, items missing required fields are dropped with a warning,
//! and any failure (network, timeout, unparseable output, zero valid
//! items) falls back to the deterministic pipeline.

use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;

use wattwise_core::llm::{GenerationParams, LlmError, LlmInput, LlmRuntime, Message};
use wattwise_core::{
    ActionParameters, ActionProposal, ActionType, Assumptions, Constraints, Device,
};

use crate::propose_actions;

const SYSTEM_PROMPT: &str = "You are an Energy Optimization Agent for a smart-home app. You receive a home's inventory of devices (each with power estimates, control capabilities, and user constraints). Your job is to propose a ranked list of safe, feasible actions that minimize annual electricity cost under given user constraints.

REQUIREMENTS:
- RETURN JSON ONLY. No markdown, no explanation.
- For each proposed action include: deviceId, label, action_type (turn_off|schedule|smart_plug|set_mode|replace), parameters (cost_usd, standby_reduction, schedule_off_start, schedule_off_end), estimated_annual_kwh_saved, estimated_annual_dollars_saved, estimated_co2_kg_saved, estimated_cost_usd, payback_months, feasibility_score (0-1), rationale (1-2 sentences), safety_flags (list).
- Never propose turning off devices marked as is_critical:true unless user explicitly allowed; instead propose \"suggest_manual\" for these.
- Respect user comfort constraints.
- Use the provided assumptions.
- Output top N proposals.";

/// Internal planner failures; never surfaced to callers, only logged
/// before falling back.
#[derive(Debug, Error)]
enum PlanError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Unparseable planner response: {0}")]
    Parse(String),
}

/// Planner that asks an external reasoning model for ranked proposals,
/// falling back to the deterministic pipeline on any failure.
pub struct LlmPlanner {
    runtime: Arc<dyn LlmRuntime>,
}

impl LlmPlanner {
    /// Create a planner backed by the given runtime.
    pub fn new(runtime: Arc<dyn LlmRuntime>) -> Self {
        Self { runtime }
    }

    /// Propose actions via the external model, falling back to
    /// [`propose_actions`] when the model path yields nothing usable.
    pub async fn propose_actions(
        &self,
        devices: &[Device],
        assumptions: &Assumptions,
        constraints: &Constraints,
        top_n: usize,
    ) -> Vec<ActionProposal> {
        match self.try_llm_proposals(devices, assumptions, constraints, top_n).await {
            Ok(proposals) if !proposals.is_empty() => {
                tracing::info!(
                    "LLM planner ({}) returned {} proposals",
                    self.runtime.backend_id().as_str(),
                    proposals.len()
                );
                proposals
            }
            Ok(_) => {
                tracing::warn!("LLM planner returned zero valid proposals, falling back to greedy");
                propose_actions(devices, assumptions, constraints, top_n)
            }
            Err(e) => {
                tracing::error!("LLM planner failed: {e}, falling back to greedy");
                propose_actions(devices, assumptions, constraints, top_n)
            }
        }
    }

    async fn try_llm_proposals(
        &self,
        devices: &[Device],
        assumptions: &Assumptions,
        constraints: &Constraints,
        top_n: usize,
    ) -> Result<Vec<ActionProposal>, PlanError> {
        let request = json!({
            "assumptions": assumptions,
            "devices": sanitize_devices(devices),
            "constraints": constraints,
            "top_n": top_n,
        });

        let input = LlmInput {
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(request.to_string()),
            ],
            params: GenerationParams {
                temperature: Some(0.1),
                max_tokens: Some(4096),
            },
            model: None,
        };

        let output = self.runtime.generate(input).await?;
        parse_proposals(&output.text, top_n)
    }
}

/// Project devices down to the fields the model is allowed to see.
fn sanitize_devices(devices: &[Device]) -> Vec<Value> {
    devices
        .iter()
        .map(|d| {
            json!({
                "deviceId": d.id,
                "label": d.label,
                "category": d.category,
                "power": d.power,
                "is_critical": d.is_critical,
                "control": d.control,
                "active_hours_per_day": d.active_hours_per_day.unwrap_or(4.0),
            })
        })
        .collect()
}

/// Remove a Markdown code-fence wrapper if the model added one.
fn strip_code_fences(content: &str) -> &str {
    let content = content.trim();
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// Parse and validate the model's response into typed proposals.
///
/// Accepts either a bare JSON list or a `{"proposals": [...]}` envelope.
/// Items that fail required-field validation are dropped with a warning;
/// every numeric field is coerced with an explicit default.
fn parse_proposals(text: &str, top_n: usize) -> Result<Vec<ActionProposal>, PlanError> {
    let cleaned = strip_code_fences(text);
    let parsed: Value =
        serde_json::from_str(cleaned).map_err(|e| PlanError::Parse(e.to_string()))?;

    let items = match &parsed {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("proposals") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Err(PlanError::Parse("no proposals list in response".to_string())),
        },
        _ => return Err(PlanError::Parse("response is not a list or object".to_string())),
    };

    let mut proposals = Vec::new();
    for item in items.iter().take(top_n) {
        match validate_item(item) {
            Some(p) => proposals.push(p),
            None => tracing::warn!("Skipping invalid LLM proposal: {item}"),
        }
    }
    Ok(proposals)
}

fn validate_item(item: &Value) -> Option<ActionProposal> {
    let device_id = item.get("deviceId")?.as_str()?.to_string();
    let action_type = ActionType::parse(item.get("action_type")?.as_str()?)?;

    let params = item.get("parameters").cloned().unwrap_or(Value::Null);
    let parameters = ActionParameters {
        plug_model: str_field(&params, "plug_model"),
        cost_usd: num_field(&params, "cost_usd", 0.0),
        standby_reduction: num_field(&params, "standby_reduction", 0.8),
        schedule_off_start: str_field(&params, "schedule_off_start"),
        schedule_off_end: str_field(&params, "schedule_off_end"),
        eco_mode: str_field(&params, "eco_mode"),
        replacement_model: str_field(&params, "replacement_model"),
        replacement_cost_usd: num_field(&params, "replacement_cost_usd", 0.0),
    };

    Some(ActionProposal {
        device_id,
        label: str_field(item, "label").unwrap_or_else(|| "Unknown".to_string()),
        action_type,
        parameters,
        estimated_annual_kwh_saved: num_field(item, "estimated_annual_kwh_saved", 0.0),
        estimated_annual_dollars_saved: num_field(item, "estimated_annual_dollars_saved", 0.0),
        estimated_co2_kg_saved: num_field(item, "estimated_co2_kg_saved", 0.0),
        estimated_cost_usd: num_field(item, "estimated_cost_usd", 0.0),
        payback_months: num_field(item, "payback_months", 0.0),
        feasibility_score: num_field(item, "feasibility_score", 0.5).clamp(0.0, 1.0),
        rationale: str_field(item, "rationale").unwrap_or_default(),
        safety_flags: item
            .get("safety_flags")
            .and_then(Value::as_array)
            .map(|flags| {
                flags
                    .iter()
                    .filter_map(|f| f.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
    })
}

fn num_field(value: &Value, key: &str, default: f64) -> f64 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
