//! Cost-minimization planner for home appliances.
//!
//! For each device and each applicable action kind, the savings calculators
//! estimate annual dollar/kWh/CO2 savings and upfront cost. Candidates are
//! generated under a protection policy for critical and do-not-turn-off
//! devices, then ranked by savings-per-dollar and greedily selected under
//! the user's budget and action-count constraints.
//!
//! An optional LLM-backed planner can replace the deterministic ranking;
//! its output is strictly validated and any failure falls back to the
//! deterministic pipeline.

pub mod calculators;
pub mod candidates;
pub mod planner;
pub mod ranking;

pub use candidates::generate_candidates;
pub use planner::LlmPlanner;
pub use ranking::rank_and_select;

use wattwise_core::{ActionProposal, Assumptions, Constraints, Device};

/// Deterministic proposal pipeline: generate candidates for every device,
/// rank by savings-per-dollar, and select a budget- and count-bounded
/// subset, truncated to `top_n`.
pub fn propose_actions(
    devices: &[Device],
    assumptions: &Assumptions,
    constraints: &Constraints,
    top_n: usize,
) -> Vec<ActionProposal> {
    let candidates = generate_candidates(devices, assumptions, constraints);
    rank_and_select(candidates, constraints, top_n)
}
