//! Greedy ranking and selection of candidate actions.

use std::cmp::Ordering;

use wattwise_core::{ActionProposal, Constraints};

/// Cost floor applied to the savings-per-dollar score, so free actions get
/// a very large but bounded score instead of dividing by zero.
const COST_FLOOR_USD: f64 = 0.1;

fn score(proposal: &ActionProposal) -> f64 {
    proposal.estimated_annual_dollars_saved / proposal.estimated_cost_usd.max(COST_FLOOR_USD)
}

/// Rank candidates by savings-per-dollar and greedily select a subset that
/// respects the action-count and budget constraints, truncated to `top_n`.
///
/// This is a single pass over the ranked list: a candidate that exceeds the
/// remaining budget is skipped, not a stopping point, so cheaper
/// lower-ranked candidates can still be picked up. Deliberately not an
/// optimal knapsack.
pub fn rank_and_select(
    mut candidates: Vec<ActionProposal>,
    constraints: &Constraints,
    top_n: usize,
) -> Vec<ActionProposal> {
    candidates.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));

    let mut selected: Vec<ActionProposal> = Vec::new();
    let mut remaining_budget = constraints.budget_usd;

    for candidate in candidates {
        if selected.len() >= constraints.max_actions {
            break;
        }
        if candidate.estimated_cost_usd <= remaining_budget {
            remaining_budget -= candidate.estimated_cost_usd;
            selected.push(candidate);
        }
    }

    selected.truncate(top_n);
    selected
}
