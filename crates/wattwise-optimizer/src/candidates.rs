//! Candidate generation under the critical/protected device policy.
//!
//! The gating differs deliberately per action kind: turn_off is never even
//! computed for critical or protected devices, smart_plug and schedule
//! degrade to a manual suggestion for critical devices, and eco-mode and
//! replacement suggestions are never gated (neither touches availability).

use wattwise_core::{ActionProposal, ActionType, Assumptions, Constraints, Device};

use crate::calculators;

/// Downgrade a proposal to a manual suggestion for a critical device.
fn to_manual_suggestion(mut proposal: ActionProposal, lower_feasibility: bool) -> ActionProposal {
    proposal.action_type = ActionType::SuggestManual;
    proposal.safety_flags.push("critical_device".to_string());
    if lower_feasibility {
        proposal.feasibility_score = 0.4;
        proposal.rationale = format!("[Critical] {} — requires manual approval.", proposal.rationale);
    }
    proposal
}

/// Generate the flat candidate list for all devices.
pub fn generate_candidates(
    devices: &[Device],
    assumptions: &Assumptions,
    constraints: &Constraints,
) -> Vec<ActionProposal> {
    let mut candidates = Vec::new();

    for device in devices {
        let is_critical = device.is_critical;
        let is_protected = constraints.is_protected(device);

        // Smart plug: critical+protected devices get nothing, critical-only
        // devices get a manual suggestion instead.
        if let Some(proposal) = calculators::smart_plug_saving(device, assumptions) {
            if is_critical && is_protected {
                // skip
            } else if is_critical {
                candidates.push(to_manual_suggestion(proposal, true));
            } else {
                candidates.push(proposal);
            }
        }

        // Schedule: protected devices are skipped outright; critical ones
        // degrade to a manual suggestion.
        if !is_protected {
            if let Some(proposal) =
                calculators::schedule_saving(device, assumptions, &constraints.quiet_hours)
            {
                if is_critical {
                    candidates.push(to_manual_suggestion(proposal, false));
                } else {
                    candidates.push(proposal);
                }
            }
        }

        // Eco mode: no gating, changing a power mode keeps the device available.
        if let Some(proposal) = calculators::eco_mode_saving(device, assumptions) {
            candidates.push(proposal);
        }

        // Turn off: computed only for devices that are neither critical nor
        // protected.
        if !is_critical && !is_protected {
            if let Some(proposal) = calculators::turn_off_saving(device, assumptions) {
                candidates.push(proposal);
            }
        }

        // Replace: no gating, purchase suggestions are informational.
        if let Some(proposal) = calculators::replace_saving(device, assumptions) {
            candidates.push(proposal);
        }
    }

    tracing::debug!(
        "Generated {} candidates across {} devices",
        candidates.len(),
        devices.len()
    );
    candidates
}
