//! Savings calculators, one per action kind.
//!
//! Each calculator is a pure function of (device, assumptions, optional
//! schedule hint) returning `Option<ActionProposal>`. Returning `None` is a
//! policy decision ("not worth proposing"), not an error. Monetary and
//! energy outputs are rounded to 2 decimal places here, at the calculator
//! boundary; payback is rounded to 1 decimal.

use wattwise_core::{ActionParameters, ActionProposal, ActionType, Assumptions, Device};

/// Average smart-plug hardware cost.
pub const SMART_PLUG_COST_USD: f64 = 15.0;
/// Typical eco-mode active-power reduction factor.
pub const ECO_MODE_REDUCTION: f64 = 0.15;
/// Active-power reduction assumed for an ENERGY STAR replacement.
pub const REPLACE_ACTIVE_REDUCTION: f64 = 0.30;
/// Payback sentinel when annual savings are zero.
pub const PAYBACK_NEVER_MONTHS: f64 = 999.0;

/// Categories that expose an eco/power-save mode.
const ECO_CATEGORIES: [&str; 8] = [
    "Television",
    "TV",
    "Monitor",
    "Laptop",
    "Air Conditioner",
    "Washing Machine",
    "Dryer",
    "Refrigerator",
];

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Estimated replacement cost for an efficient model, by category.
fn replacement_cost(category: &str) -> f64 {
    match category {
        "Television" | "TV" => 400.0,
        "Refrigerator" => 800.0,
        "Washing Machine" => 600.0,
        "Dryer" => 700.0,
        "Microwave" => 150.0,
        "Air Conditioner" => 500.0,
        "Space Heater" => 80.0,
        "Oven" => 1200.0,
        "Monitor" => 250.0,
        "Laptop" => 800.0,
        "Light Bulb" => 8.0,
        "Toaster" => 40.0,
        "Hair Dryer" => 40.0,
        "Phone Charger" => 20.0,
        _ => 200.0,
    }
}

/// Daily off-window hours from the first quiet-hours range, default 8 when
/// absent or unparseable.
fn schedule_hours(quiet_hours: &[String]) -> f64 {
    let Some(range) = quiet_hours.first() else {
        return 8.0;
    };
    let Some((start, end)) = range.split_once('-') else {
        return 8.0;
    };
    let hour = |s: &str| s.split(':').next().and_then(|h| h.parse::<i64>().ok());
    match (hour(start), hour(end)) {
        (Some(start_h), Some(end_h)) => (end_h - start_h).rem_euclid(24) as f64,
        _ => 8.0,
    }
}

/// First quiet-hours window as (start, end), defaulting to 23:00-07:00.
fn schedule_window(quiet_hours: &[String]) -> (String, String) {
    if let Some((start, end)) = quiet_hours.first().and_then(|r| r.split_once('-')) {
        (start.to_string(), end.to_string())
    } else {
        ("23:00".to_string(), "07:00".to_string())
    }
}

/// Smart plug auto-off: cuts standby power by the standby-reduction
/// fraction during idle hours. Skipped below 0.5 W standby.
pub fn smart_plug_saving(device: &Device, assumptions: &Assumptions) -> Option<ActionProposal> {
    let standby_w = device.power.standby_watts_typical;
    if standby_w < 0.5 {
        return None; // not worth it
    }

    let active_hours = device.active_hours(assumptions);
    let standby_hours = 24.0 - active_hours;

    let kwh_saved = standby_w * assumptions.standby_reduction * standby_hours * 365.0 / 1000.0;
    let dollars_saved = kwh_saved * assumptions.rate_per_kwh;
    let co2_saved = kwh_saved * assumptions.kg_co2_per_kwh;
    let cost = SMART_PLUG_COST_USD;
    let payback = if dollars_saved > 0.0 {
        cost / dollars_saved * 12.0
    } else {
        PAYBACK_NEVER_MONTHS
    };

    Some(ActionProposal {
        device_id: device.id.clone(),
        label: device.label.clone(),
        action_type: ActionType::SmartPlug,
        parameters: ActionParameters {
            plug_model: Some("generic_wifi".to_string()),
            cost_usd: cost,
            standby_reduction: assumptions.standby_reduction,
            ..Default::default()
        },
        estimated_annual_kwh_saved: round2(kwh_saved),
        estimated_annual_dollars_saved: round2(dollars_saved),
        estimated_co2_kg_saved: round2(co2_saved),
        estimated_cost_usd: cost,
        payback_months: round1(payback),
        feasibility_score: 0.9,
        rationale: format!(
            "Smart plug eliminates {:.0}% of {}W standby draw during {:.0}h idle time.",
            assumptions.standby_reduction * 100.0,
            standby_w,
            standby_hours
        ),
        safety_flags: Vec::new(),
    })
}

/// Schedule the device off during quiet hours. Only eliminated standby is
/// credited, not active draw. Skipped when annual savings fall under $0.50.
pub fn schedule_saving(
    device: &Device,
    assumptions: &Assumptions,
    quiet_hours: &[String],
) -> Option<ActionProposal> {
    let standby_w = device.power.standby_watts_typical;
    let hours = schedule_hours(quiet_hours);

    let kwh_saved = standby_w * hours * 365.0 / 1000.0;
    let dollars_saved = kwh_saved * assumptions.rate_per_kwh;
    let co2_saved = kwh_saved * assumptions.kg_co2_per_kwh;

    if dollars_saved < 0.50 {
        return None; // not worth it
    }

    let (off_start, off_end) = schedule_window(quiet_hours);

    Some(ActionProposal {
        device_id: device.id.clone(),
        label: device.label.clone(),
        action_type: ActionType::Schedule,
        parameters: ActionParameters {
            schedule_off_start: Some(off_start),
            schedule_off_end: Some(off_end),
            cost_usd: 0.0,
            ..Default::default()
        },
        estimated_annual_kwh_saved: round2(kwh_saved),
        estimated_annual_dollars_saved: round2(dollars_saved),
        estimated_co2_kg_saved: round2(co2_saved),
        estimated_cost_usd: 0.0,
        payback_months: 0.0,
        feasibility_score: 0.85,
        rationale: format!(
            "Scheduling {} off during quiet hours saves {:.1} kWh/year from eliminated standby.",
            device.label, kwh_saved
        ),
        safety_flags: Vec::new(),
    })
}

/// Switch to eco/power-save mode, reducing active draw by 15%. Only
/// applicable to categories known to expose such a mode; skipped when
/// annual savings fall under $1.
pub fn eco_mode_saving(device: &Device, assumptions: &Assumptions) -> Option<ActionProposal> {
    let active_w = device.power.active_watts_typical;
    let active_hours = device.active_hours(assumptions);

    let watts_saved = active_w * ECO_MODE_REDUCTION;
    let kwh_saved = watts_saved * active_hours * 365.0 / 1000.0;
    let dollars_saved = kwh_saved * assumptions.rate_per_kwh;
    let co2_saved = kwh_saved * assumptions.kg_co2_per_kwh;

    if dollars_saved < 1.0 {
        return None;
    }

    if !ECO_CATEGORIES.contains(&device.category.as_str()) {
        return None;
    }

    Some(ActionProposal {
        device_id: device.id.clone(),
        label: device.label.clone(),
        action_type: ActionType::SetMode,
        parameters: ActionParameters {
            eco_mode: Some("eco".to_string()),
            cost_usd: 0.0,
            ..Default::default()
        },
        estimated_annual_kwh_saved: round2(kwh_saved),
        estimated_annual_dollars_saved: round2(dollars_saved),
        estimated_co2_kg_saved: round2(co2_saved),
        estimated_cost_usd: 0.0,
        payback_months: 0.0,
        feasibility_score: 0.75,
        rationale: format!(
            "Eco mode reduces active power by ~{:.0}%, saving {:.1} kWh/year during {:.0}h daily use.",
            ECO_MODE_REDUCTION * 100.0,
            kwh_saved,
            active_hours
        ),
        safety_flags: Vec::new(),
    })
}

/// Turn the device off completely when not in use (manual action,
/// eliminates the full standby draw). Skipped below 1 W standby.
pub fn turn_off_saving(device: &Device, assumptions: &Assumptions) -> Option<ActionProposal> {
    let standby_w = device.power.standby_watts_typical;
    if standby_w < 1.0 {
        return None;
    }

    let active_hours = device.active_hours(assumptions);
    let standby_hours = 24.0 - active_hours;

    let kwh_saved = standby_w * standby_hours * 365.0 / 1000.0;
    let dollars_saved = kwh_saved * assumptions.rate_per_kwh;
    let co2_saved = kwh_saved * assumptions.kg_co2_per_kwh;

    Some(ActionProposal {
        device_id: device.id.clone(),
        label: device.label.clone(),
        action_type: ActionType::TurnOff,
        parameters: ActionParameters {
            cost_usd: 0.0,
            ..Default::default()
        },
        estimated_annual_kwh_saved: round2(kwh_saved),
        estimated_annual_dollars_saved: round2(dollars_saved),
        estimated_co2_kg_saved: round2(co2_saved),
        estimated_cost_usd: 0.0,
        payback_months: 0.0,
        feasibility_score: 0.7,
        rationale: format!(
            "Manually unplugging when not in use eliminates {}W standby for {:.0}h/day.",
            standby_w, standby_hours
        ),
        safety_flags: vec!["requires_manual_action".to_string()],
    })
}

/// Replace with an energy-efficient model: 30% less active power and
/// standby halved (floored at 0.3 W). Skipped when payback exceeds 120
/// months.
pub fn replace_saving(device: &Device, assumptions: &Assumptions) -> Option<ActionProposal> {
    let active_w = device.power.active_watts_typical;
    let active_hours = device.active_hours(assumptions);

    let watts_saved = active_w * REPLACE_ACTIVE_REDUCTION;
    let standby_w = device.power.standby_watts_typical;
    let new_standby = (standby_w * 0.5).max(0.3);
    let standby_saved = standby_w - new_standby;
    let standby_hours = 24.0 - active_hours;

    let kwh_saved = (watts_saved * active_hours + standby_saved * standby_hours) * 365.0 / 1000.0;
    let dollars_saved = kwh_saved * assumptions.rate_per_kwh;
    let co2_saved = kwh_saved * assumptions.kg_co2_per_kwh;

    let cost = replacement_cost(&device.category);
    let payback = if dollars_saved > 0.0 {
        cost / dollars_saved * 12.0
    } else {
        PAYBACK_NEVER_MONTHS
    };

    if payback > 120.0 {
        // > 10 years payback = not worth suggesting
        return None;
    }

    Some(ActionProposal {
        device_id: device.id.clone(),
        label: device.label.clone(),
        action_type: ActionType::Replace,
        parameters: ActionParameters {
            replacement_model: Some("ENERGY STAR equivalent".to_string()),
            replacement_cost_usd: cost,
            cost_usd: cost,
            ..Default::default()
        },
        estimated_annual_kwh_saved: round2(kwh_saved),
        estimated_annual_dollars_saved: round2(dollars_saved),
        estimated_co2_kg_saved: round2(co2_saved),
        estimated_cost_usd: cost,
        payback_months: round1(payback),
        feasibility_score: 0.5,
        rationale: format!(
            "Replacing with ENERGY STAR model saves ~{:.0}% active power ({:.0}W). Payback in {:.0} months.",
            REPLACE_ACTIVE_REDUCTION * 100.0,
            watts_saved,
            payback
        ),
        safety_flags: vec!["requires_purchase".to_string()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wattwise_core::{DeviceControl, DevicePower, UsageProfile};

    fn device(standby_w: f64, active_w: f64, category: &str) -> Device {
        Device {
            id: "d1".to_string(),
            label: "Test Device".to_string(),
            category: category.to_string(),
            power: DevicePower {
                standby_watts_typical: standby_w,
                standby_watts_range: [standby_w / 2.0, standby_w * 2.0],
                active_watts_typical: active_w,
                active_watts_range: [active_w / 2.0, active_w * 2.0],
            },
            is_critical: false,
            control: DeviceControl::default(),
            active_hours_per_day: Some(4.0),
            usage_profile: UsageProfile::Typical,
        }
    }

    #[test]
    fn test_smart_plug_skips_low_standby() {
        let d = device(0.4, 100.0, "Television");
        assert!(smart_plug_saving(&d, &Assumptions::default()).is_none());
    }

    #[test]
    fn test_smart_plug_formula() {
        // standby=2.0, reduction=0.8, active=4h -> 2.0*0.8*20*365/1000 = 11.68 kWh
        let d = device(2.0, 100.0, "Television");
        let p = smart_plug_saving(&d, &Assumptions::default()).unwrap();
        assert!((p.estimated_annual_kwh_saved - 11.68).abs() < 0.01);
        // 11.68 kWh * $0.30 = $3.504 -> rounded to 3.5
        assert!((p.estimated_annual_dollars_saved - 3.5).abs() < 0.01);
        // payback = 15/3.504*12 = 51.4 months
        assert!((p.payback_months - 51.4).abs() < 0.05);
        assert_eq!(p.estimated_cost_usd, 15.0);
        assert_eq!(p.feasibility_score, 0.9);
    }

    #[test]
    fn test_smart_plug_zero_savings_payback_sentinel() {
        let d = device(1.0, 50.0, "Television");
        let assumptions = Assumptions {
            rate_per_kwh: 0.0,
            ..Default::default()
        };
        let p = smart_plug_saving(&d, &assumptions).unwrap();
        assert_eq!(p.payback_months, PAYBACK_NEVER_MONTHS);
    }

    #[test]
    fn test_schedule_default_window() {
        // standby=2.0, 8h window -> 2.0*8*365/1000 = 5.84 kWh
        let d = device(2.0, 100.0, "Television");
        let quiet = vec!["23:00-07:00".to_string()];
        let p = schedule_saving(&d, &Assumptions::default(), &quiet).unwrap();
        assert!((p.estimated_annual_kwh_saved - 5.84).abs() < 0.01);
        assert_eq!(p.parameters.schedule_off_start.as_deref(), Some("23:00"));
        assert_eq!(p.parameters.schedule_off_end.as_deref(), Some("07:00"));
    }

    #[test]
    fn test_schedule_unparseable_falls_back_to_8h() {
        let d = device(2.0, 100.0, "Television");
        let quiet = vec!["late-night".to_string()];
        let p = schedule_saving(&d, &Assumptions::default(), &quiet).unwrap();
        assert!((p.estimated_annual_kwh_saved - 5.84).abs() < 0.01);
    }

    #[test]
    fn test_schedule_rejects_tiny_savings() {
        let d = device(0.2, 100.0, "Television");
        let quiet = vec!["23:00-07:00".to_string()];
        // 0.2W * 8h * 365/1000 * $0.30 = $0.18 < $0.50
        assert!(schedule_saving(&d, &Assumptions::default(), &quiet).is_none());
    }

    #[test]
    fn test_eco_mode_category_gate() {
        let heater = device(1.0, 1500.0, "Space Heater");
        assert!(eco_mode_saving(&heater, &Assumptions::default()).is_none());

        let tv = device(1.0, 100.0, "Television");
        let p = eco_mode_saving(&tv, &Assumptions::default()).unwrap();
        // 100*0.15*4*365/1000 = 21.9 kWh
        assert!((p.estimated_annual_kwh_saved - 21.9).abs() < 0.01);
        assert_eq!(p.parameters.eco_mode.as_deref(), Some("eco"));
    }

    #[test]
    fn test_eco_mode_rejects_small_savings() {
        // 10W active: 10*0.15*4*365/1000*0.3 = $0.66 < $1
        let d = device(1.0, 10.0, "Television");
        assert!(eco_mode_saving(&d, &Assumptions::default()).is_none());
    }

    #[test]
    fn test_turn_off_threshold() {
        assert!(turn_off_saving(&device(0.9, 100.0, "TV"), &Assumptions::default()).is_none());

        let p = turn_off_saving(&device(2.0, 100.0, "TV"), &Assumptions::default()).unwrap();
        // full standby elimination, no reduction factor: 2.0*20*365/1000 = 14.6
        assert!((p.estimated_annual_kwh_saved - 14.6).abs() < 0.01);
        assert_eq!(p.estimated_cost_usd, 0.0);
        assert!(p.safety_flags.contains(&"requires_manual_action".to_string()));
    }

    #[test]
    fn test_replace_rejects_long_payback() {
        // Low-usage fridge: $800 replacement never pays back inside 10 years.
        let mut d = device(3.0, 150.0, "Refrigerator");
        d.active_hours_per_day = Some(1.0);
        assert!(replace_saving(&d, &Assumptions::default()).is_none());
    }

    #[test]
    fn test_replace_standby_floor() {
        // standby 0.4 halves to 0.2 but floors at 0.3, so only 0.1W credited.
        let mut d = device(0.4, 200.0, "Light Bulb");
        d.active_hours_per_day = Some(8.0);
        let p = replace_saving(&d, &Assumptions::default()).unwrap();
        // active: 200*0.3*8 = 480 Wh/day; standby: 0.1*16 = 1.6 Wh/day
        let expected: f64 = (480.0 + 1.6) * 365.0 / 1000.0;
        assert!((p.estimated_annual_kwh_saved - (expected * 100.0).round() / 100.0).abs() < 0.01);
        assert_eq!(p.estimated_cost_usd, 8.0);
        assert!(p.safety_flags.contains(&"requires_purchase".to_string()));
    }

    #[test]
    fn test_replacement_cost_default() {
        assert_eq!(replacement_cost("Aquarium Pump"), 200.0);
        assert_eq!(replacement_cost("Oven"), 1200.0);
    }

    #[test]
    fn test_schedule_hours_wraps_midnight() {
        assert_eq!(schedule_hours(&["23:00-07:00".to_string()]), 8.0);
        assert_eq!(schedule_hours(&["01:00-05:00".to_string()]), 4.0);
        assert_eq!(schedule_hours(&[]), 8.0);
    }
}
