//! Device inventory and planning input types.
//!
//! Devices are owned by the external inventory service; the engine only
//! reads them. `Assumptions` and `Constraints` are immutable per
//! computation.

use serde::{Deserialize, Serialize};

/// Estimated power profile for a device.
///
/// Produced by the external power-estimation pipeline; the engine consumes
/// the typical values and never recomputes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicePower {
    /// Typical standby draw in watts.
    #[serde(default = "DevicePower::default_standby")]
    pub standby_watts_typical: f64,
    /// Standby draw range [min, max] in watts.
    #[serde(default = "DevicePower::default_standby_range")]
    pub standby_watts_range: [f64; 2],
    /// Typical active draw in watts.
    #[serde(default = "DevicePower::default_active")]
    pub active_watts_typical: f64,
    /// Active draw range [min, max] in watts.
    #[serde(default = "DevicePower::default_active_range")]
    pub active_watts_range: [f64; 2],
}

impl DevicePower {
    fn default_standby() -> f64 {
        2.0
    }

    fn default_standby_range() -> [f64; 2] {
        [0.5, 5.0]
    }

    fn default_active() -> f64 {
        75.0
    }

    fn default_active_range() -> [f64; 2] {
        [20.0, 200.0]
    }
}

impl Default for DevicePower {
    fn default() -> Self {
        Self {
            standby_watts_typical: Self::default_standby(),
            standby_watts_range: Self::default_standby_range(),
            active_watts_typical: Self::default_active(),
            active_watts_range: Self::default_active_range(),
        }
    }
}

/// How a device can be controlled.
///
/// Opaque to the engine; passed through to the external planner and the
/// commander unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceControl {
    /// Control mechanism ("smart_plug", "smart_switch", "api", "manual").
    #[serde(default, rename = "type")]
    pub control_type: String,
    /// Controller-specific device identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Supported capabilities (on_off, energy, dimmer).
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Daily usage intensity profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageProfile {
    /// Around 2 active hours per day.
    Light,
    /// Around 4 active hours per day.
    #[default]
    Typical,
    /// Around 8 active hours per day.
    Heavy,
}

impl UsageProfile {
    /// Default active hours per day for this profile.
    pub fn active_hours(&self) -> f64 {
        match self {
            UsageProfile::Light => 2.0,
            UsageProfile::Typical => 4.0,
            UsageProfile::Heavy => 8.0,
        }
    }
}

/// A monitored appliance, as read from the device inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Inventory identifier.
    pub id: String,
    /// User-facing label, e.g. "Living Room TV".
    pub label: String,
    /// Appliance category, e.g. "Television".
    pub category: String,
    /// Estimated power profile.
    #[serde(default)]
    pub power: DevicePower,
    /// User marked this device as must-stay-available.
    #[serde(default)]
    pub is_critical: bool,
    /// Control descriptor (unused by the engine itself).
    #[serde(default)]
    pub control: DeviceControl,
    /// Per-device override of active hours; falls back to the profile
    /// default from `Assumptions` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_hours_per_day: Option<f64>,
    /// Usage intensity profile.
    #[serde(default)]
    pub usage_profile: UsageProfile,
}

impl Device {
    /// Active hours per day: the device override if present, otherwise the
    /// profile default resolved through the assumptions.
    pub fn active_hours(&self, assumptions: &Assumptions) -> f64 {
        self.active_hours_per_day
            .unwrap_or_else(|| assumptions.profile.active_hours())
    }
}

/// Cost and environmental assumptions for one planning computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assumptions {
    /// Electricity rate in $/kWh.
    #[serde(default = "Assumptions::default_rate")]
    pub rate_per_kwh: f64,
    /// Grid carbon intensity in kg CO2 per kWh.
    #[serde(default = "Assumptions::default_co2")]
    pub kg_co2_per_kwh: f64,
    /// Default usage profile for devices without an override.
    #[serde(default)]
    pub profile: UsageProfile,
    /// Fraction of standby draw eliminated by an auto-off mechanism.
    #[serde(default = "Assumptions::default_standby_reduction")]
    pub standby_reduction: f64,
}

impl Assumptions {
    fn default_rate() -> f64 {
        0.30
    }

    fn default_co2() -> f64 {
        0.25
    }

    fn default_standby_reduction() -> f64 {
        0.8
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            rate_per_kwh: Self::default_rate(),
            kg_co2_per_kwh: Self::default_co2(),
            profile: UsageProfile::default(),
            standby_reduction: Self::default_standby_reduction(),
        }
    }
}

/// User constraints on what the planner may propose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraints {
    /// Maximum number of actions to select.
    #[serde(default = "Constraints::default_max_actions")]
    pub max_actions: usize,
    /// Total upfront spend allowed across selected actions.
    #[serde(default = "Constraints::default_budget")]
    pub budget_usd: f64,
    /// Case-insensitive label/category substrings that must never be
    /// turned off or scheduled.
    #[serde(default)]
    pub do_not_turn_off: Vec<String>,
    /// Daily "HH:MM-HH:MM" windows in which off-scheduling is acceptable.
    /// The first entry is authoritative.
    #[serde(default = "Constraints::default_quiet_hours")]
    pub quiet_hours: Vec<String>,
}

impl Constraints {
    fn default_max_actions() -> usize {
        5
    }

    // Effectively unbounded; matches the upstream sentinel.
    fn default_budget() -> f64 {
        999_999.0
    }

    fn default_quiet_hours() -> Vec<String> {
        vec!["23:00-07:00".to_string()]
    }

    /// Whether a device matches the do-not-turn-off list by label or
    /// category substring, case-insensitively.
    pub fn is_protected(&self, device: &Device) -> bool {
        let label = device.label.to_lowercase();
        let category = device.category.to_lowercase();
        self.do_not_turn_off.iter().any(|name| {
            let name = name.to_lowercase();
            label.contains(&name) || category.contains(&name)
        })
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_actions: Self::default_max_actions(),
            budget_usd: Self::default_budget(),
            do_not_turn_off: Vec::new(),
            quiet_hours: Self::default_quiet_hours(),
        }
    }
}
