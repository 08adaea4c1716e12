//! Compliance calculation defaults.

use serde::{Deserialize, Serialize};

/// Defaults applied when a compliance request does not state them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Whether to compute the "compliant until" date for compliant consumers.
    #[serde(default = "default_true")]
    pub calculate_compliant_until: bool,
    /// Whether to compute per-product compliance date ranges.
    #[serde(default = "default_true")]
    pub calculate_product_date_ranges: bool,
    /// How long after registration a consumer counts as newborn, in hours.
    /// Unmapped-guest pools are only available to newborn guests.
    #[serde(default = "default_newborn_window")]
    pub newborn_window_hours: i64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            calculate_compliant_until: true,
            calculate_product_date_ranges: true,
            newborn_window_hours: default_newborn_window(),
        }
    }
}

impl ComplianceConfig {
    /// The newborn window as a chrono duration.
    pub fn newborn_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.newborn_window_hours)
    }
}

fn default_true() -> bool {
    true
}

fn default_newborn_window() -> i64 {
    24
}
