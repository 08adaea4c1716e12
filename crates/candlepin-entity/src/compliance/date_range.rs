//! Date ranges over which a product stays covered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inclusive coverage window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
