//! Compliance status output and its building blocks.

pub mod date_range;
pub mod reason;
pub mod status;

pub use date_range::DateRange;
pub use reason::{ComplianceReason, ReasonSource};
pub use status::{ComplianceStatus, StatusLabel};
