//! Auto-attach: choose which pools, and how much of each, to bind so a
//! consumer becomes compliant.

pub mod group;
pub mod priority;
pub mod selector;

pub use group::{Candidate, EntitlementGroup};
pub use priority::{has_no_product_overlap, pool_priority, prefer_pool};
pub use selector::AutobindRules;
