//! Pre-entitlement validation: can this consumer take this pool?

pub mod checks;
pub mod context;
pub mod result;
pub mod rules;

pub use checks::Check;
pub use context::ValidationContext;
pub use result::ValidationResult;
pub use rules::EntitlementRules;
