//! Outcome of validating one pool for one consumer.

use serde::{Deserialize, Serialize};

/// Error and warning keys accumulated by the pre-entitlement checks.
///
/// Keys are symbolic (`rulefailed.*`, `rulewarning.*`) so the host can
/// localize them. Any error blocks the bind; warnings are informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn add_error(&mut self, key: impl Into<String>) {
        self.errors.push(key.into());
    }

    pub fn add_warning(&mut self, key: impl Into<String>) {
        self.warnings.push(key.into());
    }

    /// Record `blocking` when the caller is binding, `advisory` otherwise.
    pub fn add_for_caller(&mut self, binding: bool, blocking: &str, advisory: &str) {
        if binding {
            self.add_error(blocking);
        } else {
            self.add_warning(advisory);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the pool may be bound.
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }
}
