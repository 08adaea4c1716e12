//! Auto-bind pool selection configuration.

use serde::{Deserialize, Serialize};

/// Auto-bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutobindConfig {
    /// Service levels that never restrict pool selection. Merged with the
    /// exempt list sent in each request.
    #[serde(default)]
    pub exempt_service_levels: Vec<String>,
    /// Upper bound on the stacking attributes considered when searching for
    /// parallel stacks. The search is exponential in this number.
    #[serde(default = "default_max_stacking_attributes")]
    pub max_stacking_attributes: usize,
}

impl Default for AutobindConfig {
    fn default() -> Self {
        Self {
            exempt_service_levels: Vec::new(),
            max_stacking_attributes: default_max_stacking_attributes(),
        }
    }
}

fn default_max_stacking_attributes() -> usize {
    8
}
