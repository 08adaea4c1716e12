//! Rule engine configuration schemas.
//!
//! All configuration structs are deserialized from an optional TOML file
//! and `CANDLEPIN_RULES__*` environment variables via the `config` crate.
//! Each sub-module represents a logical configuration section.

pub mod autobind;
pub mod compliance;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::autobind::AutobindConfig;
pub use self::compliance::ComplianceConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root rule engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Compliance calculation defaults.
    #[serde(default)]
    pub compliance: ComplianceConfig,
    /// Auto-bind pool selection settings.
    #[serde(default)]
    pub autobind: AutobindConfig,
}

impl RulesConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional; environment variables prefixed with
    /// `CANDLEPIN_RULES` (nested with `__`) are layered on top.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CANDLEPIN_RULES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(AppError::configuration(format!(
                "Invalid logging.format '{}'. Expected one of: json, pretty",
                self.logging.format
            )));
        }
        if self.compliance.newborn_window_hours < 0 {
            return Err(AppError::configuration(
                "compliance.newborn_window_hours must not be negative",
            ));
        }
        if self.autobind.max_stacking_attributes == 0 {
            return Err(AppError::configuration(
                "autobind.max_stacking_attributes must be at least 1",
            ));
        }
        Ok(())
    }
}
