//! Caller context for pre-entitlement validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The host operation on whose behalf a pool is being validated.
///
/// Several checks block only when the caller is about to bind; listing
/// callers get a warning instead so the pool can still be shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerType {
    /// Auto-bind pool selection.
    BestPools,
    /// An explicit bind request.
    Bind,
    /// Listing available pools.
    ListPools,
    /// Anything else.
    #[default]
    #[serde(other)]
    Unknown,
}

impl CallerType {
    /// Whether failures for this caller should block instead of warn.
    pub fn is_binding(&self) -> bool {
        matches!(self, Self::BestPools | Self::Bind)
    }

    /// Return the caller as its wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BestPools => "best_pools",
            Self::Bind => "bind",
            Self::ListPools => "list_pools",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CallerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CallerType {
    type Err = crate::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "best_pools" => Ok(Self::BestPools),
            "bind" => Ok(Self::Bind),
            "list_pools" => Ok(Self::ListPools),
            "unknown" => Ok(Self::Unknown),
            _ => Err(crate::AppError::validation(format!(
                "Invalid caller: '{s}'. Expected one of: best_pools, bind, list_pools, unknown"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_callers() {
        assert!(CallerType::Bind.is_binding());
        assert!(CallerType::BestPools.is_binding());
        assert!(!CallerType::ListPools.is_binding());
        assert!(!CallerType::Unknown.is_binding());
    }

    #[test]
    fn test_unrecognised_label_deserializes_as_unknown() {
        let caller: CallerType = serde_json::from_str("\"subscribe\"").unwrap();
        assert_eq!(caller, CallerType::Unknown);
        assert_eq!("BIND".parse::<CallerType>().unwrap(), CallerType::Bind);
        assert!("nope".parse::<CallerType>().is_err());
    }
}
