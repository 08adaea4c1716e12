//! Consumer type labels the rules treat specially.

use std::fmt;
use std::str::FromStr;

/// Well-known consumer type labels.
///
/// Consumer types are open-ended on the wire, so entities keep the raw
/// label and compare against these constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerTypeLabel {
    /// A registered physical or virtual system.
    System,
    /// A hypervisor reported by virt-who; treated like a system.
    Hypervisor,
    /// An organisation-wide certificate holder, exempt from type checks.
    Uebercert,
    /// A person consumer; its pools cannot go on activation keys.
    Person,
}

impl ConsumerTypeLabel {
    /// Return the label as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Hypervisor => "hypervisor",
            Self::Uebercert => "uebercert",
            Self::Person => "person",
        }
    }

    /// Check whether a raw label names this type.
    pub fn matches(&self, label: &str) -> bool {
        self.as_str() == label
    }
}

impl fmt::Display for ConsumerTypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConsumerTypeLabel {
    type Err = crate::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "hypervisor" => Ok(Self::Hypervisor),
            "uebercert" => Ok(Self::Uebercert),
            "person" => Ok(Self::Person),
            _ => Err(crate::AppError::validation(format!(
                "Unknown consumer type: '{s}'"
            ))),
        }
    }
}
