//! System purpose attributes used to rank pools during auto-bind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A system purpose dimension on which consumer intent and pool offering
/// are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyspurposeAttribute {
    /// Installed products versus provided products.
    Products,
    /// Consumer role versus the product `roles` attribute.
    Roles,
    /// Consumer add-ons versus the product `addons` attribute.
    Addons,
    /// Consumer service level versus the product `support_level` attribute.
    SupportLevel,
    /// Consumer usage versus the product `usage` attribute.
    Usage,
}

impl SyspurposeAttribute {
    /// All dimensions in scoring order.
    pub const ALL: [SyspurposeAttribute; 5] = [
        Self::Products,
        Self::Roles,
        Self::Addons,
        Self::SupportLevel,
        Self::Usage,
    ];

    /// Relative weight of the dimension in the pool priority score.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Products => 20.0,
            Self::Roles => 10.0,
            Self::Addons => 5.0,
            Self::SupportLevel => 3.0,
            Self::Usage => 1.0,
        }
    }

    /// The product attribute carrying the pool side of this dimension.
    /// `Products` is read from the provided product list instead.
    pub fn product_attribute(&self) -> Option<&'static str> {
        match self {
            Self::Products => None,
            Self::Roles => Some(super::attribute::names::ROLES),
            Self::Addons => Some("addons"),
            Self::SupportLevel => Some(super::attribute::names::SUPPORT_LEVEL),
            Self::Usage => Some(super::attribute::names::USAGE),
        }
    }

    /// Whether the pool side is a comma separated list.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::Roles | Self::Addons)
    }
}

impl fmt::Display for SyspurposeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Products => "products",
            Self::Roles => "roles",
            Self::Addons => "addons",
            Self::SupportLevel => "support_level",
            Self::Usage => "usage",
        };
        write!(f, "{name}")
    }
}
