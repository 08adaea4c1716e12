//! Product attribute and consumer fact names understood by the rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Consumer fact names.
pub mod facts {
    /// Number of CPU sockets.
    pub const SOCKETS: &str = "cpu.cpu_socket(s)";
    /// Total memory in kilobytes.
    pub const RAM: &str = "memory.memtotal";
    /// Cores per socket.
    pub const CORES_PER_SOCKET: &str = "cpu.core(s)_per_socket";
    /// Machine architecture, e.g. `x86_64`.
    pub const ARCH: &str = "uname.machine";
    /// `"true"` when the consumer is a virtual guest.
    pub const IS_VIRT_GUEST: &str = "virt.is_guest";
    /// Storage band usage in terabytes.
    pub const STORAGE_BAND_USAGE: &str = "band.storage.usage";
    /// The guest's own virtualization UUID.
    pub const VIRT_UUID: &str = "virt.uuid";
}

/// Pool and product attribute names that are not stacked on.
pub mod names {
    pub const INSTANCE_MULTIPLIER: &str = "instance_multiplier";
    pub const REQUIRES_HOST: &str = "requires_host";
    pub const REQUIRES_CONSUMER: &str = "requires_consumer";
    pub const REQUIRES_CONSUMER_TYPE: &str = "requires_consumer_type";
    pub const VIRT_ONLY: &str = "virt_only";
    pub const PHYSICAL_ONLY: &str = "physical_only";
    pub const POOL_DERIVED: &str = "pool_derived";
    pub const UNMAPPED_GUESTS_ONLY: &str = "unmapped_guests_only";
    pub const MULTI_ENTITLEMENT: &str = "multi-entitlement";
    pub const STACKING_ID: &str = "stacking_id";
    /// Syspurpose service level offered by the product.
    pub const SUPPORT_LEVEL: &str = "support_level";
    /// Syspurpose usage offered by the product.
    pub const USAGE: &str = "usage";
    /// Syspurpose roles offered by the product (comma separated).
    pub const ROLES: &str = "roles";
    /// Consumer capability a distributor must declare to use derived pools.
    pub const DERIVED_PRODUCT_CAPABILITY: &str = "derived_product";
}

/// Product attributes that take part in coverage calculation.
///
/// Every attribute a compliance tracker can enforce has a variant here, so
/// accumulation strategies, coverage conditions and fact calculators are
/// all exhaustive matches over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductAttribute {
    Sockets,
    Cores,
    Ram,
    Arch,
    Vcpu,
    GuestLimit,
    StorageBand,
    Role,
    Addons,
}

/// Attributes checked for physical consumers, in evaluation order.
pub const PHYSICAL_ATTRIBUTES: &[ProductAttribute] = &[
    ProductAttribute::Sockets,
    ProductAttribute::Cores,
    ProductAttribute::Ram,
    ProductAttribute::Arch,
    ProductAttribute::GuestLimit,
    ProductAttribute::StorageBand,
    ProductAttribute::Role,
    ProductAttribute::Addons,
];

/// Attributes checked for virtual guests, in evaluation order.
pub const VIRT_ATTRIBUTES: &[ProductAttribute] = &[
    ProductAttribute::Vcpu,
    ProductAttribute::Ram,
    ProductAttribute::Arch,
    ProductAttribute::GuestLimit,
    ProductAttribute::StorageBand,
    ProductAttribute::Role,
    ProductAttribute::Addons,
];

impl ProductAttribute {
    /// Return the attribute name as it appears on products.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sockets => "sockets",
            Self::Cores => "cores",
            Self::Ram => "ram",
            Self::Arch => "arch",
            Self::Vcpu => "vcpu",
            Self::GuestLimit => "guest_limit",
            Self::StorageBand => "storage_band",
            Self::Role => "role",
            Self::Addons => "addons",
        }
    }

    /// The consumer fact this attribute is compared against, if any.
    pub fn consumer_fact(&self) -> Option<&'static str> {
        match self {
            Self::Sockets => Some(facts::SOCKETS),
            Self::Cores | Self::Vcpu => Some(facts::CORES_PER_SOCKET),
            Self::Arch => Some(facts::ARCH),
            Self::Ram => Some(facts::RAM),
            Self::StorageBand => Some(facts::STORAGE_BAND_USAGE),
            Self::GuestLimit | Self::Role | Self::Addons => None,
        }
    }

    /// Attributes whose coverage is computed across every entitlement the
    /// consumer holds rather than within one stack.
    pub fn is_global(&self) -> bool {
        matches!(self, Self::GuestLimit)
    }

    /// Attributes left unchecked for guests when a stack contains a
    /// host-restricted pool.
    pub fn unchecked_when_host_restricted(&self) -> bool {
        matches!(self, Self::Ram | Self::Vcpu)
    }

    /// Attributes that stacking more entitlements can never change.
    pub fn affects_quantity(&self) -> bool {
        !matches!(
            self,
            Self::Arch | Self::GuestLimit | Self::Addons | Self::Role
        )
    }

    /// The attribute set relevant for a guest or physical consumer.
    pub fn for_consumer(is_guest: bool) -> &'static [ProductAttribute] {
        if is_guest {
            VIRT_ATTRIBUTES
        } else {
            PHYSICAL_ATTRIBUTES
        }
    }
}

impl fmt::Display for ProductAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProductAttribute {
    type Err = crate::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sockets" => Ok(Self::Sockets),
            "cores" => Ok(Self::Cores),
            "ram" => Ok(Self::Ram),
            "arch" => Ok(Self::Arch),
            "vcpu" => Ok(Self::Vcpu),
            "guest_limit" => Ok(Self::GuestLimit),
            "storage_band" => Ok(Self::StorageBand),
            "role" => Ok(Self::Role),
            "addons" => Ok(Self::Addons),
            _ => Err(crate::AppError::validation(format!(
                "Not a stackable product attribute: '{s}'"
            ))),
        }
    }
}
