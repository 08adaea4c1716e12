//! # candlepin-entity
//!
//! View models for the Candlepin policy engine. Every struct in this crate
//! mirrors a JSON snapshot delivered by the host application (pools,
//! consumers, entitlements, activation keys) or a value the rules hand
//! back (compliance status, reasons, date ranges). All models derive
//! `Debug`, `Clone`, `Serialize` and `Deserialize` with camelCase field
//! names, and expose read-only accessors the rules build on.

pub mod activation_key;
pub mod compliance;
pub mod consumer;
pub mod entitlement;
pub mod pool;
pub mod serde_util;

pub use activation_key::{ActivationKey, ActivationKeyPool, KeyProfile};
pub use compliance::{ComplianceReason, ComplianceStatus, DateRange, ReasonSource, StatusLabel};
pub use consumer::{Capability, Consumer, ConsumerType, GuestId, InstalledProduct};
pub use entitlement::Entitlement;
pub use pool::{Attribute, Pool, ProvidedProduct};
