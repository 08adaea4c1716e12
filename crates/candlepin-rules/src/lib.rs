//! # candlepin-rules
//!
//! The entitlement policy engine. Given JSON snapshots of consumers, pools
//! and entitlements it decides:
//!
//! - whether a consumer's installed products are covered ([`compliance`]),
//! - which pools to attach and how many of each ([`autobind`]),
//! - whether a pool may be bound, listed or exported ([`validation`]),
//! - how many entitlements to suggest for a pool ([`quantity`]),
//! - how a pool should be labelled ([`pool_type`]) and whether it may go on
//!   an activation key ([`activation_key`]).
//!
//! Every rule is a pure function of its inputs. Rule structs own their
//! configuration and are cheap to clone; the current time is always passed
//! in explicitly.

pub mod activation_key;
pub mod arch;
pub mod autobind;
pub mod compliance;
pub mod coverage;
pub mod facts;
pub mod pool_type;
pub mod quantity;
pub mod request;
pub mod tracker;
pub mod validation;

pub use activation_key::validate_key_pool;
pub use autobind::AutobindRules;
pub use compliance::{ComplianceRules, is_ent_compliant, is_stack_compliant};
pub use coverage::Coverage;
pub use pool_type::{PoolType, PoolTypeResult};
pub use quantity::{SuggestedQuantity, suggested_quantities, suggested_quantity};
pub use request::{
    ActivationKeyRequest, AutobindRequest, ComplianceRequest, PoolTypeRequest, QuantityRequest,
    ValidationRequest,
};
pub use tracker::ComplianceTracker;
pub use validation::{EntitlementRules, ValidationResult};
