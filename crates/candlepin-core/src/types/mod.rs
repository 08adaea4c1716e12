//! Shared vocabulary used across the Candlepin policy workspace.

pub mod attribute;
pub mod caller;
pub mod consumer_type;
pub mod id;
pub mod syspurpose;

pub use attribute::ProductAttribute;
pub use caller::CallerType;
pub use consumer_type::ConsumerTypeLabel;
pub use id::*;
pub use syspurpose::SyspurposeAttribute;
