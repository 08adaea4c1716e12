//! Consumer view model.

pub mod guest;
pub mod model;

pub use guest::GuestId;
pub use model::{Capability, Consumer, ConsumerType, InstalledProduct};
