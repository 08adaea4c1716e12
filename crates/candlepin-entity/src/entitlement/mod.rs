//! Entitlement view model.

pub mod model;

pub use model::Entitlement;
