//! Subscription pool view model.

pub mod attribute;
pub mod model;

pub use attribute::{Attribute, ProvidedProduct};
pub use model::Pool;
