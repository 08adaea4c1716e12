//! Activation key view model.

pub mod model;

pub use model::{ActivationKey, ActivationKeyPool, KeyProfile};
