//! # candlepin-core
//!
//! Core crate for the Candlepin policy engine. Contains the unified error
//! system, configuration schemas, and the shared vocabulary used by the
//! rules: typed identifiers, product attribute names, consumer fact names,
//! consumer type labels, and validation caller contexts.
//!
//! This crate has **no** internal dependencies on other Candlepin crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;
pub mod util;

pub use error::AppError;
pub use result::AppResult;
