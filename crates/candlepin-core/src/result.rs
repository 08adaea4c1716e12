//! Convenience result type alias for the policy engine.

use crate::error::AppError;

/// A specialized `Result` type for envelope parsing, configuration and I/O.
///
/// The rule evaluation itself is infallible; only the boundary where raw
/// input enters the engine returns `AppResult`.
pub type AppResult<T> = Result<T, AppError>;
