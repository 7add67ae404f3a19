//! Convenience result alias.

use crate::error::AppError;

/// Result type used by every lod2 crate below the HTTP boundary.
pub type AppResult<T> = Result<T, AppError>;
