//! # lod2-core
//!
//! Core crate for lod2. Contains configuration schemas, prefixed typed
//! identifiers, and the unified error system.
//!
//! This crate has **no** internal dependencies on other lod2 crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
