//! # lod2-api
//!
//! HTTP API layer for lod2 built on Axum.
//!
//! Provides the login, invite registration, account and user administration
//! endpoints, the identity middleware that resolves the token cookies on
//! every request, extractors, DTOs, and error mapping.

pub mod cookies;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
