//! # lod2-entity
//!
//! Domain entity models for lod2. Every struct in this crate represents a
//! database table row or a domain value object derived from one.

pub mod invite;
pub mod role;
pub mod session;
pub mod user;
