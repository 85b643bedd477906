//! Core types and trait definitions for the pixeltrack email open tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod email;
pub mod error;
pub mod status;
pub mod store;
pub mod tracking;

pub use error::OpenError;
