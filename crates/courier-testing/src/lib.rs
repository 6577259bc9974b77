//! Test utilities for Courier crates.
//!
//! Import from `[dev-dependencies]` only, never in production code.

pub mod auth;
