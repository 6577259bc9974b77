//! Cross-cutting plumbing shared by Courier binaries: env config, error bodies,
//! health probe, request ids, serde helpers and tracing setup.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
