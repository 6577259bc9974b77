//! Session-token types shared by the Courier API and its tests.
//!
//! Provides JWT issuing/validation, bearer-header parsing and the `Identity` extractor.

pub mod identity;
pub mod token;
