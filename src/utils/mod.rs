//! Utilities Module
//!
//! Common utilities used across the crate.

pub mod chain_config;
pub mod crypto;
pub mod logging;

pub use chain_config::*;
pub use crypto::*;
