//! CIP-64 Fee-Currency Transactions
//!
//! Implements the Celo typed transaction envelope (0x7b) that pays gas in an
//! ERC-20 fee currency instead of the native asset.
//! Reference: https://github.com/celo-org/celo-proposals/blob/master/CIPs/cip-0064.md
//!
//! The payload matches EIP-1559 with one extra `feeCurrency` field appended
//! before the signature.

pub mod types;
pub mod validation;
pub mod transaction;
pub mod signer;
pub mod json;


pub use types::*;
pub use signer::*;
pub use json::*;
