//! Celo CIP-64 Core Library
//!
//! Typed transaction envelope (type `0x7b`) that lets an account pay gas in
//! an ERC-20 fee currency.
//!
//! # Architecture
//!
//! This crate provides:
//! - **rlp**: Strict RLP encoding and decoding
//! - **cip64**: Transaction record, codec, validation, signing and recovery
//! - **error**: Error taxonomy with machine-readable codes
//! - **utils**: Chain configuration, hashing and secp256k1, logging
//!
//! # Example
//!
//! ```rust,ignore
//! use celo_cip64::{Cip64Transaction, TxOptions};
//!
//! let tx = Cip64Transaction::decode_hex(serialized, TxOptions::default())?;
//! println!("sender: {}", celo_cip64::to_checksum_address(&tx.sender_address()?));
//! println!("hash:   0x{}", hex::encode(tx.hash()?));
//! ```

pub mod error;
pub mod rlp;
pub mod cip64;
pub mod utils;

// Re-export key types for convenience
pub use error::{Cip64Error, Cip64Result, ErrorCode, ErrorReport};
pub use cip64::{
    Cip64JsonTx, Cip64Transaction, Cip64TxFields, Cip64TxRequest, AccessListItem, Address,
    Signature, TxOptions, TxType, CIP64_TX_TYPE,
};
pub use utils::chain_config::{ChainConfig, ChainContext, Hardfork};

// Re-export crypto utilities for binaries
pub use utils::crypto::{keccak256, public_key_to_address, to_checksum_address};
