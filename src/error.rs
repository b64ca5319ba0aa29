//! Error types for CIP-64 envelope operations
//!
//! Every failure is a hard rejection of the operation that raised it. Each
//! variant carries the field and values needed for a precise diagnostic, and
//! maps onto a serializable [`ErrorCode`] for machine-readable reporting.

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// Error raised while constructing, decoding, signing or verifying a
/// CIP-64 transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Cip64Error {
    #[error(
        "Invalid serialized tx input: not a CIP64 transaction (wrong tx type, expected: 0x{expected:02x}, received: {})",
        received_label(*received)
    )]
    WrongTransactionType { expected: u8, received: Option<u8> },

    #[error("Malformed encoding in {field}: {reason}")]
    MalformedEncoding { field: &'static str, reason: String },

    #[error("Invalid access list: {0}")]
    InvalidAccessList(String),

    #[error(
        "{reason} (gasLimit={gas_limit} maxFeePerGas={max_fee_per_gas} maxPriorityFeePerGas={max_priority_fee_per_gas})"
    )]
    InvalidFeeParameters {
        reason: &'static str,
        gas_limit: U256,
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Transaction is not signed: cannot {0}")]
    NotSigned(&'static str),

    #[error("The chain ID does not match the configured chain (expected: {expected}, received: {actual})")]
    ChainIdMismatch { expected: U256, actual: U256 },

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
}

fn received_label(received: Option<u8>) -> String {
    match received {
        Some(byte) => match crate::cip64::TxType::from_type_byte(byte) {
            Some(known) => format!("0x{:02x} ({})", byte, known.name()),
            None => format!("0x{:02x}", byte),
        },
        None => "none".to_string(),
    }
}

impl Cip64Error {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Cip64Error::MalformedEncoding {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Cip64Error::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Category of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Cip64Error::WrongTransactionType { .. } => ErrorCode::WrongTransactionType,
            Cip64Error::MalformedEncoding { .. } => ErrorCode::MalformedEncoding,
            Cip64Error::InvalidAccessList(_) => ErrorCode::InvalidAccessList,
            Cip64Error::InvalidFeeParameters { .. } => ErrorCode::InvalidFeeParameters,
            Cip64Error::InvalidSignature(_) => ErrorCode::InvalidSignature,
            Cip64Error::NotSigned(_) => ErrorCode::NotSigned,
            Cip64Error::ChainIdMismatch { .. } => ErrorCode::ChainIdMismatch,
            Cip64Error::InvalidField { .. } => ErrorCode::InvalidField,
            Cip64Error::InvalidPrivateKey(_) => ErrorCode::InvalidPrivateKey,
        }
    }

    /// Serializable form for reporting across process boundaries
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Wire format
    WrongTransactionType,
    MalformedEncoding,
    InvalidAccessList,

    // Semantic validation
    InvalidFeeParameters,
    ChainIdMismatch,
    InvalidField,

    // Signatures
    InvalidSignature,
    NotSigned,
    InvalidPrivateKey,
}

/// Machine-readable error report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

/// Result type alias for CIP-64 operations
pub type Cip64Result<T> = Result<T, Cip64Error>;

impl From<crate::rlp::RlpError> for Cip64Error {
    fn from(e: crate::rlp::RlpError) -> Self {
        Cip64Error::malformed("rlp", e.to_string())
    }
}
