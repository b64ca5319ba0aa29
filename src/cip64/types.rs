//! CIP-64 Type Definitions
//!
//! Core types for the fee-currency transaction envelope.

use crate::utils::chain_config::{ChainConfig, Hardfork};
use ethers_core::types::U256;
use std::sync::OnceLock;

/// CIP-64 transaction type identifier
pub const CIP64_TX_TYPE: u8 = 0x7b;

/// Field count of an unsigned envelope
pub const UNSIGNED_FIELD_COUNT: usize = 10;

/// Field count of a signed envelope
pub const SIGNED_FIELD_COUNT: usize = 13;

/// Half the secp256k1 group order; `s` above this is rejected (EIP-2)
pub const SECP256K1_N_DIV_2: U256 = U256([
    0xdfe9_2f46_681b_20a0,
    0x5d57_6e73_57a4_501d,
    0xffff_ffff_ffff_ffff,
    0x7fff_ffff_ffff_ffff,
]);

/// 20-byte account address
pub type Address = [u8; 20];

/// 32-byte storage slot key
pub type StorageKey = [u8; 32];

/// Typed envelopes sharing the outer wire format on Celo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    Eip1559,
    Cip66,
    Cip64,
    Cip42,
}

impl TxType {
    pub fn type_byte(&self) -> u8 {
        match self {
            TxType::Eip1559 => 0x02,
            TxType::Cip66 => 0x7a,
            TxType::Cip64 => CIP64_TX_TYPE,
            TxType::Cip42 => 0x7c,
        }
    }

    pub fn from_type_byte(byte: u8) -> Option<Self> {
        match byte {
            0x02 => Some(TxType::Eip1559),
            0x7a => Some(TxType::Cip66),
            CIP64_TX_TYPE => Some(TxType::Cip64),
            0x7c => Some(TxType::Cip42),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TxType::Eip1559 => "eip1559",
            TxType::Cip66 => "cip66",
            TxType::Cip64 => "cip64",
            TxType::Cip42 => "cip42",
        }
    }
}

/// Access list entry (address + storage keys)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<StorageKey>,
}

impl AccessListItem {
    pub fn new(address: Address, storage_keys: Vec<StorageKey>) -> Self {
        Self {
            address,
            storage_keys,
        }
    }
}

/// Transaction signature with a plain 0/1 parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub y_parity: u8,
    pub r: U256,
    pub s: U256,
}

/// The payload fields of a CIP-64 transaction.
///
/// This is plain input data; validation happens when it is turned into a
/// [`Cip64Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cip64TxFields {
    pub chain_id: U256,
    pub nonce: U256,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas_limit: U256,
    /// `None` for contract creation
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub access_list: Vec<AccessListItem>,
    /// Token used to pay for gas
    pub fee_currency: Address,
}

impl Cip64TxFields {
    /// Zeroed fields for a chain and fee currency
    pub fn new(chain_id: impl Into<U256>, fee_currency: Address) -> Self {
        Self {
            chain_id: chain_id.into(),
            nonce: U256::zero(),
            max_priority_fee_per_gas: U256::zero(),
            max_fee_per_gas: U256::zero(),
            gas_limit: U256::zero(),
            to: None,
            value: U256::zero(),
            data: Vec::new(),
            access_list: Vec::new(),
            fee_currency,
        }
    }

    pub fn with_nonce(mut self, nonce: impl Into<U256>) -> Self {
        self.nonce = nonce.into();
        self
    }

    pub fn with_max_priority_fee(mut self, fee: impl Into<U256>) -> Self {
        self.max_priority_fee_per_gas = fee.into();
        self
    }

    pub fn with_max_fee(mut self, fee: impl Into<U256>) -> Self {
        self.max_fee_per_gas = fee.into();
        self
    }

    pub fn with_gas_limit(mut self, limit: impl Into<U256>) -> Self {
        self.gas_limit = limit.into();
        self
    }

    pub fn with_to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn with_value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn add_access_list_item(mut self, item: AccessListItem) -> Self {
        self.access_list.push(item);
        self
    }
}

/// Construction options
#[derive(Debug, Clone)]
pub struct TxOptions {
    /// Chain the transaction must belong to; `None` adopts the transaction's
    /// own chain id with the default hardfork
    pub chain: Option<ChainConfig>,
    /// Frozen records cache their hash and data fee
    pub freeze: bool,
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            chain: None,
            freeze: true,
        }
    }
}

impl TxOptions {
    pub fn with_chain(chain: ChainConfig) -> Self {
        Self {
            chain: Some(chain),
            freeze: true,
        }
    }

    pub fn unfrozen(mut self) -> Self {
        self.freeze = false;
        self
    }
}

/// Write-once derived values
#[derive(Debug, Clone, Default)]
pub(crate) struct TxCache {
    pub(crate) hash: OnceLock<[u8; 32]>,
    pub(crate) data_fee: OnceLock<U256>,
}

/// A validated, immutable CIP-64 transaction, unsigned or signed.
///
/// Construct with [`Cip64Transaction::new`], [`Cip64Transaction::decode`] or
/// [`Cip64Transaction::from_request`]. Signing yields a new value.
#[derive(Debug, Clone)]
pub struct Cip64Transaction {
    pub(crate) fields: Cip64TxFields,
    pub(crate) signature: Option<Signature>,
    pub(crate) hardfork: Hardfork,
    pub(crate) options: TxOptions,
    pub(crate) cache: TxCache,
}

impl Cip64Transaction {
    pub fn fields(&self) -> &Cip64TxFields {
        &self.fields
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn hardfork(&self) -> Hardfork {
        self.hardfork
    }

    pub fn is_frozen(&self) -> bool {
        self.options.freeze
    }

    pub fn chain_id(&self) -> U256 {
        self.fields.chain_id
    }

    pub fn nonce(&self) -> U256 {
        self.fields.nonce
    }

    pub fn max_priority_fee_per_gas(&self) -> U256 {
        self.fields.max_priority_fee_per_gas
    }

    pub fn max_fee_per_gas(&self) -> U256 {
        self.fields.max_fee_per_gas
    }

    pub fn gas_limit(&self) -> U256 {
        self.fields.gas_limit
    }

    pub fn to(&self) -> Option<&Address> {
        self.fields.to.as_ref()
    }

    pub fn value(&self) -> U256 {
        self.fields.value
    }

    pub fn data(&self) -> &[u8] {
        &self.fields.data
    }

    pub fn access_list(&self) -> &[AccessListItem] {
        &self.fields.access_list
    }

    pub fn fee_currency(&self) -> &Address {
        &self.fields.fee_currency
    }

    /// Contract creation transactions carry no recipient
    pub fn is_contract_creation(&self) -> bool {
        self.fields.to.is_none()
    }
}

/// Records are equal when their payload and signature are; caches and
/// options do not take part.
impl PartialEq for Cip64Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.signature == other.signature
    }
}

impl Eq for Cip64Transaction {}
