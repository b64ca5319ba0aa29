//! CIP-64 Transaction Construction and Encoding
//!
//! Wire format:
//! `0x7b || rlp([chain_id, nonce, max_priority_fee_per_gas, max_fee_per_gas,
//!              gas_limit, to, value, data, access_list, fee_currency,
//!              (y_parity, r, s)])`

use super::types::{
    AccessListItem, Cip64Transaction, Cip64TxFields, Signature, TxCache, TxOptions,
    CIP64_TX_TYPE, SIGNED_FIELD_COUNT, UNSIGNED_FIELD_COUNT,
};
use super::validation::{
    check_access_list, check_canonical_integers, check_fee_ordering, check_not_list,
    check_overflow, check_signature_form, expect_address, expect_bytes,
    expect_optional_address, expect_u256,
};
use crate::error::{Cip64Error, Cip64Result};
use crate::log_debug;
use crate::rlp::{self, RlpItem};
use crate::utils::chain_config::{ChainConfig, ChainContext, Hardfork};
use ethers_core::types::U256;

/// Unvalidated signature triple as it arrives from the wire or a request
pub(crate) type RawSignature = (U256, U256, U256);

impl Cip64Transaction {
    /// Validate fields into an unsigned transaction
    pub fn new(fields: Cip64TxFields, opts: TxOptions) -> Cip64Result<Self> {
        Self::build(fields, None, opts)
    }

    /// Validate fields against a chain context
    pub fn with_context(fields: Cip64TxFields, ctx: &impl ChainContext) -> Cip64Result<Self> {
        Self::new(fields, TxOptions::with_chain(ChainConfig::from_context(ctx)?))
    }

    /// Single construction path; every record passes through here
    pub(crate) fn build(
        fields: Cip64TxFields,
        signature: Option<RawSignature>,
        options: TxOptions,
    ) -> Cip64Result<Self> {
        let hardfork = match &options.chain {
            Some(chain) => {
                let expected = ChainContext::chain_id(chain);
                if expected != fields.chain_id {
                    return Err(Cip64Error::ChainIdMismatch {
                        expected,
                        actual: fields.chain_id,
                    });
                }
                chain.hardfork()
            }
            None => Hardfork::default(),
        };

        check_overflow(
            fields.gas_limit,
            fields.max_fee_per_gas,
            fields.max_priority_fee_per_gas,
        )?;
        check_fee_ordering(
            fields.gas_limit,
            fields.max_fee_per_gas,
            fields.max_priority_fee_per_gas,
        )?;

        let signature = signature
            .map(|(v, r, s)| {
                check_signature_form(v, s, hardfork).map(|y_parity| Signature { y_parity, r, s })
            })
            .transpose()?;

        Ok(Self {
            fields,
            signature,
            hardfork,
            options,
            cache: TxCache::default(),
        })
    }

    /// Positional field list: 10 entries, 13 when signed
    pub fn raw(&self) -> Vec<RlpItem> {
        let f = &self.fields;
        let mut values = vec![
            RlpItem::from_u256(&f.chain_id),
            RlpItem::from_u256(&f.nonce),
            RlpItem::from_u256(&f.max_priority_fee_per_gas),
            RlpItem::from_u256(&f.max_fee_per_gas),
            RlpItem::from_u256(&f.gas_limit),
            RlpItem::Bytes(f.to.map(|to| to.to_vec()).unwrap_or_default()),
            RlpItem::from_u256(&f.value),
            RlpItem::Bytes(f.data.clone()),
            access_list_item(&f.access_list),
            RlpItem::Bytes(f.fee_currency.to_vec()),
        ];

        if let Some(sig) = &self.signature {
            values.push(RlpItem::from_u256(&U256::from(sig.y_parity)));
            values.push(RlpItem::from_u256(&sig.r));
            values.push(RlpItem::from_u256(&sig.s));
        }

        values
    }

    /// Serialize for broadcast: `0x7b || rlp(raw())`
    pub fn encode(&self) -> Vec<u8> {
        with_type_prefix(&rlp::encode_list(&self.raw()))
    }

    /// Hex form of [`encode`](Self::encode), `0x`-prefixed
    pub fn encode_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encode()))
    }

    /// Decode a serialized transaction
    pub fn decode(serialized: &[u8], opts: TxOptions) -> Cip64Result<Self> {
        match serialized.first() {
            Some(&CIP64_TX_TYPE) => {}
            received => {
                return Err(Cip64Error::WrongTransactionType {
                    expected: CIP64_TX_TYPE,
                    received: received.copied(),
                })
            }
        }

        match rlp::decode(&serialized[1..])? {
            RlpItem::List(values) => Self::from_values(values, opts),
            RlpItem::Bytes(_) => Err(Cip64Error::malformed(
                "transaction",
                "Invalid serialized tx input: must be array",
            )),
        }
    }

    /// Decode a `0x`-prefixed (or bare) hex string
    pub fn decode_hex(serialized: &str, opts: TxOptions) -> Cip64Result<Self> {
        let trimmed = serialized.trim();
        let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| Cip64Error::invalid_field("serialized", e.to_string()))?;
        Self::decode(&bytes, opts)
    }

    /// Build from a positional field list
    pub fn from_values(values: Vec<RlpItem>, opts: TxOptions) -> Cip64Result<Self> {
        if values.len() != UNSIGNED_FIELD_COUNT && values.len() != SIGNED_FIELD_COUNT {
            return Err(Cip64Error::malformed(
                "transaction",
                format!(
                    "invalid field count: only expecting {} values (for unsigned tx) or {} values (for signed tx), got {}",
                    UNSIGNED_FIELD_COUNT,
                    SIGNED_FIELD_COUNT,
                    values.len()
                ),
            ));
        }

        let sig_items = values.get(UNSIGNED_FIELD_COUNT..);
        let (v, r, s) = match sig_items {
            Some([v, r, s]) => (Some(v), Some(r), Some(s)),
            _ => (None, None, None),
        };

        check_not_list(&[("chainId", Some(&values[0])), ("v", v)])?;
        check_canonical_integers(&[
            ("chainId", Some(&values[0])),
            ("nonce", Some(&values[1])),
            ("maxPriorityFeePerGas", Some(&values[2])),
            ("maxFeePerGas", Some(&values[3])),
            ("gasLimit", Some(&values[4])),
            ("value", Some(&values[6])),
            ("v", v),
            ("r", r),
            ("s", s),
        ])?;

        let fields = Cip64TxFields {
            chain_id: expect_u256("chainId", &values[0])?,
            nonce: expect_u256("nonce", &values[1])?,
            max_priority_fee_per_gas: expect_u256("maxPriorityFeePerGas", &values[2])?,
            max_fee_per_gas: expect_u256("maxFeePerGas", &values[3])?,
            gas_limit: expect_u256("gasLimit", &values[4])?,
            to: expect_optional_address("to", &values[5])?,
            value: expect_u256("value", &values[6])?,
            data: expect_bytes("data", &values[7])?.to_vec(),
            access_list: check_access_list(&values[8])?,
            fee_currency: expect_address("feeCurrency", &values[9])?,
        };

        let signature = match (v, r, s) {
            (Some(v), Some(r), Some(s)) => Some((
                expect_u256("v", v)?,
                expect_u256("r", r)?,
                expect_u256("s", s)?,
            )),
            _ => None,
        };

        let tx = Self::build(fields, signature, opts)?;
        log_debug!(
            "cip64",
            "decoded transaction",
            fields = values.len(),
            chain_id = tx.fields.chain_id,
            nonce = tx.fields.nonce,
        );
        Ok(tx)
    }

    /// Gas charged for calldata, access list and init code.
    ///
    /// Cached on frozen records.
    pub fn data_fee(&self) -> U256 {
        if self.options.freeze {
            *self.cache.data_fee.get_or_init(|| self.compute_data_fee())
        } else {
            self.compute_data_fee()
        }
    }

    fn compute_data_fee(&self) -> U256 {
        let hardfork = self.hardfork;
        let data = &self.fields.data;

        let zero_bytes = data.iter().filter(|&&b| b == 0).count() as u64;
        let non_zero_bytes = data.len() as u64 - zero_bytes;
        let mut cost = zero_bytes * hardfork.tx_data_zero_gas()
            + non_zero_bytes * hardfork.tx_data_non_zero_gas();

        if self.is_contract_creation() {
            if let Some(word_gas) = hardfork.init_code_word_gas() {
                cost += (data.len() as u64).div_ceil(32) * word_gas;
            }
        }

        let storage_keys: u64 = self
            .fields
            .access_list
            .iter()
            .map(|item| item.storage_keys.len() as u64)
            .sum();
        cost += self.fields.access_list.len() as u64 * hardfork.access_list_address_gas()
            + storage_keys * hardfork.access_list_storage_key_gas();

        U256::from(cost)
    }

    /// Intrinsic gas: base transaction cost plus [`data_fee`](Self::data_fee)
    pub fn base_fee(&self) -> U256 {
        let mut fee = self.data_fee() + U256::from(self.hardfork.tx_gas());
        if self.is_contract_creation() {
            fee += U256::from(self.hardfork.tx_creation_gas());
        }
        fee
    }

    /// Upfront balance needed: `gasLimit * effectiveGasPrice + value`.
    ///
    /// Priced in the native asset; no fee-currency conversion is applied.
    /// `None` when the total does not fit in 256 bits.
    pub fn estimate_fee(&self, base_fee_per_gas: U256) -> Option<U256> {
        let f = &self.fields;
        // min(prio, maxFee - base) + base, without underflow; capped by maxFee
        let gas_price = f
            .max_priority_fee_per_gas
            .saturating_add(base_fee_per_gas)
            .min(f.max_fee_per_gas);
        f.gas_limit.checked_mul(gas_price)?.checked_add(f.value)
    }

    /// Human-readable problems; empty when the transaction is usable
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let intrinsic = self.base_fee();
        if intrinsic > self.fields.gas_limit {
            errors.push(format!(
                "gasLimit is too low. given {}, need at least {}",
                self.fields.gas_limit, intrinsic
            ));
        }

        if self.is_signed() && !self.verify_signature() {
            errors.push("Invalid Signature".to_string());
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

fn access_list_item(access_list: &[AccessListItem]) -> RlpItem {
    RlpItem::List(
        access_list
            .iter()
            .map(|item| {
                RlpItem::List(vec![
                    RlpItem::Bytes(item.address.to_vec()),
                    RlpItem::List(
                        item.storage_keys
                            .iter()
                            .map(|key| RlpItem::Bytes(key.to_vec()))
                            .collect(),
                    ),
                ])
            })
            .collect(),
    )
}

pub(crate) fn with_type_prefix(rlp: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(1 + rlp.len());
    encoded.push(CIP64_TX_TYPE);
    encoded.extend_from_slice(rlp);
    encoded
}
