//! JSON Views
//!
//! `Cip64JsonTx` is the hex-string rendering of a transaction.
//! `Cip64TxRequest` is the lenient input form accepted by
//! [`Cip64Transaction::from_request`].

use super::transaction::RawSignature;
use super::types::{AccessListItem, Address, Cip64Transaction, Cip64TxFields, TxOptions};
use super::validation::check_access_list_lengths;
use crate::error::{Cip64Error, Cip64Result};
use crate::utils::chain_config::ChainContext;
use ethers_core::types::U256;
use serde::{Deserialize, Deserializer, Serialize};

/// Access list entry as hex strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonAccessListItem {
    pub address: String,
    #[serde(default)]
    pub storage_keys: Vec<String>,
}

/// Hex-string view of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cip64JsonTx {
    pub chain_id: String,
    pub nonce: String,
    pub max_priority_fee_per_gas: String,
    pub max_fee_per_gas: String,
    pub gas_limit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub value: String,
    pub data: String,
    pub access_list: Vec<JsonAccessListItem>,
    pub fee_currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
}

/// An integer given as a JSON number, a `0x` hex string or a decimal string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quantity(pub U256);

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Quantity(U256::from(n))),
            Raw::Text(text) => parse_quantity(&text)
                .map(Quantity)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a `0x` hex or decimal quantity string
pub fn parse_quantity(text: &str) -> Result<U256, String> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some("") => Ok(U256::zero()),
        Some(digits) => U256::from_str_radix(digits, 16)
            .map_err(|e| format!("invalid hex quantity {:?}: {:?}", text, e)),
        None if text.is_empty() => Err("empty quantity".to_string()),
        None => U256::from_dec_str(text)
            .map_err(|e| format!("invalid decimal quantity {:?}: {:?}", text, e)),
    }
}

/// Lenient transaction input.
///
/// Missing quantities default to zero. A missing `chainId` is taken from the
/// configured chain.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cip64TxRequest {
    pub chain_id: Option<Quantity>,
    pub nonce: Option<Quantity>,
    pub max_priority_fee_per_gas: Option<Quantity>,
    pub max_fee_per_gas: Option<Quantity>,
    #[serde(alias = "gas")]
    pub gas_limit: Option<Quantity>,
    pub to: Option<String>,
    pub value: Option<Quantity>,
    #[serde(alias = "input")]
    pub data: Option<String>,
    #[serde(default)]
    pub access_list: Vec<JsonAccessListItem>,
    pub fee_currency: String,
    pub v: Option<Quantity>,
    pub r: Option<Quantity>,
    pub s: Option<Quantity>,
}

impl Cip64Transaction {
    /// Hex-string view
    pub fn to_json(&self) -> Cip64JsonTx {
        let f = &self.fields;
        let sig = self.signature.as_ref();
        Cip64JsonTx {
            chain_id: quantity(&f.chain_id),
            nonce: quantity(&f.nonce),
            max_priority_fee_per_gas: quantity(&f.max_priority_fee_per_gas),
            max_fee_per_gas: quantity(&f.max_fee_per_gas),
            gas_limit: quantity(&f.gas_limit),
            to: f.to.as_ref().map(|to| prefixed(to)),
            value: quantity(&f.value),
            data: prefixed(&f.data),
            access_list: f.access_list.iter().map(AccessListItem::to_json).collect(),
            fee_currency: prefixed(&f.fee_currency),
            v: sig.map(|s| format!("0x{:x}", s.y_parity)),
            r: sig.map(|s| quantity(&s.r)),
            s: sig.map(|s| quantity(&s.s)),
        }
    }

    /// Validate a request into a transaction
    pub fn from_request(request: &Cip64TxRequest, opts: TxOptions) -> Cip64Result<Self> {
        let chain_id = match (&request.chain_id, &opts.chain) {
            (Some(id), _) => id.0,
            (None, Some(chain)) => ChainContext::chain_id(chain),
            (None, None) => {
                return Err(Cip64Error::invalid_field(
                    "chainId",
                    "missing and no chain configured",
                ))
            }
        };

        let raw_list = request
            .access_list
            .iter()
            .map(|item| {
                let address = parse_hex("accessList", &item.address)?;
                let keys = item
                    .storage_keys
                    .iter()
                    .map(|key| parse_hex("accessList", key))
                    .collect::<Cip64Result<Vec<_>>>()?;
                Ok((address, keys))
            })
            .collect::<Cip64Result<Vec<_>>>()?;

        let to = match request.to.as_deref().map(str::trim) {
            None | Some("") | Some("0x") => None,
            Some(to) => Some(parse_address("to", to)?),
        };

        let fields = Cip64TxFields {
            chain_id,
            nonce: or_zero(&request.nonce),
            max_priority_fee_per_gas: or_zero(&request.max_priority_fee_per_gas),
            max_fee_per_gas: or_zero(&request.max_fee_per_gas),
            gas_limit: or_zero(&request.gas_limit),
            to,
            value: or_zero(&request.value),
            data: match &request.data {
                Some(data) => parse_hex("data", data)?,
                None => Vec::new(),
            },
            access_list: check_access_list_lengths(&raw_list)?,
            fee_currency: parse_address("feeCurrency", &request.fee_currency)?,
        };

        let signature: Option<RawSignature> = match (request.v, request.r, request.s) {
            (Some(v), Some(r), Some(s)) => Some((v.0, r.0, s.0)),
            (None, None, None) => None,
            _ => {
                return Err(Cip64Error::invalid_field(
                    "signature",
                    "v, r and s must be given together",
                ))
            }
        };

        Self::build(fields, signature, opts)
    }

    /// Parse and validate a JSON request
    pub fn from_json_str(json: &str, opts: TxOptions) -> Cip64Result<Self> {
        let request: Cip64TxRequest = serde_json::from_str(json)
            .map_err(|e| Cip64Error::invalid_field("request", e.to_string()))?;
        Self::from_request(&request, opts)
    }
}

fn quantity(value: &U256) -> String {
    format!("0x{:x}", value)
}

fn prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn or_zero(value: &Option<Quantity>) -> U256 {
    value.map(|q| q.0).unwrap_or_default()
}

fn parse_hex(field: &'static str, text: &str) -> Cip64Result<Vec<u8>> {
    let text = text.trim();
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|e| Cip64Error::invalid_field(field, format!("{:?}: {}", text, e)))
}

fn parse_address(field: &'static str, text: &str) -> Cip64Result<Address> {
    let bytes = parse_hex(field, text)?;
    Address::try_from(bytes.as_slice()).map_err(|_| {
        Cip64Error::invalid_field(field, format!("expected 20 bytes, got {}", bytes.len()))
    })
}

impl AccessListItem {
    /// Hex-string view of one entry
    pub fn to_json(&self) -> JsonAccessListItem {
        JsonAccessListItem {
            address: prefixed(&self.address),
            storage_keys: self.storage_keys.iter().map(|k| prefixed(k)).collect(),
        }
    }
}
