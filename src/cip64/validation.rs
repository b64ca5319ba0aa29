//! CIP-64 Validation
//!
//! Checks run while a transaction is being constructed. Wire-level checks
//! take decoded RLP items; semantic checks take typed values.

use super::types::{AccessListItem, Address, StorageKey, SECP256K1_N_DIV_2};
use crate::error::{Cip64Error, Cip64Result};
use crate::rlp::{u256_from_bytes, RlpItem};
use crate::utils::chain_config::Hardfork;
use ethers_core::types::U256;

/// Fail if any named field is a nested list where a scalar belongs
pub fn check_not_list(fields: &[(&'static str, Option<&RlpItem>)]) -> Cip64Result<()> {
    for &(name, item) in fields {
        if let Some(item) = item {
            if item.is_list() {
                return Err(Cip64Error::malformed(name, "expected a scalar, found a list"));
            }
        }
    }
    Ok(())
}

/// Fail if any named integer field carries a leading zero byte
pub fn check_canonical_integers(fields: &[(&'static str, Option<&RlpItem>)]) -> Cip64Result<()> {
    for &(name, item) in fields {
        let Some(item) = item else { continue };
        let bytes = expect_bytes(name, item)?;
        if bytes.first() == Some(&0) {
            return Err(Cip64Error::malformed(
                name,
                format!("leading zero byte in 0x{}", hex::encode(bytes)),
            ));
        }
    }
    Ok(())
}

/// The byte-string payload of a scalar field
pub fn expect_bytes<'a>(field: &'static str, item: &'a RlpItem) -> Cip64Result<&'a [u8]> {
    item.as_bytes()
        .ok_or_else(|| Cip64Error::malformed(field, "expected a byte string, found a list"))
}

/// Scalar field as a 256-bit integer
pub fn expect_u256(field: &'static str, item: &RlpItem) -> Cip64Result<U256> {
    let bytes = expect_bytes(field, item)?;
    u256_from_bytes(bytes).ok_or_else(|| {
        Cip64Error::malformed(field, format!("{} bytes exceed 256 bits", bytes.len()))
    })
}

/// Scalar field as a 20-byte address
pub fn expect_address(field: &'static str, item: &RlpItem) -> Cip64Result<Address> {
    let bytes = expect_bytes(field, item)?;
    Address::try_from(bytes).map_err(|_| {
        Cip64Error::malformed(field, format!("expected 20 bytes, got {}", bytes.len()))
    })
}

/// Recipient field: empty for contract creation, else a 20-byte address
pub fn expect_optional_address(field: &'static str, item: &RlpItem) -> Cip64Result<Option<Address>> {
    if expect_bytes(field, item)?.is_empty() {
        return Ok(None);
    }
    expect_address(field, item).map(Some)
}

/// Decode and check the access list structure
pub fn check_access_list(item: &RlpItem) -> Cip64Result<Vec<AccessListItem>> {
    let entries = item
        .as_list()
        .ok_or_else(|| Cip64Error::InvalidAccessList("access list must be a list".to_string()))?;

    let mut raw = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let pair = match entry.as_list() {
            Some(pair) if pair.len() == 2 => pair,
            _ => {
                return Err(Cip64Error::InvalidAccessList(format!(
                    "entry {} must be an [address, storageKeys] pair",
                    i
                )))
            }
        };
        let address = pair[0].as_bytes().ok_or_else(|| {
            Cip64Error::InvalidAccessList(format!("entry {} address must be a byte string", i))
        })?;
        let keys = pair[1].as_list().ok_or_else(|| {
            Cip64Error::InvalidAccessList(format!("entry {} storage keys must be a list", i))
        })?;
        let keys = keys
            .iter()
            .map(|key| {
                key.as_bytes().map(<[u8]>::to_vec).ok_or_else(|| {
                    Cip64Error::InvalidAccessList(format!(
                        "entry {} storage key must be a byte string",
                        i
                    ))
                })
            })
            .collect::<Cip64Result<Vec<_>>>()?;
        raw.push((address.to_vec(), keys));
    }

    check_access_list_lengths(&raw)
}

/// Check address and key lengths of a raw access list
pub fn check_access_list_lengths(raw: &[(Vec<u8>, Vec<Vec<u8>>)]) -> Cip64Result<Vec<AccessListItem>> {
    raw.iter()
        .enumerate()
        .map(|(i, (address, keys))| {
            let address = Address::try_from(address.as_slice()).map_err(|_| {
                Cip64Error::InvalidAccessList(format!(
                    "Invalid EIP-2930 transaction: address length should be 20 bytes (entry {} has {})",
                    i,
                    address.len()
                ))
            })?;
            let storage_keys = keys
                .iter()
                .map(|key| {
                    StorageKey::try_from(key.as_slice()).map_err(|_| {
                        Cip64Error::InvalidAccessList(format!(
                            "Invalid EIP-2930 transaction: storage slot length should be 32 bytes (entry {} has {})",
                            i,
                            key.len()
                        ))
                    })
                })
                .collect::<Cip64Result<Vec<_>>>()?;
            Ok(AccessListItem::new(address, storage_keys))
        })
        .collect()
}

/// `maxFeePerGas` must cover `maxPriorityFeePerGas`
pub fn check_fee_ordering(gas_limit: U256, max_fee: U256, max_priority_fee: U256) -> Cip64Result<()> {
    if max_fee < max_priority_fee {
        return Err(Cip64Error::InvalidFeeParameters {
            reason: "maxFeePerGas cannot be less than maxPriorityFeePerGas (The total must be the larger of the two)",
            gas_limit,
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: max_priority_fee,
        });
    }
    Ok(())
}

/// `gasLimit * maxFeePerGas` must fit in 256 bits
pub fn check_overflow(gas_limit: U256, max_fee: U256, max_priority_fee: U256) -> Cip64Result<()> {
    if gas_limit.checked_mul(max_fee).is_none() {
        return Err(Cip64Error::InvalidFeeParameters {
            reason: "gasLimit * maxFeePerGas cannot exceed MAX_INTEGER (2^256-1)",
            gas_limit,
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: max_priority_fee,
        });
    }
    Ok(())
}

/// Check parity range and low-S form; returns the parity as a byte
pub fn check_signature_form(y_parity: U256, s: U256, hardfork: Hardfork) -> Cip64Result<u8> {
    if y_parity > U256::one() {
        return Err(Cip64Error::InvalidSignature(format!(
            "The y-parity of the transaction should either be 0 or 1 (got {})",
            y_parity
        )));
    }
    if hardfork.rejects_high_s() && s > SECP256K1_N_DIV_2 {
        return Err(Cip64Error::InvalidSignature(format!(
            "Invalid Signature: s-values greater than secp256k1n/2 are considered invalid (s=0x{:x})",
            s
        )));
    }
    Ok(y_parity.low_u32() as u8)
}
