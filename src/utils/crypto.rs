//! Hashing and secp256k1 primitives
//!
//! Thin wrappers over `tiny-keccak` and `secp256k1`. The legacy `v = 27 + id`
//! recovery convention is handled at this boundary only: callers pass and
//! receive `v` in the 27/28 form, everything inside the crate stores 0/1.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};

/// Offset added to the recovery id by the legacy signing convention
pub const RECOVERY_ID_OFFSET: u64 = 27;

/// Keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Convert raw address bytes to an EIP-55 checksummed address
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() || nibble < 8 {
            result.push(ch);
        } else {
            result.push(ch.to_ascii_uppercase());
        }
    }

    result
}

/// Address of a 64-byte uncompressed public key (no 0x04 prefix)
pub fn public_key_to_address(public_key: &[u8; 64]) -> [u8; 20] {
    let hash = keccak256(public_key);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Strip the legacy offset from `v`, yielding a 0/1 recovery id.
///
/// Values below 27 cannot carry the offset and are rejected.
pub fn normalize_recovery_id(v: u64) -> Result<u64, String> {
    v.checked_sub(RECOVERY_ID_OFFSET)
        .ok_or_else(|| format!("v={} is below the legacy offset {}", v, RECOVERY_ID_OFFSET))
}

/// Signature produced by [`ecsign`], `v` in 27/28 form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub v: u64,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

/// Sign a 32-byte digest (RFC 6979 nonces, low-S normalized)
pub fn ecsign(digest: &[u8; 32], private_key: &[u8]) -> Result<EcdsaSignature, String> {
    if private_key.len() != 32 {
        return Err(format!("Expected 32 bytes, got {}", private_key.len()));
    }
    if private_key.iter().all(|&b| b == 0) {
        return Err("Private key is all zeros".to_string());
    }

    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(private_key).map_err(|e| e.to_string())?;
    let message = Message::from_digest(*digest);

    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, &secret_key)
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    Ok(EcdsaSignature {
        v: recovery_id.to_i32() as u64 + RECOVERY_ID_OFFSET,
        r,
        s,
    })
}

/// Recover the 64-byte uncompressed public key that signed `digest`.
///
/// `v` must be 27 or 28.
pub fn ecrecover(digest: &[u8; 32], v: u64, r: &[u8; 32], s: &[u8; 32]) -> Result<[u8; 64], String> {
    let recovery = normalize_recovery_id(v)?;
    if recovery > 1 {
        return Err(format!("Invalid signature v value: {}", v));
    }

    let secp = Secp256k1::new();
    let recovery_id = RecoveryId::from_i32(recovery as i32).map_err(|e| e.to_string())?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(r);
    compact[32..].copy_from_slice(s);

    let signature =
        RecoverableSignature::from_compact(&compact, recovery_id).map_err(|e| e.to_string())?;
    let message = Message::from_digest(*digest);
    let public_key = secp
        .recover_ecdsa(&message, &signature)
        .map_err(|e| e.to_string())?;

    let mut out = [0u8; 64];
    out.copy_from_slice(&public_key.serialize_uncompressed()[1..]);
    Ok(out)
}

/// Public key of a private key, 64-byte uncompressed form
pub fn private_key_to_public_key(private_key: &[u8]) -> Result<[u8; 64], String> {
    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(private_key).map_err(|e| e.to_string())?;
    let public_key = PublicKey::from_secret_key(&secp, &secret_key);

    let mut out = [0u8; 64];
    out.copy_from_slice(&public_key.serialize_uncompressed()[1..]);
    Ok(out)
}
