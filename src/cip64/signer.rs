//! CIP-64 Transaction Signing
//!
//! Defines what gets hashed and signed, and maps recovered signatures back
//! onto wire values. Curve operations are delegated to `utils::crypto`.

use super::transaction::with_type_prefix;
use super::types::{Address, Cip64Transaction, UNSIGNED_FIELD_COUNT};
use super::validation::check_signature_form;
use crate::error::{Cip64Error, Cip64Result};
use crate::log_debug;
use crate::rlp;
use crate::utils::crypto::{
    ecrecover, ecsign, keccak256, normalize_recovery_id, public_key_to_address,
    RECOVERY_ID_OFFSET,
};
use ethers_core::types::U256;

impl Cip64Transaction {
    /// The bytes that are signed: `0x7b || rlp(first 10 fields)`
    pub fn signing_payload(&self) -> Vec<u8> {
        let raw = self.raw();
        with_type_prefix(&rlp::encode_list(&raw[..UNSIGNED_FIELD_COUNT]))
    }

    /// keccak256 of the signing payload
    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    /// The message to sign: hashed by default, raw for devices that hash
    /// internally
    pub fn message_to_sign(&self, hash_message: bool) -> Vec<u8> {
        if hash_message {
            self.signing_hash().to_vec()
        } else {
            self.signing_payload()
        }
    }

    /// Transaction hash: keccak256 of the full signed encoding.
    ///
    /// Cached on frozen records.
    pub fn hash(&self) -> Cip64Result<[u8; 32]> {
        if !self.is_signed() {
            return Err(Cip64Error::NotSigned("compute the transaction hash"));
        }
        if self.options.freeze {
            Ok(*self.cache.hash.get_or_init(|| keccak256(&self.encode())))
        } else {
            Ok(keccak256(&self.encode()))
        }
    }

    /// Attach a signature, producing a new signed transaction.
    ///
    /// `v` uses the legacy 27/28 convention; it is stored as 0/1.
    pub fn apply_signature(&self, v: u64, r: U256, s: U256) -> Cip64Result<Self> {
        let y_parity = normalize_recovery_id(v).map_err(Cip64Error::InvalidSignature)?;
        Self::build(
            self.fields.clone(),
            Some((U256::from(y_parity), r, s)),
            self.options.clone(),
        )
    }

    /// Sign with a 32-byte secp256k1 private key
    pub fn sign(&self, private_key: &[u8]) -> Cip64Result<Self> {
        let digest = self.signing_hash();
        let sig = ecsign(&digest, private_key).map_err(Cip64Error::InvalidPrivateKey)?;
        let signed = self.apply_signature(
            sig.v,
            U256::from_big_endian(&sig.r),
            U256::from_big_endian(&sig.s),
        )?;

        log_debug!(
            "cip64",
            "signed transaction",
            nonce = signed.fields.nonce,
            signing_hash = hex::encode(digest),
        );
        Ok(signed)
    }

    /// Recover the signer's 64-byte uncompressed public key.
    ///
    /// The digest is the signing hash, not [`hash`](Self::hash).
    pub fn recover_signer_key(&self) -> Cip64Result<[u8; 64]> {
        let sig = self
            .signature
            .ok_or(Cip64Error::NotSigned("recover the signer public key"))?;

        check_signature_form(U256::from(sig.y_parity), sig.s, self.hardfork)?;

        let digest = self.signing_hash();
        ecrecover(
            &digest,
            sig.y_parity as u64 + RECOVERY_ID_OFFSET,
            &to_word(&sig.r),
            &to_word(&sig.s),
        )
        .map_err(|e| Cip64Error::InvalidSignature(format!("Invalid Signature: {}", e)))
    }

    /// Address of the signer
    pub fn sender_address(&self) -> Cip64Result<Address> {
        let public_key = self.recover_signer_key()?;
        let sender = public_key_to_address(&public_key);
        log_debug!("cip64", "recovered sender", sender = format!("0x{}", hex::encode(sender)));
        Ok(sender)
    }

    /// Whether the signature recovers to a public key
    pub fn verify_signature(&self) -> bool {
        self.recover_signer_key().is_ok()
    }
}

fn to_word(value: &U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Sign a CIP-64 transaction with a private key
pub fn sign_cip64_transaction(
    tx: &Cip64Transaction,
    private_key: &[u8; 32],
) -> Cip64Result<Cip64Transaction> {
    tx.sign(private_key)
}

/// Recover the signer of a signed transaction
pub fn recover_transaction_signer(signed: &Cip64Transaction) -> Cip64Result<Address> {
    signed.sender_address()
}
