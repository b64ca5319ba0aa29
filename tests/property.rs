use celo_cip64::rlp::{self, RlpItem};
use celo_cip64::{
    keccak256, to_checksum_address, AccessListItem, Cip64Error, Cip64Transaction, Cip64TxFields,
    TxOptions,
};
use ethers_core::types::U256;
use proptest::prelude::*;

fn any_u256() -> impl Strategy<Value = U256> {
    prop_oneof![
        Just(U256::zero()),
        any::<u64>().prop_map(U256::from),
        prop::array::uniform32(any::<u8>()).prop_map(|b| U256::from_big_endian(&b)),
    ]
}

fn any_access_list() -> impl Strategy<Value = Vec<AccessListItem>> {
    prop::collection::vec(
        (
            prop::array::uniform20(any::<u8>()),
            prop::collection::vec(prop::array::uniform32(any::<u8>()), 0..3),
        )
            .prop_map(|(address, keys)| AccessListItem::new(address, keys)),
        0..3,
    )
}

prop_compose! {
    fn any_fields()(
        chain_id in any_u256(),
        nonce in any::<u64>(),
        max_fee in any::<u64>(),
        prio_ratio in 0u64..=100,
        gas_limit in any::<u32>(),
        to in prop::option::of(prop::array::uniform20(any::<u8>())),
        value in any_u256(),
        data in prop::collection::vec(any::<u8>(), 0..64),
        access_list in any_access_list(),
        fee_currency in prop::array::uniform20(any::<u8>()),
    ) -> Cip64TxFields {
        let mut fields = Cip64TxFields::new(chain_id, fee_currency)
            .with_nonce(nonce)
            .with_max_fee(max_fee)
            .with_max_priority_fee((max_fee as u128 * prio_ratio as u128 / 100) as u64)
            .with_gas_limit(gas_limit as u64)
            .with_value(value)
            .with_data(data);
        fields.to = to;
        fields.access_list = access_list;
        fields
    }
}

fn any_private_key() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>()).prop_filter("valid secp256k1 scalar", |bytes| {
        secp256k1::SecretKey::from_slice(bytes).is_ok()
    })
}

proptest! {
    #[test]
    fn unsigned_decode_inverts_encode(fields in any_fields()) {
        let tx = Cip64Transaction::new(fields, TxOptions::default()).unwrap();
        let encoded = tx.encode();

        prop_assert_eq!(encoded[0], 0x7b);
        prop_assert_eq!(Cip64Transaction::decode(&encoded, TxOptions::default()).unwrap(), tx);
    }

    #[test]
    fn signed_transactions_recover_their_signer(
        fields in any_fields(),
        key in any_private_key(),
    ) {
        let tx = Cip64Transaction::new(fields, TxOptions::default()).unwrap();
        let signed = tx.sign(&key).unwrap();
        let decoded = Cip64Transaction::decode(&signed.encode(), TxOptions::default()).unwrap();

        let secp = secp256k1::Secp256k1::new();
        let secret = secp256k1::SecretKey::from_slice(&key).unwrap();
        let public = secp256k1::PublicKey::from_secret_key(&secp, &secret).serialize_uncompressed();
        let expected = keccak256(&public[1..]);

        prop_assert_eq!(&decoded, &signed);
        prop_assert_eq!(&decoded.sender_address().unwrap()[..], &expected[12..]);
        prop_assert_eq!(decoded.hash().unwrap(), keccak256(&signed.encode()));
        prop_assert_eq!(decoded.signing_hash(), keccak256(&tx.encode()));
    }

    #[test]
    fn foreign_type_bytes_are_rejected(fields in any_fields(), type_byte in any::<u8>()) {
        prop_assume!(type_byte != 0x7b);
        let mut encoded = Cip64Transaction::new(fields, TxOptions::default()).unwrap().encode();
        encoded[0] = type_byte;

        let rejected = matches!(
            Cip64Transaction::decode(&encoded, TxOptions::default()),
            Err(Cip64Error::WrongTransactionType { received: Some(b), .. }) if b == type_byte
        );
        prop_assert!(rejected);
    }

    #[test]
    fn wrong_field_counts_are_rejected(fields in any_fields(), count in 0usize..16) {
        prop_assume!(count != 10 && count != 13);
        let mut raw = Cip64Transaction::new(fields, TxOptions::default()).unwrap().raw();
        raw.resize(count, RlpItem::Bytes(vec![]));

        let mut encoded = vec![0x7b];
        encoded.extend(rlp::encode_list(&raw));
        let rejected = matches!(
            Cip64Transaction::decode(&encoded, TxOptions::default()),
            Err(Cip64Error::MalformedEncoding { .. })
        );
        prop_assert!(rejected);
    }

    #[test]
    fn upfront_cost_never_below_value(fields in any_fields(), base_fee in any::<u64>()) {
        let tx = Cip64Transaction::new(fields, TxOptions::default()).unwrap();
        match tx.estimate_fee(U256::from(base_fee)) {
            Some(cost) => prop_assert!(cost >= tx.value()),
            None => prop_assert!(tx.value() > U256::MAX - tx.gas_limit() * tx.max_fee_per_gas()),
        }
    }

    #[test]
    fn rlp_decoding_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = rlp::decode(&bytes);
        let mut typed = vec![0x7b];
        typed.extend(bytes);
        let _ = Cip64Transaction::decode(&typed, TxOptions::default());
    }

    #[test]
    fn checksum_addresses_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let checksummed = to_checksum_address(&bytes);
        prop_assert!(checksummed.starts_with("0x"));
        prop_assert_eq!(checksummed[2..].to_ascii_lowercase(), hex::encode(bytes));
    }
}
