//! Script-template signing through the public API

use consensus_core::hash::hash160;
use consensus_core::script::*;
use consensus_core::sighash::signature_hash;
use consensus_core::sign::{sign_script, sign_spent_output};
use consensus_core::*;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

fn keystore() -> (MemoryKeyStore, KeyId, KeyId) {
    let mut store = MemoryKeyStore::new();
    let compressed = store.add_key(SecretKey::from_slice(&[0x11; 32]).unwrap(), true);
    let uncompressed = store.add_key(SecretKey::from_slice(&[0x22; 32]).unwrap(), false);
    (store, compressed, uncompressed)
}

fn funding_outputs(scripts: &[ByteString]) -> Vec<TransactionOutput> {
    scripts
        .iter()
        .map(|script| TransactionOutput {
            value: 10_000,
            script_pubkey: script.clone(),
        })
        .collect()
}

fn spending_tx(prev_indices: &[u32]) -> Transaction {
    let inputs = prev_indices
        .iter()
        .map(|&index| TransactionInput {
            prevout: OutPoint::new([0xab; 32], index),
            script_sig: vec![],
            sequence: SEQUENCE_FINAL,
        })
        .collect();
    Transaction::new(
        1,
        inputs,
        vec![TransactionOutput {
            value: 9_000,
            script_pubkey: pay_to_pubkey_hash(&[0x33; 20]),
        }],
        0,
    )
}

fn verify(sig_item: &[u8], pubkey: &[u8], digest: &Hash, hash_type: u32) -> bool {
    let (last, der) = sig_item.split_last().unwrap();
    if *last != hash_type as u8 {
        return false;
    }
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest_slice(digest).unwrap();
    let signature = Signature::from_der(der).unwrap();
    let pubkey = PublicKey::from_slice(pubkey).unwrap();
    secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
}

#[test]
fn test_p2pkh_unlocking_script() {
    let (store, key_id, _) = keystore();
    let script_pubkey = pay_to_pubkey_hash(&key_id);
    let mut tx = spending_tx(&[0]);

    sign_script(&store, &script_pubkey, &mut tx, 0, SIGHASH_ALL).unwrap();

    let items = push_items(&tx.inputs[0].script_sig).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(hash160(&items[1]), key_id);
    let digest = signature_hash(&script_pubkey, &tx, 0, SIGHASH_ALL);
    assert!(verify(&items[0], &items[1], &digest, SIGHASH_ALL));
}

#[test]
fn test_p2pkh_uncompressed_key() {
    let (store, _, key_id) = keystore();
    let script_pubkey = pay_to_pubkey_hash(&key_id);
    let mut tx = spending_tx(&[0]);

    sign_script(&store, &script_pubkey, &mut tx, 0, SIGHASH_ALL).unwrap();

    let items = push_items(&tx.inputs[0].script_sig).unwrap();
    assert_eq!(items[1].len(), 65);
    assert_eq!(items[1][0], 0x04);
}

#[test]
fn test_p2pk_unlocking_script() {
    let (store, key_id, _) = keystore();
    let pubkey = store.public_key(&key_id).unwrap();
    let script_pubkey = pay_to_pubkey(&pubkey);
    let mut tx = spending_tx(&[0]);

    sign_script(&store, &script_pubkey, &mut tx, 0, SIGHASH_ALL).unwrap();

    let items = push_items(&tx.inputs[0].script_sig).unwrap();
    assert_eq!(items.len(), 1);
    let digest = signature_hash(&script_pubkey, &tx, 0, SIGHASH_ALL);
    assert!(verify(&items[0], &pubkey, &digest, SIGHASH_ALL));
}

#[test]
fn test_hash_type_byte_appended() {
    let (store, key_id, _) = keystore();
    let script_pubkey = pay_to_pubkey_hash(&key_id);
    let mut tx = spending_tx(&[0, 1]);
    let hash_type = SIGHASH_SINGLE | SIGHASH_ANYONECANPAY;

    sign_script(&store, &script_pubkey, &mut tx, 0, hash_type).unwrap();

    let items = push_items(&tx.inputs[0].script_sig).unwrap();
    let digest = signature_hash(&script_pubkey, &tx, 0, hash_type);
    assert_eq!(*items[0].last().unwrap(), 0x83);
    assert!(verify(&items[0], &items[1], &digest, hash_type));
}

#[test]
fn test_signing_is_deterministic() {
    let (store, key_id, _) = keystore();
    let script_pubkey = pay_to_pubkey_hash(&key_id);
    let mut first = spending_tx(&[0]);
    let mut second = spending_tx(&[0]);

    sign_script(&store, &script_pubkey, &mut first, 0, SIGHASH_ALL).unwrap();
    sign_script(&store, &script_pubkey, &mut second, 0, SIGHASH_ALL).unwrap();
    assert_eq!(first.inputs[0].script_sig, second.inputs[0].script_sig);
}

#[test]
fn test_missing_key_leaves_transaction_unchanged() {
    let (store, _, _) = keystore();
    let mut tx = spending_tx(&[0]);
    tx.inputs[0].script_sig = vec![0x51];
    let before = tx.clone();

    let err = sign_script(&store, &pay_to_pubkey_hash(&[0x99; 20]), &mut tx, 0, SIGHASH_ALL)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SigningFailure);
    assert_eq!(tx, before);
}

#[test]
fn test_script_hash_and_multisig_never_signed() {
    let (store, key_id, _) = keystore();
    let pubkey = store.public_key(&key_id).unwrap();

    let p2sh = pay_to_script_hash(&hash160(&pay_to_pubkey(&pubkey)));
    let bare_multisig = multisig(1, &[pubkey]).unwrap();

    for script_pubkey in [p2sh, bare_multisig] {
        let mut tx = spending_tx(&[0]);
        let err = sign_script(&store, &script_pubkey, &mut tx, 0, SIGHASH_ALL).unwrap_err();
        assert!(matches!(err, ConsensusError::UnsupportedScript(_)));
        assert!(tx.inputs[0].script_sig.is_empty());
    }
}

#[test]
fn test_nonstandard_script_fails() {
    let (store, _, _) = keystore();
    let mut tx = spending_tx(&[0]);
    let err = sign_script(&store, &[OP_1], &mut tx, 0, SIGHASH_ALL).unwrap_err();
    assert!(matches!(err, ConsensusError::UnsupportedScript("nonstandard")));
}

#[test]
fn test_input_index_out_of_range() {
    let (store, key_id, _) = keystore();
    let mut tx = spending_tx(&[0]);
    let before = tx.clone();
    let err = sign_script(&store, &pay_to_pubkey_hash(&key_id), &mut tx, 5, SIGHASH_ALL)
        .unwrap_err();
    assert!(matches!(err, ConsensusError::InputIndexOutOfRange { index: 5, len: 1 }));
    assert_eq!(tx, before);
}

#[test]
fn test_sign_spent_output_uses_prevout_index() {
    let (store, compressed, uncompressed) = keystore();
    let funding = funding_outputs(&[
        pay_to_pubkey_hash(&compressed),
        pay_to_pubkey_hash(&uncompressed),
    ]);
    let mut tx = spending_tx(&[1, 0]);

    sign_spent_output(&store, &funding, &mut tx, 0, 0, SIGHASH_ALL).unwrap();
    sign_spent_output(&store, &funding, &mut tx, 1, 0, SIGHASH_ALL).unwrap();

    let first = push_items(&tx.inputs[0].script_sig).unwrap();
    let second = push_items(&tx.inputs[1].script_sig).unwrap();
    assert_eq!(hash160(&first[1]), uncompressed);
    assert_eq!(hash160(&second[1]), compressed);
}

#[test]
fn test_sign_spent_output_prevout_out_of_range() {
    let (store, key_id, _) = keystore();
    let funding = funding_outputs(&[pay_to_pubkey_hash(&key_id)]);
    let mut tx = spending_tx(&[3]);

    let err = sign_spent_output(&store, &funding, &mut tx, 0, 0, SIGHASH_ALL).unwrap_err();
    assert!(matches!(err, ConsensusError::OutputIndexOutOfRange { index: 3, len: 1 }));

    let err = sign_spent_output(&store, &funding, &mut tx, 1, 0, SIGHASH_ALL).unwrap_err();
    assert!(matches!(err, ConsensusError::InputIndexOutOfRange { .. }));
}

#[test]
fn test_signed_transaction_still_valid() {
    let (store, key_id, _) = keystore();
    let mut tx = spending_tx(&[0]);
    sign_script(&store, &pay_to_pubkey_hash(&key_id), &mut tx, 0, SIGHASH_ALL).unwrap();

    let consensus = consensus_core::ConsensusCore::new();
    assert!(consensus.validate_transaction(&tx).is_valid());
}
