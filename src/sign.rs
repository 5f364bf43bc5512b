//! Script-template signer
//!
//! Produces the unlocking script for an input that spends a pay-to-pubkey or
//! pay-to-pubkey-hash output. Other templates are rejected. The input's
//! scriptSig is only replaced once a complete unlocking script exists.

use secp256k1::{Message, Secp256k1};
use tracing::debug;

use crate::error::{ConsensusError, Result};
use crate::hash::{hash160, hash_to_hex};
use crate::keystore::KeyStore;
use crate::script::{classify_script, push_data};
use crate::sighash::signature_hash;
use crate::types::*;

/// Sign input `input_index` of `tx` against the locking script
/// `script_pubkey`.
///
/// - `PubKey`: pushes `<sig>`
/// - `PubKeyHash`: pushes `<sig> <pubkey>`
///
/// where `<sig>` is the DER signature followed by the low byte of
/// `hash_type`.
pub fn sign_script<K: KeyStore + ?Sized>(
    keystore: &K,
    script_pubkey: &[u8],
    tx: &mut Transaction,
    input_index: usize,
    hash_type: u32,
) -> Result<()> {
    match build_script_sig(keystore, script_pubkey, tx, input_index, hash_type) {
        Ok(script_sig) => {
            tx.set_script_sig(input_index, script_sig);
            debug!(input_index, hash_type, "signed input");
            Ok(())
        }
        Err(err) => {
            debug!(input_index, error = %err, "signing failed");
            Err(err)
        }
    }
}

/// Sign input `input_index` against the output it spends.
///
/// The spent output is `spent_outputs[prevout.index]`, where `spent_outputs`
/// are the outputs of the funding transaction. `flags` is reserved for
/// script verification flags and does not affect signing.
pub fn sign_spent_output<K: KeyStore + ?Sized>(
    keystore: &K,
    spent_outputs: &[TransactionOutput],
    tx: &mut Transaction,
    input_index: usize,
    _flags: u32,
    hash_type: u32,
) -> Result<()> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or(ConsensusError::InputIndexOutOfRange {
            index: input_index,
            len: tx.inputs.len(),
        })?;

    let output_index = input.prevout.index as usize;
    let spent = spent_outputs
        .get(output_index)
        .ok_or(ConsensusError::OutputIndexOutOfRange {
            index: output_index,
            len: spent_outputs.len(),
        })?;

    sign_script(keystore, &spent.script_pubkey, tx, input_index, hash_type)
}

fn build_script_sig<K: KeyStore + ?Sized>(
    keystore: &K,
    script_pubkey: &[u8],
    tx: &Transaction,
    input_index: usize,
    hash_type: u32,
) -> Result<ByteString> {
    if input_index >= tx.inputs.len() {
        return Err(ConsensusError::InputIndexOutOfRange {
            index: input_index,
            len: tx.inputs.len(),
        });
    }

    let sighash = signature_hash(script_pubkey, tx, input_index, hash_type);
    let mut script_sig = Vec::with_capacity(107);

    match classify_script(script_pubkey) {
        ScriptTemplate::PubKey(pubkey) => {
            let key_id = hash160(&pubkey);
            push_signature(keystore, &key_id, &sighash, hash_type, &mut script_sig)?;
        }
        ScriptTemplate::PubKeyHash(key_id) => {
            push_signature(keystore, &key_id, &sighash, hash_type, &mut script_sig)?;
            if !keystore.append_public_key(&key_id, &mut script_sig) {
                return Err(ConsensusError::KeyNotFound(hex::encode(key_id)));
            }
        }
        template => return Err(ConsensusError::UnsupportedScript(template.name())),
    }

    Ok(script_sig)
}

fn push_signature<K: KeyStore + ?Sized>(
    keystore: &K,
    key_id: &KeyId,
    sighash: &Hash,
    hash_type: u32,
    script_sig: &mut ByteString,
) -> Result<()> {
    let secret = keystore
        .private_key(key_id)
        .ok_or_else(|| ConsensusError::KeyNotFound(hex::encode(key_id)))?;

    let secp = Secp256k1::signing_only();
    let message = Message::from_digest_slice(sighash)?;
    let mut signature = secp.sign_ecdsa(&message, &secret).serialize_der().to_vec();
    signature.push(hash_type as u8);

    debug!(sighash = %hash_to_hex(sighash), sig_len = signature.len(), "created signature");
    push_data(script_sig, &signature);
    Ok(())
}
