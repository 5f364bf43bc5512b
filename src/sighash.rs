//! Legacy (pre-segwit) signature hash

use tracing::trace;

use crate::constants::*;
use crate::hash::double_sha256;
use crate::script::remove_codeseparators;
use crate::serialize::serialize_transaction;
use crate::types::*;

/// The digest returned for an input or `SIGHASH_SINGLE` output that does
/// not exist: the 256-bit integer one, little-endian.
pub const SIGHASH_ONE: Hash = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

/// SignatureHash: 𝒮 × 𝒯𝒳 × ℕ × ℕ → ℍ
///
/// Digest committed to by the signature on input `input_index`. The
/// transaction is copied, trimmed according to `hash_type`, serialized and
/// double hashed together with `hash_type` as a little-endian u32.
pub fn signature_hash(
    script_code: &[u8],
    tx: &Transaction,
    input_index: usize,
    hash_type: u32,
) -> Hash {
    if input_index >= tx.inputs.len() {
        trace!(input_index, inputs = tx.inputs.len(), "sighash input out of range");
        return SIGHASH_ONE;
    }

    let mode = hash_type & SIGHASH_MODE_MASK;
    if mode == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        trace!(input_index, outputs = tx.outputs.len(), "sighash single without output");
        return SIGHASH_ONE;
    }

    let mut inputs: Vec<TransactionInput> = tx
        .inputs
        .iter()
        .map(|input| TransactionInput {
            prevout: input.prevout,
            script_sig: Vec::new(),
            sequence: input.sequence,
        })
        .collect();
    inputs[input_index].script_sig = remove_codeseparators(script_code);

    let mut outputs = tx.outputs.clone();
    match mode {
        SIGHASH_NONE => {
            outputs.clear();
            zero_other_sequences(&mut inputs, input_index);
        }
        SIGHASH_SINGLE => {
            outputs.truncate(input_index + 1);
            for output in &mut outputs[..input_index] {
                output.value = -1;
                output.script_pubkey.clear();
            }
            zero_other_sequences(&mut inputs, input_index);
        }
        _ => {}
    }

    if hash_type & SIGHASH_ANYONECANPAY != 0 {
        inputs = vec![inputs.swap_remove(input_index)];
    }

    let copy = Transaction::new(tx.version, inputs, outputs, tx.lock_time);
    let mut preimage = serialize_transaction(&copy);
    preimage.extend_from_slice(&hash_type.to_le_bytes());

    trace!(input_index, hash_type, preimage_len = preimage.len(), "computed sighash");
    double_sha256(&preimage)
}

fn zero_other_sequences(inputs: &mut [TransactionInput], keep: usize) {
    for (i, input) in inputs.iter_mut().enumerate() {
        if i != keep {
            input.sequence = 0;
        }
    }
}
