//! Context-free transaction validation

use tracing::debug;

use crate::error::Violation;
use crate::params::ConsensusParams;
use crate::serialize::transaction_size;
use crate::types::*;

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// A transaction tx = (v, ins, outs, lt) is valid if and only if:
/// 1. |ins| > 0 ∧ |outs| > 0
/// 2. |tx| × scale ≤ max block weight
/// 3. ∀o ∈ outs: 0 ≤ o.value ≤ M_max, and every prefix sum stays in range
/// 4. no two inputs spend the same outpoint
/// 5. coinbase: 2 ≤ |scriptSig| ≤ 100; otherwise no input has a null prevout
///
/// Rules are checked in this order; the first failure is reported.
pub fn check_transaction(tx: &Transaction, params: &ConsensusParams) -> ValidationResult {
    match find_violation(tx, params) {
        None => ValidationResult::Valid,
        Some(violation) => {
            debug!(kind = %violation.kind, reason = %violation.reason, "transaction rejected");
            ValidationResult::Invalid(violation)
        }
    }
}

fn find_violation(tx: &Transaction, params: &ConsensusParams) -> Option<Violation> {
    // 1. Check inputs and outputs are not empty
    if tx.inputs.is_empty() {
        return Some(Violation::structural("transaction has no inputs"));
    }
    if tx.outputs.is_empty() {
        return Some(Violation::structural("transaction has no outputs"));
    }

    // 2. A lone transaction must fit in a block
    let weight = params.weight(transaction_size(tx));
    if weight > params.max_block_weight {
        return Some(Violation::limit(format!(
            "transaction weight {} exceeds {}",
            weight, params.max_block_weight
        )));
    }

    // 3. Output values and their running total
    if let Err(violation) = check_output_values(&tx.outputs, params.max_money) {
        return Some(violation);
    }

    // 4. Duplicate inputs
    if let Some((i, j)) = find_duplicate_input(tx) {
        return Some(Violation::structural(format!(
            "inputs {} and {} spend the same outpoint",
            i, j
        )));
    }

    // 5. Coinbase shape
    if is_coinbase(tx) {
        let len = tx.inputs[0].script_sig.len();
        if len < params.coinbase_script_sig_min || len > params.coinbase_script_sig_max {
            return Some(Violation::structural(format!(
                "coinbase scriptSig length {} outside [{}, {}]",
                len, params.coinbase_script_sig_min, params.coinbase_script_sig_max
            )));
        }
    } else if let Some(i) = tx.inputs.iter().position(|input| input.prevout.is_null()) {
        return Some(Violation::structural(format!(
            "non-coinbase input {} has a null prevout",
            i
        )));
    }

    None
}

/// Every value in [0, max_money], and the running sum never overflows or
/// leaves that range.
fn check_output_values(
    outputs: &[TransactionOutput],
    max_money: i64,
) -> std::result::Result<i64, Violation> {
    let mut total = 0i64;
    for (i, output) in outputs.iter().enumerate() {
        if output.value < 0 || output.value > max_money {
            return Err(Violation::value(format!(
                "output {} value {} outside [0, {}]",
                i, output.value, max_money
            )));
        }
        total = total
            .checked_add(output.value)
            .filter(|sum| *sum <= max_money)
            .ok_or_else(|| {
                Violation::value(format!("output total exceeds {} at output {}", max_money, i))
            })?;
    }
    Ok(total)
}

/// First pair of inputs referencing the same outpoint
fn find_duplicate_input(tx: &Transaction) -> Option<(usize, usize)> {
    for (i, a) in tx.inputs.iter().enumerate() {
        for (j, b) in tx.inputs.iter().enumerate().skip(i + 1) {
            if a.prevout == b.prevout {
                return Some((i, j));
            }
        }
    }
    None
}

/// Check if transaction is coinbase
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1 && tx.inputs[0].prevout.is_null()
}
