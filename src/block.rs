//! Context-free block validation

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::error::Violation;
use crate::hash::hash_to_hex;
use crate::merkle::merkle_root;
use crate::params::ConsensusParams;
use crate::pow::check_proof_of_work_hash;
use crate::serialize::block_size;
use crate::transaction::{check_transaction, is_coinbase};
use crate::types::*;

/// CheckBlock: ℬ → {valid, invalid}, against the local wall clock
pub fn check_block(block: &Block, params: &ConsensusParams) -> ValidationResult {
    check_block_at(block, params, unix_now())
}

/// CheckBlock: ℬ × ℕ → {valid, invalid}
///
/// For block b = (h, txs) checked at local time `now`:
/// 1. Refresh the cached block hash
/// 2. |txs| > 0
/// 3. |txs| × scale ≤ max weight
/// 4. |b| × scale ≤ max weight
/// 5. hash(h) ≤ ExpandTarget(h.bits)
/// 6. h.time ≤ now + 2h
/// 7. MerkleRoot(txs) = h.merkle_root
/// 8. every tx valid, txs[0] coinbase, no other coinbase
pub fn check_block_at(block: &Block, params: &ConsensusParams, now: u64) -> ValidationResult {
    match find_violation(block, params, now) {
        None => ValidationResult::Valid,
        Some(violation) => {
            debug!(
                block = %hash_to_hex(&block.header.hash()),
                kind = %violation.kind,
                reason = %violation.reason,
                "block rejected"
            );
            ValidationResult::Invalid(violation)
        }
    }
}

fn find_violation(block: &Block, params: &ConsensusParams, now: u64) -> Option<Violation> {
    // 1. Recompute and cache the identity hash
    let hash = block.header.refresh_hash();

    // 2. At least one transaction
    if block.transactions.is_empty() {
        return Some(Violation::structural("block has no transactions"));
    }

    // 3. Cheap count bound before serializing
    let count_weight = params.weight(block.transactions.len());
    if count_weight > params.max_block_weight {
        return Some(Violation::limit(format!(
            "{} transactions exceed the block weight limit",
            block.transactions.len()
        )));
    }

    // 4. Serialized weight
    let weight = params.weight(block_size(block));
    if weight > params.max_block_weight {
        return Some(Violation::limit(format!(
            "block weight {} exceeds {}",
            weight, params.max_block_weight
        )));
    }

    // 5. Proof of work
    match check_proof_of_work_hash(&hash, block.header.bits) {
        Ok(true) => {}
        Ok(false) => {
            return Some(Violation::consensus(format!(
                "hash {} above target {:#010x}",
                hash_to_hex(&hash),
                block.header.bits
            )))
        }
        Err(err) => return Some(Violation::consensus(err.to_string())),
    }

    // 6. Not too far in the future
    let limit = now.saturating_add(params.max_future_block_time);
    if u64::from(block.header.timestamp) > limit {
        return Some(Violation::consensus(format!(
            "timestamp {} later than {}",
            block.header.timestamp, limit
        )));
    }

    // 7. Merkle commitment
    let root = merkle_root(&block.transactions);
    if root != block.header.merkle_root {
        return Some(Violation::consensus(format!(
            "merkle root mismatch: computed {}, header {}",
            hash_to_hex(&root),
            hash_to_hex(&block.header.merkle_root)
        )));
    }

    // 8. Transactions and coinbase placement
    for (i, tx) in block.transactions.iter().enumerate() {
        if let ValidationResult::Invalid(violation) = check_transaction(tx, params) {
            return Some(Violation::new(
                violation.kind,
                format!("transaction {}: {}", i, violation.reason),
            ));
        }

        let should_be_coinbase = i == 0;
        if is_coinbase(tx) != should_be_coinbase {
            let reason = if should_be_coinbase {
                "first transaction is not coinbase".to_string()
            } else {
                format!("transaction {} is an extra coinbase", i)
            };
            return Some(Violation::consensus(reason));
        }
    }

    None
}

/// Seconds since the Unix epoch; a clock before 1970 reads as zero
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
