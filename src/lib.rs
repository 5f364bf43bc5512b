//! # Consensus-Core
//!
//! Context-free Bitcoin consensus checks and legacy script-template signing.
//!
//! The crate covers the parts of validation that need nothing beyond the
//! object being checked: transaction structure and value ranges, block
//! weight, proof of work, timestamp drift and the Merkle commitment. It
//! also builds unlocking scripts for pay-to-pubkey and pay-to-pubkey-hash
//! outputs from keys held in a [`KeyStore`](keystore::KeyStore).
//!
//! ## Design Principles
//!
//! 1. **Pure checks**: validators never mutate their input apart from the
//!    memoized identity hash, and report a typed [`ValidationResult`]
//! 2. **Exact Version Pinning**: all consensus-critical dependencies are
//!    pinned to exact versions
//! 3. **Explicit parameters**: every limit comes from a [`ConsensusParams`]
//!
//! ## Usage
//!
//! ```rust
//! use consensus_core::ConsensusCore;
//! use consensus_core::types::*;
//!
//! let consensus = ConsensusCore::new();
//! let tx = Transaction::new(
//!     1,
//!     vec![TransactionInput {
//!         prevout: OutPoint::new([1; 32], 0),
//!         script_sig: vec![],
//!         sequence: 0xffffffff,
//!     }],
//!     vec![TransactionOutput {
//!         value: 1000,
//!         script_pubkey: vec![0x51],
//!     }],
//!     0,
//! );
//! assert!(consensus.validate_transaction(&tx).is_valid());
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod hash;
pub mod params;
pub mod serialize;
pub mod script;
pub mod merkle;
pub mod transaction;
pub mod pow;
pub mod block;
pub mod sighash;
pub mod keystore;
pub mod sign;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{ConsensusError, ErrorKind, Result, Violation, ViolationKind};
pub use keystore::{KeyStore, MemoryKeyStore};
pub use params::ConsensusParams;

/// Consensus checks bound to one set of [`ConsensusParams`]
///
/// # Examples
///
/// ```
/// use consensus_core::{ConsensusCore, ConsensusParams};
///
/// let params = ConsensusParams::from_json(r#"{"max_future_block_time": 600}"#).unwrap();
/// let consensus = ConsensusCore::with_params(params);
/// assert_eq!(consensus.params().max_future_block_time, 600);
/// assert_eq!(consensus.params().max_block_weight, 4_000_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConsensusCore {
    params: ConsensusParams,
}

impl ConsensusCore {
    /// Mainnet parameters
    pub fn new() -> Self {
        Self::with_params(ConsensusParams::mainnet())
    }

    pub fn with_params(params: ConsensusParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// Validate a transaction according to context-free consensus rules
    pub fn validate_transaction(&self, tx: &Transaction) -> ValidationResult {
        transaction::check_transaction(tx, &self.params)
    }

    /// Validate a block against the local wall clock
    ///
    /// # Examples
    ///
    /// ```
    /// use consensus_core::ConsensusCore;
    /// use consensus_core::types::*;
    ///
    /// let consensus = ConsensusCore::new();
    /// let block = Block {
    ///     header: BlockHeader::new(1, [0; 32], [0; 32], 1231006505, 0x1d00ffff, 0),
    ///     transactions: vec![],
    /// };
    ///
    /// let result = consensus.validate_block(&block);
    /// assert_eq!(result.violation().unwrap().kind, consensus_core::ViolationKind::Structural);
    /// ```
    pub fn validate_block(&self, block: &Block) -> ValidationResult {
        block::check_block(block, &self.params)
    }

    /// Validate a block as if the local clock read `now` (Unix seconds)
    pub fn validate_block_at(&self, block: &Block, now: u64) -> ValidationResult {
        block::check_block_at(block, &self.params, now)
    }

    /// Check proof of work
    ///
    /// Fails when `header.bits` does not decode to a usable target.
    pub fn check_proof_of_work(&self, header: &BlockHeader) -> Result<bool> {
        pow::check_proof_of_work(header)
    }

    /// Merkle root of a transaction list; all-zero when empty
    pub fn merkle_root(&self, transactions: &[Transaction]) -> Hash {
        merkle::merkle_root(transactions)
    }

    pub fn build_merkle_tree(&self, transactions: &[Transaction]) -> Option<MerkleTree> {
        merkle::build_merkle_tree(transactions)
    }

    pub fn merkle_branch(&self, tree: &MerkleTree, leaf_index: usize) -> Option<MerkleBranch> {
        merkle::merkle_branch(tree, leaf_index)
    }

    /// Root implied by a leaf, its branch and its index
    ///
    /// # Examples
    ///
    /// ```
    /// use consensus_core::ConsensusCore;
    /// use consensus_core::hash::double_sha256;
    /// use consensus_core::types::MerkleTree;
    ///
    /// let consensus = ConsensusCore::new();
    /// let leaves: Vec<_> = (0u8..5).map(|i| double_sha256(&[i])).collect();
    /// let tree = MerkleTree::from_leaves(&leaves).unwrap();
    ///
    /// let branch = consensus.merkle_branch(&tree, 3).unwrap();
    /// assert_eq!(consensus.check_merkle_branch(&leaves[3], &branch, 3), tree.root());
    /// ```
    pub fn check_merkle_branch(&self, leaf_hash: &Hash, branch: &[Hash], leaf_index: u32) -> Hash {
        merkle::check_merkle_branch(leaf_hash, branch, leaf_index)
    }

    /// Sign one input against the locking script it spends
    pub fn sign_script<K: KeyStore + ?Sized>(
        &self,
        keystore: &K,
        script_pubkey: &[u8],
        tx: &mut Transaction,
        input_index: usize,
        hash_type: u32,
    ) -> Result<()> {
        sign::sign_script(keystore, script_pubkey, tx, input_index, hash_type)
    }

    /// Sign one input, looking up the spent output by the input's prevout index
    pub fn sign_spent_output<K: KeyStore + ?Sized>(
        &self,
        keystore: &K,
        spent_outputs: &[TransactionOutput],
        tx: &mut Transaction,
        input_index: usize,
        flags: u32,
        hash_type: u32,
    ) -> Result<()> {
        sign::sign_spent_output(keystore, spent_outputs, tx, input_index, flags, hash_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consensus_core_new_uses_mainnet() {
        let consensus = ConsensusCore::new();
        assert_eq!(consensus.params(), &ConsensusParams::mainnet());
        assert_eq!(ConsensusCore::default().params(), &ConsensusParams::default());
    }

    #[test]
    fn test_params_threaded_into_validation() {
        let tx = Transaction::new(
            1,
            vec![TransactionInput {
                prevout: OutPoint::new([1; 32], 0),
                script_sig: vec![],
                sequence: 0xffffffff,
            }],
            vec![TransactionOutput {
                value: 2_000,
                script_pubkey: vec![],
            }],
            0,
        );
        assert!(ConsensusCore::new().validate_transaction(&tx).is_valid());

        let strict = ConsensusCore::with_params(ConsensusParams {
            max_money: 1_000,
            ..ConsensusParams::default()
        });
        let result = strict.validate_transaction(&tx);
        assert_eq!(result.violation().map(|v| v.kind), Some(ViolationKind::Value));
    }

    #[test]
    fn test_merkle_root_empty() {
        assert_eq!(ConsensusCore::new().merkle_root(&[]), [0u8; 32]);
        assert!(ConsensusCore::new().build_merkle_tree(&[]).is_none());
    }
}
