//! Merkle tree over a block's transactions
//!
//! The tree is Bitcoin's legacy construction: an odd node at the end of a
//! level is paired with itself. Nodes are stored flattened, leaves first,
//! one level after another, so a branch can be read back by offset.

use tracing::trace;

use crate::hash::hash_pair;
use crate::types::*;

impl MerkleTree {
    /// Build the tree over precomputed leaf hashes.
    ///
    /// Returns `None` for an empty leaf list.
    pub fn from_leaves(leaves: &[Hash]) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }

        let mut nodes = leaves.to_vec();
        let mut level_start = 0;
        let mut level_size = leaves.len();

        while level_size > 1 {
            for i in (0..level_size).step_by(2) {
                let right = (i + 1).min(level_size - 1);
                let parent = hash_pair(&nodes[level_start + i], &nodes[level_start + right]);
                nodes.push(parent);
            }
            level_start += level_size;
            level_size = level_size.div_ceil(2);
        }

        trace!(leaves = leaves.len(), nodes = nodes.len(), "built merkle tree");
        Some(Self {
            nodes,
            leaf_count: leaves.len(),
        })
    }

    /// The last node of the flattened tree
    pub fn root(&self) -> Hash {
        self.nodes.last().copied().unwrap_or([0u8; 32])
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn leaves(&self) -> &[Hash] {
        &self.nodes[..self.leaf_count.min(self.nodes.len())]
    }
}

/// Build the full tree over the transactions' identity hashes.
///
/// Each transaction's hash cache is refreshed on the way.
pub fn build_merkle_tree(transactions: &[Transaction]) -> Option<MerkleTree> {
    let leaves: Vec<Hash> = transactions.iter().map(|tx| tx.refresh_hash()).collect();
    MerkleTree::from_leaves(&leaves)
}

/// Merkle root of a transaction list; all-zero for an empty list
pub fn merkle_root(transactions: &[Transaction]) -> Hash {
    build_merkle_tree(transactions)
        .map(|tree| tree.root())
        .unwrap_or([0u8; 32])
}

/// Merkle root over precomputed txids; all-zero for an empty list
pub fn merkle_root_from_hashes(hashes: &[Hash]) -> Hash {
    MerkleTree::from_leaves(hashes)
        .map(|tree| tree.root())
        .unwrap_or([0u8; 32])
}

/// Sibling hashes proving leaf `leaf_index` against the tree's root.
///
/// Returns `None` when the index is out of range or the tree is malformed.
pub fn merkle_branch(tree: &MerkleTree, leaf_index: usize) -> Option<MerkleBranch> {
    if leaf_index >= tree.leaf_count {
        return None;
    }

    let mut branch = Vec::new();
    let mut index = leaf_index;
    let mut level_start = 0;
    let mut level_size = tree.leaf_count;

    while level_size > 1 {
        let sibling = (index ^ 1).min(level_size - 1);
        branch.push(*tree.nodes.get(level_start + sibling)?);
        index >>= 1;
        level_start += level_size;
        level_size = level_size.div_ceil(2);
    }

    Some(branch)
}

/// Fold a branch onto a leaf hash and return the resulting root.
///
/// This only computes; the caller compares against the claimed root.
pub fn check_merkle_branch(leaf_hash: &Hash, branch: &[Hash], leaf_index: u32) -> Hash {
    let mut hash = *leaf_hash;
    let mut index = leaf_index;

    for sibling in branch {
        hash = if index & 1 == 1 {
            hash_pair(sibling, &hash)
        } else {
            hash_pair(&hash, sibling)
        };
        index >>= 1;
    }

    hash
}
