//! Core Bitcoin types for consensus validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::hash::double_sha256;
use crate::serialize::{serialize_block_header, serialize_transaction};

/// Hash type: 256-bit hash, in internal (wire) byte order
pub type Hash = [u8; 32];

/// Key identifier: Hash160 of a serialized public key
pub type KeyId = [u8; 20];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Memoized identity hash.
///
/// The cell is guarded by a read-write lock so the same object may be hashed
/// from several threads; every writer stores the hash of the same bytes, so
/// racing first computations agree. Equality, cloning into a fresh object and
/// serde all treat the cache as absent.
#[derive(Default)]
pub struct HashCache(RwLock<Option<Hash>>);

impl HashCache {
    /// Cached value, if any.
    pub fn get(&self) -> Option<Hash> {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the cached value.
    pub fn store(&self, hash: Hash) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(hash);
    }

    /// Drop the cached value.
    pub fn invalidate(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Return the cached value, computing and storing it on a miss.
    ///
    /// `compute` runs without holding the lock.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> Hash) -> Hash {
        if let Some(hash) = self.get() {
            return hash;
        }
        let hash = compute();
        self.store(hash);
        hash
    }

    /// Recompute unconditionally and store the result.
    pub fn refresh(&self, compute: impl FnOnce() -> Hash) -> Hash {
        let hash = compute();
        self.store(hash);
        hash
    }
}

impl Clone for HashCache {
    fn clone(&self) -> Self {
        HashCache(RwLock::new(self.get()))
    }
}

impl PartialEq for HashCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for HashCache {}

impl fmt::Debug for HashCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(hash) => write!(f, "HashCache({})", crate::hash::hash_to_hex(&hash)),
            None => f.write_str("HashCache(empty)"),
        }
    }
}

/// OutPoint: reference to output `index` of transaction `hash`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    /// The outpoint carried by a coinbase input
    pub const NULL: OutPoint = OutPoint {
        hash: [0u8; 32],
        index: 0xffffffff,
    };

    pub fn new(hash: Hash, index: u32) -> Self {
        Self { hash, index }
    }

    /// All-zero hash with index `0xffffffff`
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
}

/// Transaction output; `value` is in satoshis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: i64,
    pub script_pubkey: ByteString,
}

/// Transaction
///
/// Fields are public. A caller mutating them directly must call
/// [`Transaction::invalidate_hash`] afterwards; validation always recomputes
/// the hash so a stale cache cannot change a validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
    #[serde(skip)]
    pub cached_hash: HashCache,
}

impl Transaction {
    pub fn new(
        version: u32,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        lock_time: u32,
    ) -> Self {
        Self {
            version,
            inputs,
            outputs,
            lock_time,
            cached_hash: HashCache::default(),
        }
    }

    /// Identity hash (txid), memoized
    pub fn hash(&self) -> Hash {
        self.cached_hash.get_or_compute(|| self.compute_hash())
    }

    /// Recompute the identity hash and refresh the cache
    pub fn refresh_hash(&self) -> Hash {
        self.cached_hash.refresh(|| self.compute_hash())
    }

    /// DoubleHash of the serialized transaction, ignoring the cache
    pub fn compute_hash(&self) -> Hash {
        double_sha256(&serialize_transaction(self))
    }

    pub fn invalidate_hash(&self) {
        self.cached_hash.invalidate();
    }

    /// Replace the unlocking script of input `index`.
    ///
    /// Returns `false` when the index is out of range.
    pub fn set_script_sig(&mut self, index: usize, script_sig: ByteString) -> bool {
        match self.inputs.get_mut(index) {
            Some(input) => {
                input.script_sig = script_sig;
                self.cached_hash.invalidate();
                true
            }
            None => false,
        }
    }
}

/// Block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    #[serde(skip)]
    pub cached_hash: HashCache,
}

impl BlockHeader {
    pub fn new(
        version: i32,
        prev_block_hash: Hash,
        merkle_root: Hash,
        timestamp: u32,
        bits: u32,
        nonce: u32,
    ) -> Self {
        Self {
            version,
            prev_block_hash,
            merkle_root,
            timestamp,
            bits,
            nonce,
            cached_hash: HashCache::default(),
        }
    }

    /// Block identity hash, memoized
    pub fn hash(&self) -> Hash {
        self.cached_hash.get_or_compute(|| self.compute_hash())
    }

    pub fn refresh_hash(&self) -> Hash {
        self.cached_hash.refresh(|| self.compute_hash())
    }

    /// DoubleHash of the 80-byte serialized header
    pub fn compute_hash(&self) -> Hash {
        double_sha256(&serialize_block_header(self))
    }

    pub fn invalidate_hash(&self) {
        self.cached_hash.invalidate();
    }
}

/// Block: header plus transactions, coinbase first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }
}

/// Flattened Merkle tree: every level from the leaves up to the root,
/// left to right, concatenated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleTree {
    pub nodes: Vec<Hash>,
    pub leaf_count: usize,
}

/// Sibling hashes from the leaf level up to (excluding) the root
pub type MerkleBranch = Vec<Hash>;

/// Classification of a locking script against the standard templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptTemplate {
    /// `<pubkey> OP_CHECKSIG`
    PubKey(ByteString),
    /// `OP_DUP OP_HASH160 <key id> OP_EQUALVERIFY OP_CHECKSIG`
    PubKeyHash(KeyId),
    /// `OP_HASH160 <script hash> OP_EQUAL`
    ScriptHash([u8; 20]),
    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`
    MultiSig { required: u8, keys: Vec<ByteString> },
    NonStandard,
}

impl ScriptTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptTemplate::PubKey(_) => "pubkey",
            ScriptTemplate::PubKeyHash(_) => "pubkeyhash",
            ScriptTemplate::ScriptHash(_) => "scripthash",
            ScriptTemplate::MultiSig { .. } => "multisig",
            ScriptTemplate::NonStandard => "nonstandard",
        }
    }
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(crate::error::Violation),
}

impl ValidationResult {
    /// Boolean projection: accept or reject
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// The violation that caused rejection, if any
    pub fn violation(&self) -> Option<&crate::error::Violation> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(v) => Some(v),
        }
    }
}
