//! Hash composition: how raw bytes become consensus commitments

use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::types::{Hash, KeyId};

/// SHA256(SHA256(data)); used for txids, block hashes and Merkle nodes
pub fn double_sha256(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

/// DoubleHash of `left || right`, raw 32-byte concatenation
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(left);
    engine.input(right);
    sha256d::Hash::from_engine(engine).into_inner()
}

/// RIPEMD160(SHA256(data)); used for key ids and script hashes
pub fn hash160(data: &[u8]) -> KeyId {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripe);
    out
}

/// Conventional display form: byte-reversed hex
pub fn hash_to_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// Parse the byte-reversed display form back into internal order
pub fn hash_from_hex(s: &str) -> Option<Hash> {
    let bytes = hex::decode(s).ok()?;
    let mut hash: Hash = bytes.try_into().ok()?;
    hash.reverse();
    Some(hash)
}
