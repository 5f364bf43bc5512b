//! Proof of work: compact target decoding and the hash-below-target check

use std::cmp::Ordering;

use crate::error::{ConsensusError, Result};
use crate::types::*;

/// CheckProofOfWork: ℋ → {true, false}
///
/// SHA256(SHA256(header)), read as a little-endian 256-bit integer, must not
/// exceed ExpandTarget(header.bits). An undecodable target is an error.
pub fn check_proof_of_work(header: &BlockHeader) -> Result<bool> {
    check_proof_of_work_hash(&header.compute_hash(), header.bits)
}

/// Compare an already computed block hash against a compact target
pub fn check_proof_of_work_hash(hash: &Hash, bits: u32) -> Result<bool> {
    let target = expand_target(bits)?;
    Ok(U256::from_le_bytes(hash) <= target)
}

/// 256-bit unsigned integer for Bitcoin target calculations
///
/// Limbs are little-endian: `self.0[0]` holds the lowest 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct U256(pub [u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);

    pub fn from_u32(value: u32) -> Self {
        U256([value as u64, 0, 0, 0])
    }

    pub fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&x| x == 0)
    }

    pub fn shl(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }

        let mut result = U256::ZERO;
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in 0..4 - word_shift {
            result.0[i + word_shift] |= self.0[i] << bit_shift;
            if bit_shift > 0 && i + word_shift + 1 < 4 {
                result.0[i + word_shift + 1] |= self.0[i] >> (64 - bit_shift);
            }
        }

        result
    }

    pub fn shr(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }

        let mut result = U256::ZERO;
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in word_shift..4 {
            result.0[i - word_shift] |= self.0[i] >> bit_shift;
            if bit_shift > 0 && i > word_shift {
                result.0[i - word_shift - 1] |= self.0[i] << (64 - bit_shift);
            }
        }

        result
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, word) in self.0.iter().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let mut limb = [0u8; 8];
            limb.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *word = u64::from_le_bytes(limb);
        }
        U256(words)
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

/// Expand target from compact representation
///
/// The high byte is a base-256 exponent, the low 23 bits a mantissa and bit
/// 23 a sign: target = mantissa × 256^(exponent − 3). Negative, overflowing
/// and zero targets cannot be met and are rejected.
pub fn expand_target(bits: u32) -> Result<U256> {
    let exponent = bits >> 24;
    let mantissa = bits & 0x007f_ffff;

    let word = if exponent <= 3 {
        mantissa >> (8 * (3 - exponent))
    } else {
        mantissa
    };

    if word != 0 && bits & 0x0080_0000 != 0 {
        return Err(ConsensusError::InvalidProofOfWork(format!(
            "negative compact target {:#010x}",
            bits
        )));
    }

    if word != 0
        && (exponent > 34
            || (word > 0xff && exponent > 33)
            || (word > 0xffff && exponent > 32))
    {
        return Err(ConsensusError::InvalidProofOfWork(format!(
            "compact target {:#010x} overflows 256 bits",
            bits
        )));
    }

    let target = if exponent <= 3 {
        U256::from_u32(word)
    } else {
        U256::from_u32(word).shl(8 * (exponent - 3))
    };

    if target.is_zero() {
        return Err(ConsensusError::InvalidProofOfWork(format!(
            "zero compact target {:#010x}",
            bits
        )));
    }

    Ok(target)
}
