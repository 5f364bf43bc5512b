//! Bitcoin consensus constants

/// Maximum money supply: 21,000,000 BTC in satoshis
pub const MAX_MONEY: i64 = 21_000_000 * 100_000_000;

/// Satoshis per BTC
pub const SATOSHIS_PER_BTC: i64 = 100_000_000;

/// Maximum block weight (BIP 141)
pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;

/// Weight units per byte of non-witness serialization
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// How far a block timestamp may run ahead of local time: 2 hours
pub const MAX_FUTURE_BLOCK_TIME: u64 = 2 * 60 * 60;

/// Coinbase scriptSig length bounds, inclusive
pub const MIN_COINBASE_SCRIPT_SIG: usize = 2;
pub const MAX_COINBASE_SCRIPT_SIG: usize = 100;

/// Largest length prefix accepted when decoding
pub const MAX_SIZE: u64 = 0x0200_0000;

/// Serialized block header length
pub const BLOCK_HEADER_SIZE: usize = 80;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Signature hash types
pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_NONE: u32 = 0x02;
pub const SIGHASH_SINGLE: u32 = 0x03;
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask selecting the base sighash mode
pub const SIGHASH_MODE_MASK: u32 = 0x1f;

/// Mainnet genesis difficulty in compact form
pub const GENESIS_BITS: u32 = 0x1d00ffff;
