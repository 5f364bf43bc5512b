//! Error types for consensus validation and signing

use std::fmt;
use thiserror::Error;

/// Category of a rejected consensus rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Empty input/output list, duplicate inputs, malformed coinbase
    Structural,
    /// Weight or size exceeded
    Limit,
    /// Negative, out-of-range or overflowing amounts
    Value,
    /// Target not met, Merkle mismatch, future timestamp, coinbase placement
    Consensus,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::Structural => "structural",
            ViolationKind::Limit => "limit",
            ViolationKind::Value => "value",
            ViolationKind::Consensus => "consensus",
        };
        f.write_str(name)
    }
}

/// Why a transaction or block was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} violation: {reason}")]
pub struct Violation {
    pub kind: ViolationKind,
    pub reason: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn structural(reason: impl Into<String>) -> Self {
        Self::new(ViolationKind::Structural, reason)
    }

    pub fn limit(reason: impl Into<String>) -> Self {
        Self::new(ViolationKind::Limit, reason)
    }

    pub fn value(reason: impl Into<String>) -> Self {
        Self::new(ViolationKind::Value, reason)
    }

    pub fn consensus(reason: impl Into<String>) -> Self {
        Self::new(ViolationKind::Consensus, reason)
    }
}

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid proof of work: {0}")]
    InvalidProofOfWork(String),

    #[error("Malformed script: {0}")]
    Script(String),

    #[error("Unsupported script template for signing: {0}")]
    UnsupportedScript(&'static str),

    #[error("No private key for key id {0}")]
    KeyNotFound(String),

    #[error("Input index {index} out of range for {len} inputs")]
    InputIndexOutOfRange { index: usize, len: usize },

    #[error("Output index {index} out of range for {len} outputs")]
    OutputIndexOutOfRange { index: usize, len: usize },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid consensus parameters: {0}")]
    Params(String),
}

/// Error taxonomy member, including the signing failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Violation(ViolationKind),
    SigningFailure,
    Serialization,
    Configuration,
}

impl ConsensusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsensusError::Serialization(_) => ErrorKind::Serialization,
            ConsensusError::InvalidProofOfWork(_) => {
                ErrorKind::Violation(ViolationKind::Consensus)
            }
            ConsensusError::Params(_) => ErrorKind::Configuration,
            ConsensusError::Script(_)
            | ConsensusError::UnsupportedScript(_)
            | ConsensusError::KeyNotFound(_)
            | ConsensusError::InputIndexOutOfRange { .. }
            | ConsensusError::OutputIndexOutOfRange { .. }
            | ConsensusError::Signing(_) => ErrorKind::SigningFailure,
        }
    }
}

impl From<secp256k1::Error> for ConsensusError {
    fn from(err: secp256k1::Error) -> Self {
        ConsensusError::Signing(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
