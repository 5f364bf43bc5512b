//! Consensus parameters
//!
//! Every validation entry point takes a `ConsensusParams`. The defaults are
//! Bitcoin mainnet values; other networks or test harnesses may load a JSON
//! document and override individual limits.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ConsensusError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusParams {
    /// Upper bound for any single output and for the sum of outputs
    pub max_money: i64,
    /// Block weight limit; also bounds a lone transaction
    pub max_block_weight: u64,
    /// Weight units charged per serialized byte
    pub witness_scale_factor: u64,
    /// Seconds a block timestamp may lie ahead of local time
    pub max_future_block_time: u64,
    pub coinbase_script_sig_min: usize,
    pub coinbase_script_sig_max: usize,
}

impl ConsensusParams {
    pub fn mainnet() -> Self {
        Self {
            max_money: MAX_MONEY,
            max_block_weight: MAX_BLOCK_WEIGHT,
            witness_scale_factor: WITNESS_SCALE_FACTOR,
            max_future_block_time: MAX_FUTURE_BLOCK_TIME,
            coinbase_script_sig_min: MIN_COINBASE_SCRIPT_SIG,
            coinbase_script_sig_max: MAX_COINBASE_SCRIPT_SIG,
        }
    }

    /// Parse from JSON; missing fields take mainnet values.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self =
            serde_json::from_str(json).map_err(|e| ConsensusError::Params(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.witness_scale_factor == 0 {
            return Err(ConsensusError::Params(
                "witness_scale_factor must be non-zero".to_string(),
            ));
        }
        if self.max_money < 0 {
            return Err(ConsensusError::Params(format!(
                "max_money must be non-negative, got {}",
                self.max_money
            )));
        }
        if self.coinbase_script_sig_min > self.coinbase_script_sig_max {
            return Err(ConsensusError::Params(format!(
                "coinbase scriptSig bounds inverted: {} > {}",
                self.coinbase_script_sig_min, self.coinbase_script_sig_max
            )));
        }
        Ok(())
    }

    /// Weight of `size` serialized bytes, saturating
    pub fn weight(&self, size: usize) -> u64 {
        (size as u64).saturating_mul(self.witness_scale_factor)
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_defaults() {
        let params = ConsensusParams::default();
        assert_eq!(params.max_money, 2_100_000_000_000_000);
        assert_eq!(params.max_block_weight, 4_000_000);
        assert_eq!(params.weight(250), 1000);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial_override() {
        let params = ConsensusParams::from_json(r#"{"max_future_block_time": 60}"#).unwrap();
        assert_eq!(params.max_future_block_time, 60);
        assert_eq!(params.max_block_weight, MAX_BLOCK_WEIGHT);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            ConsensusParams::from_json(r#"{"witness_scale_factor": 0}"#),
            Err(ConsensusError::Params(_))
        ));
        assert!(matches!(
            ConsensusParams::from_json(
                r#"{"coinbase_script_sig_min": 10, "coinbase_script_sig_max": 5}"#
            ),
            Err(ConsensusError::Params(_))
        ));
        assert!(ConsensusParams::from_json("not json").is_err());
    }
}
