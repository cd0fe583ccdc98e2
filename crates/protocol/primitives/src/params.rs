//! Consensus parameters.

use alloc::{string::String, vec, vec::Vec};
use alloy_primitives::{B256, keccak256};
use alloy_rlp::RlpEncodable;
use serde::{Deserialize, Serialize};

/// Limits on block size and gas.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct BlockParams {
    /// The maximum size of a block, in bytes.
    pub max_bytes: u64,
    /// The maximum gas per block. Zero disables the limit.
    pub max_gas: u64,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self { max_bytes: 22_020_096, max_gas: 0 }
    }
}

/// Limits on the age and size of evidence.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct EvidenceParams {
    /// The maximum age of evidence, in blocks.
    pub max_age_num_blocks: u64,
    /// The maximum age of evidence, in seconds.
    pub max_age_duration: u64,
    /// The maximum total size of evidence per block, in bytes.
    pub max_bytes: u64,
}

impl Default for EvidenceParams {
    fn default() -> Self {
        Self { max_age_num_blocks: 100_000, max_age_duration: 172_800, max_bytes: 1_048_576 }
    }
}

/// Restrictions on validator keys.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct ValidatorParams {
    /// The accepted public key types.
    pub pub_key_types: Vec<String>,
}

impl Default for ValidatorParams {
    fn default() -> Self {
        Self { pub_key_types: vec![String::from("ed25519")] }
    }
}

/// The consensus parameters in effect at a height.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Block limits.
    pub block: BlockParams,
    /// Evidence limits.
    pub evidence: EvidenceParams,
    /// Validator key restrictions.
    pub validator: ValidatorParams,
}

impl ConsensusParams {
    /// Returns the hash committed to by [crate::Header::consensus_hash].
    pub fn hash(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }
}
