//! Contains the block [Header].

use crate::{BlockId, ValidationError, ValidationResult};
use alloc::string::String;
use alloy_primitives::{Address, B256, keccak256};
use alloy_rlp::RlpEncodable;
use serde::{Deserialize, Serialize};

/// The maximum length of a chain id, in bytes.
pub const MAX_CHAIN_ID_LEN: usize = 50;

/// A block header.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct Header {
    /// The chain identifier.
    pub chain_id: String,
    /// The block height.
    pub height: u64,
    /// The block time, in seconds since the unix epoch.
    pub time: u64,
    /// The id of the previous block.
    pub last_block_id: BlockId,
    /// The hash of the commit for the previous block.
    pub last_commit_hash: B256,
    /// The ordered root of the block's transactions.
    pub data_hash: B256,
    /// The hash of the validator set that commits this block.
    pub validators_hash: B256,
    /// The hash of the validator set for the next block.
    pub next_validators_hash: B256,
    /// The hash of the consensus parameters for this block.
    pub consensus_hash: B256,
    /// The application state root after executing the previous block.
    pub app_hash: B256,
    /// The ordered root of the previous block's transaction results.
    pub last_results_hash: B256,
    /// The ordered root of the block's evidence.
    pub evidence_hash: B256,
    /// The address of the block proposer.
    pub proposer_address: Address,
}

impl Header {
    /// Returns the hash of the header, which is also the hash of the block.
    pub fn hash(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }

    /// Performs basic structural validation.
    pub fn validate_basic(&self) -> ValidationResult<()> {
        if self.chain_id.is_empty() {
            return Err(ValidationError::EmptyChainId);
        }
        if self.chain_id.len() > MAX_CHAIN_ID_LEN {
            return Err(ValidationError::ChainIdTooLong(self.chain_id.len()));
        }
        if self.height == 0 {
            return Err(ValidationError::ZeroHeight);
        }
        if self.height == 1 && !self.last_block_id.is_zero() {
            return Err(ValidationError::UnexpectedLastBlockId);
        }
        self.last_block_id.validate_basic()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::string::ToString;

    fn header() -> Header {
        Header { chain_id: "keel-test".to_string(), height: 1, ..Default::default() }
    }

    #[test]
    fn test_valid_header() {
        header().validate_basic().unwrap();
    }

    #[test]
    fn test_chain_id_bounds() {
        let mut h = header();
        h.chain_id = String::new();
        assert_eq!(h.validate_basic(), Err(ValidationError::EmptyChainId));

        h.chain_id = "x".repeat(MAX_CHAIN_ID_LEN + 1);
        assert_eq!(h.validate_basic(), Err(ValidationError::ChainIdTooLong(51)));
    }

    #[test]
    fn test_first_block_has_no_parent() {
        let mut h = header();
        h.last_block_id.hash = B256::repeat_byte(0xaa);
        assert_eq!(h.validate_basic(), Err(ValidationError::UnexpectedLastBlockId));

        h.height = 2;
        h.validate_basic().unwrap();
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = header();
        let mut changed = base.clone();
        changed.proposer_address = Address::repeat_byte(1);
        assert_ne!(base.hash(), changed.hash());

        let mut changed = base.clone();
        changed.app_hash = B256::repeat_byte(1);
        assert_ne!(base.hash(), changed.hash());
    }
}
