//! Block identifiers.

use crate::{ValidationError, ValidationResult};
use alloy_primitives::B256;
use alloy_rlp::RlpEncodable;
use serde::{Deserialize, Serialize};

/// The header of the set of parts a serialized block is split into for gossip.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, RlpEncodable, Serialize, Deserialize,
)]
pub struct PartSetHeader {
    /// The number of parts.
    pub total: u32,
    /// The ordered root of the parts.
    pub hash: B256,
}

impl PartSetHeader {
    /// Returns `true` if the header is the zero value.
    pub fn is_zero(&self) -> bool {
        self.total == 0 && self.hash.is_zero()
    }
}

/// The identity of a block: its header hash together with its part set header.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, RlpEncodable, Serialize, Deserialize,
)]
pub struct BlockId {
    /// The block header hash.
    pub hash: B256,
    /// The part set header of the serialized block.
    pub part_set_header: PartSetHeader,
}

impl BlockId {
    /// Returns `true` if the block id is the zero value.
    pub fn is_zero(&self) -> bool {
        self.hash.is_zero() && self.part_set_header.is_zero()
    }

    /// Performs basic structural validation.
    pub fn validate_basic(&self) -> ValidationResult<()> {
        if self.hash.is_zero() {
            if !self.part_set_header.is_zero() {
                return Err(ValidationError::ZeroHashWithParts);
            }
            return Ok(());
        }
        if !self.part_set_header.is_zero() && self.part_set_header.total == 0 {
            return Err(ValidationError::EmptyPartSet);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_block_id_is_valid() {
        assert!(BlockId::default().is_zero());
        BlockId::default().validate_basic().unwrap();
    }

    #[test]
    fn test_zero_hash_with_parts() {
        let id = BlockId {
            hash: B256::ZERO,
            part_set_header: PartSetHeader { total: 1, hash: B256::repeat_byte(1) },
        };
        assert_eq!(id.validate_basic(), Err(ValidationError::ZeroHashWithParts));
    }

    #[test]
    fn test_parts_without_total() {
        let id = BlockId {
            hash: B256::repeat_byte(1),
            part_set_header: PartSetHeader { total: 0, hash: B256::repeat_byte(2) },
        };
        assert_eq!(id.validate_basic(), Err(ValidationError::EmptyPartSet));
    }
}
