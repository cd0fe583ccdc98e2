//! Contains the [Block] type and its part set commitment.

use crate::{BlockId, Commit, Evidence, Header, PartSetHeader, ValidationError, ValidationResult};
use alloc::vec::Vec;
use alloy_primitives::{B256, Bytes};
use alloy_rlp::{Encodable, RlpEncodable};
use keel_mpt::{ordered_root, ordered_root_with_encoder};
use serde::{Deserialize, Serialize};

/// The default size of a block part, in bytes.
pub const BLOCK_PART_SIZE_BYTES: usize = 65536;

/// A block: a header, its transactions and evidence, and the commit for the previous block.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// The raw transactions, in execution order.
    pub txs: Vec<Bytes>,
    /// Evidence of validator misbehavior included in the block.
    pub evidence: Vec<Evidence>,
    /// The commit for the previous block.
    pub last_commit: Commit,
}

impl Block {
    /// Returns the block hash, which is the hash of its header.
    pub fn hash(&self) -> B256 {
        self.header.hash()
    }

    /// Returns the block height.
    pub const fn height(&self) -> u64 {
        self.header.height
    }

    /// Computes the ordered root of the block's transactions.
    pub fn data_hash(txs: &[Bytes]) -> B256 {
        ordered_root(txs)
    }

    /// Computes the ordered root of the block's evidence.
    pub fn evidence_hash(evidence: &[Evidence]) -> B256 {
        ordered_root_with_encoder(evidence, |e, buf| e.encode(buf))
    }

    /// Splits the RLP encoding of the block into `part_size` chunks and commits to them.
    pub fn part_set_header(&self, part_size: usize) -> PartSetHeader {
        let encoded = alloy_rlp::encode(self);
        let parts = encoded.chunks(part_size.max(1)).collect::<Vec<_>>();
        PartSetHeader { total: parts.len() as u32, hash: ordered_root(&parts) }
    }

    /// Returns the identity of the block when split into `part_size` chunks.
    pub fn block_id(&self, part_size: usize) -> BlockId {
        BlockId { hash: self.hash(), part_set_header: self.part_set_header(part_size) }
    }

    /// Performs basic structural validation: the header is well formed, its content hashes
    /// match the block body, and the embedded last commit belongs to the previous block.
    pub fn validate_basic(&self) -> ValidationResult<()> {
        let header = &self.header;
        header.validate_basic()?;

        check_hash("data_hash", header.data_hash, Self::data_hash(&self.txs))?;
        check_hash("evidence_hash", header.evidence_hash, Self::evidence_hash(&self.evidence))?;
        check_hash("last_commit_hash", header.last_commit_hash, self.last_commit.hash())?;

        if header.height == 1 {
            if !self.last_commit.signatures.is_empty() {
                return Err(ValidationError::UnexpectedLastCommit(
                    self.last_commit.signatures.len(),
                ));
            }
            return Ok(());
        }

        self.last_commit.validate_basic()?;
        if self.last_commit.height != header.height - 1 {
            return Err(ValidationError::LastCommitHeight {
                expected: header.height - 1,
                got: self.last_commit.height,
            });
        }
        if self.last_commit.block_id != header.last_block_id {
            return Err(ValidationError::LastCommitBlockId);
        }
        Ok(())
    }
}

fn check_hash(field: &'static str, expected: B256, computed: B256) -> ValidationResult<()> {
    if expected == computed {
        Ok(())
    } else {
        Err(ValidationError::HashMismatch { field, expected, computed })
    }
}
