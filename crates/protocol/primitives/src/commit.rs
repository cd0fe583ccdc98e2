//! Commits and the signatures they aggregate.

use crate::{BlockId, Header, ValidationError, ValidationResult};
use alloc::vec::Vec;
use alloy_primitives::{Address, B256, Bytes};
use alloy_rlp::{BufMut, Encodable, RlpEncodable};
use keel_mpt::ordered_root_with_encoder;
use serde::{Deserialize, Serialize};

/// Records what a validator voted for in a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockIdFlag {
    /// The validator did not vote.
    #[default]
    Absent,
    /// The validator voted for the committed block.
    Commit,
    /// The validator voted for nil.
    Nil,
}

impl BlockIdFlag {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Absent => 1,
            Self::Commit => 2,
            Self::Nil => 3,
        }
    }
}

impl Encodable for BlockIdFlag {
    fn encode(&self, out: &mut dyn BufMut) {
        self.as_u8().encode(out)
    }

    fn length(&self) -> usize {
        self.as_u8().length()
    }
}

/// A single validator's entry in a [Commit].
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct CommitSig {
    /// What the validator voted for.
    pub block_id_flag: BlockIdFlag,
    /// The address of the validator. Zero for absent votes.
    pub validator_address: Address,
    /// The vote timestamp, in seconds since the unix epoch.
    pub timestamp: u64,
    /// The vote signature. Empty for absent votes.
    pub signature: Bytes,
}

impl CommitSig {
    /// Creates an absent signature.
    pub fn absent() -> Self {
        Self::default()
    }

    /// Returns `true` if the validator did not vote.
    pub fn is_absent(&self) -> bool {
        self.block_id_flag == BlockIdFlag::Absent
    }

    /// Returns `true` if the validator voted for the committed block.
    pub fn is_commit(&self) -> bool {
        self.block_id_flag == BlockIdFlag::Commit
    }

    fn validate_basic(&self, index: usize) -> ValidationResult<()> {
        let has_address = !self.validator_address.is_zero();
        let has_signature = !self.signature.is_empty();
        match self.block_id_flag {
            BlockIdFlag::Absent if has_address || has_signature => {
                Err(ValidationError::AbsentSignatureWithData(index))
            }
            BlockIdFlag::Commit | BlockIdFlag::Nil if !has_address || !has_signature => {
                Err(ValidationError::IncompleteSignature(index))
            }
            _ => Ok(()),
        }
    }
}

/// The set of votes that finalized the block at `height`.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct Commit {
    /// The height of the committed block.
    pub height: u64,
    /// The consensus round the block was committed in.
    pub round: u32,
    /// The id of the committed block.
    pub block_id: BlockId,
    /// One entry per validator, in validator set order.
    pub signatures: Vec<CommitSig>,
}

impl Commit {
    /// Returns the ordered root of the commit signatures.
    pub fn hash(&self) -> B256 {
        ordered_root_with_encoder(&self.signatures, |sig, buf| sig.encode(buf))
    }

    /// Performs basic structural validation.
    pub fn validate_basic(&self) -> ValidationResult<()> {
        if self.height >= 1 {
            if self.signatures.is_empty() {
                return Err(ValidationError::NoSignatures(self.height));
            }
            if self.block_id.is_zero() {
                return Err(ValidationError::ZeroCommitBlockId(self.height));
            }
            self.block_id.validate_basic()?;
        }
        self.signatures.iter().enumerate().try_for_each(|(i, sig)| sig.validate_basic(i))
    }
}

/// A header together with the commit that signs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedHeader {
    /// The signed header.
    pub header: Header,
    /// The commit for the header.
    pub commit: Commit,
}

impl SignedHeader {
    /// Checks that the header and commit are well formed, belong to `chain_id`, and that the
    /// commit signs the header.
    pub fn validate_basic(&self, chain_id: &str) -> ValidationResult<()> {
        self.header.validate_basic()?;
        if self.header.chain_id != chain_id {
            return Err(ValidationError::ChainIdMismatch {
                expected: chain_id.into(),
                got: self.header.chain_id.clone(),
            });
        }
        if self.header.height != self.commit.height {
            return Err(ValidationError::HeightMismatch {
                header: self.header.height,
                commit: self.commit.height,
            });
        }
        let header_hash = self.header.hash();
        if self.commit.block_id.hash != header_hash {
            return Err(ValidationError::CommitBlockMismatch {
                signed: self.commit.block_id.hash,
                header: header_hash,
            });
        }
        self.commit.validate_basic()
    }
}
