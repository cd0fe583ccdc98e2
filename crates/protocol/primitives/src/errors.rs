//! Errors for the `keel-primitives` crate.

use alloc::string::String;
use alloy_primitives::B256;
use thiserror::Error;

/// A [Result] type alias where the error is [ValidationError].
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A structural validation failure raised by a `validate_basic` check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The block id has a zero hash but a non-zero part set header.
    #[error("Block id has a zero hash but a non-zero part set header")]
    ZeroHashWithParts,
    /// The part set header commits to zero parts.
    #[error("Part set header has a non-zero hash but no parts")]
    EmptyPartSet,
    /// The chain id is empty.
    #[error("Chain id is empty")]
    EmptyChainId,
    /// The chain id exceeds the maximum length.
    #[error("Chain id is {0} bytes long")]
    ChainIdTooLong(usize),
    /// The header height is zero.
    #[error("Header height is zero")]
    ZeroHeight,
    /// The first block refers to a previous block.
    #[error("First block carries a non-zero last block id")]
    UnexpectedLastBlockId,
    /// A header hash field does not match the recomputed value.
    #[error("{field} mismatch: header carries {expected}, computed {computed}")]
    HashMismatch {
        /// The name of the header field.
        field: &'static str,
        /// The value carried by the header.
        expected: B256,
        /// The value recomputed from the block contents.
        computed: B256,
    },
    /// The embedded last commit is for the wrong height.
    #[error("Last commit is for height {got}, expected {expected}")]
    LastCommitHeight {
        /// The expected commit height.
        expected: u64,
        /// The height of the embedded commit.
        got: u64,
    },
    /// The embedded last commit does not commit to the header's last block id.
    #[error("Last commit block id does not match the header's last block id")]
    LastCommitBlockId,
    /// The first block carries last commit signatures.
    #[error("First block carries {0} last commit signatures")]
    UnexpectedLastCommit(usize),
    /// The commit carries no signatures.
    #[error("Commit at height {0} has no signatures")]
    NoSignatures(u64),
    /// The commit block id is zero.
    #[error("Commit at height {0} has a zero block id")]
    ZeroCommitBlockId(u64),
    /// An absent signature carries an address or signature bytes.
    #[error("Absent signature {0} carries validator data")]
    AbsentSignatureWithData(usize),
    /// A present signature is missing an address or signature bytes.
    #[error("Signature {0} is missing its validator address or signature")]
    IncompleteSignature(usize),
    /// The header belongs to another chain.
    #[error("Chain id mismatch: expected {expected}, got {got}")]
    ChainIdMismatch {
        /// The expected chain id.
        expected: String,
        /// The chain id carried by the header.
        got: String,
    },
    /// The header and commit heights differ.
    #[error("Header height {header} does not match commit height {commit}")]
    HeightMismatch {
        /// The header height.
        header: u64,
        /// The commit height.
        commit: u64,
    },
    /// The commit signs a different header.
    #[error("Commit signs block {signed}, header hashes to {header}")]
    CommitBlockMismatch {
        /// The block hash signed by the commit.
        signed: B256,
        /// The hash of the header.
        header: B256,
    },
}
