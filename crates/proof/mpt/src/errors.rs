//! Errors for the `keel-mpt` crate.

use alloc::string::String;
use alloy_primitives::B256;
use thiserror::Error;

/// A [Result] type alias where the error is [TrieNodeError].
pub type TrieNodeResult<T> = Result<T, TrieNodeError>;

/// An error type for [TrieNode] operations.
///
/// [TrieNode]: crate::TrieNode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieNodeError {
    /// Invalid trie node type encountered.
    #[error("Invalid trie node type encountered")]
    InvalidNodeType,
    /// Failed to decode trie node.
    #[error("Failed to decode trie node: {0}")]
    RLPError(alloy_rlp::Error),
    /// Key does not exist in trie.
    #[error("Key does not exist in trie")]
    KeyNotFound,
    /// The path ended at a branch node. All keys of a trie must have the same length.
    #[error("Path ended at a branch node")]
    ShortPath,
    /// Trie provider error.
    #[error("Trie provider error: {0}")]
    Provider(String),
}

/// A [Result] type alias where the error is [ProofError].
pub type ProofResult<T> = Result<T, ProofError>;

/// An error raised while checking a membership proof against a root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// A node on the path to the key is not part of the proof.
    #[error("Proof is missing the node with commitment {0}")]
    MissingNode(B256),
    /// The proof resolves to a value that differs from the claimed one.
    #[error("Proof value mismatch: claimed {claimed:?}, proven {proven:?}")]
    ValueMismatch {
        /// The value the caller claimed for the key.
        claimed: Option<alloy_primitives::Bytes>,
        /// The value the proof actually resolves to.
        proven: Option<alloy_primitives::Bytes>,
    },
    /// Walking the proof failed.
    #[error(transparent)]
    Trie(#[from] TrieNodeError),
}
