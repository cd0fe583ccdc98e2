//! Errors for the `keel-testapp` crate.

use alloy_primitives::B256;
use keel_mpt::TrieNodeError;
use keel_oracle::OracleError;
use thiserror::Error;

/// A [Result] type alias where the error is [TestAppError].
pub type TestAppResult<T> = Result<T, TestAppError>;

/// A failure of the application itself. Rejected transactions are not errors.
#[derive(Error, Debug)]
pub enum TestAppError {
    /// The oracle failed to serve a request.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// The oracle does not know the trie node.
    #[error("Trie node {hash} not found: {log}")]
    MissingNode {
        /// The requested node commitment.
        hash: B256,
        /// The query log returned with the failure.
        log: String,
    },
    /// The oracle served a preimage that does not hash to the requested node.
    #[error("Trie node preimage mismatch: expected {expected}, computed {computed}")]
    NodeHashMismatch {
        /// The requested node commitment.
        expected: B256,
        /// The hash of the served preimage.
        computed: B256,
    },
    /// A served trie node could not be decoded.
    #[error("Failed to decode trie node {0}: {1}")]
    NodeDecode(B256, alloy_rlp::Error),
    /// A trie operation failed.
    #[error(transparent)]
    Trie(#[from] TrieNodeError),
    /// The oracle serves a block other than the one the application was rehydrated for.
    #[error("Expected block {expected}, got block {got}")]
    VersionMismatch {
        /// The version the application was rehydrated at.
        expected: u64,
        /// The height of the block served or delivered.
        got: u64,
    },
    /// The block does not build on the application's state.
    #[error("Block {height} expects app hash {expected}, state is at {state}")]
    AppHashMismatch {
        /// The block height.
        height: u64,
        /// The app hash recorded in the block header.
        expected: B256,
        /// The current state root.
        state: B256,
    },
}

/// An error decoding a [crate::Tx].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    /// The transaction is not valid RLP.
    #[error("Invalid transaction encoding: {0}")]
    Rlp(#[from] alloy_rlp::Error),
    /// The transaction has trailing bytes after its RLP encoding.
    #[error("Transaction has {0} trailing bytes")]
    TrailingBytes(usize),
    /// The message type is unknown.
    #[error("Unknown message type {0}")]
    UnknownKind(u8),
    /// The message has an empty key.
    #[error("Empty key")]
    EmptyKey,
    /// A `Get` or `Remove` message carries a value.
    #[error("Unexpected value for message type {0}")]
    UnexpectedValue(u8),
    /// A `Set` message has an empty value.
    #[error("Empty value")]
    EmptyValue,
}
