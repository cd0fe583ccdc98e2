//! Errors for the `keel-oracle` crate.

use alloy_primitives::B256;
use keel_mpt::ProofError;
use keel_primitives::{BlockId, ValidationError};
use thiserror::Error;

/// A [Result] type alias where the error is [SourceError].
pub type SourceResult<T> = Result<T, SourceError>;

/// An error raised by a raw [crate::DataSource]. These are propagated unmodified.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The request could not be sent or the response could not be read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The node answered with a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
    },
    /// The node answered with neither a result nor an error.
    #[error("Empty JSON-RPC response for {0}")]
    EmptyResponse(String),
    /// The response could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The source does not know the requested data.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The result cache failed.
    #[error(transparent)]
    Cache(#[from] anyhow::Error),
}

/// An error raised while parsing a [crate::QueryKey].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The key has no path.
    #[error("Query key has an empty path")]
    EmptyPath,
    /// A required parameter is missing.
    #[error("Query key {key} is missing parameter {param}")]
    MissingParam {
        /// The full key.
        key: String,
        /// The missing parameter.
        param: &'static str,
    },
    /// A parameter could not be parsed.
    #[error("Query key {key} has an invalid {param} parameter")]
    InvalidParam {
        /// The full key.
        key: String,
        /// The invalid parameter.
        param: &'static str,
    },
}

/// A [Result] type alias where the error is [VerificationError].
pub type VerificationResult<T> = Result<T, VerificationError>;

/// A failure of the trust chain while constructing a [crate::RpcOracle]. Construction is
/// aborted on the first failure and no verified data is exposed.
#[derive(Error, Debug)]
pub enum VerificationError {
    /// The trust anchor is unusable.
    #[error("Invalid trust anchor height {0}")]
    InvalidAnchor(u64),
    /// The block is not structurally valid.
    #[error("Malformed block at height {height}: {source}")]
    MalformedBlock {
        /// The block height.
        height: u64,
        /// The structural failure.
        source: ValidationError,
    },
    /// The block id claimed by the source differs from the recomputed one.
    #[error("Block id mismatch at height {height}: claimed {claimed:?}, computed {computed:?}")]
    BlockIdentityMismatch {
        /// The block height.
        height: u64,
        /// The id claimed by the source.
        claimed: BlockId,
        /// The id recomputed from the block.
        computed: BlockId,
    },
    /// The block hash differs from the trusted anchor hash.
    #[error("Anchor hash mismatch at height {height}: expected {expected}, computed {computed}")]
    AnchorHashMismatch {
        /// The anchor height.
        height: u64,
        /// The trusted hash.
        expected: B256,
        /// The recomputed block hash.
        computed: B256,
    },
    /// The commit is not structurally valid.
    #[error("Malformed commit at height {height}: {source}")]
    MalformedCommit {
        /// The commit height.
        height: u64,
        /// The structural failure.
        source: ValidationError,
    },
    /// The commit does not hash to the block's `last_commit_hash`.
    #[error("Last commit hash mismatch at {height}: expected {expected}, computed {computed}")]
    LastCommitHashMismatch {
        /// The commit height.
        height: u64,
        /// The hash recorded in the verified block.
        expected: B256,
        /// The recomputed commit hash.
        computed: B256,
    },
    /// The commit signs a different block than the verified block's parent.
    #[error("Last block id mismatch at height {height}: expected {expected}, got {got}")]
    LastBlockIdMismatch {
        /// The commit height.
        height: u64,
        /// The parent hash recorded in the verified block.
        expected: B256,
        /// The block hash signed by the commit.
        got: B256,
    },
    /// The validator pages do not add up to the reported total.
    #[error("Incomplete validator set at height {height}: fetched {fetched} of {total}")]
    IncompleteValidatorSet {
        /// The validator set height.
        height: u64,
        /// The number of validators fetched so far.
        fetched: usize,
        /// The total reported by the source.
        total: usize,
    },
    /// The assembled validator set does not hash to the commit header's `validators_hash`.
    #[error("Validators hash mismatch at {height}: expected {expected}, computed {computed}")]
    ValidatorsHashMismatch {
        /// The validator set height.
        height: u64,
        /// The hash recorded in the verified header.
        expected: B256,
        /// The hash of the assembled set.
        computed: B256,
    },
    /// The source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A [Result] type alias where the error is [OracleError].
pub type OracleResult<T> = Result<T, OracleError>;

/// An error returned by [crate::Oracle::get].
#[derive(Error, Debug)]
pub enum OracleError {
    /// The oracle does not serve the requested path.
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),
    /// The query key is malformed.
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
    /// A state query response carries a proof that does not match the verified state root.
    #[error("Invalid proof for query {key}: {source}")]
    InvalidQueryProof {
        /// The query key.
        key: String,
        /// The proof failure.
        source: ProofError,
    },
    /// A state query response carries a value without anything proving it.
    #[error("Missing proof for query {0}")]
    MissingQueryProof(String),
    /// The underlying source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// A response could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
