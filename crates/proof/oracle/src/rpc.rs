//! Contains the [RpcOracle], which verifies data from an untrusted [DataSource] against a
//! [TrustAnchor] before serving it.

use crate::{
    DataSource, Oracle, OracleError, OracleResult, QueryKey, VerificationError,
    VerificationResult, paths,
};
use alloy_primitives::{Bytes, keccak256};
use alloy_trie::Nibbles;
use keel_mpt::verify_proof;
use keel_primitives::{
    BLOCK_PART_SIZE_BYTES, Block, BlockId, ResultAbciQuery, ResultBlock, ResultValidators,
    SignedHeader, TrustAnchor, ValidatorSet,
};
use tracing::{debug, info, trace, warn};

/// Configuration of the [RpcOracle].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleConfig {
    /// The page size used when fetching the validator set.
    pub validators_per_page: usize,
    /// The part size used when recomputing a block's part set header.
    pub block_part_size: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self { validators_per_page: 100, block_part_size: BLOCK_PART_SIZE_BYTES }
    }
}

/// The artifacts verified during [RpcOracle] construction. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedState {
    /// The block at the anchor height.
    pub block: Block,
    /// The recomputed id of `block`.
    pub block_id: BlockId,
    /// The header and commit for `anchor.height - 1`.
    pub commit: SignedHeader,
    /// The validator set that signed `commit`.
    pub validators: ValidatorSet,
}

/// An [Oracle] that serves data from an untrusted [DataSource], bound to a single
/// [TrustAnchor].
///
/// Construction verifies, in order, the anchor block, the commit for the previous height and
/// the validator set that signed it. Any failure aborts construction.
#[derive(Debug)]
pub struct RpcOracle<S> {
    anchor: TrustAnchor,
    source: S,
    state: VerifiedState,
}

impl<S: DataSource> RpcOracle<S> {
    /// Verifies the trust chain rooted in `anchor` and creates a new [RpcOracle].
    ///
    /// ## Takes
    /// - `anchor` - The trusted height and block hash.
    /// - `source` - The untrusted data source.
    /// - `config` - The oracle configuration.
    ///
    /// ## Returns
    /// - `Ok(RpcOracle)` - The block, commit and validator set were verified.
    /// - `Err(VerificationError)` - A check failed, or the source failed.
    pub fn new(anchor: TrustAnchor, source: S, config: OracleConfig) -> VerificationResult<Self> {
        if anchor.height == 0 {
            return Err(VerificationError::InvalidAnchor(anchor.height));
        }
        info!(
            target: "oracle",
            "Verifying trust chain from block {} ({})",
            anchor.height,
            anchor.hash
        );

        let (block, block_id) = Self::verify_block(&anchor, &source, config.block_part_size)?;
        let commit = Self::verify_commit(&block, &source)?;
        let validators = Self::verify_validators(&commit, &source, config.validators_per_page)?;

        info!(
            target: "oracle",
            "Verified block {} with {} transactions and {} validators",
            anchor.height,
            block.txs.len(),
            validators.len()
        );
        Ok(Self { anchor, source, state: VerifiedState { block, block_id, commit, validators } })
    }

    /// Returns the trust anchor.
    pub const fn anchor(&self) -> &TrustAnchor {
        &self.anchor
    }

    /// Returns the verified state.
    pub const fn state(&self) -> &VerifiedState {
        &self.state
    }

    /// Fetches the anchor block and binds it to the anchor hash.
    fn verify_block(
        anchor: &TrustAnchor,
        source: &S,
        part_size: usize,
    ) -> VerificationResult<(Block, BlockId)> {
        let height = anchor.height;
        let ResultBlock { block_id: claimed, block } = source.block(height)?;

        block
            .validate_basic()
            .map_err(|source| VerificationError::MalformedBlock { height, source })?;

        let computed = block.block_id(part_size);
        if computed != claimed {
            return Err(VerificationError::BlockIdentityMismatch { height, claimed, computed });
        }
        if computed.hash != anchor.hash {
            return Err(VerificationError::AnchorHashMismatch {
                height,
                expected: anchor.hash,
                computed: computed.hash,
            });
        }

        debug!(target: "oracle", "Block {height} matches the trust anchor");
        Ok((block, computed))
    }

    /// Fetches the commit for the previous height and binds it to the verified block.
    fn verify_commit(block: &Block, source: &S) -> VerificationResult<SignedHeader> {
        let height = block.height() - 1;
        let signed_header = source.commit(height)?.signed_header;

        signed_header
            .validate_basic(&block.header.chain_id)
            .map_err(|source| VerificationError::MalformedCommit { height, source })?;

        let computed = signed_header.commit.hash();
        if computed != block.header.last_commit_hash {
            return Err(VerificationError::LastCommitHashMismatch {
                height,
                expected: block.header.last_commit_hash,
                computed,
            });
        }
        if signed_header.commit.block_id != block.header.last_block_id {
            return Err(VerificationError::LastBlockIdMismatch {
                height,
                expected: block.header.last_block_id.hash,
                got: signed_header.commit.block_id.hash,
            });
        }

        debug!(target: "oracle", "Commit {height} matches the block's last commit hash");
        Ok(signed_header)
    }

    /// Fetches the validator set that signed `commit` and binds it to the commit header.
    fn verify_validators(
        commit: &SignedHeader,
        source: &S,
        per_page: usize,
    ) -> VerificationResult<ValidatorSet> {
        let height = commit.header.height;
        let validators = Self::fetch_validators(source, height, per_page)?;

        let computed = validators.hash();
        if computed != commit.header.validators_hash {
            return Err(VerificationError::ValidatorsHashMismatch {
                height,
                expected: commit.header.validators_hash,
                computed,
            });
        }

        debug!(target: "oracle", "Validator set {height} matches the commit's validators hash");
        Ok(validators)
    }

    /// Fetches pages of the validator set at `height`, starting at page 1, until the running
    /// count reaches the reported total. Pages are concatenated in the order they are returned.
    fn fetch_validators(
        source: &S,
        height: u64,
        per_page: usize,
    ) -> VerificationResult<ValidatorSet> {
        let mut validators = Vec::new();
        let mut page = 1;
        loop {
            let result = source.validators(height, page, per_page)?;
            let fetched = validators.len() + result.validators.len();
            if result.validators.is_empty() || fetched > result.total {
                return Err(VerificationError::IncompleteValidatorSet {
                    height,
                    fetched,
                    total: result.total,
                });
            }

            validators.extend(result.validators);
            if validators.len() == result.total {
                break;
            }
            page += 1;
        }

        debug!(
            target: "oracle",
            "Fetched {} validators at height {height} in {page} pages",
            validators.len()
        );
        Ok(ValidatorSet::new(validators))
    }

    /// Forwards a state query to the source at `anchor.height - 1` and checks the answer
    /// against the verified state root.
    ///
    /// A successful answer must either prove its value (or its absence) with proof nodes, or be
    /// content addressed: a value whose hash is the queried key. Failed answers are passed on
    /// only if they carry no value.
    fn abci_query(&self, key: &QueryKey) -> OracleResult<ResultAbciQuery> {
        let path = key.required("path")?;
        let data = key.bytes("data")?;
        let height = self.anchor.height - 1;

        let result = self.source.abci_query(path, &data, height, true)?;
        let response = &result.response;
        if !response.is_ok() {
            if !response.value.is_empty() {
                return Err(OracleError::MissingQueryProof(key.to_string()));
            }
            return Ok(result);
        }

        let content_addressed = response.proof_ops.is_empty() &&
            !response.value.is_empty() &&
            keccak256(&response.value).as_slice() == data.as_slice();
        if content_addressed {
            trace!(target: "oracle", "Content addressed answer for {key}");
            return Ok(result);
        }

        let value = (!response.value.is_empty()).then_some(&response.value[..]);
        verify_proof(
            self.state.block.header.app_hash,
            &Nibbles::unpack(keccak256(&data)),
            value,
            &response.proof_ops,
        )
        .map_err(|source| match source {
            _ if response.proof_ops.is_empty() => OracleError::MissingQueryProof(key.to_string()),
            source => OracleError::InvalidQueryProof { key: key.to_string(), source },
        })?;
        Ok(result)
    }
}

impl<S: DataSource> Oracle for RpcOracle<S> {
    fn get(&self, key: &QueryKey) -> OracleResult<Bytes> {
        let body = match key.path() {
            paths::BLOCK => serde_json::to_vec(&ResultBlock {
                block_id: self.state.block_id,
                block: self.state.block.clone(),
            })?,
            paths::VALIDATORS => serde_json::to_vec(&ResultValidators::complete(
                self.state.commit.header.height,
                self.state.validators.clone(),
            ))?,
            paths::ABCI_QUERY => serde_json::to_vec(&self.abci_query(key)?)?,
            paths::CONSENSUS_PARAMS => {
                warn!(
                    target: "oracle",
                    "Consensus parameters are not bound to the trust chain and are not served"
                );
                return Err(OracleError::UnsupportedQuery(key.to_string()));
            }
            _ => return Err(OracleError::UnsupportedQuery(key.to_string())),
        };
        Ok(body.into())
    }
}
