//! Contains the [LocalOracle], which serves a locally produced block and the state of a live
//! application without any verification.

use crate::{Oracle, OracleError, OracleResult, QueryKey, Queryable, paths};
use alloy_primitives::{Bytes, hex};
use keel_primitives::{
    BLOCK_PART_SIZE_BYTES, Block, ConsensusParams, ResultAbciQuery, ResultBlock,
    ResultConsensusParams, ResultValidators, ValidatorSet, abci::RequestQuery,
};
use std::sync::Arc;
use tracing::trace;

/// An [Oracle] backed by a fully synced, in-process application and a single known block.
///
/// The data is produced locally and is considered authoritative, so nothing is verified.
#[derive(Debug)]
pub struct LocalOracle<A> {
    app: Arc<A>,
    block: Block,
    validators: ValidatorSet,
    consensus_params: ConsensusParams,
}

impl<A: Queryable> LocalOracle<A> {
    /// Creates a new [LocalOracle] serving `block`, the `validators` that signed its last commit
    /// and the state of `app` at `block.height - 1`. Consensus parameters default to
    /// [ConsensusParams::default].
    pub fn new(app: Arc<A>, block: Block, validators: ValidatorSet) -> Self {
        Self { app, block, validators, consensus_params: ConsensusParams::default() }
    }

    /// Serves `consensus_params` instead of the defaults.
    pub fn with_consensus_params(mut self, consensus_params: ConsensusParams) -> Self {
        self.consensus_params = consensus_params;
        self
    }

    /// The height the served state and validator set are effective at.
    const fn parent_height(&self) -> u64 {
        self.block.header.height.saturating_sub(1)
    }
}

impl<A: Queryable> Oracle for LocalOracle<A> {
    fn get(&self, key: &QueryKey) -> OracleResult<Bytes> {
        trace!(target: "oracle", "Local lookup of {key}");
        let body = match key.path() {
            paths::BLOCK => serde_json::to_vec(&ResultBlock {
                block_id: self.block.block_id(BLOCK_PART_SIZE_BYTES),
                block: self.block.clone(),
            })?,
            paths::VALIDATORS => serde_json::to_vec(&ResultValidators::complete(
                self.parent_height(),
                self.validators.clone(),
            ))?,
            paths::CONSENSUS_PARAMS => serde_json::to_vec(&ResultConsensusParams {
                block_height: self.parent_height(),
                consensus_params: self.consensus_params.clone(),
            })?,
            paths::ABCI_QUERY => {
                let request = RequestQuery {
                    data: key.bytes("data")?.into(),
                    path: key.required("path")?.to_string(),
                    height: self.parent_height(),
                    prove: true,
                };
                trace!(
                    target: "oracle",
                    "Querying {} for 0x{}",
                    request.path,
                    hex::encode(&request.data)
                );
                serde_json::to_vec(&ResultAbciQuery { response: self.app.query(request) })?
            }
            _ => return Err(OracleError::UnsupportedQuery(key.to_string())),
        };
        Ok(body.into())
    }
}
