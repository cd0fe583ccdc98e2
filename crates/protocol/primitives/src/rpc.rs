//! Result envelopes of the node's JSON-RPC methods.

use crate::{
    Block, BlockId, ConsensusParams, SignedHeader, Validator, ValidatorSet, abci::ResponseQuery,
};
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

/// The result of the `block` method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBlock {
    /// The id the node claims for the block.
    pub block_id: BlockId,
    /// The block.
    pub block: Block,
}

/// The result of the `commit` method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCommit {
    /// The header and the commit that signs it.
    pub signed_header: SignedHeader,
    /// `true` if the commit is the canonical one, rather than the node's latest seen commit.
    pub canonical: bool,
}

/// The result of the `validators` method: one page of the validator set at `block_height`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultValidators {
    /// The height the validator set is effective at.
    pub block_height: u64,
    /// The validators on this page, in set order.
    pub validators: Vec<Validator>,
    /// The number of validators on this page.
    pub count: usize,
    /// The total number of validators in the set.
    pub total: usize,
}

impl ResultValidators {
    /// Wraps a complete validator set as a single page.
    pub fn complete(block_height: u64, set: ValidatorSet) -> Self {
        let validators = set.into_validators();
        let count = validators.len();
        Self { block_height, validators, count, total: count }
    }
}

/// The result of the `abci_query` method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultAbciQuery {
    /// The application's response.
    pub response: ResponseQuery,
}

/// The result of the `consensus_params` method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultConsensusParams {
    /// The height the parameters are effective at.
    pub block_height: u64,
    /// The consensus parameters.
    pub consensus_params: ConsensusParams,
}
