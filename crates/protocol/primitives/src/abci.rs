//! ABCI request and response messages exchanged between the block executor and an application.

use crate::{ConsensusParams, Header, MisbehaviorKind};
use alloc::{string::String, vec::Vec};
use alloy_primitives::{Address, B256, Bytes};
use alloy_rlp::{Encodable, RlpEncodable};
use keel_mpt::ordered_root_with_encoder;
use serde::{Deserialize, Serialize};

/// The response code of a successful request.
pub const CODE_TYPE_OK: u32 = 0;

/// A change to the validator set, or an entry of the genesis validator set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    /// The validator's public key material.
    pub pub_key: Bytes,
    /// The new voting power. Zero removes the validator.
    pub power: u64,
}

/// A validator as referred to by vote and misbehavior information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    /// The validator address.
    pub address: Address,
    /// The validator's voting power.
    pub power: u64,
}

/// Whether a validator signed the previous block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInfo {
    /// The validator.
    pub validator: ValidatorInfo,
    /// `true` if the validator's signature is part of the last commit.
    pub signed_last_block: bool,
}

/// The votes of the commit for the previous block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastCommitInfo {
    /// The round the previous block was committed in.
    pub round: u32,
    /// One entry per validator, in validator set order.
    pub votes: Vec<VoteInfo>,
}

/// Misbehavior of a single validator, reported to the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misbehavior {
    /// The kind of misbehavior.
    pub kind: MisbehaviorKind,
    /// The misbehaving validator.
    pub validator: ValidatorInfo,
    /// The height the misbehavior happened at.
    pub height: u64,
    /// The time of the block at `height`.
    pub time: u64,
    /// The total voting power of the validator set at `height`.
    pub total_voting_power: u64,
}

/// A key/value attribute of an [Event].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    /// The attribute key.
    pub key: String,
    /// The attribute value.
    pub value: String,
}

/// An event emitted by the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The event type.
    pub kind: String,
    /// The event attributes.
    pub attributes: Vec<EventAttribute>,
}

/// Initializes the application state for a new chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInitChain {
    /// The genesis time.
    pub time: u64,
    /// The chain identifier.
    pub chain_id: String,
    /// The initial consensus parameters.
    pub consensus_params: Option<ConsensusParams>,
    /// The initial validator set.
    pub validators: Vec<ValidatorUpdate>,
    /// The raw application genesis state.
    pub app_state_bytes: Bytes,
    /// The height of the first block.
    pub initial_height: u64,
}

/// The application's answer to [RequestInitChain].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInitChain {
    /// Consensus parameters chosen by the application, if any.
    pub consensus_params: Option<ConsensusParams>,
    /// Validator set chosen by the application, if any.
    pub validators: Vec<ValidatorUpdate>,
    /// The initial application hash.
    pub app_hash: B256,
}

/// Signals the start of a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBeginBlock {
    /// The block hash.
    pub hash: B256,
    /// The full block header.
    pub header: Header,
    /// The votes of the commit for the previous block.
    pub last_commit_info: LastCommitInfo,
    /// Misbehavior evidenced in the block.
    pub byzantine_validators: Vec<Misbehavior>,
}

/// The application's answer to [RequestBeginBlock].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBeginBlock {
    /// Events emitted while beginning the block.
    pub events: Vec<Event>,
}

/// Delivers a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDeliverTx {
    /// The raw transaction.
    pub tx: Bytes,
}

/// The result of executing a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDeliverTx {
    /// The response code. [CODE_TYPE_OK] on success.
    pub code: u32,
    /// Result data.
    pub data: Bytes,
    /// Non-deterministic log output.
    pub log: String,
    /// The gas requested by the transaction.
    pub gas_wanted: u64,
    /// The gas used by the transaction.
    pub gas_used: u64,
    /// Events emitted by the transaction.
    pub events: Vec<Event>,
}

impl ResponseDeliverTx {
    /// Returns `true` if the transaction succeeded.
    pub const fn is_ok(&self) -> bool {
        self.code == CODE_TYPE_OK
    }
}

/// The deterministic part of a [ResponseDeliverTx], committed to by
/// [crate::Header::last_results_hash].
#[derive(RlpEncodable)]
struct DeterministicResult<'a> {
    code: u32,
    data: &'a Bytes,
}

/// Returns the ordered root of the deterministic fields of a block's transaction results.
pub fn results_hash(results: &[ResponseDeliverTx]) -> B256 {
    ordered_root_with_encoder(results, |r, buf| {
        DeterministicResult { code: r.code, data: &r.data }.encode(buf)
    })
}

/// Signals the end of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEndBlock {
    /// The block height.
    pub height: u64,
}

/// The application's answer to [RequestEndBlock].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEndBlock {
    /// Changes to the validator set.
    pub validator_updates: Vec<ValidatorUpdate>,
    /// Changes to the consensus parameters.
    pub consensus_param_updates: Option<ConsensusParams>,
    /// Events emitted while ending the block.
    pub events: Vec<Event>,
}

/// The application's answer to a commit request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCommit {
    /// The application hash after the block.
    pub data: B256,
    /// Blocks below this height may be pruned.
    pub retain_height: u64,
}

/// A query against the application state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestQuery {
    /// The raw query payload.
    pub data: Bytes,
    /// The query path.
    pub path: String,
    /// The state version to query. Zero selects the latest version.
    pub height: u64,
    /// Whether to include a proof in the response.
    pub prove: bool,
}

/// The application's answer to [RequestQuery].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseQuery {
    /// The response code. [CODE_TYPE_OK] on success.
    pub code: u32,
    /// Non-deterministic log output.
    pub log: String,
    /// The queried key.
    pub key: Bytes,
    /// The value at `key`. Empty if the key is not present.
    pub value: Bytes,
    /// The RLP encoded trie nodes proving `value`, ordered from the root down.
    pub proof_ops: Vec<Bytes>,
    /// The state version the query was answered at.
    pub height: u64,
}

impl ResponseQuery {
    /// Returns `true` if the query succeeded.
    pub const fn is_ok(&self) -> bool {
        self.code == CODE_TYPE_OK
    }
}
