//! Contains the [TestChain], a deterministic chain driving a [TestApp] through real blocks.

use crate::{TestApp, TestAppResult};
use alloy_primitives::{Address, B256, Bytes, keccak256};
use keel_executor::{Application, last_commit_info};
use keel_oracle::{DataSource, Queryable, SourceError, SourceResult};
use keel_primitives::{
    BLOCK_PART_SIZE_BYTES, Block, BlockId, BlockIdFlag, Commit, CommitSig, ConsensusParams,
    Header, ResultAbciQuery, ResultBlock, ResultCommit, ResultValidators, SignedHeader,
    TrustAnchor, Validator, ValidatorSet,
    abci::{
        RequestBeginBlock, RequestDeliverTx, RequestEndBlock, RequestInitChain, RequestQuery,
        ResponseDeliverTx, ValidatorUpdate, results_hash,
    },
};
use tracing::debug;

/// The time of the genesis block, in seconds since the unix epoch.
pub const GENESIS_TIME: u64 = 1_700_000_000;

/// Every validator whose index plus the height is a multiple of this is absent from a commit.
const ABSENT_EVERY: usize = 5;

/// A single-node chain with a fixed validator set, producing one block per call to
/// [TestChain::produce_block].
///
/// Headers carry every hash, and each block is committed by the whole validator set, with some
/// signatures absent. The chain serves its blocks, commits, validators and application state
/// as a [DataSource].
#[derive(Debug, Clone)]
pub struct TestChain {
    app: TestApp,
    chain_id: String,
    validators: ValidatorSet,
    blocks: Vec<(Block, BlockId)>,
    commits: Vec<SignedHeader>,
    last_results: Vec<ResponseDeliverTx>,
}

impl TestChain {
    /// Creates a chain with `num_validators` validators and initializes its application.
    pub fn new(chain_id: &str, num_validators: usize) -> TestAppResult<Self> {
        let validators = (0..num_validators)
            .map(|i| {
                let pub_key = keccak256(format!("{chain_id}/validator/{i}"));
                Validator::new(Bytes::copy_from_slice(pub_key.as_slice()), 100 + (i % 7) as u64)
            })
            .collect::<ValidatorSet>();

        let mut app = TestApp::new();
        app.init_chain(RequestInitChain {
            time: GENESIS_TIME,
            chain_id: chain_id.to_string(),
            consensus_params: Some(ConsensusParams::default()),
            validators: validators
                .iter()
                .map(|v| ValidatorUpdate { pub_key: v.pub_key.clone(), power: v.voting_power })
                .collect(),
            app_state_bytes: Bytes::new(),
            initial_height: 1,
        })?;

        Ok(Self {
            app,
            chain_id: chain_id.to_string(),
            validators,
            blocks: Vec::new(),
            commits: Vec::new(),
            last_results: Vec::new(),
        })
    }

    /// Returns the height of the latest block.
    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// Returns the chain id.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Returns the full application.
    pub const fn app(&self) -> &TestApp {
        &self.app
    }

    /// Returns the validator set. It signs every block.
    pub const fn validator_set(&self) -> &ValidatorSet {
        &self.validators
    }

    /// Returns the block at `height`.
    pub fn block(&self, height: u64) -> Option<&Block> {
        self.index(height).ok().map(|i| &self.blocks[i].0)
    }

    /// Returns the id of the block at `height`.
    pub fn block_id(&self, height: u64) -> Option<BlockId> {
        self.index(height).ok().map(|i| self.blocks[i].1)
    }

    /// Returns the header and commit of the block at `height`.
    pub fn signed_header(&self, height: u64) -> Option<&SignedHeader> {
        self.index(height).ok().map(|i| &self.commits[i])
    }

    /// Returns the app hash after executing the block at `height`.
    pub fn app_hash(&self, height: u64) -> Option<B256> {
        self.app.app_hash_at(height)
    }

    /// Returns a trust anchor for the block at `height`.
    pub fn anchor(&self, height: u64) -> Option<TrustAnchor> {
        self.block_id(height).map(|id| TrustAnchor::new(height, id.hash))
    }

    /// Builds the next block out of `txs`, executes it on the application and commits it.
    ///
    /// ## Returns
    /// - `Ok(Vec<ResponseDeliverTx>)` - One result per transaction. Rejected transactions are
    ///   included in the block.
    /// - `Err(_)` - The application failed.
    pub fn produce_block(&mut self, txs: Vec<Bytes>) -> TestAppResult<Vec<ResponseDeliverTx>> {
        let height = self.height() + 1;
        let (last_block_id, last_commit) = match self.commits.last() {
            Some(signed) => (signed.commit.block_id, signed.commit.clone()),
            None => (BlockId::default(), Commit::default()),
        };

        let header = Header {
            chain_id: self.chain_id.clone(),
            height,
            time: GENESIS_TIME + height,
            last_block_id,
            last_commit_hash: last_commit.hash(),
            data_hash: Block::data_hash(&txs),
            validators_hash: self.validators.hash(),
            next_validators_hash: self.validators.hash(),
            consensus_hash: ConsensusParams::default().hash(),
            app_hash: self.app.app_hash(),
            last_results_hash: results_hash(&self.last_results),
            evidence_hash: Block::evidence_hash(&[]),
            proposer_address: self.proposer(height),
        };
        let block = Block { header, txs, evidence: Vec::new(), last_commit };

        self.app.begin_block(RequestBeginBlock {
            hash: block.hash(),
            header: block.header.clone(),
            last_commit_info: last_commit_info(&block, self.validators.validators(), 1),
            byzantine_validators: Vec::new(),
        })?;
        let mut results = Vec::with_capacity(block.txs.len());
        for tx in &block.txs {
            results.push(self.app.deliver_tx(RequestDeliverTx { tx: tx.clone() })?);
        }
        self.app.end_block(RequestEndBlock { height })?;
        let app_hash = self.app.commit()?.data;

        let block_id = block.block_id(BLOCK_PART_SIZE_BYTES);
        let signatures = self.sign(height, &block_id);
        let commit = Commit { height, round: 0, block_id, signatures };
        debug!(
            target: "testapp",
            "Produced block {height} ({}) with app hash {app_hash}",
            block_id.hash
        );

        self.commits.push(SignedHeader { header: block.header.clone(), commit });
        self.blocks.push((block, block_id));
        self.last_results = results.clone();
        Ok(results)
    }

    fn proposer(&self, height: u64) -> Address {
        let validators = self.validators.validators();
        if validators.is_empty() {
            return Address::ZERO;
        }
        validators[height as usize % validators.len()].address
    }

    fn sign(&self, height: u64, block_id: &BlockId) -> Vec<CommitSig> {
        self.validators
            .iter()
            .enumerate()
            .map(|(i, validator)| {
                if (height as usize + i) % ABSENT_EVERY == 0 {
                    return CommitSig::absent();
                }
                let digest =
                    keccak256([block_id.hash.as_slice(), validator.address.as_slice()].concat());
                CommitSig {
                    block_id_flag: BlockIdFlag::Commit,
                    validator_address: validator.address,
                    timestamp: GENESIS_TIME + height,
                    signature: [digest.as_slice(), digest.as_slice()].concat().into(),
                }
            })
            .collect()
    }

    fn index(&self, height: u64) -> SourceResult<usize> {
        if height == 0 || height > self.height() {
            return Err(SourceError::NotFound(format!(
                "height {height} is not available, latest is {}",
                self.height()
            )));
        }
        Ok(height as usize - 1)
    }
}

impl DataSource for TestChain {
    fn block(&self, height: u64) -> SourceResult<ResultBlock> {
        let (block, block_id) = &self.blocks[self.index(height)?];
        Ok(ResultBlock { block_id: *block_id, block: block.clone() })
    }

    fn commit(&self, height: u64) -> SourceResult<ResultCommit> {
        let signed_header = self.commits[self.index(height)?].clone();
        Ok(ResultCommit { signed_header, canonical: true })
    }

    fn validators(
        &self,
        height: u64,
        page: usize,
        per_page: usize,
    ) -> SourceResult<ResultValidators> {
        self.index(height)?;
        if page == 0 || per_page == 0 {
            return Err(SourceError::Rpc {
                code: -32603,
                message: format!("invalid page {page} of size {per_page}"),
            });
        }

        let all = self.validators.validators();
        let validators =
            all.iter().skip((page - 1) * per_page).take(per_page).cloned().collect::<Vec<_>>();
        Ok(ResultValidators {
            block_height: height,
            count: validators.len(),
            total: all.len(),
            validators,
        })
    }

    fn abci_query(
        &self,
        path: &str,
        data: &[u8],
        height: u64,
        prove: bool,
    ) -> SourceResult<ResultAbciQuery> {
        let response = self.app.query(RequestQuery {
            data: Bytes::copy_from_slice(data),
            path: path.to_string(),
            height,
            prove,
        });
        Ok(ResultAbciQuery { response })
    }
}
