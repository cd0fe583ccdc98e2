//! Contains the [StatelessBlockExecutor], which replays a single block against a stateless
//! application instance.

use crate::{Application, ExecutorError, ExecutorResult, StatelessApplication};
use alloy_primitives::{B256, Bytes};
use keel_oracle::Oracle;
use keel_primitives::{
    Block, Evidence, Validator,
    abci::{
        LastCommitInfo, RequestBeginBlock, RequestDeliverTx, RequestEndBlock, RequestInitChain,
        ResponseBeginBlock, ResponseCommit, ResponseDeliverTx, ResponseEndBlock, ValidatorInfo,
        ValidatorUpdate, VoteInfo,
    },
};
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt, sync::Arc};
use tracing::{debug, info, trace, warn};

/// Configuration of the [StatelessBlockExecutor].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// The height of the chain's first block.
    pub initial_height: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { initial_height: 1 }
    }
}

/// The responses of every lifecycle call made while replaying a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// The response to `begin_block`.
    pub begin_block: ResponseBeginBlock,
    /// One response per transaction, in block order.
    pub deliver_txs: Vec<ResponseDeliverTx>,
    /// The response to `end_block`.
    pub end_block: ResponseEndBlock,
    /// The response to `commit`.
    pub commit: ResponseCommit,
}

/// Replays blocks against stateless instances of an application, with every read of prior
/// state served by an [Oracle].
pub struct StatelessBlockExecutor<A> {
    app: A,
    oracle: Arc<dyn Oracle + Send + Sync>,
    config: ExecutorConfig,
}

impl<A: fmt::Debug> fmt::Debug for StatelessBlockExecutor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatelessBlockExecutor")
            .field("app", &self.app)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<A: StatelessApplication> StatelessBlockExecutor<A> {
    /// Creates a new [StatelessBlockExecutor].
    pub fn new(app: A, oracle: Arc<dyn Oracle + Send + Sync>, config: ExecutorConfig) -> Self {
        Self { app, oracle, config }
    }

    /// Replays `block` and returns the resulting application hash.
    ///
    /// ## Takes
    /// - `block` - The block to replay.
    /// - `validators` - The validator set that signed `block.last_commit`, in set order. When
    ///   non-empty, it is passed to the application through `init_chain`.
    ///
    /// ## Returns
    /// - `Ok((B256, ExecutionLog))` - The application hash from `commit`, and every response.
    /// - `Err(ExecutorError)` - The block cannot be replayed, or the application failed.
    ///
    /// ## Panics
    /// Above the initial height, if the number of signatures in the block's last commit differs
    /// from the number of validators.
    pub fn execute(
        &self,
        block: &Block,
        validators: &[Validator],
    ) -> ExecutorResult<(B256, ExecutionLog)> {
        let height = block.header.height;
        if height <= self.config.initial_height {
            return Err(ExecutorError::GenesisBlock {
                height,
                initial_height: self.config.initial_height,
            });
        }
        info!(
            target: "executor",
            "Replaying block {height} with {} transactions",
            block.txs.len()
        );

        let mut app = self
            .app
            .stateless(height, self.oracle.clone())
            .map_err(|e| ExecutorError::Rehydration { version: height, source: Box::new(e) })?;

        // Consensus parameters and application state are read through the oracle on demand.
        if !validators.is_empty() {
            debug!(target: "executor", "init_chain with {} validators", validators.len());
            app.init_chain(RequestInitChain {
                time: block.header.time,
                chain_id: block.header.chain_id.clone(),
                consensus_params: None,
                validators: validators
                    .iter()
                    .map(|v| ValidatorUpdate { pub_key: v.pub_key.clone(), power: v.voting_power })
                    .collect(),
                app_state_bytes: Bytes::new(),
                initial_height: height,
            })
            .map_err(application("init_chain"))?;
        }

        debug!(target: "executor", "begin_block {height}");
        let begin_block = app
            .begin_block(RequestBeginBlock {
                hash: block.hash(),
                header: block.header.clone(),
                last_commit_info: last_commit_info(block, validators, self.config.initial_height),
                byzantine_validators: block.evidence.iter().flat_map(Evidence::abci).collect(),
            })
            .map_err(application("begin_block"))?;

        let mut deliver_txs = Vec::with_capacity(block.txs.len());
        for (index, tx) in block.txs.iter().enumerate() {
            let response = app
                .deliver_tx(RequestDeliverTx { tx: tx.clone() })
                .map_err(application("deliver_tx"))?;
            if response.is_ok() {
                trace!(target: "executor", "Transaction {index} applied");
            } else {
                warn!(
                    target: "executor",
                    "Transaction {index} rejected with code {}: {}",
                    response.code,
                    response.log
                );
            }
            deliver_txs.push(response);
        }

        debug!(target: "executor", "end_block {height}");
        let end_block =
            app.end_block(RequestEndBlock { height }).map_err(application("end_block"))?;
        let commit = app.commit().map_err(application("commit"))?;

        info!(target: "executor", "Replayed block {height}, app hash {}", commit.data);
        Ok((commit.data, ExecutionLog { begin_block, deliver_txs, end_block, commit }))
    }
}

/// Maps an application error raised in `phase` into an [ExecutorError].
fn application<E: Error + Send + Sync + 'static>(
    phase: &'static str,
) -> impl FnOnce(E) -> ExecutorError {
    move |e| ExecutorError::Application { phase, source: Box::new(e) }
}

/// Derives the vote information of a block's last commit.
///
/// At the initial height there is no previous commit to report on, and the vote list is empty.
/// Above it, validator `i` signed the last block unless signature `i` of the commit is absent.
///
/// ## Panics
/// Above the initial height, if the number of signatures differs from the number of validators.
/// The two come from the same consensus round and cannot disagree on a valid chain.
pub fn last_commit_info(
    block: &Block,
    validators: &[Validator],
    initial_height: u64,
) -> LastCommitInfo {
    let round = block.last_commit.round;
    if block.header.height <= initial_height {
        return LastCommitInfo { round, votes: Vec::new() };
    }

    let signatures = &block.last_commit.signatures;
    if signatures.len() != validators.len() {
        panic!(
            "commit size ({}) doesn't match validator set size ({}) at height {}",
            signatures.len(),
            validators.len(),
            block.header.height
        );
    }

    let votes = validators
        .iter()
        .zip(signatures)
        .map(|(validator, sig)| VoteInfo {
            validator: ValidatorInfo {
                address: validator.address,
                power: validator.voting_power,
            },
            signed_last_block: !sig.is_absent(),
        })
        .collect();
    LastCommitInfo { round, votes }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::keccak256;
    use keel_oracle::{OracleError, OracleResult, QueryKey};
    use keel_primitives::{
        BlockIdFlag, Commit, CommitSig, MisbehaviorKind,
        abci::{CODE_TYPE_OK, ResponseInitChain},
    };
    use std::sync::Mutex;
    use thiserror::Error;

    #[derive(Debug)]
    struct NoopOracle;

    impl Oracle for NoopOracle {
        fn get(&self, key: &QueryKey) -> OracleResult<Bytes> {
            Err(OracleError::UnsupportedQuery(key.to_string()))
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        InitChain(RequestInitChain),
        BeginBlock(RequestBeginBlock),
        DeliverTx(Bytes),
        EndBlock(u64),
        Commit,
    }

    #[derive(Debug, Error)]
    #[error("{0}")]
    struct MockError(&'static str);

    #[derive(Debug, Default)]
    struct MockApp {
        calls: Arc<Mutex<Vec<Call>>>,
        versions: Mutex<Vec<u64>>,
        fail_rehydration: bool,
        fail_commit: bool,
    }

    #[derive(Debug)]
    struct MockInstance {
        calls: Arc<Mutex<Vec<Call>>>,
        applied: Vec<u8>,
        fail_commit: bool,
    }

    impl StatelessApplication for MockApp {
        type Instance = MockInstance;
        type Error = MockError;

        fn stateless(
            &self,
            version: u64,
            _: Arc<dyn Oracle + Send + Sync>,
        ) -> Result<Self::Instance, Self::Error> {
            if self.fail_rehydration {
                return Err(MockError("version pruned"));
            }
            self.versions.lock().unwrap().push(version);
            Ok(MockInstance {
                calls: self.calls.clone(),
                applied: Vec::new(),
                fail_commit: self.fail_commit,
            })
        }
    }

    impl MockInstance {
        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl Application for MockInstance {
        type Error = MockError;

        fn init_chain(
            &mut self,
            request: RequestInitChain,
        ) -> Result<ResponseInitChain, Self::Error> {
            self.record(Call::InitChain(request));
            Ok(ResponseInitChain::default())
        }

        fn begin_block(
            &mut self,
            request: RequestBeginBlock,
        ) -> Result<ResponseBeginBlock, Self::Error> {
            self.record(Call::BeginBlock(request));
            Ok(ResponseBeginBlock::default())
        }

        fn deliver_tx(
            &mut self,
            request: RequestDeliverTx,
        ) -> Result<ResponseDeliverTx, Self::Error> {
            self.record(Call::DeliverTx(request.tx.clone()));
            if request.tx.as_ref() == b"bad" {
                return Ok(ResponseDeliverTx {
                    code: 1,
                    log: "rejected".into(),
                    ..Default::default()
                });
            }
            self.applied.extend_from_slice(&request.tx);
            Ok(ResponseDeliverTx { data: request.tx, ..Default::default() })
        }

        fn end_block(&mut self, request: RequestEndBlock) -> Result<ResponseEndBlock, Self::Error> {
            self.record(Call::EndBlock(request.height));
            Ok(ResponseEndBlock::default())
        }

        fn commit(&mut self) -> Result<ResponseCommit, Self::Error> {
            self.record(Call::Commit);
            if self.fail_commit {
                return Err(MockError("disk full"));
            }
            Ok(ResponseCommit { data: keccak256(&self.applied), retain_height: 0 })
        }
    }

    fn validators(count: u8) -> Vec<Validator> {
        (0..count).map(|i| Validator::new(Bytes::from(vec![i; 32]), 10 + i as u64)).collect()
    }

    fn block(height: u64, txs: &[&'static [u8]], validators: &[Validator]) -> Block {
        let signatures = validators
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if i % 3 == 2 {
                    CommitSig::absent()
                } else {
                    CommitSig {
                        block_id_flag: BlockIdFlag::Commit,
                        validator_address: v.address,
                        timestamp: 41,
                        signature: Bytes::from_static(&[0xaa; 64]),
                    }
                }
            })
            .collect();
        let mut block = Block::default();
        block.header.height = height;
        block.header.time = 42;
        block.header.chain_id = "keel-test".into();
        block.txs = txs.iter().map(|tx| Bytes::from_static(tx)).collect();
        block.last_commit =
            Commit { height: height - 1, round: 2, signatures, ..Default::default() };
        block
    }

    fn executor(app: MockApp) -> StatelessBlockExecutor<MockApp> {
        StatelessBlockExecutor::new(app, Arc::new(NoopOracle), ExecutorConfig::default())
    }

    #[test]
    fn test_lifecycle_transcript() {
        let vals = validators(4);
        let block = block(7, &[b"a", b"b"], &vals);
        let executor = executor(MockApp::default());

        let (app_hash, log) = executor.execute(&block, &vals).unwrap();
        assert_eq!(app_hash, keccak256(b"ab"));
        assert_eq!(log.commit.data, app_hash);
        assert_eq!(*executor.app.versions.lock().unwrap(), vec![7]);

        let calls = executor.app.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 6);

        let Call::InitChain(init) = &calls[0] else { panic!("expected init_chain, got {calls:?}") };
        assert_eq!(init.chain_id, "keel-test");
        assert_eq!(init.time, 42);
        assert_eq!(init.initial_height, 7);
        assert_eq!(init.consensus_params, None);
        assert!(init.app_state_bytes.is_empty());
        assert_eq!(init.validators.len(), 4);
        assert_eq!(init.validators[3].power, 13);
        assert_eq!(init.validators[3].pub_key, vals[3].pub_key);

        let Call::BeginBlock(begin) = &calls[1] else { panic!("expected begin_block") };
        assert_eq!(begin.hash, block.hash());
        assert_eq!(begin.header, block.header);
        assert_eq!(begin.last_commit_info.round, 2);
        assert_eq!(
            begin.last_commit_info.votes.iter().map(|v| v.signed_last_block).collect::<Vec<_>>(),
            vec![true, true, false, true]
        );

        assert_eq!(calls[2], Call::DeliverTx(Bytes::from_static(b"a")));
        assert_eq!(calls[3], Call::DeliverTx(Bytes::from_static(b"b")));
        assert_eq!(calls[4], Call::EndBlock(7));
        assert_eq!(calls[5], Call::Commit);
    }

    #[test]
    fn test_no_init_chain_without_validators() {
        let block = block(3, &[b"a"], &[]);
        let executor = executor(MockApp::default());
        executor.execute(&block, &[]).unwrap();

        let calls = executor.app.calls.lock().unwrap();
        assert!(matches!(calls[0], Call::BeginBlock(_)));
        assert!(!calls.iter().any(|c| matches!(c, Call::InitChain(_))));
    }

    #[test]
    fn test_rejected_transaction_is_isolated() {
        let vals = validators(2);
        let block = block(9, &[b"x", b"bad", b"y"], &vals);
        let executor = executor(MockApp::default());

        let (app_hash, log) = executor.execute(&block, &vals).unwrap();
        assert_eq!(log.deliver_txs.len(), 3);
        assert_eq!(
            log.deliver_txs.iter().map(|r| r.code).collect::<Vec<_>>(),
            vec![CODE_TYPE_OK, 1, CODE_TYPE_OK]
        );
        assert_eq!(log.deliver_txs[2].data.as_ref(), b"y");
        assert_eq!(app_hash, keccak256(b"xy"));

        let calls = executor.app.calls.lock().unwrap();
        assert_eq!(calls[calls.len() - 2], Call::EndBlock(9));
        assert_eq!(calls[calls.len() - 1], Call::Commit);
    }

    #[test]
    fn test_deterministic() {
        let vals = validators(5);
        let block = block(12, &[b"one", b"two", b"three"], &vals);
        let first = executor(MockApp::default()).execute(&block, &vals).unwrap();
        let second = executor(MockApp::default()).execute(&block, &vals).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_evidence_forwarded() {
        let vals = validators(3);
        let mut block = block(4, &[], &vals);
        block.evidence.push(Evidence {
            kind: MisbehaviorKind::DuplicateVote,
            height: 2,
            time: 20,
            byzantine_validators: vals[..2].to_vec(),
            total_voting_power: 33,
        });
        let executor = executor(MockApp::default());
        executor.execute(&block, &vals).unwrap();

        let calls = executor.app.calls.lock().unwrap();
        let Call::BeginBlock(begin) = &calls[1] else { panic!("expected begin_block") };
        assert_eq!(begin.byzantine_validators.len(), 2);
        assert_eq!(begin.byzantine_validators[1].validator.address, vals[1].address);
    }

    #[test]
    fn test_genesis_block_rejected() {
        let executor = executor(MockApp::default());
        let mut block = Block::default();
        block.header.height = 1;
        let err = executor.execute(&block, &[]).unwrap_err();
        assert!(matches!(err, ExecutorError::GenesisBlock { height: 1, initial_height: 1 }));
        assert!(executor.app.versions.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rehydration_failure_surfaced() {
        let executor = executor(MockApp { fail_rehydration: true, ..Default::default() });
        let err = executor.execute(&block(5, &[b"a"], &[]), &[]).unwrap_err();
        assert!(matches!(err, ExecutorError::Rehydration { version: 5, .. }));
        assert_eq!(
            err.to_string(),
            "Failed to rehydrate the application at version 5: version pruned"
        );
        assert!(executor.app.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_application_failure_surfaced() {
        let executor = executor(MockApp { fail_commit: true, ..Default::default() });
        let err = executor.execute(&block(5, &[b"a"], &[]), &[]).unwrap_err();
        assert!(matches!(err, ExecutorError::Application { phase: "commit", .. }));
    }

    #[test]
    #[should_panic(expected = "commit size (4) doesn't match validator set size (3)")]
    fn test_commit_size_mismatch_panics() {
        let vals = validators(4);
        let block = block(6, &[], &vals);
        let _ = executor(MockApp::default()).execute(&block, &vals[..3]);
    }

    #[test]
    fn test_last_commit_info_at_initial_height() {
        let vals = validators(3);
        let mut block = block(10, &[], &vals);
        block.header.height = 1;
        let info = last_commit_info(&block, &[], 1);
        assert_eq!(info, LastCommitInfo { round: 2, votes: Vec::new() });

        block.header.height = 10;
        let info = last_commit_info(&block, &vals, 10);
        assert!(info.votes.is_empty());
    }
}
