//! Contains the full [TestApp] and its [StatelessTestApp] mode.

use crate::{OracleTrieProvider, TestAppError, codes, machine::Machine};
use alloy_primitives::{B256, Bytes, keccak256};
use alloy_trie::{EMPTY_ROOT_HASH, Nibbles};
use keel_executor::{Application, StatelessApplication};
use keel_mpt::{MemoryTrieProvider, TrieNode, generate_proof};
use keel_oracle::{Oracle, OracleClient, Queryable};
use keel_primitives::abci::{
    RequestBeginBlock, RequestDeliverTx, RequestEndBlock, RequestInitChain, RequestQuery,
    ResponseBeginBlock, ResponseCommit, ResponseDeliverTx, ResponseEndBlock, ResponseInitChain,
    ResponseQuery,
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info};

/// The query path serving a value and its proof.
pub const KEY_QUERY_PATH: &str = "/store/main/key";

/// The query path serving a trie node preimage by hash.
pub const NODE_QUERY_PATH: &str = "/store/main/node";

/// The full key/value application.
///
/// Every committed trie node is kept content addressed, and the root of each version is kept,
/// so the state of any committed version can be queried and proven.
#[derive(Debug, Clone)]
pub struct TestApp {
    machine: Machine<MemoryTrieProvider>,
    versions: BTreeMap<u64, B256>,
    chain_id: String,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Creates an application with an empty state at version 0.
    pub fn new() -> Self {
        Self {
            machine: Machine::new(EMPTY_ROOT_HASH, MemoryTrieProvider::default()),
            versions: BTreeMap::from([(0, EMPTY_ROOT_HASH)]),
            chain_id: String::new(),
        }
    }

    /// Returns the chain id set by `init_chain`.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Returns the latest committed version.
    pub fn version(&self) -> u64 {
        self.versions.last_key_value().map(|(v, _)| *v).unwrap_or_default()
    }

    /// Returns the app hash of the latest committed version.
    pub fn app_hash(&self) -> B256 {
        self.app_hash_at(self.version()).unwrap_or(EMPTY_ROOT_HASH)
    }

    /// Returns the app hash of `version`, if it was committed.
    pub fn app_hash_at(&self, version: u64) -> Option<B256> {
        self.versions.get(&version).copied()
    }

    /// Returns the number of stored trie nodes.
    pub fn node_count(&self) -> usize {
        self.machine.provider.len()
    }

    fn query_key(&self, key: &[u8], height: u64, prove: bool) -> ResponseQuery {
        let Some(root) = self.app_hash_at(height) else {
            return failure(codes::UNKNOWN_VERSION, format!("unknown version {height}"), height);
        };
        let path = Nibbles::unpack(keccak256(key));
        let provider = &self.machine.provider;

        let value = match TrieNode::new_blinded(root).open(&path, provider) {
            Ok(value) => value.cloned().unwrap_or_default(),
            Err(e) => return failure(codes::INTERNAL, e.to_string(), height),
        };
        let proof_ops = if prove {
            match generate_proof(&TrieNode::new_blinded(root), &path, provider) {
                Ok(proof) => proof,
                Err(e) => return failure(codes::INTERNAL, e.to_string(), height),
            }
        } else {
            Vec::new()
        };

        ResponseQuery {
            key: Bytes::copy_from_slice(key),
            value,
            proof_ops,
            height,
            ..Default::default()
        }
    }

    fn query_node(&self, data: &[u8], height: u64) -> ResponseQuery {
        if data.len() != B256::ZERO.len() {
            let log = format!("invalid node hash length {}", data.len());
            return failure(codes::INVALID_QUERY, log, height);
        }
        let hash = B256::from_slice(data);
        match self.machine.provider.preimage(&hash) {
            Some(preimage) => ResponseQuery {
                key: Bytes::copy_from_slice(data),
                value: preimage.clone(),
                height,
                ..Default::default()
            },
            None => failure(codes::UNKNOWN_NODE, format!("unknown trie node {hash}"), height),
        }
    }
}

fn failure(code: u32, log: String, height: u64) -> ResponseQuery {
    ResponseQuery { code, log, height, ..Default::default() }
}

impl Application for TestApp {
    type Error = TestAppError;

    fn init_chain(&mut self, request: RequestInitChain) -> Result<ResponseInitChain, Self::Error> {
        info!(
            target: "testapp",
            "Initializing chain {} with {} validators",
            request.chain_id,
            request.validators.len()
        );
        self.chain_id = request.chain_id;
        Ok(ResponseInitChain { app_hash: self.machine.app_hash(), ..Default::default() })
    }

    fn begin_block(
        &mut self,
        request: RequestBeginBlock,
    ) -> Result<ResponseBeginBlock, Self::Error> {
        self.machine.begin_block(&request)
    }

    fn deliver_tx(&mut self, request: RequestDeliverTx) -> Result<ResponseDeliverTx, Self::Error> {
        self.machine.deliver_tx(&request.tx)
    }

    fn end_block(&mut self, _: RequestEndBlock) -> Result<ResponseEndBlock, Self::Error> {
        Ok(ResponseEndBlock::default())
    }

    fn commit(&mut self) -> Result<ResponseCommit, Self::Error> {
        let machine = &mut self.machine;
        let app_hash = machine.app_hash();
        for (_, preimage) in machine.root.preimages() {
            machine.provider.insert(preimage);
        }
        machine.root = TrieNode::new_blinded(app_hash);
        self.versions.insert(machine.height, app_hash);

        debug!(
            target: "testapp",
            "Committed version {} with app hash {app_hash}",
            machine.height
        );
        Ok(ResponseCommit { data: app_hash, retain_height: 0 })
    }
}

impl Queryable for TestApp {
    fn query(&self, request: RequestQuery) -> ResponseQuery {
        let height = if request.height == 0 { self.version() } else { request.height };
        match request.path.as_str() {
            KEY_QUERY_PATH => self.query_key(&request.data, height, request.prove),
            NODE_QUERY_PATH => self.query_node(&request.data, height),
            path => failure(codes::UNKNOWN_PATH, format!("unknown query path {path}"), height),
        }
    }
}

impl StatelessApplication for TestApp {
    type Instance = StatelessTestApp;
    type Error = TestAppError;

    fn stateless(
        &self,
        version: u64,
        oracle: Arc<dyn Oracle + Send + Sync>,
    ) -> Result<Self::Instance, Self::Error> {
        let client = OracleClient::new(oracle);
        let header = client.block()?.block.header;
        if header.height != version {
            return Err(TestAppError::VersionMismatch { expected: version, got: header.height });
        }

        debug!(
            target: "testapp",
            "Rehydrated at version {version} on state root {}",
            header.app_hash
        );
        Ok(StatelessTestApp {
            machine: Machine::new(header.app_hash, OracleTrieProvider::new(client)),
            version,
        })
    }
}

/// The test application rehydrated at a single version. Prior state is read through an
/// [Oracle] and nothing is persisted.
#[derive(Debug)]
pub struct StatelessTestApp {
    machine: Machine<OracleTrieProvider>,
    version: u64,
}

impl StatelessTestApp {
    /// Returns the version the application was rehydrated at.
    pub const fn version(&self) -> u64 {
        self.version
    }
}

impl Application for StatelessTestApp {
    type Error = TestAppError;

    fn init_chain(&mut self, _: RequestInitChain) -> Result<ResponseInitChain, Self::Error> {
        Ok(ResponseInitChain { app_hash: self.machine.app_hash(), ..Default::default() })
    }

    fn begin_block(
        &mut self,
        request: RequestBeginBlock,
    ) -> Result<ResponseBeginBlock, Self::Error> {
        if request.header.height != self.version {
            return Err(TestAppError::VersionMismatch {
                expected: self.version,
                got: request.header.height,
            });
        }
        self.machine.begin_block(&request)
    }

    fn deliver_tx(&mut self, request: RequestDeliverTx) -> Result<ResponseDeliverTx, Self::Error> {
        self.machine.deliver_tx(&request.tx)
    }

    fn end_block(&mut self, _: RequestEndBlock) -> Result<ResponseEndBlock, Self::Error> {
        Ok(ResponseEndBlock::default())
    }

    fn commit(&mut self) -> Result<ResponseCommit, Self::Error> {
        let app_hash = self.machine.app_hash();
        debug!(target: "testapp", "Stateless commit of version {} at {app_hash}", self.version);
        Ok(ResponseCommit { data: app_hash, retain_height: 0 })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Tx;
    use keel_mpt::verify_proof;
    use keel_oracle::{LocalOracle, OracleResult, QueryKey};
    use keel_primitives::{Block, ValidatorSet};

    /// Commits one block of transactions on top of the app's latest version.
    fn commit_block(app: &mut TestApp, txs: &[Tx]) -> B256 {
        let mut request = RequestBeginBlock::default();
        request.header.height = app.version() + 1;
        request.header.app_hash = app.app_hash();
        app.begin_block(request).unwrap();
        for tx in txs {
            assert!(app.deliver_tx(RequestDeliverTx { tx: tx.encoded() }).unwrap().is_ok());
        }
        app.end_block(RequestEndBlock::default()).unwrap();
        app.commit().unwrap().data
    }

    fn populated() -> TestApp {
        let mut app = TestApp::new();
        let txs = (0..32u8).map(|i| Tx::set(vec![i], vec![i; 10])).collect::<Vec<_>>();
        commit_block(&mut app, &txs);
        commit_block(&mut app, &[Tx::remove(vec![3u8]), Tx::set(vec![4u8], vec![0xff; 10])]);
        app
    }

    #[test]
    fn test_versions() {
        let app = populated();
        assert_eq!(app.version(), 2);
        assert_eq!(app.app_hash_at(0), Some(EMPTY_ROOT_HASH));
        assert_ne!(app.app_hash_at(1), app.app_hash_at(2));
        assert_eq!(app.app_hash(), app.app_hash_at(2).unwrap());
        assert!(app.node_count() > 0);
    }

    #[test]
    fn test_key_query_with_proof() {
        let app = populated();
        for (version, key, expected) in [
            (1, 3u8, Some(vec![3u8; 10])),
            (2, 3, None),
            (1, 4, Some(vec![4; 10])),
            (2, 4, Some(vec![0xff; 10])),
        ] {
            let response = app.query(RequestQuery {
                data: Bytes::from(vec![key]),
                path: KEY_QUERY_PATH.to_string(),
                height: version,
                prove: true,
            });
            assert!(response.is_ok(), "{}", response.log);
            assert_eq!(response.value, expected.clone().map(Bytes::from).unwrap_or_default());
            verify_proof(
                app.app_hash_at(version).unwrap(),
                &Nibbles::unpack(keccak256([key])),
                expected.as_deref(),
                &response.proof_ops,
            )
            .unwrap();
        }
    }

    #[test]
    fn test_query_failures() {
        let app = populated();
        let query = |path: &str, data: Vec<u8>, height| {
            let path = path.to_string();
            app.query(RequestQuery { data: data.into(), path, height, prove: false })
        };
        assert_eq!(query(KEY_QUERY_PATH, vec![1], 9).code, codes::UNKNOWN_VERSION);
        assert_eq!(query(NODE_QUERY_PATH, vec![1, 2], 0).code, codes::INVALID_QUERY);
        assert_eq!(query(NODE_QUERY_PATH, vec![0; 32], 0).code, codes::UNKNOWN_NODE);
        assert_eq!(query("/store/other", vec![], 0).code, codes::UNKNOWN_PATH);
    }

    #[test]
    fn test_node_query() {
        let app = populated();
        let root = app.app_hash();
        let response = app.query(RequestQuery {
            data: Bytes::copy_from_slice(root.as_slice()),
            path: NODE_QUERY_PATH.to_string(),
            ..Default::default()
        });
        assert!(response.is_ok());
        assert_eq!(keccak256(&response.value), root);
        assert_eq!(response.height, 2);
    }

    fn local_oracle(app: &TestApp, height: u64) -> Arc<dyn Oracle + Send + Sync> {
        let mut block = Block::default();
        block.header.height = height;
        block.header.app_hash = app.app_hash_at(height - 1).unwrap();
        Arc::new(LocalOracle::new(Arc::new(app.clone()), block, ValidatorSet::default()))
    }

    #[test]
    fn test_stateless_matches_full() {
        let mut full = populated();
        let oracle = local_oracle(&full, 3);

        let txs = [
            Tx::set(vec![7u8], vec![1u8; 10]),
            Tx::remove(vec![8u8]),
            Tx::remove(vec![200u8]),
            Tx::get(vec![9u8]),
            Tx::set(vec![100u8], vec![2u8; 10]),
        ];
        let mut stateless = full.stateless(3, oracle).unwrap();
        assert_eq!(stateless.version(), 3);

        let mut request = RequestBeginBlock::default();
        request.header.height = 3;
        request.header.app_hash = full.app_hash();
        stateless.begin_block(request).unwrap();
        let mut results = Vec::new();
        for tx in &txs {
            results.push(stateless.deliver_tx(RequestDeliverTx { tx: tx.encoded() }).unwrap());
        }
        let stateless_hash = stateless.commit().unwrap().data;

        assert_eq!(results[3].data.as_ref(), &[9u8; 10]);
        assert_eq!(stateless_hash, commit_block(&mut full, &txs));
    }

    #[test]
    fn test_stateless_version_mismatch() {
        let app = populated();
        let err = app.stateless(5, local_oracle(&app, 3)).unwrap_err();
        assert!(matches!(err, TestAppError::VersionMismatch { expected: 5, got: 3 }));
    }

    /// Serves the genuine block, but a forged preimage for every node.
    struct ForgingOracle(Arc<dyn Oracle + Send + Sync>);

    impl Oracle for ForgingOracle {
        fn get(&self, key: &QueryKey) -> OracleResult<Bytes> {
            if key.param("path") == Some(NODE_QUERY_PATH) {
                let forged =
                    ResponseQuery { value: Bytes::from_static(&[0xc0]), ..Default::default() };
                let result = keel_primitives::ResultAbciQuery { response: forged };
                return Ok(serde_json::to_vec(&result).unwrap().into());
            }
            self.0.get(key)
        }
    }

    #[test]
    fn test_forged_node_rejected() {
        let app = populated();
        let oracle = Arc::new(ForgingOracle(local_oracle(&app, 3)));
        let mut stateless = app.stateless(3, oracle).unwrap();

        let mut request = RequestBeginBlock::default();
        request.header.height = 3;
        request.header.app_hash = app.app_hash();
        stateless.begin_block(request).unwrap();

        let err = stateless.deliver_tx(RequestDeliverTx { tx: Tx::get(vec![1u8]).encoded() });
        let Err(TestAppError::Trie(e)) = err else { panic!("expected a trie error, got {err:?}") };
        assert!(e.to_string().contains("preimage mismatch"), "{e}");
    }
}
