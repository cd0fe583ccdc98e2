//! Contains the [OracleTrieProvider], which opens blinded trie nodes through an oracle.

use crate::{NODE_QUERY_PATH, TestAppError};
use alloy_primitives::{B256, keccak256};
use alloy_rlp::Decodable;
use keel_mpt::{TrieNode, TrieProvider};
use keel_oracle::OracleClient;
use tracing::trace;

/// A [TrieProvider] that fetches node preimages with `/store/main/node` queries.
///
/// Preimages are content addressed, so every served node is checked against the requested
/// commitment before it is decoded.
#[derive(Debug, Clone)]
pub struct OracleTrieProvider {
    client: OracleClient,
}

impl OracleTrieProvider {
    /// Creates a new [OracleTrieProvider].
    pub const fn new(client: OracleClient) -> Self {
        Self { client }
    }
}

impl TrieProvider for OracleTrieProvider {
    type Error = TestAppError;

    fn trie_node_by_hash(&self, key: B256) -> Result<TrieNode, Self::Error> {
        trace!(target: "testapp", "Fetching trie node {key}");
        let response = self.client.abci_query(NODE_QUERY_PATH, key.as_slice())?;
        if !response.is_ok() || response.value.is_empty() {
            return Err(TestAppError::MissingNode { hash: key, log: response.log });
        }

        let computed = keccak256(&response.value);
        if computed != key {
            return Err(TestAppError::NodeHashMismatch { expected: key, computed });
        }
        TrieNode::decode(&mut response.value.as_ref()).map_err(|e| TestAppError::NodeDecode(key, e))
    }
}
