//! An in-memory [TrieProvider] backed by a map of node preimages.

use crate::{TrieNode, TrieProvider};
use alloc::collections::BTreeMap;
use alloy_primitives::{B256, Bytes, keccak256};
use alloy_rlp::Decodable;
use thiserror::Error;

/// An error returned by the [MemoryTrieProvider].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryProviderError {
    /// The preimage of the requested commitment is not known.
    #[error("Missing preimage for trie node {0}")]
    MissingPreimage(B256),
    /// The preimage could not be decoded as a trie node.
    #[error("Failed to decode trie node {0}: {1}")]
    Decode(B256, alloy_rlp::Error),
}

/// A [TrieProvider] that serves trie nodes out of a map of `keccak256(preimage) -> preimage`.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrieProvider {
    preimages: BTreeMap<B256, Bytes>,
}

impl MemoryTrieProvider {
    /// Creates a new [MemoryTrieProvider] from an existing preimage map.
    pub const fn new(preimages: BTreeMap<B256, Bytes>) -> Self {
        Self { preimages }
    }

    /// Creates a new [MemoryTrieProvider] from a set of raw RLP encoded trie nodes. Each node is
    /// keyed by its [keccak256] hash.
    pub fn from_preimages(nodes: impl IntoIterator<Item = Bytes>) -> Self {
        let preimages = nodes.into_iter().map(|node| (keccak256(&node), node)).collect();
        Self { preimages }
    }

    /// Inserts a raw RLP encoded trie node, returning its commitment.
    pub fn insert(&mut self, node: Bytes) -> B256 {
        let commitment = keccak256(&node);
        self.preimages.insert(commitment, node);
        commitment
    }

    /// Returns the raw preimage for the given commitment, if known.
    pub fn preimage(&self, commitment: &B256) -> Option<&Bytes> {
        self.preimages.get(commitment)
    }

    /// Returns the number of known preimages.
    pub fn len(&self) -> usize {
        self.preimages.len()
    }

    /// Returns `true` if no preimages are known.
    pub fn is_empty(&self) -> bool {
        self.preimages.is_empty()
    }
}

impl TrieProvider for MemoryTrieProvider {
    type Error = MemoryProviderError;

    fn trie_node_by_hash(&self, key: B256) -> Result<TrieNode, Self::Error> {
        let preimage = self.preimages.get(&key).ok_or(MemoryProviderError::MissingPreimage(key))?;
        TrieNode::decode(&mut preimage.as_ref()).map_err(|e| MemoryProviderError::Decode(key, e))
    }
}
