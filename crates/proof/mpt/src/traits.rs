//! Contains the [TrieProvider] trait for fetching trie node preimages.

use crate::TrieNode;
use alloc::string::ToString;
use alloy_primitives::B256;
use core::fmt::Display;

/// The [TrieProvider] trait defines the synchronous interface for fetching trie node preimages.
pub trait TrieProvider {
    /// The error type for fetching trie node preimages.
    type Error: Display + ToString;

    /// Fetches the preimage for the given trie node hash.
    ///
    /// ## Takes
    /// - `key` - The key of the trie node to fetch.
    ///
    /// ## Returns
    /// - Ok(TrieNode): The trie node preimage.
    /// - Err(Self::Error): If the trie node preimage could not be fetched.
    fn trie_node_by_hash(&self, key: B256) -> Result<TrieNode, Self::Error>;
}

/// The default, no-op implementation of the [TrieProvider] trait, used for fully open tries
/// that never need to reach out for a preimage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTrieProvider;

impl TrieProvider for NoopTrieProvider {
    type Error = core::convert::Infallible;

    fn trie_node_by_hash(&self, _key: B256) -> Result<TrieNode, Self::Error> {
        Ok(TrieNode::Empty)
    }
}

impl<T: TrieProvider> TrieProvider for &T {
    type Error = T::Error;

    fn trie_node_by_hash(&self, key: B256) -> Result<TrieNode, Self::Error> {
        (**self).trie_node_by_hash(key)
    }
}
