//! Roots of ordered lists, committed to in a trie keyed by the RLP encoded list index.

use alloc::vec::Vec;
use alloy_primitives::B256;
use alloy_rlp::{BufMut, Encodable};
use alloy_trie::{HashBuilder, Nibbles};

/// Computes the root of an ordered list of raw byte items. Item `i` is stored at the path
/// `rlp(i)`, and the empty list commits to [alloy_trie::EMPTY_ROOT_HASH].
pub fn ordered_root<T: AsRef<[u8]>>(items: &[T]) -> B256 {
    ordered_root_with_encoder(items, |item, buf| buf.put_slice(item.as_ref()))
}

/// Computes the root of an ordered list, encoding each item with `encode`.
///
/// ## Takes
/// - `items` - The list of items
/// - `encode` - Writes the leaf value for an item into the buffer
///
/// ## Returns
/// - The root commitment of the list trie.
pub fn ordered_root_with_encoder<T, F>(items: &[T], mut encode: F) -> B256
where
    F: FnMut(&T, &mut dyn BufMut),
{
    let mut leaves = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut path = Vec::new();
            index.encode(&mut path);
            let mut value = Vec::new();
            encode(item, &mut value);
            (path, value)
        })
        .collect::<Vec<_>>();

    // The hash builder expects leaves in path order, and `rlp(0) = 0x80` sorts after the single
    // byte encodings of 1 to 127.
    leaves.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let mut hb = HashBuilder::default();
    for (path, value) in &leaves {
        hb.add_leaf(Nibbles::unpack(path), value);
    }
    hb.root()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{NoopTrieProvider, TrieNode};
    use alloc::{format, string::String};
    use alloy_primitives::Bytes;
    use alloy_trie::EMPTY_ROOT_HASH;

    /// Builds the same list with an open [TrieNode], inserting in index order.
    fn node_root(items: &[String]) -> B256 {
        let mut node = TrieNode::Empty;
        for (i, item) in items.iter().enumerate() {
            let mut path = Vec::new();
            i.encode(&mut path);
            let value = Bytes::copy_from_slice(item.as_bytes());
            node.insert(&Nibbles::unpack(&path), value, &NoopTrieProvider).unwrap();
        }
        node.commitment()
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(ordered_root::<Bytes>(&[]), EMPTY_ROOT_HASH);
    }

    #[test]
    fn test_matches_trie_node() {
        for len in [1usize, 2, 3, 16, 127, 128, 129, 300] {
            let items = (0..len).map(|i| format!("item {i}")).collect::<Vec<_>>();
            assert_eq!(ordered_root(&items), node_root(&items), "length {len}");
        }
    }

    #[test]
    fn test_order_sensitive() {
        let items = [Bytes::from_static(b"a"), Bytes::from_static(b"b")];
        let swapped = [Bytes::from_static(b"b"), Bytes::from_static(b"a")];
        assert_ne!(ordered_root(&items), ordered_root(&swapped));
    }
}
