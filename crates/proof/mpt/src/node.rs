//! Contains the [TrieNode] type, a node of a hexary Merkle Patricia Trie that may be hidden
//! behind its commitment until it is needed.

use crate::{
    TrieNodeError, TrieNodeResult, TrieProvider,
    util::{rlp_list_element_length, unpack_path_to_nibbles},
};
use alloc::{boxed::Box, string::ToString, vec, vec::Vec};
use alloy_primitives::{B256, Bytes, keccak256};
use alloy_rlp::{BufMut, Decodable, EMPTY_STRING_CODE, Encodable, Header, length_of_length};
use alloy_trie::{EMPTY_ROOT_HASH, Nibbles, nodes::encode_path_leaf};
use core::mem;

/// Slots of a branch node: one child per nibble, then the value.
const BRANCH_SLOTS: usize = 17;

/// Items of a leaf or extension node: the compact path and the value or child.
const SHORT_NODE_ITEMS: usize = 2;

/// Hex-prefix flag marking a leaf path.
const HP_LEAF: u8 = 0b10;

/// Hex-prefix flag marking a path with an odd number of nibbles.
const HP_ODD: u8 = 0b01;

/// Nodes whose encoding is at least this long are referenced by hash.
const INLINE_LIMIT: usize = 32;

/// A node of a Merkle Patricia Trie.
///
/// Keys are fixed-length nibble paths and values are arbitrary bytes. A child whose encoding is
/// at least 32 bytes long is referenced by its [keccak256] commitment, and may be held as a
/// [TrieNode::Blinded] node until a read or write goes through it. Blinded nodes are opened with
/// the preimage served by a [TrieProvider].
///
/// Branch values are never set, so every key of a trie must have the same length.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum TrieNode {
    /// No node, encoded as [EMPTY_STRING_CODE].
    #[default]
    Empty,
    /// A node known only by its commitment.
    Blinded {
        /// The [keccak256] hash of the node's encoding.
        commitment: B256,
    },
    /// `rlp([compact(prefix, leaf), value])`
    Leaf {
        /// The remaining path of the key.
        prefix: Nibbles,
        /// The stored value.
        value: Bytes,
    },
    /// `rlp([compact(prefix, extension), child])`
    Extension {
        /// The path shared by every key below the node.
        prefix: Nibbles,
        /// The child, always a branch once opened.
        node: Box<TrieNode>,
    },
    /// `rlp([child_0, ..., child_15, value])`
    Branch {
        /// The 16 children followed by the (always empty) value slot.
        stack: Vec<TrieNode>,
    },
}

impl TrieNode {
    /// Creates a new [TrieNode::Blinded] node.
    pub const fn new_blinded(commitment: B256) -> Self {
        Self::Blinded { commitment }
    }

    /// Returns the commitment of the trie rooted at `self`. The root is always hashed, whatever
    /// the length of its encoding.
    pub fn commitment(&self) -> B256 {
        match self {
            Self::Empty => EMPTY_ROOT_HASH,
            Self::Blinded { commitment } => *commitment,
            _ => keccak256(self.rlp()),
        }
    }

    /// Replaces a [TrieNode::Blinded] node with the node behind its commitment. Other nodes are
    /// left untouched.
    pub fn unblind<F: TrieProvider>(&mut self, provider: &F) -> TrieNodeResult<()> {
        let Self::Blinded { commitment } = *self else {
            return Ok(());
        };
        *self = if commitment == EMPTY_ROOT_HASH {
            Self::Empty
        } else {
            provider
                .trie_node_by_hash(commitment)
                .map_err(|e| TrieNodeError::Provider(e.to_string()))?
        };
        Ok(())
    }

    /// Looks up the value at `path`, opening blinded nodes along the way. Opened nodes stay
    /// open.
    ///
    /// ## Takes
    /// - `path` - The nibbles representation of the key
    /// - `provider` - The preimage provider for blinded nodes
    ///
    /// ## Returns
    /// - `Ok(Some(_))` - The value at `path`.
    /// - `Ok(None)` - The key is not present.
    /// - `Err(_)` - A node on the path could not be opened.
    pub fn open<'a, F: TrieProvider>(
        &'a mut self,
        path: &Nibbles,
        provider: &F,
    ) -> TrieNodeResult<Option<&'a mut Bytes>> {
        self.unblind(provider)?;
        match self {
            Self::Leaf { prefix, value } => Ok((prefix == path).then_some(value)),
            Self::Extension { prefix, node } if path.starts_with(prefix.as_slice()) => {
                node.open(&path.slice(prefix.len()..), provider)
            }
            Self::Branch { stack } => {
                if path.is_empty() {
                    return Err(TrieNodeError::ShortPath);
                }
                stack[path[0] as usize].open(&path.slice(1..), provider)
            }
            _ => Ok(None),
        }
    }

    /// Sets the value at `path`, opening blinded nodes along the way.
    ///
    /// ## Takes
    /// - `path` - The nibbles representation of the key
    /// - `value` - The value to store
    /// - `provider` - The preimage provider for blinded nodes
    ///
    /// ## Returns
    /// - `Ok(())` - The value was stored.
    /// - `Err(_)` - A node on the path could not be opened.
    pub fn insert<F: TrieProvider>(
        &mut self,
        path: &Nibbles,
        value: Bytes,
        provider: &F,
    ) -> TrieNodeResult<()> {
        self.unblind(provider)?;
        match self {
            Self::Empty => *self = Self::Leaf { prefix: path.clone(), value },
            Self::Leaf { prefix, value: stored } if prefix == path => *stored = value,
            Self::Extension { prefix, node } if path.starts_with(prefix.as_slice()) => {
                return node.insert(&path.slice(prefix.len()..), value, provider);
            }
            Self::Branch { stack } => {
                if path.is_empty() {
                    return Err(TrieNodeError::ShortPath);
                }
                return stack[path[0] as usize].insert(&path.slice(1..), value, provider);
            }
            _ => *self = mem::take(self).split(path, value),
        }
        Ok(())
    }

    /// Removes the value at `path`, opening blinded nodes along the way, and restores the
    /// canonical shape of the trie.
    ///
    /// ## Takes
    /// - `path` - The nibbles representation of the key
    /// - `provider` - The preimage provider for blinded nodes
    ///
    /// ## Returns
    /// - `Ok(())` - The value was removed.
    /// - `Err(TrieNodeError::KeyNotFound)` - The key is not present. The trie is unchanged.
    /// - `Err(_)` - A node on the path, or the last sibling of a removed leaf, could not be
    ///   opened.
    pub fn delete<F: TrieProvider>(&mut self, path: &Nibbles, provider: &F) -> TrieNodeResult<()> {
        self.unblind(provider)?;
        match self {
            Self::Leaf { prefix, .. } if prefix == path => *self = Self::Empty,
            Self::Extension { prefix, node } if path.starts_with(prefix.as_slice()) => {
                node.delete(&path.slice(prefix.len()..), provider)?;
                // The child may have shrunk into a short node that absorbs the prefix.
                let prefix = mem::take(prefix);
                *self = mem::take(node.as_mut()).prepend(prefix.as_slice());
            }
            Self::Branch { stack } => {
                if path.is_empty() {
                    return Err(TrieNodeError::ShortPath);
                }
                stack[path[0] as usize].delete(&path.slice(1..), provider)?;

                let occupied = stack
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| !matches!(child, Self::Empty))
                    .map(|(index, _)| index)
                    .take(2)
                    .collect::<Vec<_>>();
                if let [index] = occupied[..] {
                    let mut last = mem::take(&mut stack[index]);
                    last.unblind(provider)?;
                    *self = last.prepend(&[index as u8]);
                }
            }
            _ => return Err(TrieNodeError::KeyNotFound),
        }
        Ok(())
    }

    /// Collects the encodings of `self` and of every open descendant that is referenced by
    /// hash, keyed by their commitment. The root is always included.
    ///
    /// Blinded descendants are skipped, since their preimages are already known to whoever
    /// blinded them.
    pub fn preimages(&self) -> Vec<(B256, Bytes)> {
        let mut out = Vec::new();
        self.collect_preimages(true, &mut out);
        out
    }

    fn collect_preimages(&self, is_root: bool, out: &mut Vec<(B256, Bytes)>) {
        match self {
            Self::Empty | Self::Blinded { .. } => return,
            Self::Leaf { .. } => {}
            Self::Extension { node, .. } => node.collect_preimages(false, out),
            Self::Branch { stack } => {
                stack.iter().for_each(|child| child.collect_preimages(false, out))
            }
        }

        let rlp = self.rlp();
        if is_root || rlp.len() >= INLINE_LIMIT {
            out.push((keccak256(&rlp), rlp.into()));
        }
    }

    /// Places `self`, a short node whose prefix diverges from `path`, and a new leaf for
    /// `value` under a branch at the first differing nibble. The shared part of the path
    /// becomes an extension above the branch.
    fn split(self, path: &Nibbles, value: Bytes) -> Self {
        let prefix = match &self {
            Self::Leaf { prefix, .. } | Self::Extension { prefix, .. } => prefix.clone(),
            _ => return self,
        };
        let shared = path.common_prefix_length(&prefix);

        let mut stack = vec![Self::Empty; BRANCH_SLOTS];
        stack[prefix[shared] as usize] = self.with_prefix(prefix.slice(shared + 1..));
        stack[path[shared] as usize] = Self::Leaf { prefix: path.slice(shared + 1..), value };

        Self::Branch { stack }.prepend(path.slice(..shared).as_slice())
    }

    /// Replaces the prefix of a short node. An extension left without a prefix is replaced by
    /// its child.
    fn with_prefix(self, prefix: Nibbles) -> Self {
        match self {
            Self::Leaf { value, .. } => Self::Leaf { prefix, value },
            Self::Extension { node, .. } if prefix.is_empty() => *node,
            Self::Extension { node, .. } => Self::Extension { prefix, node },
            node => node,
        }
    }

    /// Moves `self` below `nibbles`: short nodes absorb them into their prefix and other nodes
    /// are wrapped in an extension.
    fn prepend(self, nibbles: &[u8]) -> Self {
        if nibbles.is_empty() {
            return self;
        }
        let join = |prefix: &Nibbles| {
            Nibbles::from_nibbles_unchecked([nibbles, prefix.as_slice()].concat())
        };
        match self {
            Self::Empty => Self::Empty,
            Self::Leaf { prefix, value } => Self::Leaf { prefix: join(&prefix), value },
            Self::Extension { prefix, node } => Self::Extension { prefix: join(&prefix), node },
            node => Self::Extension {
                prefix: Nibbles::from_nibbles_unchecked(nibbles),
                node: Box::new(node),
            },
        }
    }

    /// Decodes the payload of a leaf or extension node, after its list header.
    fn decode_short(buf: &mut &[u8]) -> TrieNodeResult<Self> {
        let path = Bytes::decode(buf).map_err(TrieNodeError::RLPError)?;
        let (&first, rest) = path.split_first().ok_or(TrieNodeError::InvalidNodeType)?;
        let flags = first >> 4;
        if flags > (HP_LEAF | HP_ODD) {
            return Err(TrieNodeError::InvalidNodeType);
        }

        let odd_nibble = ((flags & HP_ODD) != 0).then_some(first & 0x0f);
        let prefix = unpack_path_to_nibbles(odd_nibble, rest);
        if (flags & HP_LEAF) != 0 {
            let value = Bytes::decode(buf).map_err(TrieNodeError::RLPError)?;
            Ok(Self::Leaf { prefix, value })
        } else {
            let node = Self::decode(buf).map_err(TrieNodeError::RLPError)?;
            Ok(Self::Extension { prefix, node: Box::new(node) })
        }
    }

    fn rlp(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length());
        self.encode(&mut out);
        out
    }

    fn list_header(&self) -> Header {
        Header { list: true, payload_length: self.payload_length() }
    }

    fn payload_length(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Blinded { commitment } => commitment.len(),
            Self::Leaf { prefix, value } => compact_path_length(prefix) + value.length(),
            Self::Extension { prefix, node } => {
                compact_path_length(prefix) + node.reference_length()
            }
            Self::Branch { stack } => stack.iter().map(Self::reference_length).sum(),
        }
    }

    /// The length of `self` as embedded in its parent.
    fn reference_length(&self) -> usize {
        let length = self.length();
        if length < INLINE_LIMIT { length } else { B256::ZERO.length() }
    }

    /// Encodes `self` as embedded in its parent: inline if short, else by commitment.
    fn encode_reference(&self, out: &mut dyn BufMut) {
        if self.length() < INLINE_LIMIT {
            self.encode(out)
        } else {
            self.commitment().encode(out)
        }
    }
}

/// The encoded length of a compact (hex-prefix) path of `prefix`.
fn compact_path_length(prefix: &Nibbles) -> usize {
    let bytes = prefix.len() / 2 + 1;
    // A single byte path is always below 0x80 and encodes as itself.
    if bytes == 1 { 1 } else { bytes + length_of_length(bytes) }
}

impl Encodable for TrieNode {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::Empty => out.put_u8(EMPTY_STRING_CODE),
            Self::Blinded { commitment } => commitment.encode(out),
            Self::Leaf { prefix, value } => {
                self.list_header().encode(out);
                encode_path_leaf(prefix, true).as_slice().encode(out);
                value.encode(out);
            }
            Self::Extension { prefix, node } => {
                self.list_header().encode(out);
                encode_path_leaf(prefix, false).as_slice().encode(out);
                node.encode_reference(out);
            }
            Self::Branch { stack } => {
                self.list_header().encode(out);
                stack.iter().for_each(|child| child.encode_reference(out));
            }
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::Empty => 1,
            Self::Blinded { commitment } => commitment.length(),
            _ => {
                let payload_length = self.payload_length();
                length_of_length(payload_length) + payload_length
            }
        }
    }
}

impl Decodable for TrieNode {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut payload: &[u8] = buf;
        let header = Header::decode(&mut payload)?;

        if !header.list {
            return match header.payload_length {
                0 => {
                    *buf = payload;
                    Ok(Self::Empty)
                }
                32 => B256::decode(buf).map(Self::new_blinded),
                _ => Err(alloy_rlp::Error::UnexpectedLength),
            };
        }

        match rlp_list_element_length(&mut &buf[..])? {
            BRANCH_SLOTS => Vec::<Self>::decode(buf).map(|stack| Self::Branch { stack }),
            SHORT_NODE_ITEMS => {
                *buf = payload;
                Self::decode_short(buf).map_err(|_| alloy_rlp::Error::UnexpectedList)
            }
            _ => Err(alloy_rlp::Error::UnexpectedLength),
        }
    }
}
