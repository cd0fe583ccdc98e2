//! Membership and non-membership proofs over a [TrieNode].

use crate::{
    MemoryProviderError, MemoryTrieProvider, ProofError, ProofResult, TrieNode, TrieNodeError,
    TrieNodeResult, TrieProvider,
};
use alloc::vec::Vec;
use alloy_primitives::{B256, Bytes};
use alloy_rlp::Encodable;
use alloy_trie::{EMPTY_ROOT_HASH, Nibbles};

/// Collects the RLP encoded nodes along `path`, starting at `root`. The returned list is the
/// proof for the value at `path`, or for its absence.
///
/// The root node is always part of the proof. Other nodes are only included when they are
/// referenced by hash, since shorter nodes are inlined into their parent's encoding.
///
/// ## Takes
/// - `root` - The root trie node. May be blinded.
/// - `path` - The nibbles representation of the path to prove
/// - `fetcher` - The preimage fetcher for blinded nodes along the path
///
/// ## Returns
/// - `Ok(Vec<Bytes>)` - The proof nodes, ordered from the root down.
/// - `Err(_)` - A node along the path could not be fetched.
pub fn generate_proof<F: TrieProvider>(
    root: &TrieNode,
    path: &Nibbles,
    fetcher: &F,
) -> TrieNodeResult<Vec<Bytes>> {
    let mut proof = Vec::new();
    let mut path = path.clone();
    let mut current = root.clone();
    let mut is_root = true;

    loop {
        current.unblind(fetcher)?;
        if matches!(current, TrieNode::Empty) {
            break;
        }

        let mut rlp_buf = Vec::with_capacity(current.length());
        current.encode(&mut rlp_buf);
        if is_root || rlp_buf.len() >= B256::ZERO.len() {
            proof.push(rlp_buf.into());
        }
        is_root = false;

        current = match current {
            TrieNode::Branch { mut stack } => {
                if path.is_empty() {
                    break;
                }
                let nibble = path[0];
                path = path.slice(1..);
                stack.get_mut(nibble as usize).map(core::mem::take).unwrap_or_default()
            }
            TrieNode::Extension { prefix, node } => {
                if path.common_prefix_length(&prefix) != prefix.len() {
                    break;
                }
                path = path.slice(prefix.len()..);
                *node
            }
            _ => break,
        };
    }

    Ok(proof)
}

/// Verifies that `proof` commits to `expected` at `path` in the trie with the given `root`.
/// Passing `None` as the expected value verifies the absence of `path`.
///
/// ## Takes
/// - `root` - The trusted root commitment
/// - `path` - The nibbles representation of the proven path
/// - `expected` - The claimed value at `path`
/// - `proof` - The RLP encoded proof nodes
///
/// ## Returns
/// - `Ok(())` - The proof is valid for the claimed value.
/// - `Err(ProofError::MissingNode)` - The proof does not contain a node on the path.
/// - `Err(ProofError::ValueMismatch)` - The proof resolves to a different value.
pub fn verify_proof(
    root: B256,
    path: &Nibbles,
    expected: Option<&[u8]>,
    proof: &[Bytes],
) -> ProofResult<()> {
    let provider = MemoryTrieProvider::from_preimages(proof.iter().cloned());
    let proven = walk(TrieNode::new_blinded(root), path.clone(), &provider)?;

    if proven.as_ref().map(|value| &value[..]) != expected {
        return Err(ProofError::ValueMismatch {
            claimed: expected.map(Bytes::copy_from_slice),
            proven,
        });
    }
    Ok(())
}

/// Walks a blinded trie using only the preimages held by `provider`.
fn walk(
    mut node: TrieNode,
    mut path: Nibbles,
    provider: &MemoryTrieProvider,
) -> ProofResult<Option<Bytes>> {
    loop {
        node = match node {
            TrieNode::Empty => return Ok(None),
            TrieNode::Blinded { commitment } if commitment == EMPTY_ROOT_HASH => TrieNode::Empty,
            TrieNode::Blinded { commitment } => {
                provider.trie_node_by_hash(commitment).map_err(|e| match e {
                    MemoryProviderError::MissingPreimage(hash) => ProofError::MissingNode(hash),
                    MemoryProviderError::Decode(_, e) => TrieNodeError::RLPError(e).into(),
                })?
            }
            TrieNode::Leaf { prefix, value } => {
                return Ok((prefix.as_slice() == path.as_slice()).then_some(value));
            }
            TrieNode::Extension { prefix, node } => {
                if path.common_prefix_length(&prefix) != prefix.len() {
                    return Ok(None);
                }
                path = path.slice(prefix.len()..);
                *node
            }
            TrieNode::Branch { mut stack } => {
                if path.is_empty() {
                    return Ok(None);
                }
                let nibble = path[0];
                path = path.slice(1..);
                stack.get_mut(nibble as usize).map(core::mem::take).unwrap_or_default()
            }
        };
    }
}
