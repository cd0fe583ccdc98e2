//! The state transition shared by the full and the stateless application.

use crate::{TestAppError, TestAppResult, Tx};
use alloy_primitives::{B256, Bytes, hex, keccak256};
use alloy_trie::Nibbles;
use keel_mpt::{TrieNode, TrieNodeError, TrieProvider};
use keel_primitives::abci::{
    Event, EventAttribute, RequestBeginBlock, ResponseBeginBlock, ResponseDeliverTx,
};
use tracing::debug;

/// Response codes of the test application.
pub mod codes {
    /// The transaction could not be decoded.
    pub const INVALID_TX: u32 = 1;
    /// The queried version is not known.
    pub const UNKNOWN_VERSION: u32 = 2;
    /// The queried trie node is not known.
    pub const UNKNOWN_NODE: u32 = 3;
    /// The query path is not supported.
    pub const UNKNOWN_PATH: u32 = 4;
    /// The query data is malformed.
    pub const INVALID_QUERY: u32 = 5;
    /// The query failed internally.
    pub const INTERNAL: u32 = 6;
}

/// The key/value state: a secure trie whose root may be blinded, and the provider used to open
/// blinded nodes.
#[derive(Debug, Clone)]
pub(crate) struct Machine<P> {
    pub(crate) root: TrieNode,
    pub(crate) provider: P,
    pub(crate) height: u64,
}

impl<P: TrieProvider> Machine<P> {
    /// Creates a machine whose state is the trie committed to by `root`.
    pub(crate) const fn new(root: B256, provider: P) -> Self {
        Self { root: TrieNode::new_blinded(root), provider, height: 0 }
    }

    /// Returns the current state root.
    pub(crate) fn app_hash(&self) -> B256 {
        self.root.commitment()
    }

    /// Starts a block, checking that it builds on the current state.
    pub(crate) fn begin_block(
        &mut self,
        request: &RequestBeginBlock,
    ) -> TestAppResult<ResponseBeginBlock> {
        let header = &request.header;
        let state = self.app_hash();
        if header.app_hash != state {
            return Err(TestAppError::AppHashMismatch {
                height: header.height,
                expected: header.app_hash,
                state,
            });
        }
        self.height = header.height;
        Ok(ResponseBeginBlock::default())
    }

    /// Applies one transaction. Undecodable transactions are rejected with
    /// [codes::INVALID_TX]; failures to read or write the trie are errors.
    pub(crate) fn deliver_tx(&mut self, raw: &[u8]) -> TestAppResult<ResponseDeliverTx> {
        let tx = match Tx::decode_exact(raw) {
            Ok(tx) => tx,
            Err(e) => {
                debug!(target: "testapp", "Rejected transaction 0x{}: {e}", hex::encode(raw));
                return Ok(ResponseDeliverTx {
                    code: codes::INVALID_TX,
                    log: e.to_string(),
                    ..Default::default()
                });
            }
        };

        let path = Nibbles::unpack(keccak256(tx.key()));
        let (kind, data) = match &tx {
            Tx::Set { value, .. } => {
                self.root.insert(&path, value.clone(), &self.provider)?;
                ("set", Bytes::new())
            }
            Tx::Get { .. } => {
                let value = self.root.open(&path, &self.provider)?.cloned();
                ("get", value.unwrap_or_default())
            }
            Tx::Remove { .. } => {
                match self.root.delete(&path, &self.provider) {
                    Ok(()) | Err(TrieNodeError::KeyNotFound) => {}
                    Err(e) => return Err(e.into()),
                }
                ("remove", Bytes::new())
            }
        };

        Ok(ResponseDeliverTx {
            data,
            gas_used: raw.len() as u64,
            events: vec![Event {
                kind: kind.to_string(),
                attributes: vec![EventAttribute {
                    key: "key".to_string(),
                    value: hex::encode(tx.key()),
                }],
            }],
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_trie::EMPTY_ROOT_HASH;
    use keel_mpt::NoopTrieProvider;

    fn machine() -> Machine<NoopTrieProvider> {
        Machine::new(EMPTY_ROOT_HASH, NoopTrieProvider)
    }

    #[test]
    fn test_set_get_remove() {
        let mut machine = machine();
        let key = Bytes::from_static(&[0x2a]);

        let res = machine.deliver_tx(&Tx::set(key.clone(), Bytes::from_static(b"v1")).encoded());
        assert!(res.unwrap().is_ok());
        let root = machine.app_hash();
        assert_ne!(root, EMPTY_ROOT_HASH);

        let res = machine.deliver_tx(&Tx::get(key.clone()).encoded()).unwrap();
        assert_eq!(res.data.as_ref(), b"v1");
        assert_eq!(machine.app_hash(), root);

        machine.deliver_tx(&Tx::remove(key.clone()).encoded()).unwrap();
        assert_eq!(machine.app_hash(), EMPTY_ROOT_HASH);

        let res = machine.deliver_tx(&Tx::get(key).encoded()).unwrap();
        assert!(res.is_ok());
        assert!(res.data.is_empty());
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let mut machine = machine();
        machine.deliver_tx(&Tx::set(vec![1u8], vec![1u8; 10]).encoded()).unwrap();
        let root = machine.app_hash();
        let res = machine.deliver_tx(&Tx::remove(vec![2u8]).encoded()).unwrap();
        assert!(res.is_ok());
        assert_eq!(machine.app_hash(), root);
    }

    #[test]
    fn test_invalid_tx_rejected() {
        let mut machine = machine();
        let res = machine.deliver_tx(b"not a tx").unwrap();
        assert_eq!(res.code, codes::INVALID_TX);
        assert!(!res.log.is_empty());
        assert_eq!(machine.app_hash(), EMPTY_ROOT_HASH);
    }

    #[test]
    fn test_begin_block_checks_app_hash() {
        let mut machine = machine();
        let mut request = RequestBeginBlock::default();
        request.header.height = 2;
        request.header.app_hash = B256::repeat_byte(1);
        assert!(matches!(
            machine.begin_block(&request),
            Err(TestAppError::AppHashMismatch { height: 2, .. })
        ));

        request.header.app_hash = EMPTY_ROOT_HASH;
        machine.begin_block(&request).unwrap();
        assert_eq!(machine.height, 2);
    }
}
