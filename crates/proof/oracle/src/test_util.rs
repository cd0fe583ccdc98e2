//! Testing utilities for `keel-oracle`

use crate::{DataSource, SourceError, SourceResult};
use alloy_primitives::{B256, Bytes, keccak256};
use alloy_trie::Nibbles;
use keel_mpt::{NoopTrieProvider, TrieNode, generate_proof};
use keel_primitives::{
    BLOCK_PART_SIZE_BYTES, Block, BlockId, BlockIdFlag, Commit, CommitSig, Header, PartSetHeader,
    ResultAbciQuery, ResultBlock, ResultCommit, ResultValidators, SignedHeader, TrustAnchor,
    Validator, ValidatorSet, abci::ResponseQuery,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A block at `height` together with the commit and validator set of `height - 1`, and a small
/// state trie whose root is the block's app hash.
#[derive(Debug, Clone)]
pub(crate) struct Fixture {
    pub(crate) validators: ValidatorSet,
    pub(crate) parent: SignedHeader,
    pub(crate) block: Block,
    pub(crate) block_id: BlockId,
    pub(crate) state: Vec<(Bytes, Bytes)>,
    pub(crate) trie: TrieNode,
}

impl Fixture {
    /// Builds a fixture with `num_validators` validators. `height` must be at least 3.
    pub(crate) fn new(num_validators: usize, height: u64) -> Self {
        let chain_id = String::from("keel-test");
        let validators = (0..num_validators as u64)
            .map(|i| {
                let pub_key = Bytes::copy_from_slice(keccak256(i.to_be_bytes()).as_slice());
                Validator::new(pub_key, 10 + i)
            })
            .collect::<ValidatorSet>();

        let state = (0..16u8)
            .map(|i| (Bytes::from(format!("key-{i}").into_bytes()), Bytes::from(vec![i; 40])))
            .collect::<Vec<_>>();
        let mut trie = TrieNode::Empty;
        for (key, value) in &state {
            trie.insert(&Nibbles::unpack(keccak256(key)), value.clone(), &NoopTrieProvider)
                .unwrap();
        }

        let parent_header = Header {
            chain_id: chain_id.clone(),
            height: height - 1,
            time: 1_000 + height - 1,
            last_block_id: BlockId {
                hash: B256::repeat_byte(0x01),
                part_set_header: PartSetHeader { total: 1, hash: B256::repeat_byte(0x02) },
            },
            validators_hash: validators.hash(),
            next_validators_hash: validators.hash(),
            proposer_address: validators.validators()[0].address,
            ..Default::default()
        };
        let parent_id = BlockId {
            hash: parent_header.hash(),
            part_set_header: PartSetHeader { total: 1, hash: B256::repeat_byte(0x03) },
        };
        let signatures = validators
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if i % 4 == 3 {
                    CommitSig::absent()
                } else {
                    CommitSig {
                        block_id_flag: BlockIdFlag::Commit,
                        validator_address: v.address,
                        timestamp: 1_000 + height,
                        signature: Bytes::from(vec![i as u8; 64]),
                    }
                }
            })
            .collect();
        let commit = Commit { height: height - 1, round: 0, block_id: parent_id, signatures };

        let txs = vec![Bytes::from_static(b"one"), Bytes::from_static(b"two")];
        let header = Header {
            chain_id,
            height,
            time: 1_000 + height,
            last_block_id: parent_id,
            last_commit_hash: commit.hash(),
            data_hash: Block::data_hash(&txs),
            validators_hash: validators.hash(),
            next_validators_hash: validators.hash(),
            app_hash: trie.commitment(),
            evidence_hash: Block::evidence_hash(&[]),
            proposer_address: validators.validators()[0].address,
            ..Default::default()
        };
        let block = Block { header, txs, evidence: vec![], last_commit: commit.clone() };
        let block_id = block.block_id(BLOCK_PART_SIZE_BYTES);

        Self {
            validators,
            parent: SignedHeader { header: parent_header, commit },
            block,
            block_id,
            state,
            trie,
        }
    }

    /// The trust anchor of the fixture's block.
    pub(crate) fn anchor(&self) -> TrustAnchor {
        TrustAnchor::new(self.block.height(), self.block_id.hash)
    }
}

/// A [DataSource] serving a [Fixture], with knobs to misbehave.
#[derive(Debug)]
pub(crate) struct FixtureSource {
    pub(crate) fixture: Fixture,
    /// Served instead of the fixture's validator set.
    pub(crate) validators_override: Option<Vec<Validator>>,
    /// Page boundaries used instead of `per_page`.
    pub(crate) page_sizes: Option<Vec<usize>>,
    /// Answer state queries with a forged value and the genuine proof.
    pub(crate) forge_values: bool,
    /// Drop the proof nodes of every state query answer.
    pub(crate) strip_proofs: bool,
    validator_calls: AtomicUsize,
}

impl FixtureSource {
    pub(crate) const fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            validators_override: None,
            page_sizes: None,
            forge_values: false,
            strip_proofs: false,
            validator_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn validator_calls(&self) -> usize {
        self.validator_calls.load(Ordering::SeqCst)
    }
}

impl DataSource for FixtureSource {
    fn block(&self, height: u64) -> SourceResult<ResultBlock> {
        if height != self.fixture.block.height() {
            return Err(SourceError::NotFound(format!("block {height}")));
        }
        Ok(ResultBlock { block_id: self.fixture.block_id, block: self.fixture.block.clone() })
    }

    fn commit(&self, height: u64) -> SourceResult<ResultCommit> {
        if height != self.fixture.parent.header.height {
            return Err(SourceError::NotFound(format!("commit {height}")));
        }
        Ok(ResultCommit { signed_header: self.fixture.parent.clone(), canonical: true })
    }

    fn validators(
        &self,
        height: u64,
        page: usize,
        per_page: usize,
    ) -> SourceResult<ResultValidators> {
        self.validator_calls.fetch_add(1, Ordering::SeqCst);
        let all = self
            .validators_override
            .clone()
            .unwrap_or_else(|| self.fixture.validators.clone().into_validators());

        let (start, len) = match &self.page_sizes {
            Some(sizes) => (
                sizes.iter().take(page - 1).sum(),
                sizes.get(page - 1).copied().unwrap_or_default(),
            ),
            None => ((page - 1) * per_page, per_page),
        };
        let validators = all.iter().skip(start).take(len).cloned().collect::<Vec<_>>();
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
        if path == "/store/main/node" {
            let preimage = self
                .fixture
                .trie
                .preimages()
                .into_iter()
                .find(|(hash, _)| hash.as_slice() == data)
                .map(|(_, preimage)| preimage);
            let response = match preimage {
                Some(value) => ResponseQuery {
                    key: Bytes::copy_from_slice(data),
                    value: if self.forge_values { Bytes::from_static(&[0xc0]) } else { value },
                    height,
                    ..Default::default()
                },
                None => ResponseQuery { code: 3, height, ..Default::default() },
            };
            return Ok(ResultAbciQuery { response });
        }
        if path != "/store/main/key" {
            return Ok(ResultAbciQuery { response: ResponseQuery { height, ..Default::default() } });
        }

        let value = if self.forge_values {
            Bytes::from_static(b"forged")
        } else {
            self.fixture
                .state
                .iter()
                .find(|(k, _)| k.as_ref() == data)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        let proof_ops = if prove && !self.strip_proofs {
            generate_proof(&self.fixture.trie, &Nibbles::unpack(keccak256(data)), &NoopTrieProvider)
                .map_err(|e| SourceError::NotFound(e.to_string()))?
        } else {
            Vec::new()
        };

        Ok(ResultAbciQuery {
            response: ResponseQuery {
                key: Bytes::copy_from_slice(data),
                value,
                proof_ops,
                height,
                ..Default::default()
            },
        })
    }
}
