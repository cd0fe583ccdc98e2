#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod errors;
pub use errors::{ProofError, ProofResult, TrieNodeError, TrieNodeResult};

mod traits;
pub use traits::{NoopTrieProvider, TrieProvider};

mod provider;
pub use provider::{MemoryProviderError, MemoryTrieProvider};

mod node;
pub use node::TrieNode;

mod list;
pub use list::{ordered_root, ordered_root_with_encoder};

mod proof;
pub use proof::{generate_proof, verify_proof};

mod util;

