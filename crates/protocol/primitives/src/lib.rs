#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod errors;
pub use errors::{ValidationError, ValidationResult};

mod block_id;
pub use block_id::{BlockId, PartSetHeader};

mod header;
pub use header::{Header, MAX_CHAIN_ID_LEN};

mod commit;
pub use commit::{BlockIdFlag, Commit, CommitSig, SignedHeader};

mod validator;
pub use validator::{Validator, ValidatorSet};

mod evidence;
pub use evidence::{Evidence, MisbehaviorKind};

mod block;
pub use block::{BLOCK_PART_SIZE_BYTES, Block};

mod params;
pub use params::{BlockParams, ConsensusParams, EvidenceParams, ValidatorParams};

mod anchor;
pub use anchor::TrustAnchor;

mod rpc;
pub use rpc::{ResultAbciQuery, ResultBlock, ResultCommit, ResultConsensusParams, ResultValidators};

pub mod abci;
