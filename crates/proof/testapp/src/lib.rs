#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{TestAppError, TestAppResult, TxError};

mod tx;
pub use tx::Tx;

mod machine;
pub use machine::codes;

mod provider;
pub use provider::OracleTrieProvider;

mod app;
pub use app::{KEY_QUERY_PATH, NODE_QUERY_PATH, StatelessTestApp, TestApp};

mod chain;
pub use chain::TestChain;
