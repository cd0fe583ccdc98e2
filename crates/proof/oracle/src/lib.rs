#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{
    KeyError, OracleError, OracleResult, SourceError, SourceResult, VerificationError,
    VerificationResult,
};

mod key;
pub use key::{QueryKey, paths};

mod traits;
pub use traits::{DataSource, Oracle, Queryable};

mod kv;
pub use kv::{DiskKeyValueStore, KeyValueStore, MemoryKeyValueStore, SharedKeyValueStore};

mod cache;
pub use cache::CachingDataSource;

mod http;
pub use http::HttpDataSource;

mod rpc;
pub use rpc::{OracleConfig, RpcOracle, VerifiedState};

mod local;
pub use local::LocalOracle;

mod client;
pub use client::OracleClient;

#[cfg(test)]
mod test_util;
