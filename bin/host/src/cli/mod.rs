//! This module contains all CLI-specific code for the host binary.

use alloy_primitives::B256;
use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser};
use keel_oracle::{DiskKeyValueStore, OracleConfig, SharedKeyValueStore};
use keel_primitives::{BLOCK_PART_SIZE_BYTES, TrustAnchor};
use std::{
    path::PathBuf,
    sync::{Arc, RwLock},
};
use url::Url;

mod parser;
pub(crate) use parser::parse_b256;

mod tracing_util;
pub use tracing_util::init_tracing_subscriber;

/// The host binary CLI application arguments.
#[derive(Parser, Clone, Debug)]
#[command(name = "keel", about = "Verifies a block against a trust anchor and replays it")]
pub struct HostCli {
    /// Verbosity level (0-4)
    #[arg(long, short, help = "Verbosity level (0-4)", action = ArgAction::Count)]
    pub v: u8,
    /// Base directory of the response cache.
    #[clap(long, env = "KEEL_DATA_DIR", default_value = "/tmp/keel")]
    pub data_dir: PathBuf,
    /// Height of the trusted block to replay.
    #[clap(long, env = "KEEL_HEIGHT")]
    pub height: u64,
    /// Hash of the trusted block to replay.
    #[clap(long, env = "KEEL_HASH", value_parser = parse_b256)]
    pub hash: B256,
    /// Address of the node's JSON-RPC endpoint.
    #[clap(long, env = "KEEL_RPC", default_value = "http://localhost:26657")]
    pub rpc: Url,
    /// Page size of validator set fetches.
    #[clap(long, env = "KEEL_PER_PAGE", default_value_t = 100)]
    pub per_page: usize,
}

impl HostCli {
    /// Returns the trust anchor the verification is rooted in.
    pub const fn anchor(&self) -> TrustAnchor {
        TrustAnchor::new(self.height, self.hash)
    }

    /// Returns the oracle configuration.
    pub const fn oracle_config(&self) -> OracleConfig {
        OracleConfig { validators_per_page: self.per_page, block_part_size: BLOCK_PART_SIZE_BYTES }
    }

    /// Returns the directory the responses for the anchor height are cached in.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("output").join(self.height.to_string())
    }

    /// Opens the on-disk response cache for the anchor height, creating it if missing.
    pub fn construct_kv_store(&self) -> Result<SharedKeyValueStore> {
        let cache_dir = self.cache_dir();
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| anyhow!("Failed to create cache directory {cache_dir:?}: {e}"))?;
        Ok(Arc::new(RwLock::new(DiskKeyValueStore::new(cache_dir)?)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use keel_oracle::KeyValueStore;

    const HASH: &str = "0x5c3f2f0e1e8a4b7d6c9e0f1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e";

    #[test]
    fn test_defaults() {
        let cli = HostCli::try_parse_from(["keel", "--height", "42", "--hash", HASH]).unwrap();
        assert_eq!(cli.v, 0);
        assert_eq!(cli.rpc.as_str(), "http://localhost:26657/");
        assert_eq!(cli.cache_dir(), PathBuf::from("/tmp/keel/output/42"));
        assert_eq!(cli.anchor(), TrustAnchor::new(42, HASH.parse().unwrap()));
        assert_eq!(cli.oracle_config(), OracleConfig::default());
    }

    #[test]
    fn test_flags() {
        let cli = HostCli::try_parse_from([
            "keel",
            "-vvv",
            "--data-dir",
            "/data",
            "--height",
            "7",
            "--hash",
            HASH,
            "--rpc",
            "http://node:26657",
            "--per-page",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.v, 3);
        assert_eq!(cli.cache_dir(), PathBuf::from("/data/output/7"));
        assert_eq!(cli.oracle_config().validators_per_page, 30);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(HostCli::try_parse_from(["keel", "--height", "7", "--hash", "0x12"]).is_err());
        assert!(HostCli::try_parse_from(["keel", "--hash", HASH, "--height", "-1"]).is_err());
        assert!(
            HostCli::try_parse_from(["keel", "--height", "7", "--hash", HASH, "--rpc", "nope"])
                .is_err()
        );
    }

    #[test]
    fn test_cache_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let cli = HostCli::try_parse_from([
            "keel",
            "--data-dir",
            dir.path().to_str().unwrap(),
            "--height",
            "3",
            "--hash",
            HASH,
        ])
        .unwrap();
        let store = cli.construct_kv_store().unwrap();
        store.write().unwrap().set("block?height=3", b"{}".to_vec()).unwrap();
        assert!(dir.path().join("output/3").is_dir());
    }
}
