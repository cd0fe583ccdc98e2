//! Wires the verifying oracle, the response cache and the stateless executor together.

use crate::HostCli;
use alloy_primitives::B256;
use anyhow::{Result, anyhow};
use keel_executor::{ExecutionLog, ExecutorConfig, StatelessBlockExecutor};
use keel_oracle::{CachingDataSource, DataSource, HttpDataSource, RpcOracle};
use keel_testapp::TestApp;
use std::sync::Arc;
use tracing::{debug, info};

/// Verifies the trust chain of the anchor block through the node at `cfg.rpc`, caching every
/// response on disk, and replays the block.
pub fn replay(cfg: &HostCli) -> Result<(B256, ExecutionLog)> {
    let store = cfg.construct_kv_store()?;
    let source = CachingDataSource::new(HttpDataSource::new(cfg.rpc.clone()), store);
    replay_from(cfg, source)
}

/// Replays the anchor block with data from `source`.
pub fn replay_from<S>(cfg: &HostCli, source: S) -> Result<(B256, ExecutionLog)>
where
    S: DataSource + Send + Sync + 'static,
{
    let anchor = cfg.anchor();
    info!(target: "host", "Replaying block {} ({})", anchor.height, anchor.hash);

    let oracle = RpcOracle::new(anchor, source, cfg.oracle_config())?;
    let block = oracle.state().block.clone();
    let validators = oracle.state().validators.clone();

    let executor =
        StatelessBlockExecutor::new(TestApp::new(), Arc::new(oracle), ExecutorConfig::default());
    let (app_hash, log) = executor.execute(&block, validators.validators())?;

    debug!(
        target: "host",
        "Execution log: {}",
        serde_json::to_string(&log).map_err(|e| anyhow!("Failed to encode execution log: {e}"))?
    );
    Ok((app_hash, log))
}
