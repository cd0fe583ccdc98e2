//! The `keel` binary: verifies a block against a trust anchor and prints the replayed app hash.

use anyhow::Result;
use clap::Parser;
use keel_host::{HostCli, init_tracing_subscriber, replay};
use tracing::info;

fn main() -> Result<()> {
    let cfg = HostCli::parse();
    init_tracing_subscriber(cfg.v)?;

    let (app_hash, _) = replay(&cfg)?;
    println!("{app_hash}");

    info!(target: "host", "Exiting host program.");
    Ok(())
}
