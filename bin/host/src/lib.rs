#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod cli;
pub use cli::{HostCli, init_tracing_subscriber};

mod replay;
pub use replay::{replay, replay_from};
