#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{ExecutorError, ExecutorResult};

mod traits;
pub use traits::{Application, StatelessApplication};

mod executor;
pub use executor::{ExecutionLog, ExecutorConfig, StatelessBlockExecutor, last_commit_info};
