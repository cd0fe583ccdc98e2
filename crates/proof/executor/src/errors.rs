//! Errors for the `keel-executor` crate.

use std::error::Error as StdError;
use thiserror::Error;

/// A boxed error raised by an application.
pub(crate) type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// A [Result] type alias where the error is [ExecutorError].
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// An error type for the [crate::StatelessBlockExecutor].
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The block is the chain's first block, which has no prior version to rehydrate from.
    #[error("Block {height} is not above the initial height {initial_height}, cannot replay")]
    GenesisBlock {
        /// The height of the block.
        height: u64,
        /// The configured initial height of the chain.
        initial_height: u64,
    },
    /// The application could not be rehydrated at the requested version.
    #[error("Failed to rehydrate the application at version {version}: {source}")]
    Rehydration {
        /// The requested version.
        version: u64,
        /// The application's error.
        source: BoxedError,
    },
    /// A lifecycle call failed in the application.
    #[error("Application failed in {phase}: {source}")]
    Application {
        /// The lifecycle call that failed.
        phase: &'static str,
        /// The application's error.
        source: BoxedError,
    },
}
