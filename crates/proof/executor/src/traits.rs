//! Contains the [Application] and [StatelessApplication] traits, the state machine capabilities
//! the executor drives.

use keel_oracle::Oracle;
use keel_primitives::abci::{
    RequestBeginBlock, RequestDeliverTx, RequestEndBlock, RequestInitChain, ResponseBeginBlock,
    ResponseCommit, ResponseDeliverTx, ResponseEndBlock, ResponseInitChain,
};
use std::{error::Error, sync::Arc};

/// A deterministic ABCI state machine.
///
/// Application level failures, such as a rejected transaction, are reported through response
/// codes. An `Err` is reserved for failures of the application itself, for example a storage
/// read that could not be served, and aborts the replay.
pub trait Application {
    /// The error type of the application.
    type Error: Error + Send + Sync + 'static;

    /// Initializes the chain.
    fn init_chain(&mut self, request: RequestInitChain) -> Result<ResponseInitChain, Self::Error>;

    /// Starts a block.
    fn begin_block(
        &mut self,
        request: RequestBeginBlock,
    ) -> Result<ResponseBeginBlock, Self::Error>;

    /// Applies one transaction.
    fn deliver_tx(&mut self, request: RequestDeliverTx) -> Result<ResponseDeliverTx, Self::Error>;

    /// Ends the block.
    fn end_block(&mut self, request: RequestEndBlock) -> Result<ResponseEndBlock, Self::Error>;

    /// Commits the block, returning the new application hash.
    fn commit(&mut self) -> Result<ResponseCommit, Self::Error>;
}

/// An application that can produce a stateless instance of itself.
pub trait StatelessApplication {
    /// The stateless instance.
    type Instance: Application;
    /// The error returned when rehydration fails.
    type Error: Error + Send + Sync + 'static;

    /// Rehydrates the application so that it executes block `version` on top of the state of
    /// `version - 1`, reading every piece of prior state through `oracle`.
    ///
    /// ## Takes
    /// - `version` - The height of the block that will be executed.
    /// - `oracle` - The verified read source.
    ///
    /// ## Returns
    /// - `Ok(Self::Instance)` - The stateless instance.
    /// - `Err(Self::Error)` - The oracle does not serve the requested version.
    fn stateless(
        &self,
        version: u64,
        oracle: Arc<dyn Oracle + Send + Sync>,
    ) -> Result<Self::Instance, Self::Error>;
}
