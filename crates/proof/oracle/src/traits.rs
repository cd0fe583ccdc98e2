//! Contains the [Oracle], [DataSource] and [Queryable] traits.

use crate::{OracleResult, QueryKey, SourceResult};
use alloy_primitives::Bytes;
use keel_primitives::{
    ResultAbciQuery, ResultBlock, ResultCommit, ResultValidators,
    abci::{RequestQuery, ResponseQuery},
};
use std::sync::Arc;

/// The uniform read interface served to the block executor and the application.
pub trait Oracle {
    /// Returns the JSON encoded result for `key`.
    ///
    /// ## Takes
    /// - `key` - The logical key to look up.
    ///
    /// ## Returns
    /// - `Ok(Bytes)` - The JSON encoded result envelope.
    /// - `Err(OracleError::UnsupportedQuery)` - The oracle does not serve the key's path.
    /// - `Err(_)` - The lookup failed.
    fn get(&self, key: &QueryKey) -> OracleResult<Bytes>;
}

impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    fn get(&self, key: &QueryKey) -> OracleResult<Bytes> {
        (**self).get(key)
    }
}

/// A raw, untrusted source of chain data, such as a node's JSON-RPC endpoint.
pub trait DataSource {
    /// Fetches the block at `height`.
    fn block(&self, height: u64) -> SourceResult<ResultBlock>;

    /// Fetches the canonical commit for the block at `height`.
    fn commit(&self, height: u64) -> SourceResult<ResultCommit>;

    /// Fetches one page of the validator set effective at `height`. Pages are 1-indexed.
    fn validators(&self, height: u64, page: usize, per_page: usize)
    -> SourceResult<ResultValidators>;

    /// Queries the application state at `height`.
    fn abci_query(
        &self,
        path: &str,
        data: &[u8],
        height: u64,
        prove: bool,
    ) -> SourceResult<ResultAbciQuery>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn block(&self, height: u64) -> SourceResult<ResultBlock> {
        (**self).block(height)
    }

    fn commit(&self, height: u64) -> SourceResult<ResultCommit> {
        (**self).commit(height)
    }

    fn validators(
        &self,
        height: u64,
        page: usize,
        per_page: usize,
    ) -> SourceResult<ResultValidators> {
        (**self).validators(height, page, per_page)
    }

    fn abci_query(
        &self,
        path: &str,
        data: &[u8],
        height: u64,
        prove: bool,
    ) -> SourceResult<ResultAbciQuery> {
        (**self).abci_query(path, data, height, prove)
    }
}

impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    fn block(&self, height: u64) -> SourceResult<ResultBlock> {
        (**self).block(height)
    }

    fn commit(&self, height: u64) -> SourceResult<ResultCommit> {
        (**self).commit(height)
    }

    fn validators(
        &self,
        height: u64,
        page: usize,
        per_page: usize,
    ) -> SourceResult<ResultValidators> {
        (**self).validators(height, page, per_page)
    }

    fn abci_query(
        &self,
        path: &str,
        data: &[u8],
        height: u64,
        prove: bool,
    ) -> SourceResult<ResultAbciQuery> {
        (**self).abci_query(path, data, height, prove)
    }
}

/// An application that answers state queries.
pub trait Queryable {
    /// Answers `request`. Failures are reported through the response code.
    fn query(&self, request: RequestQuery) -> ResponseQuery;
}

impl<T: Queryable + ?Sized> Queryable for Arc<T> {
    fn query(&self, request: RequestQuery) -> ResponseQuery {
        (**self).query(request)
    }
}
