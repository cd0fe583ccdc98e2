//! Contains the [CachingDataSource], a read-through cache in front of a [DataSource].

use crate::{DataSource, QueryKey, SharedKeyValueStore, SourceError, SourceResult};
use anyhow::anyhow;
use keel_primitives::{ResultAbciQuery, ResultBlock, ResultCommit, ResultValidators};
use core::fmt;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, trace, warn};

/// A [DataSource] that looks every fetch up in a [crate::KeyValueStore] first, keyed by the
/// canonical [QueryKey] of the fetch. On a miss, the inner source is queried and its response is
/// persisted before being returned.
pub struct CachingDataSource<S> {
    inner: S,
    store: SharedKeyValueStore,
}

impl<S: fmt::Debug> fmt::Debug for CachingDataSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingDataSource").field("inner", &self.inner).finish_non_exhaustive()
    }
}

impl<S> CachingDataSource<S> {
    /// Creates a new [CachingDataSource].
    pub const fn new(inner: S, store: SharedKeyValueStore) -> Self {
        Self { inner, store }
    }

    /// Returns the inner source.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    fn cached<T, F>(&self, key: QueryKey, fetch: F) -> SourceResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&S) -> SourceResult<T>,
    {
        let key = key.to_string();
        let hit = self
            .store
            .read()
            .map_err(|e| SourceError::Cache(anyhow!("Cache lock poisoned: {e}")))?
            .get(&key)
            .inspect_err(|e| warn!(target: "cache", "Cache read for {key} failed: {e}"))?;
        if let Some(raw) = hit {
            trace!(target: "cache", "Cache hit for {key}");
            return Ok(serde_json::from_slice(&raw)?);
        }

        debug!(target: "cache", "Cache miss for {key}, fetching");
        let result = fetch(&self.inner)?;
        let raw = serde_json::to_vec(&result)?;
        self.store
            .write()
            .map_err(|e| SourceError::Cache(anyhow!("Cache lock poisoned: {e}")))?
            .set(&key, raw)?;
        Ok(result)
    }
}

impl<S: DataSource> DataSource for CachingDataSource<S> {
    fn block(&self, height: u64) -> SourceResult<ResultBlock> {
        self.cached(QueryKey::block_at(height), |s| s.block(height))
    }

    fn commit(&self, height: u64) -> SourceResult<ResultCommit> {
        self.cached(QueryKey::commit_at(height), |s| s.commit(height))
    }

    fn validators(
        &self,
        height: u64,
        page: usize,
        per_page: usize,
    ) -> SourceResult<ResultValidators> {
        self.cached(QueryKey::validators_at(height, page, per_page), |s| {
            s.validators(height, page, per_page)
        })
    }

    fn abci_query(
        &self,
        path: &str,
        data: &[u8],
        height: u64,
        prove: bool,
    ) -> SourceResult<ResultAbciQuery> {
        self.cached(QueryKey::abci_query_at(path, data, height, prove), |s| {
            s.abci_query(path, data, height, prove)
        })
    }
}
