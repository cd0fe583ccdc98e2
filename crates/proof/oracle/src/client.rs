//! Contains the [OracleClient], a typed view over an [Oracle].

use crate::{Oracle, OracleResult, QueryKey};
use keel_primitives::{
    ResultAbciQuery, ResultBlock, ResultConsensusParams, ResultValidators, abci::ResponseQuery,
};
use serde::de::DeserializeOwned;
use std::{fmt, sync::Arc};

/// Decodes the JSON envelopes returned by an [Oracle].
#[derive(Clone)]
pub struct OracleClient {
    oracle: Arc<dyn Oracle + Send + Sync>,
}

impl fmt::Debug for OracleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleClient").finish_non_exhaustive()
    }
}

impl OracleClient {
    /// Creates a new [OracleClient].
    pub fn new(oracle: Arc<dyn Oracle + Send + Sync>) -> Self {
        Self { oracle }
    }

    /// Returns the underlying oracle.
    pub fn oracle(&self) -> &Arc<dyn Oracle + Send + Sync> {
        &self.oracle
    }

    /// Fetches the anchor block.
    pub fn block(&self) -> OracleResult<ResultBlock> {
        self.fetch(&QueryKey::block())
    }

    /// Fetches the validator set that signed the anchor block's last commit.
    pub fn validators(&self) -> OracleResult<ResultValidators> {
        self.fetch(&QueryKey::validators())
    }

    /// Fetches the consensus parameters.
    pub fn consensus_params(&self) -> OracleResult<ResultConsensusParams> {
        self.fetch(&QueryKey::consensus_params())
    }

    /// Queries the state the anchor block executes on.
    pub fn abci_query(&self, path: &str, data: &[u8]) -> OracleResult<ResponseQuery> {
        self.fetch::<ResultAbciQuery>(&QueryKey::abci_query(path, data)).map(|r| r.response)
    }

    fn fetch<T: DeserializeOwned>(&self, key: &QueryKey) -> OracleResult<T> {
        let raw = self.oracle.get(key)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        OracleError, OracleConfig, RpcOracle,
        test_util::{Fixture, FixtureSource},
    };

    #[test]
    fn test_typed_reads() {
        let fixture = Fixture::new(8, 5);
        let source = FixtureSource::new(fixture.clone());
        let oracle = RpcOracle::new(fixture.anchor(), source, OracleConfig::default()).unwrap();
        let client = OracleClient::new(Arc::new(oracle));

        assert_eq!(client.block().unwrap().block, fixture.block);
        assert_eq!(client.validators().unwrap().count, 8);

        let (key, value) = &fixture.state[3];
        assert_eq!(&client.abci_query("/store/main/key", key).unwrap().value, value);

        assert!(matches!(client.consensus_params(), Err(OracleError::UnsupportedQuery(_))));
    }
}
