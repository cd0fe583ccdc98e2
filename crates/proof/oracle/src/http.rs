//! Contains the [HttpDataSource], a [DataSource] backed by a node's JSON-RPC endpoint.

use crate::{DataSource, SourceError, SourceResult};
use alloy_primitives::hex;
use keel_primitives::{ResultAbciQuery, ResultBlock, ResultCommit, ResultValidators};
use reqwest::blocking::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::sync::atomic::{self, AtomicUsize};
use tracing::{debug, warn};
use url::Url;

/// A JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

impl<T> RpcResponse<T> {
    /// Unwraps the result, or turns the error object into a [SourceError::Rpc].
    fn into_result(self, method: &str) -> SourceResult<T> {
        match (self.result, self.error) {
            (Some(result), _) => Ok(result),
            (None, Some(error)) => {
                warn!(
                    target: "oracle",
                    code = error.code,
                    data = ?error.data,
                    "RPC call {method} failed: {}",
                    error.message
                );
                Err(SourceError::Rpc { code: error.code, message: error.message })
            }
            (None, None) => Err(SourceError::EmptyResponse(method.to_string())),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// A [DataSource] that issues JSON-RPC 2.0 requests over HTTP. Requests are blocking and issued
/// one at a time.
#[derive(Debug)]
pub struct HttpDataSource {
    endpoint: Url,
    http_client: Client,
    id: AtomicUsize,
}

impl HttpDataSource {
    /// Creates a new [HttpDataSource] for the given endpoint.
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(endpoint, Client::new())
    }

    /// Creates a new [HttpDataSource] with a preconfigured HTTP client.
    pub const fn with_client(endpoint: Url, http_client: Client) -> Self {
        Self { endpoint, http_client, id: AtomicUsize::new(0) }
    }

    /// Returns the endpoint of the source.
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the next id for the request
    fn next_request_id(&self) -> usize {
        self.id.fetch_add(1, atomic::Ordering::SeqCst)
    }

    /// Calls `method` with named `params` and decodes its result.
    fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> SourceResult<T> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_request_id()
        });
        debug!(target: "oracle", "Calling {method} with {params}");

        let response: RpcResponse<T> = self
            .http_client
            .post(self.endpoint.clone())
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        response.into_result(method)
    }
}

impl DataSource for HttpDataSource {
    fn block(&self, height: u64) -> SourceResult<ResultBlock> {
        self.call("block", json!({ "height": height.to_string() }))
    }

    fn commit(&self, height: u64) -> SourceResult<ResultCommit> {
        self.call("commit", json!({ "height": height.to_string() }))
    }

    fn validators(
        &self,
        height: u64,
        page: usize,
        per_page: usize,
    ) -> SourceResult<ResultValidators> {
        self.call(
            "validators",
            json!({
                "height": height.to_string(),
                "page": page.to_string(),
                "per_page": per_page.to_string(),
            }),
        )
    }

    fn abci_query(
        &self,
        path: &str,
        data: &[u8],
        height: u64,
        prove: bool,
    ) -> SourceResult<ResultAbciQuery> {
        self.call(
            "abci_query",
            json!({
                "path": path,
                "data": hex::encode(data),
                "height": height.to_string(),
                "prove": prove,
            }),
        )
    }
}
