//! Contains the [QueryKey] type, the logical key the [crate::Oracle] read interface is keyed on.

use crate::KeyError;
use alloy_primitives::hex;
use core::{fmt, str::FromStr};
use url::form_urlencoded;

/// The query paths understood by the oracles and data sources.
pub mod paths {
    /// The anchor block.
    pub const BLOCK: &str = "block";
    /// A commit.
    pub const COMMIT: &str = "commit";
    /// The validator set.
    pub const VALIDATORS: &str = "validators";
    /// The consensus parameters.
    pub const CONSENSUS_PARAMS: &str = "consensus_params";
    /// A raw state query.
    pub const ABCI_QUERY: &str = "abci_query";
}

/// A logical key: a path plus ordered query parameters.
///
/// The canonical string form is `path?k1=v1&k2=v2`, with parameters form-urlencoded in
/// insertion order. Byte payloads are hex encoded, so identical logical queries always map to
/// the same string and distinct queries never collide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryKey {
    path: String,
    params: Vec<(String, String)>,
}

impl QueryKey {
    /// Creates a key for `path` without parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), params: Vec::new() }
    }

    /// Appends a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// The key of the verified anchor block.
    pub fn block() -> Self {
        Self::new(paths::BLOCK)
    }

    /// The key of the verified validator set.
    pub fn validators() -> Self {
        Self::new(paths::VALIDATORS)
    }

    /// The key of the consensus parameters.
    pub fn consensus_params() -> Self {
        Self::new(paths::CONSENSUS_PARAMS)
    }

    /// The key of a state query against `path`. The oracle picks the height and proof flag.
    pub fn abci_query(path: &str, data: &[u8]) -> Self {
        Self::new(paths::ABCI_QUERY).with_param("path", path).with_param("data", hex::encode(data))
    }

    /// The canonical key of a block fetch at `height`.
    pub fn block_at(height: u64) -> Self {
        Self::new(paths::BLOCK).with_param("height", height)
    }

    /// The canonical key of a commit fetch at `height`.
    pub fn commit_at(height: u64) -> Self {
        Self::new(paths::COMMIT).with_param("height", height)
    }

    /// The canonical key of a validator page fetch.
    pub fn validators_at(height: u64, page: usize, per_page: usize) -> Self {
        Self::new(paths::VALIDATORS)
            .with_param("height", height)
            .with_param("page", page)
            .with_param("per_page", per_page)
    }

    /// The canonical key of a state query fetch.
    pub fn abci_query_at(path: &str, data: &[u8], height: u64, prove: bool) -> Self {
        Self::abci_query(path, data).with_param("height", height).with_param("prove", prove)
    }

    /// Returns the key's path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the first value of the parameter `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Returns the value of the required parameter `name`.
    pub fn required(&self, name: &'static str) -> Result<&str, KeyError> {
        self.param(name)
            .ok_or_else(|| KeyError::MissingParam { key: self.to_string(), param: name })
    }

    /// Parses the value of the required parameter `name`.
    pub fn parse<T: FromStr>(&self, name: &'static str) -> Result<T, KeyError> {
        self.required(name)?
            .parse()
            .map_err(|_| KeyError::InvalidParam { key: self.to_string(), param: name })
    }

    /// Decodes the hex encoded, required parameter `name`.
    pub fn bytes(&self, name: &'static str) -> Result<Vec<u8>, KeyError> {
        hex::decode(self.required(name)?)
            .map_err(|_| KeyError::InvalidParam { key: self.to_string(), param: name })
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.params.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.params.iter())
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

impl FromStr for QueryKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, query) = s.split_once('?').unwrap_or((s, ""));
        if path.is_empty() {
            return Err(KeyError::EmptyPath);
        }
        let params = form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        Ok(Self { path: path.to_string(), params })
    }
}
