//! Contains the [TrustAnchor] type.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// The trusted `(height, hash)` pair all verification is rooted in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrustAnchor {
    /// The trusted block height. Must be at least 1.
    pub height: u64,
    /// The trusted block hash.
    pub hash: B256,
}

impl TrustAnchor {
    /// Creates a new [TrustAnchor].
    pub const fn new(height: u64, hash: B256) -> Self {
        Self { height, hash }
    }
}
