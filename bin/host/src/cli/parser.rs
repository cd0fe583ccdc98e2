//! Parser functions for CLI arguments.

use alloy_primitives::B256;
use std::str::FromStr;

/// Parse a string slice into [B256]. The `0x` prefix is optional.
pub(crate) fn parse_b256(s: &str) -> Result<B256, String> {
    B256::from_str(s).map_err(|_| format!("Invalid B256 value: {s}"))
}
