//! Contains the [Tx] type, the transaction format of the test application.

use crate::TxError;
use alloy_primitives::Bytes;
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};

/// A single-message transaction against the key/value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tx {
    /// Sets `key` to `value`.
    Set {
        /// The key.
        key: Bytes,
        /// The value. Must not be empty.
        value: Bytes,
    },
    /// Reads `key`, returning its value as the result data.
    Get {
        /// The key.
        key: Bytes,
    },
    /// Removes `key`. Removing a missing key is a no-op.
    Remove {
        /// The key.
        key: Bytes,
    },
}

/// The wire form of a [Tx]: `rlp([kind, key, value])`.
#[derive(RlpEncodable, RlpDecodable)]
struct RawTx {
    kind: u8,
    key: Bytes,
    value: Bytes,
}

impl Tx {
    const SET: u8 = 1;
    const GET: u8 = 2;
    const REMOVE: u8 = 3;

    /// Creates a `Set` transaction.
    pub fn set(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self::Set { key: key.into(), value: value.into() }
    }

    /// Creates a `Get` transaction.
    pub fn get(key: impl Into<Bytes>) -> Self {
        Self::Get { key: key.into() }
    }

    /// Creates a `Remove` transaction.
    pub fn remove(key: impl Into<Bytes>) -> Self {
        Self::Remove { key: key.into() }
    }

    /// Returns the key the transaction touches.
    pub const fn key(&self) -> &Bytes {
        match self {
            Self::Set { key, .. } | Self::Get { key } | Self::Remove { key } => key,
        }
    }

    /// Returns the encoded transaction.
    pub fn encoded(&self) -> Bytes {
        let raw = self.raw();
        let mut buf = Vec::with_capacity(raw.length());
        raw.encode(&mut buf);
        buf.into()
    }

    /// Decodes a transaction, rejecting trailing bytes and malformed messages.
    pub fn decode_exact(mut buf: &[u8]) -> Result<Self, TxError> {
        let RawTx { kind, key, value } = RawTx::decode(&mut buf)?;
        if !buf.is_empty() {
            return Err(TxError::TrailingBytes(buf.len()));
        }
        if key.is_empty() {
            return Err(TxError::EmptyKey);
        }
        match kind {
            Self::SET if value.is_empty() => Err(TxError::EmptyValue),
            Self::SET => Ok(Self::Set { key, value }),
            Self::GET | Self::REMOVE if !value.is_empty() => Err(TxError::UnexpectedValue(kind)),
            Self::GET => Ok(Self::Get { key }),
            Self::REMOVE => Ok(Self::Remove { key }),
            _ => Err(TxError::UnknownKind(kind)),
        }
    }

    fn raw(&self) -> RawTx {
        match self {
            Self::Set { key, value } => {
                RawTx { kind: Self::SET, key: key.clone(), value: value.clone() }
            }
            Self::Get { key } => RawTx { kind: Self::GET, key: key.clone(), value: Bytes::new() },
            Self::Remove { key } => {
                RawTx { kind: Self::REMOVE, key: key.clone(), value: Bytes::new() }
            }
        }
    }
}
