//! This module contains the [KeyValueStore] trait and concrete implementations of it.

use anyhow::Result;
use std::sync::{Arc, RwLock};

mod mem;
pub use mem::MemoryKeyValueStore;

mod disk;
pub use disk::DiskKeyValueStore;

/// A type alias for a shared key-value store.
pub type SharedKeyValueStore = Arc<RwLock<dyn KeyValueStore + Send + Sync>>;

/// Describes the interface of a simple, synchronous key-value store.
pub trait KeyValueStore {
    /// Get the value associated with the given key. A missing key is `Ok(None)`, a failed read
    /// is an error.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set the value associated with the given key.
    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()>;
}
