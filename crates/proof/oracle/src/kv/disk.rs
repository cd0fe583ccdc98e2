//! Contains a concrete implementation of the [KeyValueStore] trait that stores data on disk
//! using [rocksdb].

use super::KeyValueStore;
use anyhow::{Result, anyhow};
use rocksdb::{DB, Options};
use std::path::PathBuf;

/// A simple, synchronous key-value store that stores data on disk. Entries persist across
/// runs, so a second run against the same directory is served entirely from disk.
#[derive(Debug)]
pub struct DiskKeyValueStore {
    data_directory: PathBuf,
    db: DB,
}

impl DiskKeyValueStore {
    /// Opens or creates a [DiskKeyValueStore] in the given data directory.
    pub fn new(data_directory: PathBuf) -> Result<Self> {
        let db = DB::open(&Self::get_db_options(), data_directory.as_path())
            .map_err(|e| anyhow!("Failed to open database at {data_directory:?}: {e}"))?;

        Ok(Self { data_directory, db })
    }

    /// Returns the directory the database lives in.
    pub fn data_directory(&self) -> &PathBuf {
        &self.data_directory
    }

    /// Gets the [Options] for the underlying RocksDB instance.
    fn get_db_options() -> Options {
        let mut options = Options::default();
        options.set_compression_type(rocksdb::DBCompressionType::Snappy);
        options.create_if_missing(true);
        options
    }
}

impl KeyValueStore for DiskKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.db.get(key.as_bytes()).map_err(|e| anyhow!("Failed to read {key} from disk: {e}"))
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.db
            .put(key.as_bytes(), value)
            .map_err(|e| anyhow!("Failed to write {key} to disk: {e}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = DiskKeyValueStore::new(dir.path().to_path_buf()).unwrap();
            store.set("block?height=5", b"cached".to_vec()).unwrap();
            assert_eq!(store.get("block?height=5").unwrap(), Some(b"cached".to_vec()));
        }

        let store = DiskKeyValueStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.get("block?height=5").unwrap(), Some(b"cached".to_vec()));
        assert_eq!(store.get("block?height=6").unwrap(), None);
    }
}
