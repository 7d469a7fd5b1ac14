use crate::error::KVError;

/// KVStore provides a byte-oriented key-value storage interface.
///
/// Keys follow a namespaced convention: `laundry:clients`, `laundry:counters`, etc.
/// Values are opaque bytes; callers decide the encoding (JSON for the laundry store).
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Set several keys at once. Backends with transactions apply all
    /// entries or none; the default falls back to sequential writes.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Delete several keys at once. Same atomicity rules as `batch_set`.
    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}
