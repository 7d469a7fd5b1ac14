use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, Table, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn storage_err(e: impl Display) -> KVError {
    KVError::Storage(e.to_string())
}

/// RedbStore is a KVStore backed by redb, a pure-Rust embedded key-value
/// database. Every write is its own transaction; `batch_set` and
/// `batch_delete` commit all entries in a single transaction.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_err)?;
            }
        }
        let db = Database::create(path).map_err(storage_err)?;
        let store = Self { db: Arc::new(db) };

        // Ensure the table exists so that reads on a fresh file succeed.
        store.write(|_table| Ok(()))?;
        debug!("RedbStore: opened {}", path.display());
        Ok(store)
    }

    /// Run `f` inside one write transaction and commit it.
    fn write<F>(&self, f: F) -> Result<(), KVError>
    where
        F: FnOnce(&mut Table<'_, &'static str, &'static [u8]>) -> Result<(), KVError>,
    {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(storage_err)?;
            f(&mut table)?;
        }
        write_txn.commit().map_err(storage_err)
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(TABLE).map_err(storage_err)?;
        let value = table.get(key).map_err(storage_err)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.write(|table| {
            table.insert(key, value).map_err(storage_err)?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.write(|table| {
            table.remove(key).map_err(storage_err)?;
            Ok(())
        })
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError> {
        self.write(|table| {
            for (key, value) in entries {
                table.insert(*key, *value).map_err(storage_err)?;
            }
            Ok(())
        })
    }

    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError> {
        self.write(|table| {
            for key in keys {
                table.remove(*key).map_err(storage_err)?;
            }
            Ok(())
        })
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(TABLE).map_err(storage_err)?;

        let mut results = Vec::new();
        for entry in table.range(prefix..).map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            let key = key.value().to_string();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key, value.value().to_vec()));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tmp() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn set_get_delete() {
        let (store, _dir) = open_tmp();
        assert!(store.get("laundry:clients").unwrap().is_none());

        store.set("laundry:clients", b"[]").unwrap();
        assert_eq!(store.get("laundry:clients").unwrap(), Some(b"[]".to_vec()));

        store.set("laundry:clients", b"[1]").unwrap();
        assert_eq!(store.get("laundry:clients").unwrap(), Some(b"[1]".to_vec()));

        store.delete("laundry:clients").unwrap();
        assert!(store.get("laundry:clients").unwrap().is_none());

        // Deleting again is fine.
        store.delete("laundry:clients").unwrap();
    }

    #[test]
    fn batch_set_writes_all_entries() {
        let (store, _dir) = open_tmp();
        store
            .batch_set(&[("laundry:batches", &b"[]"[..]), ("laundry:counters", &b"{}"[..])])
            .unwrap();
        assert!(store.get("laundry:batches").unwrap().is_some());
        assert!(store.get("laundry:counters").unwrap().is_some());

        store
            .batch_delete(&["laundry:batches", "laundry:counters"])
            .unwrap();
        assert!(store.get("laundry:batches").unwrap().is_none());
        assert!(store.get("laundry:counters").unwrap().is_none());
    }

    #[test]
    fn scan_respects_prefix() {
        let (store, _dir) = open_tmp();
        store.set("a:1", b"x").unwrap();
        store.set("laundry:clients", b"c").unwrap();
        store.set("laundry:garments", b"g").unwrap();
        store.set("other:clients", b"o").unwrap();

        let keys: Vec<String> = store
            .scan("laundry:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["laundry:clients", "laundry:garments"]);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("laundry:settings", b"{}").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("laundry:settings").unwrap(), Some(b"{}".to_vec()));
    }
}
