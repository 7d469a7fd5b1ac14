//! Collection store: whole-collection JSON documents over a `KVStore`.
//!
//! Each collection lives under one key, `{namespace}:{collection}`. Reads
//! are forgiving (absent or unparsable data yields the caller's default);
//! writes return errors.

use std::sync::Arc;

use lavanderia_core::ServiceError;
use lavanderia_kv::{KVError, KVStore};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::model::{Counters, Settings};

/// The persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Garments,
    Batches,
    History,
    Branches,
    Users,
    Notifications,
    Settings,
    Counters,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Clients,
        Collection::Garments,
        Collection::Batches,
        Collection::History,
        Collection::Branches,
        Collection::Users,
        Collection::Notifications,
        Collection::Settings,
        Collection::Counters,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Garments => "garments",
            Self::Batches => "batches",
            Self::History => "history",
            Self::Branches => "branches",
            Self::Users => "users",
            Self::Notifications => "notifications",
            Self::Settings => "settings",
            Self::Counters => "counters",
        }
    }
}

fn kv_err(e: KVError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

/// Serialize a value the way the store writes it.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(value).map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))
}

/// A set of collection writes committed together.
///
/// Putting the same collection twice keeps only the last value.
#[derive(Default)]
pub struct WriteBatch {
    entries: Vec<(Collection, Vec<u8>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Serialize>(&mut self, collection: Collection, value: &T) -> Result<&mut Self, ServiceError> {
        let bytes = encode(value)?;
        match self.entries.iter_mut().find(|(c, _)| *c == collection) {
            Some(entry) => entry.1 = bytes,
            None => self.entries.push((collection, bytes)),
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn collections(&self) -> impl Iterator<Item = Collection> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }
}

/// Typed access to the namespaced collections.
#[derive(Clone)]
pub struct CollectionStore {
    kv: Arc<dyn KVStore>,
    namespace: String,
}

impl CollectionStore {
    pub fn new(kv: Arc<dyn KVStore>, namespace: impl Into<String>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self, collection: Collection) -> String {
        format!("{}:{}", self.namespace, collection.name())
    }

    /// Read a collection, or `default` if it is absent or cannot be parsed.
    /// Failures are logged and never returned.
    pub fn get<T: DeserializeOwned>(&self, collection: Collection, default: T) -> T {
        let key = self.key(collection);
        match self.kv.get(&key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    warn!("store: cannot parse {}: {}, using default", key, e);
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                error!("store: read {} failed: {}, using default", key, e);
                default
            }
        }
    }

    /// Read a list collection, empty if absent.
    pub fn list<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        self.get(collection, Vec::new())
    }

    pub fn counters(&self) -> Counters {
        self.get(Collection::Counters, Counters::default())
    }

    pub fn settings(&self) -> Settings {
        self.get(Collection::Settings, Settings::default())
    }

    /// Whether anything is stored for this collection.
    pub fn contains(&self, collection: Collection) -> Result<bool, ServiceError> {
        Ok(self.kv.get(&self.key(collection)).map_err(kv_err)?.is_some())
    }

    /// Write one collection.
    pub fn set<T: Serialize>(&self, collection: Collection, value: &T) -> Result<(), ServiceError> {
        let key = self.key(collection);
        let bytes = encode(value)?;
        self.kv.set(&key, &bytes).map_err(|e| {
            error!("store: write {} failed: {}", key, e);
            kv_err(e)
        })?;
        debug!("store: wrote {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    /// Write every collection in `batch` in one backend batch.
    pub fn commit(&self, batch: WriteBatch) -> Result<(), ServiceError> {
        if batch.is_empty() {
            return Ok(());
        }
        let keyed: Vec<(String, Vec<u8>)> = batch
            .entries
            .into_iter()
            .map(|(c, bytes)| (self.key(c), bytes))
            .collect();
        let entries: Vec<(&str, &[u8])> = keyed
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect();

        self.kv.batch_set(&entries).map_err(|e| {
            error!("store: batch write of {} keys failed: {}", entries.len(), e);
            kv_err(e)
        })?;
        debug!(
            "store: committed {}",
            keyed.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>().join(", ")
        );
        Ok(())
    }

    /// Remove a collection entirely.
    pub fn clear(&self, collection: Collection) -> Result<(), ServiceError> {
        self.kv.delete(&self.key(collection)).map_err(kv_err)
    }
}
