pub mod backup;
pub mod batch;
pub mod client;
pub mod delivery;
pub mod garment;
pub mod history;
pub mod integrity;
pub mod notification;
pub mod reception;
pub mod reports;
pub mod shop;

use std::sync::Arc;

use lavanderia_core::{now_rfc3339, shallow_merge, ServiceConfig, ServiceError};
use lavanderia_kv::{KVStore, MemoryStore, RedbStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::model::{
    Counters, HistoryEntry, Identified, NewHistoryEntry, NewNotification, Notification,
};
use crate::store::{Collection, CollectionStore, WriteBatch};

/// Laundry service: owns the collection store and implements every
/// registry, workflow and report operation.
///
/// Each operation reads the collections it needs, mutates them in memory
/// and writes them back in a single batch.
pub struct LaundryService {
    pub(crate) store: CollectionStore,
    operator: String,
}

impl LaundryService {
    pub fn new(kv: Arc<dyn KVStore>, config: &ServiceConfig) -> Self {
        Self {
            store: CollectionStore::new(kv, config.namespace.clone()),
            operator: config.operator.clone(),
        }
    }

    /// Open the on-disk store described by `config`.
    pub fn open(config: &ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let path = config.resolve_db_path();
        let kv = RedbStore::open(&path)
            .map_err(|e| ServiceError::Storage(format!("open {}: {}", path.display(), e)))?;
        info!("laundry store opened at {}", path.display());
        Ok(Self::new(Arc::new(kv), config))
    }

    /// A service over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), &ServiceConfig::default())
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Operator recorded when a caller passes an empty name.
    pub fn default_operator(&self) -> &str {
        &self.operator
    }

    pub(crate) fn operator_or(&self, operator: &str) -> String {
        let operator = operator.trim();
        if operator.is_empty() {
            self.operator.clone()
        } else {
            operator.to_string()
        }
    }

    pub(crate) fn begin(&self) -> UnitOfWork<'_> {
        UnitOfWork {
            store: &self.store,
            counters: self.store.counters(),
            history: None,
            notifications: None,
            writes: WriteBatch::new(),
            now: now_rfc3339(),
        }
    }

    /// Shallow-merge a JSON patch into a record. `protected` keys are kept.
    pub(crate) fn apply_patch<T: Serialize + DeserializeOwned>(
        current: &T,
        patch: &serde_json::Value,
        protected: &[&str],
    ) -> Result<T, ServiceError> {
        if !patch.is_object() {
            return Err(ServiceError::Validation("patch must be a JSON object".into()));
        }
        let mut json = serde_json::to_value(current)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        shallow_merge(&mut json, patch, protected);
        serde_json::from_value(json)
            .map_err(|e| ServiceError::Validation(format!("invalid patch: {}", e)))
    }
}

/// Index of the record with `id`.
pub(crate) fn position<T: Identified>(records: &[T], id: u64) -> Option<usize> {
    records.iter().position(|r| r.id() == id)
}

pub(crate) fn not_found(kind: &str, id: u64) -> ServiceError {
    ServiceError::NotFound(format!("{} {} not found", kind, id))
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Changes accumulated by one operation.
///
/// History and notifications are loaded on first use, so several entries
/// appended during the same operation all land. Counters are always
/// written back on commit.
pub(crate) struct UnitOfWork<'s> {
    store: &'s CollectionStore,
    pub counters: Counters,
    history: Option<Vec<HistoryEntry>>,
    notifications: Option<Vec<Notification>>,
    writes: WriteBatch,
    pub now: String,
}

impl UnitOfWork<'_> {
    pub fn put<T: Serialize>(&mut self, collection: Collection, value: &T) -> Result<(), ServiceError> {
        self.writes.put(collection, value)?;
        Ok(())
    }

    /// Append a history entry, newest first.
    pub fn record(&mut self, entry: NewHistoryEntry) -> HistoryEntry {
        let store = self.store;
        let history = self
            .history
            .get_or_insert_with(|| store.list(Collection::History));
        let id = Counters::assign(&mut self.counters.history, crate::model::max_id(history));
        let entry = HistoryEntry {
            id,
            client_id: entry.client_id,
            garment_ids: entry.garment_ids,
            action: entry.action,
            operator: entry.operator,
            details: entry.details,
            timestamp: self.now.clone(),
        };
        history.insert(0, entry.clone());
        entry
    }

    /// Queue a notification, newest first.
    pub fn notify(&mut self, input: NewNotification) -> Notification {
        let store = self.store;
        let notifications = self
            .notifications
            .get_or_insert_with(|| store.list(Collection::Notifications));
        let id = Counters::assign(
            &mut self.counters.notifications,
            crate::model::max_id(notifications),
        );
        let notification = Notification {
            id,
            kind: input.kind,
            message: input.message,
            client_id: input.client_id,
            batch_id: input.batch_id,
            read: false,
            created_at: self.now.clone(),
        };
        notifications.insert(0, notification.clone());
        notification
    }

    pub fn commit(mut self) -> Result<(), ServiceError> {
        if let Some(history) = self.history.take() {
            self.writes.put(Collection::History, &history)?;
        }
        if let Some(notifications) = self.notifications.take() {
            self.writes.put(Collection::Notifications, &notifications)?;
        }
        self.writes.put(Collection::Counters, &self.counters)?;
        self.store.commit(self.writes)
    }
}
