use lavanderia_core::{now_rfc3339, ServiceError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{Batch, Client, Counters, Garment, HistoryEntry, Settings};
use crate::store::{Collection, WriteBatch};
use super::LaundryService;

/// Backup document. On import every key is optional; present keys
/// overwrite the matching collection verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<Client>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub garments: Option<Vec<Garment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batches: Option<Vec<Batch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<Counters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<String>,
}

impl LaundryService {
    /// Snapshot of every backed-up collection.
    pub fn export_backup(&self) -> Backup {
        Backup {
            clients: Some(self.get_clients()),
            garments: Some(self.get_garments()),
            batches: Some(self.get_batches()),
            history: Some(self.get_history()),
            settings: Some(self.get_settings()),
            counters: Some(self.get_counters()),
            export_date: Some(now_rfc3339()),
        }
    }

    pub fn export_backup_json(&self) -> Result<String, ServiceError> {
        serde_json::to_string_pretty(&self.export_backup())
            .map_err(|e| ServiceError::Internal(format!("serialize backup: {}", e)))
    }

    /// Overwrite the collections present in `json`, all in one write.
    /// Returns the collections that were replaced. Counters are taken as
    /// given; run [`LaundryService::fix_counters`] afterwards if unsure.
    pub fn import_backup(&self, json: &str) -> Result<Vec<Collection>, ServiceError> {
        let backup: Backup = serde_json::from_str(json)
            .map_err(|e| ServiceError::Validation(format!("invalid backup: {}", e)))?;

        let mut batch = WriteBatch::new();
        if let Some(clients) = &backup.clients {
            batch.put(Collection::Clients, clients)?;
        }
        if let Some(garments) = &backup.garments {
            batch.put(Collection::Garments, garments)?;
        }
        if let Some(batches) = &backup.batches {
            batch.put(Collection::Batches, batches)?;
        }
        if let Some(history) = &backup.history {
            batch.put(Collection::History, history)?;
        }
        if let Some(settings) = &backup.settings {
            batch.put(Collection::Settings, settings)?;
        }
        if let Some(counters) = &backup.counters {
            batch.put(Collection::Counters, counters)?;
        }

        let imported: Vec<Collection> = batch.collections().collect();
        self.store.commit(batch)?;
        info!(
            "backup imported ({}), exported at {}",
            imported.iter().map(Collection::name).collect::<Vec<_>>().join(", "),
            backup.export_date.as_deref().unwrap_or("unknown")
        );
        Ok(imported)
    }
}
