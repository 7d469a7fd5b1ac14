use serde::{Deserialize, Serialize};

use super::Priority;

/// Shop-wide settings, stored as a single object.
///
/// Missing fields fall back to their defaults, so settings written by an
/// older version still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub company_name: String,

    /// First segment of generated batch numbers.
    pub batch_prefix: String,

    /// First segment of simulated RFID codes.
    pub rfid_prefix: String,

    pub default_priority: Priority,

    /// Queue notifications on `listo` and delivery.
    pub notifications_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: "Lavandería".to_string(),
            batch_prefix: "LOTE".to_string(),
            rfid_prefix: "RFID".to_string(),
            default_priority: Priority::Normal,
            notifications_enabled: true,
        }
    }
}
