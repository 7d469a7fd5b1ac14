use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A batch reached `listo` and can be picked up.
    LoteListo,
    /// A single garment reached `listo`.
    PrendaLista,
    /// A batch was handed back to the client.
    Entrega,
    Sistema,
}

/// Notification: a queued message for staff or the client. Only stored;
/// nothing here sends it anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<u64>,
    #[serde(default)]
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub message: String,
    pub client_id: Option<u64>,
    pub batch_id: Option<u64>,
}
