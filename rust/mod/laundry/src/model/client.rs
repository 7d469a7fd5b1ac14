use serde::{Deserialize, Serialize};

/// Client: a laundry customer, identified by national id (cédula).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Counter-assigned primary key.
    pub id: u64,

    pub name: String,

    /// National identity number. Unique across clients.
    pub cedula: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Home branch (Branch.id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<u64>,

    /// Number of receptions registered for this client.
    #[serde(default)]
    pub total_services: u32,

    /// RFID codes of every garment ever received for this client.
    #[serde(default)]
    pub rfid_tags: Vec<String>,

    pub created_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Client {
    /// Case-insensitive match on name, cédula, phone or email.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&q)
            || self.cedula.to_lowercase().contains(&q)
            || self.phone.contains(&q)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&q))
    }
}

/// Input for registering a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub name: String,
    pub cedula: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub branch_id: Option<u64>,
}
