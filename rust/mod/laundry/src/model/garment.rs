use serde::{Deserialize, Serialize};

use super::Status;

/// Garment: one physical item received for washing, tagged with an RFID code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Garment {
    pub id: u64,

    /// Tag code, e.g. `RFID-00A1F3C2`.
    pub rfid_code: String,

    /// Owner (Client.id).
    pub client_id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<u64>,

    /// Garment kind: camisa, pantalón, vestido...
    #[serde(rename = "type")]
    pub garment_type: String,

    #[serde(default)]
    pub color: String,

    #[serde(default)]
    pub size: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub status: Status,

    pub received_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,

    /// Batch this garment is grouped in (Batch.id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<u64>,
}

impl Garment {
    /// Move to `status` and stamp the matching timestamp.
    /// The caller is responsible for checking the transition.
    pub(crate) fn set_status(&mut self, status: Status, now: &str) {
        self.status = status;
        match status {
            Status::Recibido => {}
            Status::EnProceso => {
                if self.processed_at.is_none() {
                    self.processed_at = Some(now.to_string());
                }
            }
            Status::Listo => self.ready_at = Some(now.to_string()),
            Status::Entregado => {
                if self.delivered_at.is_none() {
                    self.delivered_at = Some(now.to_string());
                }
            }
        }
    }

    /// Still in the shop (not yet handed back).
    pub fn is_active(&self) -> bool {
        self.status != Status::Entregado
    }
}

/// Input for receiving a garment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentInput {
    /// Scanned tag. A code is generated when absent.
    #[serde(default)]
    pub rfid_code: Option<String>,

    #[serde(rename = "type")]
    pub garment_type: String,

    #[serde(default)]
    pub color: String,

    #[serde(default)]
    pub size: String,

    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn garment() -> Garment {
        Garment {
            id: 4,
            rfid_code: "RFID-0000BEEF".into(),
            client_id: 1,
            branch_id: None,
            garment_type: "camisa".into(),
            color: "azul".into(),
            size: "M".into(),
            description: None,
            status: Status::Recibido,
            received_at: "2025-01-10T09:00:00+00:00".into(),
            processed_at: None,
            ready_at: None,
            delivered_at: None,
            batch_id: None,
        }
    }

    #[test]
    fn garment_wire_format() {
        let json = serde_json::to_value(garment()).unwrap();
        assert_eq!(json["type"], "camisa");
        assert_eq!(json["rfidCode"], "RFID-0000BEEF");
        assert_eq!(json["status"], "recibido");
        assert!(json.get("batchId").is_none());
    }

    #[test]
    fn set_status_stamps_timestamps() {
        let mut g = garment();
        g.set_status(Status::EnProceso, "t1");
        assert_eq!(g.processed_at.as_deref(), Some("t1"));
        g.set_status(Status::Listo, "t2");
        g.set_status(Status::EnProceso, "t3");
        // Rework keeps the first processing time.
        assert_eq!(g.processed_at.as_deref(), Some("t1"));
        g.set_status(Status::Listo, "t4");
        assert_eq!(g.ready_at.as_deref(), Some("t4"));
        g.set_status(Status::Entregado, "t5");
        assert_eq!(g.delivered_at.as_deref(), Some("t5"));
        assert!(!g.is_active());
    }
}
