use serde::{Deserialize, Serialize};

use super::Status;

/// Batch priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Baja,
    Normal,
    Alta,
    Urgente,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Batch (lote): a client-scoped group of garments tracked through the
/// wash cycle as a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: u64,

    /// Display number, e.g. "LOTE-007-2025".
    pub batch_number: String,

    /// Owner (Client.id).
    pub client_id: u64,

    /// Member garments (Garment.id), in insertion order.
    #[serde(default)]
    pub garment_ids: Vec<u64>,

    /// Always `garment_ids.len()` after any batch operation.
    #[serde(default)]
    pub total_garments: u32,

    /// How many garments the client handed in for this batch.
    pub expected_garments: u32,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,

    /// Operator who confirmed the delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_by: Option<String>,
}

impl Batch {
    /// Format a batch number: `{prefix}-{id:03}-{year}`.
    pub fn format_number(prefix: &str, id: u64, year: i32) -> String {
        format!("{}-{:03}-{}", prefix, id, year)
    }

    /// All expected garments have been added. Derived from the counts,
    /// independent of `status`.
    pub fn is_complete(&self) -> bool {
        self.total_garments >= self.expected_garments
    }

    /// Garments still missing before the batch is complete.
    pub fn missing(&self) -> u32 {
        self.expected_garments.saturating_sub(self.total_garments)
    }

    pub fn contains(&self, garment_id: u64) -> bool {
        self.garment_ids.contains(&garment_id)
    }

    /// Recompute `total_garments` from the member list.
    pub(crate) fn sync_total(&mut self) {
        self.total_garments = self.garment_ids.len() as u32;
    }
}

/// Input for creating a batch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
    pub client_id: u64,
    pub expected_garments: u32,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Garments to place in the batch right away.
    #[serde(default)]
    pub garment_ids: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(total: u32, expected: u32) -> Batch {
        Batch {
            id: 7,
            batch_number: Batch::format_number("LOTE", 7, 2025),
            client_id: 1,
            garment_ids: (1..=total as u64).collect(),
            total_garments: total,
            expected_garments: expected,
            status: Status::Recibido,
            priority: Priority::Normal,
            notes: None,
            created_at: "2025-03-01T10:00:00+00:00".into(),
            updated_at: None,
            delivered_at: None,
            delivered_by: None,
        }
    }

    #[test]
    fn batch_number_format() {
        assert_eq!(Batch::format_number("LOTE", 7, 2025), "LOTE-007-2025");
        assert_eq!(Batch::format_number("LOTE", 1234, 2026), "LOTE-1234-2026");
    }

    #[test]
    fn completeness_is_derived() {
        let b = batch(1, 2);
        assert!(!b.is_complete());
        assert_eq!(b.missing(), 1);

        let b = batch(2, 2);
        assert!(b.is_complete());
        assert_eq!(b.missing(), 0);

        let b = batch(3, 2);
        assert!(b.is_complete());
        assert_eq!(b.missing(), 0);
    }

    #[test]
    fn batch_wire_format() {
        let json = serde_json::to_value(batch(1, 2)).unwrap();
        assert_eq!(json["batchNumber"], "LOTE-007-2025");
        assert_eq!(json["totalGarments"], 1);
        assert_eq!(json["expectedGarments"], 2);
        assert_eq!(json["priority"], "normal");
        let back: Batch = serde_json::from_value(json).unwrap();
        assert_eq!(back, batch(1, 2));
    }
}
