use chrono::NaiveDate;
use lavanderia_core::parse_rfc3339;
use serde::{Deserialize, Serialize};

/// What happened, as recorded in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    ClienteCreado,
    ClienteActualizado,
    Recepcion,
    CambioEstado,
    LoteCreado,
    LoteActualizado,
    LoteEliminado,
    PrendaAgregadaLote,
    PrendaRemovidaLote,
    Entrega,
}

impl HistoryAction {
    /// Label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClienteCreado => "Cliente creado",
            Self::ClienteActualizado => "Cliente actualizado",
            Self::Recepcion => "Recepción",
            Self::CambioEstado => "Cambio de estado",
            Self::LoteCreado => "Lote creado",
            Self::LoteActualizado => "Lote actualizado",
            Self::LoteEliminado => "Lote eliminado",
            Self::PrendaAgregadaLote => "Prenda agregada a lote",
            Self::PrendaRemovidaLote => "Prenda removida de lote",
            Self::Entrega => "Entrega",
        }
    }
}

/// One line of the append-only history log. Stored newest-first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: u64,

    /// Client the action concerns (Client.id, not enforced).
    pub client_id: u64,

    #[serde(default)]
    pub garment_ids: Vec<u64>,

    pub action: HistoryAction,

    pub operator: String,

    #[serde(default)]
    pub details: String,

    pub timestamp: String,
}

impl HistoryEntry {
    pub fn date(&self) -> Option<NaiveDate> {
        parse_rfc3339(&self.timestamp).map(|dt| dt.date_naive())
    }
}

/// Input for appending a history entry.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub client_id: u64,
    pub garment_ids: Vec<u64>,
    pub action: HistoryAction,
    pub operator: String,
    pub details: String,
}

/// History query. Every set field must match; dates are inclusive and
/// compared on the UTC calendar day of the entry.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub client_id: Option<u64>,
    pub action: Option<HistoryAction>,
    pub operator: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if self.client_id.is_some_and(|id| id != entry.client_id) {
            return false;
        }
        if self.action.is_some_and(|a| a != entry.action) {
            return false;
        }
        if let Some(ref op) = self.operator {
            if !entry.operator.eq_ignore_ascii_case(op) {
                return false;
            }
        }
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        let Some(date) = entry.date() else {
            return false;
        };
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}
