use std::fmt;
use std::str::FromStr;

use lavanderia_core::ServiceError;
use serde::{Deserialize, Serialize};

/// Wash-cycle status shared by garments and batches.
///
/// ```text
/// RECIBIDO → EN_PROCESO → LISTO → ENTREGADO
///                 ↑         │
///                 └─────────┘  (rework)
/// ```
///
/// Delivery of a batch is the one path that bypasses the table: it
/// force-sets every member garment to `Entregado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Recibido,
    EnProceso,
    Listo,
    Entregado,
}

impl Default for Status {
    fn default() -> Self {
        Self::Recibido
    }
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Recibido,
        Status::EnProceso,
        Status::Listo,
        Status::Entregado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recibido => "recibido",
            Self::EnProceso => "en_proceso",
            Self::Listo => "listo",
            Self::Entregado => "entregado",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Recibido => "Recibido",
            Self::EnProceso => "En proceso",
            Self::Listo => "Listo",
            Self::Entregado => "Entregado",
        }
    }

    /// The next stage in the happy path, if any.
    pub fn next(&self) -> Option<Status> {
        match self {
            Self::Recibido => Some(Self::EnProceso),
            Self::EnProceso => Some(Self::Listo),
            Self::Listo => Some(Self::Entregado),
            Self::Entregado => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Entregado)
    }

    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Self::Recibido, Self::EnProceso)
                | (Self::EnProceso, Self::Listo)
                | (Self::Listo, Self::Entregado)
                | (Self::Listo, Self::EnProceso)
        )
    }

    /// Check a transition, returning a validation error naming both states.
    pub fn check_transition(&self, next: Status) -> Result<(), ServiceError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ServiceError::Validation(format!(
                "illegal status transition {} -> {}",
                self, next
            )))
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recibido" => Ok(Self::Recibido),
            "en_proceso" => Ok(Self::EnProceso),
            "listo" => Ok(Self::Listo),
            "entregado" => Ok(Self::Entregado),
            other => Err(ServiceError::Validation(format!("unknown status '{}'", other))),
        }
    }
}

/// Per-status tally used by the reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub recibido: usize,
    pub en_proceso: usize,
    pub listo: usize,
    pub entregado: usize,
}

impl StatusCounts {
    pub fn tally(statuses: impl IntoIterator<Item = Status>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.add(status);
        }
        counts
    }

    pub fn add(&mut self, status: Status) {
        match status {
            Status::Recibido => self.recibido += 1,
            Status::EnProceso => self.en_proceso += 1,
            Status::Listo => self.listo += 1,
            Status::Entregado => self.entregado += 1,
        }
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Recibido => self.recibido,
            Status::EnProceso => self.en_proceso,
            Status::Listo => self.listo,
            Status::Entregado => self.entregado,
        }
    }

    pub fn total(&self) -> usize {
        self.recibido + self.en_proceso + self.listo + self.entregado
    }

    /// Everything not yet handed back to the client.
    pub fn pending(&self) -> usize {
        self.total() - self.entregado
    }
}
