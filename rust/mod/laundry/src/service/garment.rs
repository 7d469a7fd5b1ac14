use lavanderia_core::ServiceError;

use crate::model::{
    Client, Counters, Garment, GarmentInput, HistoryAction, NewHistoryEntry, NewNotification,
    NotificationKind, Status, max_id,
};
use crate::rfid::RfidScanner;
use crate::store::Collection;
use super::{not_found, position, require_text, LaundryService, UnitOfWork};

/// Attempts at drawing an unused simulated tag before giving up.
const SCAN_ATTEMPTS: usize = 32;

/// Fields owned by the workflow; a garment edit never touches them.
const PROTECTED: &[&str] = &[
    "id",
    "rfidCode",
    "clientId",
    "receivedAt",
    "processedAt",
    "readyAt",
    "deliveredAt",
    "batchId",
    "status",
];

/// Draw a tag code not carried by any garment still in the shop.
pub(crate) fn unique_code(garments: &[Garment], prefix: &str) -> Result<String, ServiceError> {
    for _ in 0..SCAN_ATTEMPTS {
        let code = RfidScanner::generate_code(prefix);
        if !garments.iter().any(|g| g.is_active() && g.rfid_code == code) {
            return Ok(code);
        }
    }
    Err(ServiceError::Internal(format!(
        "no free RFID code after {} attempts",
        SCAN_ATTEMPTS
    )))
}

impl LaundryService {
    pub fn get_garments(&self) -> Vec<Garment> {
        self.store.list(Collection::Garments)
    }

    pub fn get_garment(&self, id: u64) -> Option<Garment> {
        self.get_garments().into_iter().find(|g| g.id == id)
    }

    /// Garment carrying `code`. A garment still in the shop wins over an
    /// older delivered one that reused the tag.
    pub fn get_garment_by_rfid(&self, code: &str) -> Option<Garment> {
        let code = RfidScanner::normalize(code);
        self.get_garments()
            .into_iter()
            .filter(|g| g.rfid_code == code)
            .max_by_key(|g| (g.is_active(), g.id))
    }

    pub fn get_garments_by_client(&self, client_id: u64) -> Vec<Garment> {
        self.get_garments()
            .into_iter()
            .filter(|g| g.client_id == client_id)
            .collect()
    }

    pub fn get_garments_by_status(&self, status: Status) -> Vec<Garment> {
        self.get_garments()
            .into_iter()
            .filter(|g| g.status == status)
            .collect()
    }

    /// Simulate an RFID scan: a fresh code unused by garments in the shop.
    pub fn scan_rfid(&self) -> Result<String, ServiceError> {
        let prefix = self.store.settings().rfid_prefix;
        unique_code(&self.get_garments(), &prefix)
    }

    /// Receive one garment for `client_id`. Its tag is appended to the
    /// client's `rfidTags`.
    pub fn add_garment(&self, client_id: u64, input: GarmentInput) -> Result<Garment, ServiceError> {
        let mut clients: Vec<Client> = self.store.list(Collection::Clients);
        let client_idx = position(&clients, client_id).ok_or_else(|| not_found("client", client_id))?;
        let mut garments = self.get_garments();
        let prefix = self.store.settings().rfid_prefix;

        let mut uow = self.begin();
        let garment = new_garment(&mut uow, &mut garments, &mut clients[client_idx], input, &prefix)?;
        uow.put(Collection::Garments, &garments)?;
        uow.put(Collection::Clients, &clients)?;
        uow.commit()?;
        Ok(garment)
    }

    /// Shallow-merge descriptive fields (type, color, size, description,
    /// branchId). A `status` in the patch goes through the transition table,
    /// so repeating the current status is rejected.
    pub fn update_garment(&self, id: u64, patch: serde_json::Value) -> Result<Garment, ServiceError> {
        let next_status = match patch.get("status") {
            Some(v) => Some(
                serde_json::from_value::<Status>(v.clone())
                    .map_err(|e| ServiceError::Validation(format!("invalid status: {}", e)))?,
            ),
            None => None,
        };

        let mut garments = self.get_garments();
        let idx = position(&garments, id).ok_or_else(|| not_found("garment", id))?;
        let mut updated: Garment = Self::apply_patch(&garments[idx], &patch, PROTECTED)?;
        require_text("type", &updated.garment_type)?;

        let notify = self.store.settings().notifications_enabled;
        let mut uow = self.begin();
        if let Some(next) = next_status {
            change_status(&mut uow, &mut updated, next, self.default_operator(), notify)?;
        }
        garments[idx] = updated.clone();
        uow.put(Collection::Garments, &garments)?;
        uow.commit()?;
        Ok(updated)
    }

    /// Move a garment to `next` (control screen). Illegal transitions are
    /// rejected; see [`Status::can_transition_to`].
    pub fn update_garment_status(
        &self,
        id: u64,
        next: Status,
        operator: &str,
    ) -> Result<Garment, ServiceError> {
        let mut garments = self.get_garments();
        let idx = position(&garments, id).ok_or_else(|| not_found("garment", id))?;
        let notify = self.store.settings().notifications_enabled;

        let mut uow = self.begin();
        let operator = self.operator_or(operator);
        change_status(&mut uow, &mut garments[idx], next, &operator, notify)?;
        let garment = garments[idx].clone();
        uow.put(Collection::Garments, &garments)?;
        uow.commit()?;
        Ok(garment)
    }
}

/// Build a garment, register its tag on the client and append it.
pub(crate) fn new_garment(
    uow: &mut UnitOfWork<'_>,
    garments: &mut Vec<Garment>,
    client: &mut Client,
    input: GarmentInput,
    prefix: &str,
) -> Result<Garment, ServiceError> {
    require_text("type", &input.garment_type)?;

    let rfid_code = match input.rfid_code.as_deref().map(RfidScanner::normalize) {
        Some(code) if !code.is_empty() => {
            if garments.iter().any(|g| g.is_active() && g.rfid_code == code) {
                return Err(ServiceError::Conflict(format!(
                    "RFID code '{}' is already in use",
                    code
                )));
            }
            code
        }
        _ => unique_code(garments, prefix)?,
    };

    let id = Counters::assign(&mut uow.counters.garments, max_id(garments));
    let garment = Garment {
        id,
        rfid_code: rfid_code.clone(),
        client_id: client.id,
        branch_id: client.branch_id,
        garment_type: input.garment_type.trim().to_string(),
        color: input.color,
        size: input.size,
        description: input.description,
        status: Status::Recibido,
        received_at: uow.now.clone(),
        processed_at: None,
        ready_at: None,
        delivered_at: None,
        batch_id: None,
    };
    garments.push(garment.clone());
    if !client.rfid_tags.contains(&rfid_code) {
        client.rfid_tags.push(rfid_code);
    }
    Ok(garment)
}

/// Status move with history, plus a pickup notice on `listo` when `notify`.
fn change_status(
    uow: &mut UnitOfWork<'_>,
    garment: &mut Garment,
    next: Status,
    operator: &str,
    notify: bool,
) -> Result<(), ServiceError> {
    let previous = garment.status;
    previous.check_transition(next)?;
    garment.set_status(next, &uow.now);
    uow.record(NewHistoryEntry {
        client_id: garment.client_id,
        garment_ids: vec![garment.id],
        action: HistoryAction::CambioEstado,
        operator: operator.to_string(),
        details: format!(
            "Prenda {}: {} → {}",
            garment.rfid_code,
            previous.label(),
            next.label()
        ),
    });
    if next == Status::Listo && notify {
        uow.notify(NewNotification {
            kind: NotificationKind::PrendaLista,
            message: format!("Prenda {} lista", garment.rfid_code),
            client_id: Some(garment.client_id),
            batch_id: garment.batch_id,
        });
    }
    Ok(())
}
