use lavanderia_core::ServiceError;
use tracing::{info, warn};

use crate::model::{
    Batch, Garment, HistoryAction, NewHistoryEntry, NewNotification, NotificationKind, Status,
};
use crate::store::Collection;
use super::{not_found, position, LaundryService, UnitOfWork};

impl LaundryService {
    /// Batches waiting at the counter.
    pub fn get_ready_for_delivery(&self) -> Vec<Batch> {
        self.get_batches_by_status(Status::Listo)
    }

    /// Hand a batch back to its client.
    ///
    /// Allowed from any status except `entregado`. Every member garment is
    /// set to `entregado` whatever its own status was; batch, garments,
    /// history and notification are written together.
    pub fn deliver_batch(&self, id: u64, operator: &str) -> Result<Batch, ServiceError> {
        let mut batches = self.get_batches();
        let idx = position(&batches, id).ok_or_else(|| not_found("batch", id))?;
        let mut garments = self.get_garments();
        let notify = self.store.settings().notifications_enabled;

        let mut uow = self.begin();
        let operator = self.operator_or(operator);
        apply_delivery(&mut uow, &mut batches[idx], &mut garments, &operator, notify)?;
        let batch = batches[idx].clone();
        uow.put(Collection::Batches, &batches)?;
        uow.put(Collection::Garments, &garments)?;
        uow.commit()?;
        Ok(batch)
    }
}

/// Mark `batch` and its members delivered inside `uow`.
pub(crate) fn apply_delivery(
    uow: &mut UnitOfWork<'_>,
    batch: &mut Batch,
    garments: &mut [Garment],
    operator: &str,
    notify: bool,
) -> Result<(), ServiceError> {
    if batch.status == Status::Entregado {
        return Err(ServiceError::Validation(format!(
            "batch {} is already delivered",
            batch.batch_number
        )));
    }

    let now = uow.now.clone();
    batch.status = Status::Entregado;
    batch.delivered_at = Some(now.clone());
    batch.delivered_by = Some(operator.to_string());
    batch.updated_at = Some(now.clone());

    for garment_id in &batch.garment_ids {
        match garments.iter_mut().find(|g| g.id == *garment_id) {
            Some(g) => g.set_status(Status::Entregado, &now),
            None => warn!(
                "delivery of {}: garment {} does not exist",
                batch.batch_number, garment_id
            ),
        }
    }

    uow.record(NewHistoryEntry {
        client_id: batch.client_id,
        garment_ids: batch.garment_ids.clone(),
        action: HistoryAction::Entrega,
        operator: operator.to_string(),
        details: format!(
            "Lote {} entregado ({} prendas)",
            batch.batch_number, batch.total_garments
        ),
    });
    if notify {
        uow.notify(NewNotification {
            kind: NotificationKind::Entrega,
            message: format!("Lote {} entregado al cliente", batch.batch_number),
            client_id: Some(batch.client_id),
            batch_id: Some(batch.id),
        });
    }

    info!("batch {} delivered by {}", batch.batch_number, operator);
    Ok(())
}
