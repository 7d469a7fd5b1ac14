use chrono::{Datelike, Utc};
use lavanderia_core::ServiceError;
use tracing::{info, warn};

use crate::model::{
    Batch, Counters, Garment, HistoryAction, NewBatch, NewHistoryEntry, NewNotification,
    NotificationKind, Status, max_id,
};
use crate::store::Collection;
use super::delivery::apply_delivery;
use super::{not_found, position, LaundryService, UnitOfWork};

/// Fields maintained by membership and delivery operations.
const PROTECTED: &[&str] = &[
    "id",
    "batchNumber",
    "clientId",
    "garmentIds",
    "totalGarments",
    "status",
    "createdAt",
    "deliveredAt",
    "deliveredBy",
];

impl LaundryService {
    pub fn get_batches(&self) -> Vec<Batch> {
        self.store.list(Collection::Batches)
    }

    pub fn get_batch(&self, id: u64) -> Option<Batch> {
        self.get_batches().into_iter().find(|b| b.id == id)
    }

    pub fn get_batches_by_client(&self, client_id: u64) -> Vec<Batch> {
        self.get_batches()
            .into_iter()
            .filter(|b| b.client_id == client_id)
            .collect()
    }

    pub fn get_batches_by_status(&self, status: Status) -> Vec<Batch> {
        self.get_batches()
            .into_iter()
            .filter(|b| b.status == status)
            .collect()
    }

    /// Member garments of a batch, in membership order. Missing ids are
    /// skipped.
    pub fn get_batch_garments(&self, batch_id: u64) -> Vec<Garment> {
        let Some(batch) = self.get_batch(batch_id) else {
            return Vec::new();
        };
        let garments = self.get_garments();
        batch
            .garment_ids
            .iter()
            .filter_map(|id| garments.iter().find(|g| g.id == *id).cloned())
            .collect()
    }

    /// Open a batch for a client. `garment_ids` are attached right away,
    /// moving them out of any other batch.
    pub fn create_batch(&self, input: NewBatch) -> Result<Batch, ServiceError> {
        if self.get_client(input.client_id).is_none() {
            return Err(not_found("client", input.client_id));
        }
        if input.expected_garments == 0 {
            return Err(ServiceError::Validation(
                "expectedGarments must be at least 1".into(),
            ));
        }
        let settings = self.store.settings();
        let mut batches = self.get_batches();
        let mut garments = self.get_garments();

        let mut uow = self.begin();
        let id = Counters::assign(&mut uow.counters.batches, max_id(&batches));
        batches.push(Batch {
            id,
            batch_number: Batch::format_number(&settings.batch_prefix, id, Utc::now().year()),
            client_id: input.client_id,
            garment_ids: Vec::new(),
            total_garments: 0,
            expected_garments: input.expected_garments,
            status: Status::Recibido,
            priority: input.priority.unwrap_or(settings.default_priority),
            notes: input.notes,
            created_at: uow.now.clone(),
            updated_at: None,
            delivered_at: None,
            delivered_by: None,
        });
        let idx = batches.len() - 1;
        for garment_id in input.garment_ids {
            attach(&mut batches, &mut garments, idx, garment_id)?;
        }
        batches[idx].updated_at = None;
        let batch = batches[idx].clone();

        uow.record(NewHistoryEntry {
            client_id: batch.client_id,
            garment_ids: batch.garment_ids.clone(),
            action: HistoryAction::LoteCreado,
            operator: self.default_operator().to_string(),
            details: format!(
                "Lote {} creado ({} prendas esperadas)",
                batch.batch_number, batch.expected_garments
            ),
        });
        uow.put(Collection::Batches, &batches)?;
        uow.put(Collection::Garments, &garments)?;
        uow.commit()?;

        info!("batch {} created for client {}", batch.batch_number, batch.client_id);
        Ok(batch)
    }

    /// Put a garment in a batch. Adding a current member changes nothing;
    /// a garment in another batch is moved.
    pub fn add_garment_to_batch(&self, batch_id: u64, garment_id: u64) -> Result<Batch, ServiceError> {
        let mut batches = self.get_batches();
        let idx = position(&batches, batch_id).ok_or_else(|| not_found("batch", batch_id))?;
        let mut garments = self.get_garments();

        if !attach(&mut batches, &mut garments, idx, garment_id)? {
            return Ok(batches.swap_remove(idx));
        }
        let mut uow = self.begin();
        let batch = batches[idx].clone();
        uow.record(NewHistoryEntry {
            client_id: batch.client_id,
            garment_ids: vec![garment_id],
            action: HistoryAction::PrendaAgregadaLote,
            operator: self.default_operator().to_string(),
            details: format!(
                "Prenda agregada al lote {} ({}/{})",
                batch.batch_number, batch.total_garments, batch.expected_garments
            ),
        });
        uow.put(Collection::Batches, &batches)?;
        uow.put(Collection::Garments, &garments)?;
        uow.commit()?;
        Ok(batch)
    }

    /// Take a garment out of a batch and clear its `batchId`.
    pub fn remove_garment_from_batch(
        &self,
        batch_id: u64,
        garment_id: u64,
    ) -> Result<Batch, ServiceError> {
        let mut batches = self.get_batches();
        let idx = position(&batches, batch_id).ok_or_else(|| not_found("batch", batch_id))?;
        if !batches[idx].contains(garment_id) {
            return Err(ServiceError::NotFound(format!(
                "garment {} is not in batch {}",
                garment_id, batch_id
            )));
        }
        if batches[idx].status == Status::Entregado {
            return Err(ServiceError::Validation(format!(
                "batch {} is already delivered",
                batches[idx].batch_number
            )));
        }
        let mut garments = self.get_garments();

        let mut uow = self.begin();
        let batch = &mut batches[idx];
        batch.garment_ids.retain(|id| *id != garment_id);
        batch.sync_total();
        batch.updated_at = Some(uow.now.clone());
        match garments.iter_mut().find(|g| g.id == garment_id) {
            Some(g) if g.batch_id == Some(batch_id) => g.batch_id = None,
            Some(_) => {}
            None => warn!("batch {}: member garment {} does not exist", batch_id, garment_id),
        }
        let batch = batch.clone();

        uow.record(NewHistoryEntry {
            client_id: batch.client_id,
            garment_ids: vec![garment_id],
            action: HistoryAction::PrendaRemovidaLote,
            operator: self.default_operator().to_string(),
            details: format!("Prenda removida del lote {}", batch.batch_number),
        });
        uow.put(Collection::Batches, &batches)?;
        uow.put(Collection::Garments, &garments)?;
        uow.commit()?;
        Ok(batch)
    }

    /// Shallow-merge `patch` into the batch (`expectedGarments`, `priority`,
    /// `notes`). A `status` key is routed through the transition table; a
    /// status of `entregado` confirms delivery.
    pub fn update_batch(&self, id: u64, patch: serde_json::Value) -> Result<Batch, ServiceError> {
        let next_status = match patch.get("status") {
            Some(v) => Some(
                serde_json::from_value::<Status>(v.clone())
                    .map_err(|e| ServiceError::Validation(format!("invalid status: {}", e)))?,
            ),
            None => None,
        };

        let mut batches = self.get_batches();
        let idx = position(&batches, id).ok_or_else(|| not_found("batch", id))?;
        let mut updated: Batch = Self::apply_patch(&batches[idx], &patch, PROTECTED)?;
        if updated.expected_garments == 0 {
            return Err(ServiceError::Validation(
                "expectedGarments must be at least 1".into(),
            ));
        }

        let operator = self.default_operator().to_string();
        let mut uow = self.begin();
        updated.updated_at = Some(uow.now.clone());
        let mut garments = None;
        if let Some(next) = next_status {
            if next == Status::Entregado {
                let mut members = self.get_garments();
                let notify = self.store.settings().notifications_enabled;
                apply_delivery(&mut uow, &mut updated, &mut members, &operator, notify)?;
                garments = Some(members);
            } else {
                self.move_status(&mut uow, &mut updated, next, &operator)?;
            }
        }

        let changed: Vec<&str> = patch
            .as_object()
            .map(|obj| {
                obj.keys()
                    .map(String::as_str)
                    .filter(|k| !PROTECTED.contains(k))
                    .collect()
            })
            .unwrap_or_default();
        if !changed.is_empty() {
            uow.record(NewHistoryEntry {
                client_id: updated.client_id,
                garment_ids: vec![],
                action: HistoryAction::LoteActualizado,
                operator,
                details: format!(
                    "Lote {}: campos actualizados: {}",
                    updated.batch_number,
                    changed.join(", ")
                ),
            });
        }

        batches[idx] = updated.clone();
        uow.put(Collection::Batches, &batches)?;
        if let Some(garments) = garments {
            uow.put(Collection::Garments, &garments)?;
        }
        uow.commit()?;
        Ok(updated)
    }

    /// Move a batch to `next`. `entregado` confirms delivery, see
    /// [`LaundryService::deliver_batch`]. Member garments keep their own
    /// status otherwise.
    pub fn update_batch_status(
        &self,
        id: u64,
        next: Status,
        operator: &str,
    ) -> Result<Batch, ServiceError> {
        if next == Status::Entregado {
            return self.deliver_batch(id, operator);
        }
        let mut batches = self.get_batches();
        let idx = position(&batches, id).ok_or_else(|| not_found("batch", id))?;

        let mut uow = self.begin();
        let operator = self.operator_or(operator);
        self.move_status(&mut uow, &mut batches[idx], next, &operator)?;
        let batch = batches[idx].clone();
        uow.put(Collection::Batches, &batches)?;
        uow.commit()?;
        Ok(batch)
    }

    /// Remove a batch. Former members stay, with their `batchId` cleared.
    pub fn delete_batch(&self, id: u64) -> Result<Batch, ServiceError> {
        let mut batches = self.get_batches();
        let idx = position(&batches, id).ok_or_else(|| not_found("batch", id))?;
        let batch = batches.remove(idx);
        let mut garments = self.get_garments();
        for g in garments.iter_mut().filter(|g| g.batch_id == Some(id)) {
            g.batch_id = None;
        }

        let mut uow = self.begin();
        uow.record(NewHistoryEntry {
            client_id: batch.client_id,
            garment_ids: batch.garment_ids.clone(),
            action: HistoryAction::LoteEliminado,
            operator: self.default_operator().to_string(),
            details: format!("Lote {} eliminado", batch.batch_number),
        });
        uow.put(Collection::Batches, &batches)?;
        uow.put(Collection::Garments, &garments)?;
        uow.commit()?;

        info!("batch {} deleted", batch.batch_number);
        Ok(batch)
    }

    /// Non-delivery status move with history, plus a pickup notice on `listo`.
    fn move_status(
        &self,
        uow: &mut UnitOfWork<'_>,
        batch: &mut Batch,
        next: Status,
        operator: &str,
    ) -> Result<(), ServiceError> {
        let previous = batch.status;
        previous.check_transition(next)?;
        batch.status = next;
        batch.updated_at = Some(uow.now.clone());
        uow.record(NewHistoryEntry {
            client_id: batch.client_id,
            garment_ids: vec![],
            action: HistoryAction::LoteActualizado,
            operator: operator.to_string(),
            details: format!(
                "Lote {}: {} → {}",
                batch.batch_number,
                previous.label(),
                next.label()
            ),
        });
        if next == Status::Listo && self.store.settings().notifications_enabled {
            uow.notify(NewNotification {
                kind: NotificationKind::LoteListo,
                message: format!("Lote {} listo para entrega", batch.batch_number),
                client_id: Some(batch.client_id),
                batch_id: Some(batch.id),
            });
        }
        Ok(())
    }
}

/// Attach `garment_id` to `batches[idx]`. Returns `false` when it already
/// was a member.
fn attach(
    batches: &mut [Batch],
    garments: &mut [Garment],
    idx: usize,
    garment_id: u64,
) -> Result<bool, ServiceError> {
    let batch_id = batches[idx].id;
    let garment = garments
        .iter_mut()
        .find(|g| g.id == garment_id)
        .ok_or_else(|| not_found("garment", garment_id))?;

    if batches[idx].status == Status::Entregado {
        return Err(ServiceError::Validation(format!(
            "batch {} is already delivered",
            batches[idx].batch_number
        )));
    }
    if garment.client_id != batches[idx].client_id {
        return Err(ServiceError::Validation(format!(
            "garment {} belongs to another client",
            garment_id
        )));
    }
    if batches[idx].contains(garment_id) {
        return Ok(false);
    }
    if !garment.is_active() {
        return Err(ServiceError::Validation(format!(
            "garment {} was already delivered",
            garment_id
        )));
    }

    let now = lavanderia_core::now_rfc3339();
    if let Some(old) = garment.batch_id.filter(|old| *old != batch_id) {
        match batches.iter_mut().find(|b| b.id == old) {
            Some(previous) => {
                previous.garment_ids.retain(|id| *id != garment_id);
                previous.sync_total();
                previous.updated_at = Some(now.clone());
            }
            None => warn!("garment {} pointed at missing batch {}", garment_id, old),
        }
    }

    let batch = &mut batches[idx];
    batch.garment_ids.push(garment_id);
    batch.sync_total();
    batch.updated_at = Some(now);
    garment.batch_id = Some(batch_id);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::service::test_support::{client, garment, service};

    fn new_batch(client_id: u64, expected: u32) -> NewBatch {
        NewBatch {
            client_id,
            expected_garments: expected,
            ..Default::default()
        }
    }

    #[test]
    fn create_batch_numbers_and_defaults() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let b = svc.create_batch(new_batch(c.id, 2)).unwrap();

        assert_eq!(b.id, 1);
        assert_eq!(b.batch_number, format!("LOTE-001-{}", Utc::now().year()));
        assert_eq!(b.status, Status::Recibido);
        assert_eq!(b.priority, Priority::Normal);
        assert_eq!(b.total_garments, 0);
        assert!(!b.is_complete());
        assert_eq!(svc.get_counters().batches, 2);
        assert_eq!(svc.get_history()[0].action, HistoryAction::LoteCreado);
    }

    #[test]
    fn create_batch_validates() {
        let svc = service();
        assert_eq!(
            svc.create_batch(new_batch(5, 1)).unwrap_err().error_code(),
            "NOT_FOUND"
        );
        let c = client(&svc, "Ana", "0101");
        assert_eq!(
            svc.create_batch(new_batch(c.id, 0)).unwrap_err().error_code(),
            "VALIDATION_FAILED"
        );
        assert!(svc.get_batches().is_empty());
    }

    #[test]
    fn create_batch_with_initial_garments() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let g1 = garment(&svc, c.id, "camisa");
        let g2 = garment(&svc, c.id, "falda");

        let b = svc
            .create_batch(NewBatch { garment_ids: vec![g1.id, g2.id], ..new_batch(c.id, 2) })
            .unwrap();
        assert_eq!(b.garment_ids, vec![g1.id, g2.id]);
        assert!(b.is_complete());
        assert_eq!(svc.get_garment(g2.id).unwrap().batch_id, Some(b.id));
        assert_eq!(svc.get_batch_garments(b.id).len(), 2);
    }

    #[test]
    fn add_then_remove_restores_batch() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let g1 = garment(&svc, c.id, "camisa");
        let g2 = garment(&svc, c.id, "falda");
        let b = svc
            .create_batch(NewBatch { garment_ids: vec![g1.id], ..new_batch(c.id, 3) })
            .unwrap();

        let added = svc.add_garment_to_batch(b.id, g2.id).unwrap();
        assert_eq!(added.garment_ids, vec![g1.id, g2.id]);
        assert_eq!(added.total_garments, 2);
        assert_eq!(svc.get_garment(g2.id).unwrap().batch_id, Some(b.id));

        let removed = svc.remove_garment_from_batch(b.id, g2.id).unwrap();
        assert_eq!(removed.garment_ids, b.garment_ids);
        assert_eq!(removed.total_garments, b.total_garments);
        assert_eq!(svc.get_garment(g2.id).unwrap().batch_id, None);
    }

    #[test]
    fn add_is_idempotent_and_moves_between_batches() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let g = garment(&svc, c.id, "camisa");
        let b1 = svc.create_batch(new_batch(c.id, 1)).unwrap();
        let b2 = svc.create_batch(new_batch(c.id, 1)).unwrap();

        svc.add_garment_to_batch(b1.id, g.id).unwrap();
        let history_len = svc.get_history().len();
        let again = svc.add_garment_to_batch(b1.id, g.id).unwrap();
        assert_eq!(again.garment_ids, vec![g.id]);
        assert_eq!(svc.get_history().len(), history_len);

        svc.add_garment_to_batch(b2.id, g.id).unwrap();
        assert!(svc.get_batch(b1.id).unwrap().garment_ids.is_empty());
        assert_eq!(svc.get_batch(b1.id).unwrap().total_garments, 0);
        assert_eq!(svc.get_batch(b2.id).unwrap().garment_ids, vec![g.id]);
        assert_eq!(svc.get_garment(g.id).unwrap().batch_id, Some(b2.id));
    }

    #[test]
    fn membership_errors() {
        let svc = service();
        let a = client(&svc, "Ana", "0101");
        let b = client(&svc, "Beto", "0202");
        let foreign = garment(&svc, b.id, "camisa");
        let batch = svc.create_batch(new_batch(a.id, 1)).unwrap();

        let err = svc.add_garment_to_batch(batch.id, foreign.id).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        let err = svc.add_garment_to_batch(batch.id, 99).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        let err = svc.add_garment_to_batch(99, foreign.id).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        let err = svc.remove_garment_from_batch(batch.id, foreign.id).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn batch_status_follows_table_and_notifies() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let b = svc.create_batch(new_batch(c.id, 1)).unwrap();

        let err = svc.update_batch_status(b.id, Status::Listo, "op").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        svc.update_batch_status(b.id, Status::EnProceso, "op").unwrap();
        let listo = svc.update_batch_status(b.id, Status::Listo, "op").unwrap();
        assert_eq!(listo.status, Status::Listo);
        assert_eq!(svc.get_ready_for_delivery().len(), 1);

        let notes = svc.get_notifications(false);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::LoteListo);
        assert_eq!(notes[0].batch_id, Some(b.id));
    }

    #[test]
    fn update_batch_merges_and_delivers() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let g = garment(&svc, c.id, "camisa");
        let b = svc
            .create_batch(NewBatch { garment_ids: vec![g.id], ..new_batch(c.id, 2) })
            .unwrap();

        let updated = svc
            .update_batch(b.id, serde_json::json!({"priority": "urgente", "totalGarments": 9}))
            .unwrap();
        assert_eq!(updated.priority, Priority::Urgente);
        assert_eq!(updated.total_garments, 1);

        let err = svc
            .update_batch(b.id, serde_json::json!({"expectedGarments": 0}))
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let delivered = svc
            .update_batch(b.id, serde_json::json!({"status": "entregado"}))
            .unwrap();
        assert_eq!(delivered.status, Status::Entregado);
        assert!(delivered.delivered_at.is_some());
        assert_eq!(svc.get_garment(g.id).unwrap().status, Status::Entregado);
    }

    #[test]
    fn update_batch_redelivery_is_rejected() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let b = svc.create_batch(new_batch(c.id, 1)).unwrap();

        // A status equal to the current one is not a no-op.
        let err = svc
            .update_batch(b.id, serde_json::json!({"status": "recibido", "notes": "x"}))
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert_eq!(svc.get_batch(b.id).unwrap().notes, b.notes);

        let delivered = svc.deliver_batch(b.id, "Luis").unwrap();
        let history_len = svc.get_history().len();
        let err = svc
            .update_batch(b.id, serde_json::json!({"status": "entregado"}))
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let stored = svc.get_batch(b.id).unwrap();
        assert_eq!(stored.delivered_at, delivered.delivered_at);
        assert_eq!(stored.delivered_by.as_deref(), Some("Luis"));
        assert_eq!(svc.get_history().len(), history_len);
    }

    #[test]
    fn delete_batch_clears_back_references() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let g = garment(&svc, c.id, "camisa");
        let b = svc
            .create_batch(NewBatch { garment_ids: vec![g.id], ..new_batch(c.id, 1) })
            .unwrap();

        let deleted = svc.delete_batch(b.id).unwrap();
        assert_eq!(deleted.id, b.id);
        assert!(svc.get_batch(b.id).is_none());
        assert_eq!(svc.get_garment(g.id).unwrap().batch_id, None);
        assert_eq!(svc.get_history()[0].action, HistoryAction::LoteEliminado);
        assert_eq!(svc.delete_batch(b.id).unwrap_err().error_code(), "NOT_FOUND");

        // Ids are never reused.
        let next = svc.create_batch(new_batch(c.id, 1)).unwrap();
        assert_eq!(next.id, 2);
    }
}
