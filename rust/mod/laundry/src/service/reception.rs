use lavanderia_core::ServiceError;
use tracing::info;

use crate::model::{Client, Garment, GarmentInput, HistoryAction, NewHistoryEntry};
use crate::store::Collection;
use super::garment::new_garment;
use super::{not_found, position, LaundryService};

impl LaundryService {
    /// Counter intake: register every item for `client_id`, count one
    /// service for the client and log a single `recepcion` entry.
    ///
    /// Items without an RFID code get a freshly scanned one.
    pub fn receive_garments(
        &self,
        client_id: u64,
        items: Vec<GarmentInput>,
        operator: &str,
    ) -> Result<Vec<Garment>, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::Validation(
                "reception needs at least one garment".into(),
            ));
        }
        let mut clients: Vec<Client> = self.store.list(Collection::Clients);
        let idx = position(&clients, client_id).ok_or_else(|| not_found("client", client_id))?;
        let mut garments = self.get_garments();
        let prefix = self.store.settings().rfid_prefix;

        let mut uow = self.begin();
        let mut received = Vec::with_capacity(items.len());
        for item in items {
            received.push(new_garment(&mut uow, &mut garments, &mut clients[idx], item, &prefix)?);
        }
        let client = &mut clients[idx];
        client.total_services += 1;
        client.updated_at = Some(uow.now.clone());

        let types: Vec<&str> = received.iter().map(|g| g.garment_type.as_str()).collect();
        uow.record(NewHistoryEntry {
            client_id,
            garment_ids: received.iter().map(|g| g.id).collect(),
            action: HistoryAction::Recepcion,
            operator: self.operator_or(operator),
            details: format!("{} prendas recibidas: {}", received.len(), types.join(", ")),
        });
        uow.put(Collection::Garments, &garments)?;
        uow.put(Collection::Clients, &clients)?;
        uow.commit()?;

        info!("received {} garments for client {}", received.len(), client_id);
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{client, service};

    fn item(kind: &str) -> GarmentInput {
        GarmentInput {
            garment_type: kind.into(),
            ..Default::default()
        }
    }

    #[test]
    fn reception_registers_everything_at_once() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");

        let garments = svc
            .receive_garments(c.id, vec![item("camisa"), item("pantalón"), item("saco")], "Luis")
            .unwrap();
        assert_eq!(garments.len(), 3);
        assert_eq!(svc.get_garments_by_client(c.id).len(), 3);

        let c = svc.get_client(c.id).unwrap();
        assert_eq!(c.total_services, 1);
        assert_eq!(c.rfid_tags.len(), 3);

        let history = svc.get_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, HistoryAction::Recepcion);
        assert_eq!(history[0].operator, "Luis");
        assert_eq!(history[0].garment_ids, garments.iter().map(|g| g.id).collect::<Vec<_>>());
        assert_eq!(history[0].details, "3 prendas recibidas: camisa, pantalón, saco");
        assert_eq!(svc.get_counters().garments, 4);
    }

    #[test]
    fn reception_is_all_or_nothing() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let tagged = GarmentInput {
            rfid_code: Some("RFID-00000001".into()),
            ..item("camisa")
        };

        let err = svc
            .receive_garments(c.id, vec![tagged.clone(), item("falda"), tagged], "")
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");
        assert!(svc.get_garments().is_empty());
        assert_eq!(svc.get_client(c.id).unwrap().total_services, 0);
    }

    #[test]
    fn reception_errors() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        assert_eq!(
            svc.receive_garments(c.id, vec![], "op").unwrap_err().error_code(),
            "VALIDATION_FAILED"
        );
        assert_eq!(
            svc.receive_garments(99, vec![item("camisa")], "op").unwrap_err().error_code(),
            "NOT_FOUND"
        );
    }
}
