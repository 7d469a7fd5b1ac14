use lavanderia_core::ServiceError;
use tracing::info;

use crate::model::{Client, Counters, HistoryAction, NewClient, NewHistoryEntry, max_id};
use crate::store::Collection;
use super::{not_found, position, require_text, LaundryService};

/// Fields managed by the reception workflow, not by client edits.
const PROTECTED: &[&str] = &["id", "createdAt", "totalServices", "rfidTags"];

impl LaundryService {
    pub fn get_clients(&self) -> Vec<Client> {
        self.store.list(Collection::Clients)
    }

    pub fn get_client(&self, id: u64) -> Option<Client> {
        self.get_clients().into_iter().find(|c| c.id == id)
    }

    pub fn find_client_by_cedula(&self, cedula: &str) -> Option<Client> {
        let cedula = cedula.trim();
        self.get_clients().into_iter().find(|c| c.cedula == cedula)
    }

    /// Clients whose name, cédula, phone or email contains `query`.
    pub fn search_clients(&self, query: &str) -> Vec<Client> {
        self.get_clients()
            .into_iter()
            .filter(|c| c.matches(query))
            .collect()
    }

    pub fn add_client(&self, input: NewClient) -> Result<Client, ServiceError> {
        require_text("name", &input.name)?;
        require_text("cedula", &input.cedula)?;

        let mut clients = self.get_clients();
        let cedula = input.cedula.trim().to_string();
        if clients.iter().any(|c| c.cedula == cedula) {
            return Err(ServiceError::Conflict(format!(
                "client with cedula '{}' already exists",
                cedula
            )));
        }

        let mut uow = self.begin();
        let id = Counters::assign(&mut uow.counters.clients, max_id(&clients));
        let client = Client {
            id,
            name: input.name.trim().to_string(),
            cedula,
            phone: input.phone.trim().to_string(),
            email: input.email,
            address: input.address,
            branch_id: input.branch_id,
            total_services: 0,
            rfid_tags: Vec::new(),
            created_at: uow.now.clone(),
            updated_at: None,
        };
        clients.push(client.clone());

        uow.record(NewHistoryEntry {
            client_id: id,
            garment_ids: vec![],
            action: HistoryAction::ClienteCreado,
            operator: self.default_operator().to_string(),
            details: format!("Cliente registrado: {}", client.name),
        });
        uow.put(Collection::Clients, &clients)?;
        uow.commit()?;

        info!("client {} created ({})", client.id, client.cedula);
        Ok(client)
    }

    /// Shallow-merge `patch` into the client. `id`, `createdAt`,
    /// `totalServices` and `rfidTags` cannot be changed this way.
    pub fn update_client(&self, id: u64, patch: serde_json::Value) -> Result<Client, ServiceError> {
        let mut clients = self.get_clients();
        let idx = position(&clients, id).ok_or_else(|| not_found("client", id))?;

        let mut updated: Client = Self::apply_patch(&clients[idx], &patch, PROTECTED)?;
        require_text("name", &updated.name)?;
        require_text("cedula", &updated.cedula)?;
        updated.cedula = updated.cedula.trim().to_string();
        if clients.iter().any(|c| c.id != id && c.cedula == updated.cedula) {
            return Err(ServiceError::Conflict(format!(
                "client with cedula '{}' already exists",
                updated.cedula
            )));
        }

        let mut uow = self.begin();
        updated.updated_at = Some(uow.now.clone());
        clients[idx] = updated.clone();

        let changed: Vec<&str> = patch
            .as_object()
            .map(|obj| {
                obj.keys()
                    .map(String::as_str)
                    .filter(|k| !PROTECTED.contains(k))
                    .collect()
            })
            .unwrap_or_default();
        uow.record(NewHistoryEntry {
            client_id: id,
            garment_ids: vec![],
            action: HistoryAction::ClienteActualizado,
            operator: self.default_operator().to_string(),
            details: format!("Campos actualizados: {}", changed.join(", ")),
        });
        uow.put(Collection::Clients, &clients)?;
        uow.commit()?;

        Ok(updated)
    }
}
