use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::model::{max_id, Batch, Branch, Client, Garment, HistoryEntry, Notification, User};
use crate::store::Collection;
use super::LaundryService;

impl LaundryService {
    /// Scan the store for broken references and report each problem as a
    /// readable line. Nothing is repaired; an empty list means consistent.
    pub fn verify_integrity(&self) -> Vec<String> {
        let clients: Vec<Client> = self.store.list(Collection::Clients);
        let garments: Vec<Garment> = self.store.list(Collection::Garments);
        let batches: Vec<Batch> = self.store.list(Collection::Batches);
        let history: Vec<HistoryEntry> = self.store.list(Collection::History);
        let branches: Vec<Branch> = self.store.list(Collection::Branches);
        let users: Vec<User> = self.store.list(Collection::Users);
        let notifications: Vec<Notification> = self.store.list(Collection::Notifications);
        let counters = self.store.counters();

        let client_ids: HashSet<u64> = clients.iter().map(|c| c.id).collect();
        let garment_ids: HashSet<u64> = garments.iter().map(|g| g.id).collect();
        let batch_ids: HashSet<u64> = batches.iter().map(|b| b.id).collect();
        let mut problems = Vec::new();

        for g in &garments {
            if !client_ids.contains(&g.client_id) {
                problems.push(format!(
                    "Prenda {} ({}) referencia al cliente inexistente {}",
                    g.id, g.rfid_code, g.client_id
                ));
            }
            if let Some(batch_id) = g.batch_id.filter(|id| !batch_ids.contains(id)) {
                problems.push(format!(
                    "Prenda {} ({}) referencia al lote inexistente {}",
                    g.id, g.rfid_code, batch_id
                ));
            }
        }

        for b in &batches {
            for id in b.garment_ids.iter().filter(|id| !garment_ids.contains(id)) {
                problems.push(format!(
                    "Lote {} contiene la prenda inexistente {}",
                    b.batch_number, id
                ));
            }
            if b.total_garments as usize != b.garment_ids.len() {
                problems.push(format!(
                    "Lote {}: totalGarments es {} pero tiene {} prendas",
                    b.batch_number,
                    b.total_garments,
                    b.garment_ids.len()
                ));
            }
        }

        for h in history.iter().filter(|h| !client_ids.contains(&h.client_id)) {
            problems.push(format!(
                "Historial {} referencia al cliente inexistente {}",
                h.id, h.client_id
            ));
        }

        let checks = [
            ("clients", counters.clients, max_id(&clients)),
            ("garments", counters.garments, max_id(&garments)),
            ("batches", counters.batches, max_id(&batches)),
            ("history", counters.history, max_id(&history)),
            ("branches", counters.branches, max_id(&branches)),
            ("users", counters.users, max_id(&users)),
            ("notifications", counters.notifications, max_id(&notifications)),
        ];
        for (name, counter, max) in checks {
            if counter <= max {
                problems.push(format!(
                    "Contador {} ({}) no es mayor que el id máximo ({})",
                    name, counter, max
                ));
            }
        }

        let mut by_code: HashMap<&str, Vec<u64>> = HashMap::new();
        for g in garments.iter().filter(|g| g.is_active()) {
            by_code.entry(g.rfid_code.as_str()).or_default().push(g.id);
        }
        let mut duplicated: Vec<_> = by_code.into_iter().filter(|(_, ids)| ids.len() > 1).collect();
        duplicated.sort();
        for (code, ids) in duplicated {
            let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
            problems.push(format!(
                "Código RFID {} duplicado en prendas activas: {}",
                code,
                ids.join(", ")
            ));
        }

        if !problems.is_empty() {
            warn!("integrity check found {} problems", problems.len());
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Counters, NewBatch, NewBranch, NewNotification, NewUser, NotificationKind};
    use crate::service::test_support::{client, garment, service};

    #[test]
    fn consistent_store_has_no_problems() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let g = garment(&svc, c.id, "camisa");
        svc.create_batch(NewBatch {
            client_id: c.id,
            expected_garments: 1,
            garment_ids: vec![g.id],
            ..Default::default()
        })
        .unwrap();
        assert!(svc.verify_integrity().is_empty());
    }

    #[test]
    fn reports_dangling_references() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let g = garment(&svc, c.id, "camisa");
        let b = svc
            .create_batch(NewBatch {
                client_id: c.id,
                expected_garments: 1,
                garment_ids: vec![g.id],
                ..Default::default()
            })
            .unwrap();

        let mut garments = svc.get_garments();
        garments[0].client_id = 50;
        garments[0].batch_id = Some(60);
        svc.store.set(Collection::Garments, &garments).unwrap();

        let mut batches = svc.get_batches();
        batches[0].garment_ids.push(70);
        svc.store.set(Collection::Batches, &batches).unwrap();

        let problems = svc.verify_integrity();
        assert!(problems.iter().any(|p| p.contains("cliente inexistente 50")));
        assert!(problems.iter().any(|p| p.contains("lote inexistente 60")));
        assert!(problems.iter().any(|p| p.contains(&format!("Lote {} contiene la prenda inexistente 70", b.batch_number))));
        assert!(problems.iter().any(|p| p.contains("totalGarments es 1 pero tiene 2")));
    }

    #[test]
    fn reports_counters_and_duplicates() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        let g1 = garment(&svc, c.id, "camisa");
        let g2 = garment(&svc, c.id, "falda");
        svc.add_branch(NewBranch { name: "Centro".into(), ..Default::default() }).unwrap();
        svc.add_user(NewUser { username: "luis".into(), name: "Luis".into(), ..Default::default() })
            .unwrap();
        svc.add_notification(NewNotification {
            kind: NotificationKind::Sistema,
            message: "Respaldo pendiente".into(),
            client_id: None,
            batch_id: None,
        })
        .unwrap();

        let mut garments = svc.get_garments();
        garments[1].rfid_code = g1.rfid_code.clone();
        svc.store.set(Collection::Garments, &garments).unwrap();
        svc.store.set(Collection::Counters, &Counters::default()).unwrap();
        svc.add_history_entry(crate::model::NewHistoryEntry {
            client_id: 404,
            garment_ids: vec![],
            action: crate::model::HistoryAction::Recepcion,
            operator: "op".into(),
            details: String::new(),
        })
        .unwrap();

        let problems = svc.verify_integrity();
        assert!(problems.iter().any(|p| p.starts_with("Contador clients")));
        assert!(problems.iter().any(|p| p.starts_with("Contador garments")));
        for name in ["branches", "users", "notifications"] {
            let prefix = format!("Contador {} (1)", name);
            assert!(problems.iter().any(|p| p.starts_with(&prefix)), "missing {}", name);
        }
        assert!(problems.iter().any(|p| p.contains("referencia al cliente inexistente 404")));
        assert!(problems
            .iter()
            .any(|p| p.contains(&format!("{}, {}", g1.id, g2.id)) && p.contains("duplicado")));

        svc.fix_counters().unwrap();
        assert!(!svc.verify_integrity().iter().any(|p| p.starts_with("Contador")));
    }
}
