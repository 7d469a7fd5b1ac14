use csv::{QuoteStyle, Terminator, WriterBuilder};
use lavanderia_core::{parse_rfc3339, ServiceError};

use crate::model::{Client, HistoryEntry, HistoryFilter, NewHistoryEntry};
use crate::store::Collection;
use super::LaundryService;

/// Header row of the history export.
pub const CSV_HEADER: &str = "Fecha,Hora,Acción,Cliente,Usuario,Detalles,Prendas";

impl LaundryService {
    /// Append an entry to the log (newest first).
    pub fn add_history_entry(&self, mut entry: NewHistoryEntry) -> Result<HistoryEntry, ServiceError> {
        entry.operator = self.operator_or(&entry.operator);
        let mut uow = self.begin();
        let entry = uow.record(entry);
        uow.commit()?;
        Ok(entry)
    }

    /// The whole log, newest first.
    pub fn get_history(&self) -> Vec<HistoryEntry> {
        self.store.list(Collection::History)
    }

    pub fn filter_history(&self, filter: &HistoryFilter) -> Vec<HistoryEntry> {
        self.get_history()
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect()
    }

    /// Render the filtered log as CSV: a header line, then one fully quoted
    /// row per entry. Dates and times are UTC.
    pub fn export_history_csv(&self, filter: &HistoryFilter) -> Result<String, ServiceError> {
        let clients: Vec<Client> = self.store.list(Collection::Clients);
        let mut out = Vec::new();
        out.extend_from_slice(CSV_HEADER.as_bytes());
        out.push(b'\n');

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);
        for entry in self.filter_history(filter) {
            let (fecha, hora) = match parse_rfc3339(&entry.timestamp) {
                Some(ts) => (
                    ts.format("%d/%m/%Y").to_string(),
                    ts.format("%H:%M:%S").to_string(),
                ),
                None => (entry.timestamp.clone(), String::new()),
            };
            let cliente = clients
                .iter()
                .find(|c| c.id == entry.client_id)
                .map(|c| c.name.as_str())
                .unwrap_or("Desconocido");
            let prendas = entry.garment_ids.len().to_string();
            writer
                .write_record([
                    fecha.as_str(),
                    hora.as_str(),
                    entry.action.label(),
                    cliente,
                    entry.operator.as_str(),
                    entry.details.as_str(),
                    prendas.as_str(),
                ])
                .map_err(|e| ServiceError::Internal(format!("csv: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ServiceError::Internal(format!("csv: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| ServiceError::Internal(format!("csv: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HistoryAction;
    use crate::service::test_support::{client, service};

    fn entry(client_id: u64, operator: &str, details: &str) -> NewHistoryEntry {
        NewHistoryEntry {
            client_id,
            garment_ids: vec![1, 2],
            action: HistoryAction::Recepcion,
            operator: operator.into(),
            details: details.into(),
        }
    }

    #[test]
    fn history_is_newest_first() {
        let svc = service();
        let a = svc.add_history_entry(entry(1, "Luis", "primera")).unwrap();
        let b = svc.add_history_entry(entry(1, "", "segunda")).unwrap();
        assert!(b.id > a.id);
        assert_eq!(b.operator, "sistema");

        let history = svc.get_history();
        assert_eq!(history[0].details, "segunda");
        assert_eq!(history[1].details, "primera");
    }

    #[test]
    fn filter_by_operator_and_action() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        svc.add_history_entry(entry(c.id, "Luis", "x")).unwrap();
        svc.add_history_entry(entry(c.id, "Marta", "y")).unwrap();

        let filter = HistoryFilter {
            operator: Some("luis".into()),
            ..Default::default()
        };
        assert_eq!(svc.filter_history(&filter).len(), 1);

        let filter = HistoryFilter {
            client_id: Some(c.id),
            action: Some(HistoryAction::Recepcion),
            ..Default::default()
        };
        assert_eq!(svc.filter_history(&filter).len(), 2);
        assert_eq!(svc.filter_history(&HistoryFilter::default()).len(), 3);
    }

    #[test]
    fn csv_has_header_and_one_line_per_entry() {
        let svc = service();
        let c = client(&svc, "Ana \"la rápida\"", "0101");
        svc.add_history_entry(entry(c.id, "Luis", "dijo \"listo\"")).unwrap();
        svc.add_history_entry(entry(77, "Luis", "sin cliente")).unwrap();

        let csv = svc.export_history_csv(&HistoryFilter::default()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);

        assert!(lines[1].starts_with('"'));
        assert!(lines[1].contains("\"Desconocido\""));
        assert!(lines[1].ends_with(",\"2\""));
        assert!(lines[2].contains("\"Ana \"\"la rápida\"\"\""));
        assert!(lines[2].contains("\"dijo \"\"listo\"\"\""));
        assert!(lines[3].contains("\"Cliente creado\""));
        assert!(lines[3].ends_with(",\"0\""));
    }

    #[test]
    fn csv_formats_date_and_time() {
        let svc = service();
        let mut history = svc.get_history();
        history.push(HistoryEntry {
            id: 1,
            client_id: 0,
            garment_ids: vec![],
            action: HistoryAction::Entrega,
            operator: "op".into(),
            details: String::new(),
            timestamp: "2024-03-05T14:07:09Z".into(),
        });
        svc.store.set(Collection::History, &history).unwrap();

        let csv = svc.export_history_csv(&HistoryFilter::default()).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("\"05/03/2024\",\"14:07:09\",\"Entrega\""));
    }

    #[test]
    fn csv_of_empty_log_is_just_the_header() {
        let svc = service();
        let csv = svc.export_history_csv(&HistoryFilter::default()).unwrap();
        assert_eq!(csv, format!("{}\n", CSV_HEADER));
    }
}
