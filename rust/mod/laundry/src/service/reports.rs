use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use lavanderia_core::{parse_rfc3339, ServiceError};
use serde::Serialize;

use crate::model::{Client, Status, StatusCounts};
use super::LaundryService;

/// Longest range `daily_activity` accepts, in days.
const MAX_ACTIVITY_DAYS: i64 = 366;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_clients: usize,
    pub garments: StatusCounts,
    pub batches: StatusCounts,
    pub received_today: usize,
    pub delivered_today: usize,
    /// Batches in `listo`, waiting for pickup.
    pub pending_deliveries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCount {
    pub branch_id: Option<u64>,
    pub branch_name: String,
    pub total: usize,
    /// Not yet delivered.
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub received: usize,
    pub delivered: usize,
}

/// UTC calendar day of an RFC 3339 timestamp.
fn day_of(ts: &str) -> Option<NaiveDate> {
    parse_rfc3339(ts).map(|dt| dt.date_naive())
}

impl LaundryService {
    pub fn dashboard_stats(&self) -> DashboardStats {
        self.dashboard_stats_on(Utc::now().date_naive())
    }

    /// Dashboard figures with "today" fixed to `day`.
    pub fn dashboard_stats_on(&self, day: NaiveDate) -> DashboardStats {
        let garments = self.get_garments();
        let batches = self.get_batches();
        let batch_counts = StatusCounts::tally(batches.iter().map(|b| b.status));
        DashboardStats {
            total_clients: self.get_clients().len(),
            garments: StatusCounts::tally(garments.iter().map(|g| g.status)),
            batches: batch_counts,
            received_today: garments
                .iter()
                .filter(|g| day_of(&g.received_at) == Some(day))
                .count(),
            delivered_today: garments
                .iter()
                .filter(|g| g.delivered_at.as_deref().and_then(day_of) == Some(day))
                .count(),
            pending_deliveries: batch_counts.get(Status::Listo),
        }
    }

    /// Garment counts per branch. Garments without a branch are grouped
    /// under "Sin sucursal".
    pub fn garments_by_branch(&self) -> Vec<BranchCount> {
        let branches = self.get_branches();
        let mut groups: BTreeMap<Option<u64>, (usize, usize)> = BTreeMap::new();
        for g in self.get_garments() {
            let entry = groups.entry(g.branch_id).or_default();
            entry.0 += 1;
            if g.is_active() {
                entry.1 += 1;
            }
        }
        groups
            .into_iter()
            .map(|(branch_id, (total, pending))| {
                let branch_name = match branch_id {
                    Some(id) => branches
                        .iter()
                        .find(|b| b.id == id)
                        .map(|b| b.name.clone())
                        .unwrap_or_else(|| format!("Sucursal {}", id)),
                    None => "Sin sucursal".to_string(),
                };
                BranchCount {
                    branch_id,
                    branch_name,
                    total,
                    pending,
                }
            })
            .collect()
    }

    /// The `n` clients with the most services; ties go to the older client.
    pub fn top_clients(&self, n: usize) -> Vec<Client> {
        let mut clients = self.get_clients();
        clients.sort_by(|a, b| b.total_services.cmp(&a.total_services).then(a.id.cmp(&b.id)));
        clients.truncate(n);
        clients
    }

    /// Received and delivered garments per day, `from..=to`.
    pub fn daily_activity(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyActivity>, ServiceError> {
        if from > to {
            return Err(ServiceError::Validation(format!(
                "range start {} is after end {}",
                from, to
            )));
        }
        if (to - from).num_days() >= MAX_ACTIVITY_DAYS {
            return Err(ServiceError::Validation(format!(
                "range is limited to {} days",
                MAX_ACTIVITY_DAYS
            )));
        }

        let mut days: BTreeMap<NaiveDate, DailyActivity> = from
            .iter_days()
            .take_while(|d| *d <= to)
            .map(|date| (date, DailyActivity { date, received: 0, delivered: 0 }))
            .collect();
        for g in self.get_garments() {
            if let Some(day) = day_of(&g.received_at).and_then(|d| days.get_mut(&d)) {
                day.received += 1;
            }
            if let Some(day) = g
                .delivered_at
                .as_deref()
                .and_then(day_of)
                .and_then(|d| days.get_mut(&d))
            {
                day.delivered += 1;
            }
        }
        Ok(days.into_values().collect())
    }
}
