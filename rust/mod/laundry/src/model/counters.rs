use serde::{Deserialize, Serialize};

use super::{Batch, Branch, Client, Garment, HistoryEntry, Notification, User};

/// A record with a counter-assigned id.
pub trait Identified {
    fn id(&self) -> u64;
}

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn id(&self) -> u64 {
                self.id
            }
        })*
    };
}

identified!(Client, Garment, Batch, HistoryEntry, Branch, User, Notification);

/// Highest id in a collection, 0 when empty.
pub fn max_id<T: Identified>(records: &[T]) -> u64 {
    records.iter().map(Identified::id).max().unwrap_or(0)
}

fn one() -> u64 {
    1
}

/// Next id to assign, one slot per entity type.
///
/// Every slot must stay strictly greater than every id present in its
/// collection; `assign` enforces this even when the stored value is stale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    #[serde(default = "one")]
    pub clients: u64,
    #[serde(default = "one")]
    pub garments: u64,
    #[serde(default = "one")]
    pub batches: u64,
    #[serde(default = "one")]
    pub history: u64,
    #[serde(default = "one")]
    pub branches: u64,
    #[serde(default = "one")]
    pub users: u64,
    #[serde(default = "one")]
    pub notifications: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            clients: 1,
            garments: 1,
            batches: 1,
            history: 1,
            branches: 1,
            users: 1,
            notifications: 1,
        }
    }
}

impl Counters {
    /// Take the next id from `slot`, skipping past `existing_max` if the
    /// slot has fallen behind. Leaves `slot` at `id + 1`. Saturates at
    /// `u64::MAX`.
    pub fn assign(slot: &mut u64, existing_max: u64) -> u64 {
        let id = (*slot).max(existing_max.saturating_add(1)).max(1);
        *slot = id.saturating_add(1);
        id
    }

    /// `max + 1` for the given collection, never below 1.
    pub fn after<T: Identified>(records: &[T]) -> u64 {
        max_id(records).saturating_add(1)
    }
}
