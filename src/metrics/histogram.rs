use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Point-in-time copy of the status-code histogram.
///
/// Serializes as a JSON object keyed by status code, e.g. `{"200":20,"503":1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCounts(BTreeMap<u16, u64>);

impl StatusCounts {
    #[must_use]
    pub fn get(&self, status: u16) -> u64 {
        self.0.get(&status).copied().unwrap_or(0)
    }

    /// Total number of completed round trips.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0
            .values()
            .fold(0u64, |acc, count| acc.saturating_add(*count))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.0.iter().map(|(status, count)| (*status, *count))
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<u16, u64> {
        self.0
    }
}

impl From<BTreeMap<u16, u64>> for StatusCounts {
    fn from(value: BTreeMap<u16, u64>) -> Self {
        Self(value)
    }
}

/// Status code -> occurrence count, written concurrently by every worker.
///
/// Every read and write goes through one mutex, so no lost updates and no
/// partial reads are observable. The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct StatusHistogram {
    counts: Mutex<BTreeMap<u16, u64>>,
}

impl StatusHistogram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for `status`, starting it at 1 when absent.
    pub fn record(&self, status: u16) {
        let mut counts = self.lock();
        let entry = counts.entry(status).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    /// Copy of the current counts. Partial while a run is in progress.
    #[must_use]
    pub fn snapshot(&self) -> StatusCounts {
        StatusCounts(self.lock().clone())
    }

    // Writers only ever leave complete increments behind, so a poisoned map is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<u16, u64>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
