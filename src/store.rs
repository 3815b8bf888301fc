//! Storage for completed simulation analyses.
//!
//! The engine never touches storage; callers hand a store to whichever layer
//! persists results (the HTTP API keeps one in its shared state).

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::sim::summary::SimulationSummary;
use crate::sim::types::{BessSpec, ChargingStrategy};

pub type AnalysisId = u64;

/// One stored run: inputs that identify it plus its summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub created_at: NaiveDateTime,
    pub spec: BessSpec,
    pub strategy: ChargingStrategy,
    pub summary: SimulationSummary,
}

/// Persistence boundary for analyses.
pub trait AnalysisStore: Send + Sync {
    /// Stores a run and returns its newly assigned id.
    fn insert(
        &self,
        spec: BessSpec,
        strategy: ChargingStrategy,
        summary: SimulationSummary,
    ) -> AnalysisId;

    fn get(&self, id: AnalysisId) -> Option<AnalysisRecord>;

    /// All records, oldest first.
    fn list(&self) -> Vec<AnalysisRecord>;
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AnalysisId,
    records: BTreeMap<AnalysisId, AnalysisRecord>,
}

/// Process-local store guarded by a `RwLock`.
///
/// [`InMemoryStore::new`] keeps every record for the life of the process, so
/// memory grows with each simulation. Long-running servers should use
/// [`InMemoryStore::with_max_records`], which evicts the oldest analyses.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    max_records: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `max_records` analyses (at least one). Ids keep
    /// increasing after eviction.
    pub fn with_max_records(max_records: usize) -> Self {
        Self {
            inner: RwLock::default(),
            max_records: Some(max_records.max(1)),
        }
    }
}

impl AnalysisStore for InMemoryStore {
    fn insert(
        &self,
        spec: BessSpec,
        strategy: ChargingStrategy,
        summary: SimulationSummary,
    ) -> AnalysisId {
        // A poisoned lock only means another writer panicked mid-insert; the
        // map itself is still consistent.
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.insert(
            id,
            AnalysisRecord {
                id,
                created_at: chrono::Local::now().naive_local(),
                spec,
                strategy,
                summary,
            },
        );
        if let Some(max) = self.max_records {
            while inner.records.len() > max {
                if let Some((evicted, _)) = inner.records.pop_first() {
                    tracing::debug!(id = evicted, "evicted analysis");
                }
            }
        }
        tracing::debug!(id, "stored analysis");
        id
    }

    fn get(&self, id: AnalysisId) -> Option<AnalysisRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.records.get(&id).cloned()
    }

    fn list(&self) -> Vec<AnalysisRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.records.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::summary::{SummaryParams, summarize};

    fn summary() -> SimulationSummary {
        summarize(&[], &SummaryParams::default())
    }

    #[test]
    fn assigns_increasing_ids() {
        let store = InMemoryStore::new();
        let a = store.insert(BessSpec::new(10.0, 48.0), ChargingStrategy::Solar, summary());
        let b = store.insert(
            BessSpec::new(20.0, 96.0),
            ChargingStrategy::GridOffPeak,
            summary(),
        );
        assert!(b > a);
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.list()[0].id, a);
    }

    #[test]
    fn get_returns_stored_record() {
        let store = InMemoryStore::new();
        let id = store.insert(BessSpec::new(10.0, 48.0), ChargingStrategy::Solar, summary());
        let record = store.get(id).unwrap();
        assert_eq!(record.spec.power_kw, 10.0);
        assert_eq!(record.strategy, ChargingStrategy::Solar);
        assert!(store.get(id + 1).is_none());
    }

    #[test]
    fn bounded_store_evicts_oldest() {
        let store = InMemoryStore::with_max_records(2);
        let ids: Vec<_> = (0..3)
            .map(|_| store.insert(BessSpec::new(10.0, 48.0), ChargingStrategy::Solar, summary()))
            .collect();

        assert_eq!(store.list().len(), 2);
        assert!(store.get(ids[0]).is_none());
        assert_eq!(store.list()[0].id, ids[1]);
        assert_eq!(store.list()[1].id, ids[2]);
    }
}
