//! Persistent, deduplicated storage of observations and derived verdicts.
//!
//! Observations are keyed by station and minute. The first report written
//! under a key is kept for good; a different report for the same key is a
//! [`CacheError::PersistenceConflict`].

pub mod error;
pub mod file;
pub mod memory;

use crate::store::error::CacheError;
use crate::types::observation::Observation;
use crate::types::record::ObservationRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObservationKey {
    pub station: String,
    pub timestamp: DateTime<Utc>,
}

impl ObservationKey {
    pub fn of(observation: &Observation) -> Self {
        Self {
            station: observation.station().to_string(),
            timestamp: observation.timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VerdictKey {
    pub station: String,
    pub timestamp: DateTime<Utc>,
    pub ruleset: String,
}

/// Stored outcome of evaluating one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub vfr: bool,
    pub flyable: bool,
}

/// Storage collaborator used by the collector.
///
/// Implementations must make [`insert_if_absent`](Self::insert_if_absent)
/// atomic per key.
pub trait ObservationStore {
    /// Stores `observation` unless its key is taken. Returns `true` when it was
    /// written and `false` when the identical report was already present.
    fn insert_if_absent(&self, observation: &Observation) -> Result<bool, CacheError>;

    /// Observations of `station` with `begin <= timestamp <= end`, oldest first.
    fn range(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, CacheError>;

    fn contains_any(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CacheError> {
        Ok(!self.range(station, begin, end)?.is_empty())
    }

    /// Inserts or replaces the verdict stored under `key`.
    fn upsert_verdict(&self, key: VerdictKey, verdict: VerdictRecord) -> Result<(), CacheError>;

    /// Looks up the verdict last stored under `key`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the observation was never evaluated under that ruleset.
    fn verdict(&self, key: &VerdictKey) -> Result<Option<VerdictRecord>, CacheError>;

    /// Makes everything written so far durable. Implementations that touch
    /// the disk do so off the async worker threads.
    fn commit(&self) -> impl Future<Output = Result<(), CacheError>> + Send {
        async { Ok(()) }
    }
}

/// The maps shared by the store implementations.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    observations: BTreeMap<ObservationKey, ObservationRecord>,
    verdicts: BTreeMap<VerdictKey, VerdictRecord>,
}

impl StoreState {
    pub(crate) fn insert_if_absent(&mut self, observation: &Observation) -> Result<bool, CacheError> {
        match self.observations.entry(ObservationKey::of(observation)) {
            Entry::Vacant(entry) => {
                entry.insert(observation.to_record());
                Ok(true)
            }
            Entry::Occupied(entry) if entry.get().raw == observation.raw() => Ok(false),
            Entry::Occupied(entry) => Err(CacheError::PersistenceConflict {
                station: entry.key().station.clone(),
                timestamp: entry.key().timestamp,
            }),
        }
    }

    pub(crate) fn range(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, CacheError> {
        self.records_in(station, begin, end)
            .map(|(key, record)| {
                Observation::from_record(record.clone()).map_err(|source| {
                    CacheError::CorruptRecord {
                        station: key.station.clone(),
                        timestamp: key.timestamp,
                        source,
                    }
                })
            })
            .collect()
    }

    pub(crate) fn contains_any(&self, station: &str, begin: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.records_in(station, begin, end).next().is_some()
    }

    fn records_in<'a>(
        &'a self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = (&'a ObservationKey, &'a ObservationRecord)> + 'a {
        let bounds = (begin <= end).then(|| {
            let low = ObservationKey {
                station: station.to_string(),
                timestamp: begin,
            };
            let high = ObservationKey {
                station: station.to_string(),
                timestamp: end,
            };
            low..=high
        });
        bounds
            .into_iter()
            .flat_map(move |bounds| self.observations.range(bounds))
    }

    pub(crate) fn upsert_verdict(&mut self, key: VerdictKey, verdict: VerdictRecord) {
        self.verdicts.insert(key, verdict);
    }

    pub(crate) fn verdict(&self, key: &VerdictKey) -> Option<VerdictRecord> {
        self.verdicts.get(key).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.observations.len()
    }
}
