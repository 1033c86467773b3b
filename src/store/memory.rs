use crate::store::error::CacheError;
use crate::store::{ObservationStore, StoreState, VerdictKey, VerdictRecord};
use crate::types::observation::Observation;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

/// Store that lives only as long as the process. Useful for tests and one-off
/// analyses.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored observations.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, CacheError> {
        self.state.lock().map_err(|_| CacheError::LockPoisoned)
    }
}

impl ObservationStore for MemoryStore {
    fn insert_if_absent(&self, observation: &Observation) -> Result<bool, CacheError> {
        self.lock()?.insert_if_absent(observation)
    }

    fn range(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, CacheError> {
        self.lock()?.range(station, begin, end)
    }

    fn contains_any(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CacheError> {
        Ok(self.lock()?.contains_any(station, begin, end))
    }

    fn upsert_verdict(&self, key: VerdictKey, verdict: VerdictRecord) -> Result<(), CacheError> {
        self.lock()?.upsert_verdict(key, verdict);
        Ok(())
    }

    fn verdict(&self, key: &VerdictKey) -> Result<Option<VerdictRecord>, CacheError> {
        Ok(self.lock()?.verdict(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::sync::Arc;

    #[test]
    fn concurrent_inserts_keep_one_copy() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let observation =
                        parse("202501020920 METAR EGKA 020920Z 24008KT 9999").unwrap();
                    store.insert_if_absent(&observation).unwrap()
                })
            })
            .collect();

        let written: usize = handles
            .into_iter()
            .map(|handle| usize::from(handle.join().unwrap()))
            .sum();
        assert_eq!(written, 1);
        assert_eq!(store.len().unwrap(), 1);
    }
}
