//! Cache-first collection of observations.
//!
//! Days that already have at least one stored report are served from the
//! store. The remaining days are coalesced into as few upstream requests as
//! [`MergePolicy`] allows, fetched one after the other, parsed and persisted
//! before anything is returned.

pub mod error;
pub mod merge;

use crate::collector::error::CollectError;
use crate::collector::merge::{merge_windows, MergePolicy};
use crate::parser::parse;
use crate::source::error::FetchError;
use crate::source::MetarSource;
use crate::store::error::CacheError;
use crate::store::ObservationStore;
use crate::types::fetch_window::FetchWindow;
use crate::types::observation::Observation;
use crate::windows::{resolve_windows, OperatingHours};
use chrono::NaiveDate;
use chrono_tz::Tz;
use log::{debug, info, warn};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How often and how patiently a throttled request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, the first one included.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub struct Collector<S, C> {
    source: S,
    store: C,
    retry: RetryPolicy,
    merge: MergePolicy,
}

impl<S: MetarSource, C: ObservationStore> Collector<S, C> {
    /// Creates a collector reading from `source` and writing to `store`.
    ///
    /// # Arguments
    ///
    /// * `source` - Upstream [`MetarSource`] asked for the days the store lacks.
    /// * `store` - [`ObservationStore`] consulted first and filled with every
    ///   fetched report.
    ///
    /// # Returns
    ///
    /// A collector with the default [`RetryPolicy`] and [`MergePolicy`].
    ///
    /// # Examples
    ///
    /// ```
    /// use metar_archive::{Collector, MemoryStore, OgimetSource, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// let collector = Collector::new(OgimetSource::new(), MemoryStore::new())
    ///     .with_retry_policy(RetryPolicy {
    ///         max_attempts: 3,
    ///         backoff: Duration::from_secs(30),
    ///     });
    /// ```
    pub fn new(source: S, store: C) -> Self {
        Self {
            source,
            store,
            retry: RetryPolicy::default(),
            merge: MergePolicy::default(),
        }
    }

    /// Replaces how throttled requests are retried. See [`RetryPolicy`].
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces how missing days are grouped into upstream requests.
    pub fn with_merge_policy(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// All stored observations of `station` inside the operating hours of
    /// every day from `start` to `end`, fetching the days the store lacks.
    ///
    /// Returned observations are in chronological order. If `cancel` fires,
    /// requests already persisted stay in the store.
    ///
    /// # Arguments
    ///
    /// * `station` - ICAO identifier of the station.
    /// * `start`, `end` - First and last local day, inclusive.
    /// * `hours` - Local operating hours that bound each day's window.
    /// * `timezone` - Zone used to turn the local hours into UTC.
    /// * `cancel` - Optional token checked between requests and while waiting.
    ///
    /// # Errors
    ///
    /// * [`CollectError::Window`] for invalid hours or a reversed date range.
    /// * [`CollectError::RetriesExhausted`] when upstream keeps throttling.
    /// * [`CollectError::Cancelled`] when `cancel` fires.
    /// * [`CollectError::Fetch`] and [`CollectError::Cache`] for source and
    ///   store failures.
    pub async fn collect(
        &self,
        station: &str,
        start: NaiveDate,
        end: NaiveDate,
        hours: &OperatingHours,
        timezone: Tz,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Observation>, CollectError> {
        let windows = resolve_windows(station, start, end, hours, timezone)?;

        let mut missing = Vec::new();
        for window in &windows {
            if !self
                .store
                .contains_any(&window.station, window.begin, window.end)?
            {
                missing.push(window.clone());
            }
        }
        info!(
            "{} of {} days for {} already cached",
            windows.len() - missing.len(),
            windows.len(),
            station
        );

        let requests = merge_windows(missing, &self.merge);
        for (index, request) in requests.iter().enumerate() {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(CollectError::Cancelled);
            }
            info!("Request {}/{}: {}", index + 1, requests.len(), request);
            let lines = self.fetch_with_retry(request, cancel).await?;
            let stored = self.persist(&lines)?;
            self.store.commit().await?;
            info!("Stored {} new observations for {}", stored, request);
        }

        let mut observations = Vec::new();
        for window in &windows {
            observations.extend(
                self.store
                    .range(&window.station, window.begin, window.end)?,
            );
        }
        Ok(observations)
    }

    async fn fetch_with_retry(
        &self,
        request: &FetchWindow,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<String>, CollectError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let fetch = self
                .source
                .fetch_raw(&request.station, request.begin, request.end);
            let result = match cancel {
                Some(token) => tokio::select! {
                    _ = token.cancelled() => return Err(CollectError::Cancelled),
                    result = fetch => result,
                },
                None => fetch.await,
            };

            match result {
                Ok(lines) => return Ok(lines),
                Err(FetchError::NoData) => {
                    info!("No reports upstream for {}", request);
                    return Ok(Vec::new());
                }
                Err(FetchError::Transient { message }) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(CollectError::RetriesExhausted {
                            station: request.station.clone(),
                            attempts: attempt,
                        });
                    }
                    warn!(
                        "Upstream throttled {} ({}), retrying in {:?} (attempt {}/{})",
                        request, message, self.retry.backoff, attempt, self.retry.max_attempts
                    );
                    self.backoff(cancel).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn backoff(&self, cancel: Option<&CancellationToken>) -> Result<(), CollectError> {
        let sleep = tokio::time::sleep(self.retry.backoff);
        match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(CollectError::Cancelled),
                _ = sleep => Ok(()),
            },
            None => {
                sleep.await;
                Ok(())
            }
        }
    }

    /// Parses and stores every line, returning how many were new. Malformed
    /// lines and conflicting duplicates are skipped.
    fn persist(&self, lines: &[String]) -> Result<usize, CollectError> {
        let mut stored = 0;
        for line in lines {
            let observation = match parse(line) {
                Ok(observation) => observation,
                Err(e) => {
                    warn!("Skipping malformed report: {}", e);
                    continue;
                }
            };
            match self.store.insert_if_absent(&observation) {
                Ok(true) => stored += 1,
                Ok(false) => debug!("Already stored: {}", observation.raw()),
                Err(e @ CacheError::PersistenceConflict { .. }) => {
                    warn!("{}, keeping the stored report", e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(stored)
    }
}
