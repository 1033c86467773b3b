//! Entry point tying the upstream source, the observation store and the rule
//! evaluator together.

use crate::analysis::{record_verdicts, AnalysisRow};
use crate::collector::merge::MergePolicy;
use crate::collector::{Collector, RetryPolicy};
use crate::error::MetarArchiveError;
use crate::rules::ruleset::Ruleset;
use crate::source::ogimet::OgimetSource;
use crate::source::MetarSource;
use crate::store::file::FileStore;
use crate::store::ObservationStore;
use crate::types::observation::Observation;
use crate::types::period::AnyDate;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use crate::windows::{OperatingHours, DEFAULT_TIMEZONE};
use bon::bon;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Archive of METAR observations for one or more stations.
///
/// Create one with [`MetarArchive::new()`] to fetch from Ogimet and cache in
/// the user's cache directory, or with [`MetarArchive::from_parts`] to plug in
/// another source or store.
///
/// # Examples
///
/// ```rust,no_run
/// # use metar_archive::{MetarArchive, MetarArchiveError};
/// # use chrono::NaiveDate;
/// # #[tokio::main]
/// # async fn main() -> Result<(), MetarArchiveError> {
/// let archive = MetarArchive::new().await?;
/// let observations = archive
///     .collect()
///     .station("EGKA")
///     .start(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap())
///     .end(NaiveDate::from_ymd_opt(2023, 1, 8).unwrap())
///     .call()
///     .await?;
/// println!("{} reports", observations.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MetarArchive<S = OgimetSource, C = FileStore> {
    collector: Collector<S, C>,
}

impl MetarArchive {
    /// Opens the archive stored in `cache_folder`, creating the folder if
    /// needed.
    ///
    /// # Errors
    ///
    /// * [`MetarArchiveError::CacheDirCreation`] if the folder cannot be created.
    /// * [`MetarArchiveError::Cache`] if an existing store file cannot be read
    ///   or decoded.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, MetarArchiveError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| MetarArchiveError::CacheDirCreation(cache_folder.clone(), e))?;
        let store = tokio::task::spawn_blocking(move || FileStore::open(&cache_folder)).await??;
        Ok(Self::from_parts(OgimetSource::new(), store))
    }

    /// Opens the archive in the default cache directory
    /// (e.g. `~/.cache/metar_archive_cache` on Linux).
    pub async fn new() -> Result<Self, MetarArchiveError> {
        let cache_folder = get_cache_dir().map_err(MetarArchiveError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }
}

#[bon]
impl<S: MetarSource, C: ObservationStore> MetarArchive<S, C> {
    /// Builds an archive from any source and store, e.g. a
    /// [`MemoryStore`](crate::MemoryStore) for a throwaway session.
    ///
    /// # Arguments
    ///
    /// * `source` - Where missing days are fetched from.
    /// * `store` - Where observations and verdicts are kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use metar_archive::{MemoryStore, MetarArchive, OgimetSource};
    ///
    /// let archive = MetarArchive::from_parts(OgimetSource::new(), MemoryStore::new());
    /// ```
    pub fn from_parts(source: S, store: C) -> Self {
        Self {
            collector: Collector::new(source, store),
        }
    }

    /// See [`Collector::with_retry_policy`].
    pub fn with_retry_policy(self, retry: RetryPolicy) -> Self {
        Self {
            collector: self.collector.with_retry_policy(retry),
        }
    }

    pub fn with_merge_policy(self, merge: MergePolicy) -> Self {
        Self {
            collector: self.collector.with_merge_policy(merge),
        }
    }

    pub fn store(&self) -> &C {
        self.collector.store()
    }

    pub fn source(&self) -> &S {
        self.collector.source()
    }

    /// Observations of `station` within the operating hours of each day from
    /// `start` to `end`, fetching only the days not cached yet.
    ///
    /// * `.hours(OperatingHours)`: Optional. Defaults to 08-18 local, 08-20 in summer.
    /// * `.timezone(Tz)`: Optional. Defaults to `Europe/London`.
    /// * `.cancel(CancellationToken)`: Optional. Stops between requests and
    ///   during quota back-off.
    #[builder]
    pub async fn collect(
        &self,
        station: &str,
        start: NaiveDate,
        end: NaiveDate,
        hours: Option<OperatingHours>,
        timezone: Option<Tz>,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<Observation>, MetarArchiveError> {
        let hours = hours.unwrap_or_default();
        let timezone = timezone.unwrap_or(DEFAULT_TIMEZONE);
        Ok(self
            .collector
            .collect(station, start, end, &hours, timezone, cancel.as_ref())
            .await?)
    }

    /// Collects like [`collect`](Self::collect), then evaluates every
    /// observation against `ruleset` and the VFR minima and stores the
    /// verdicts under the ruleset's name.
    #[builder]
    pub async fn analyze(
        &self,
        station: &str,
        start: NaiveDate,
        end: NaiveDate,
        ruleset: &Ruleset,
        hours: Option<OperatingHours>,
        timezone: Option<Tz>,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<AnalysisRow>, MetarArchiveError> {
        let observations = self
            .collect()
            .station(station)
            .start(start)
            .end(end)
            .maybe_hours(hours)
            .maybe_timezone(timezone)
            .maybe_cancel(cancel)
            .call()
            .await?;
        Ok(record_verdicts(self.store(), &observations, ruleset).await?)
    }

    /// [`collect`](Self::collect) with default hours and timezone over any
    /// [`AnyDate`] period.
    ///
    /// # Arguments
    ///
    /// * `station` - ICAO identifier, e.g. `"EGKA"`.
    /// * `period` - A [`DateRange`](crate::DateRange), a `NaiveDate`, a pair of
    ///   dates or a string such as `"2023-01-02"`, `"2023-01"`, `"2023"` or
    ///   `"2023-01-02..2023-01-08"`.
    ///
    /// # Errors
    ///
    /// [`MetarArchiveError::InvalidPeriod`] when `period` names no valid,
    /// ordered range of days, otherwise whatever [`collect`](Self::collect)
    /// returns.
    pub async fn collect_period(
        &self,
        station: &str,
        period: impl AnyDate,
    ) -> Result<Vec<Observation>, MetarArchiveError> {
        let range = period
            .date_range()
            .ok_or(MetarArchiveError::InvalidPeriod)?;
        self.collect()
            .station(station)
            .start(range.start)
            .end(range.end)
            .call()
            .await
    }
}
