//! Upstream providers of raw METAR lines.

pub mod error;
pub mod ogimet;

use crate::source::error::FetchError;
use chrono::{DateTime, Utc};
use std::future::Future;

/// Something that can be asked for the reports of one station between two
/// instants.
///
/// Every returned line starts with a 12 digit `YYYYMMDDHHmm` timestamp,
/// followed by the report text. Returning [`FetchError::NoData`] is preferred
/// over an empty list.
pub trait MetarSource {
    fn fetch_raw(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<String>, FetchError>> + Send;
}
