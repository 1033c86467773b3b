use chrono::{DateTime, Utc};
use std::fmt;

/// A contiguous UTC interval to request from the upstream source. Both ends
/// are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchWindow {
    pub station: String,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    pub fn new(station: impl Into<String>, begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            station: station.into(),
            begin,
            end,
        }
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} to {}",
            self.station,
            self.begin.format("%Y-%m-%d %H:%MZ"),
            self.end.format("%Y-%m-%d %H:%MZ")
        )
    }
}
