use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("End date {end} is before start date {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("Hour {0} is not a valid hour of the day")]
    InvalidHour(u32),

    #[error("Local end hour {end} is before local start hour {start}")]
    InvertedHours { start: u32, end: u32 },

    #[error("Local time {hour:02}:00 on {date} does not exist in the configured timezone")]
    NonexistentLocalTime { date: NaiveDate, hour: u32 },
}
