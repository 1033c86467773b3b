//! Turns a range of calendar days plus local operating hours into one UTC
//! [`FetchWindow`] per day.
//!
//! Winter and summer hours are told apart by the zone's DST offset at the
//! winter start hour of each day.

pub mod error;

use crate::types::fetch_window::FetchWindow;
use crate::windows::error::WindowError;
use bon::Builder;
use chrono::{DateTime, LocalResult, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};

/// Timezone used when none is given.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::London;

/// Local wall-clock hours during which reports are wanted.
///
/// # Examples
///
/// ```
/// use metar_archive::OperatingHours;
///
/// let hours = OperatingHours::builder()
///     .start_hour(8)
///     .end_hour(18)
///     .summer_end_hour(20)
///     .build();
/// assert_eq!(hours.summer(), (8, 20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct OperatingHours {
    pub start_hour: u32,
    pub end_hour: u32,
    /// Defaults to `start_hour`.
    pub summer_start_hour: Option<u32>,
    /// Defaults to `end_hour`.
    pub summer_end_hour: Option<u32>,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 18,
            summer_start_hour: Some(8),
            summer_end_hour: Some(20),
        }
    }
}

impl OperatingHours {
    pub fn winter(&self) -> (u32, u32) {
        (self.start_hour, self.end_hour)
    }

    pub fn summer(&self) -> (u32, u32) {
        (
            self.summer_start_hour.unwrap_or(self.start_hour),
            self.summer_end_hour.unwrap_or(self.end_hour),
        )
    }

    pub fn validate(&self) -> Result<(), WindowError> {
        for (start, end) in [self.winter(), self.summer()] {
            for hour in [start, end] {
                if hour > 23 {
                    return Err(WindowError::InvalidHour(hour));
                }
            }
            if end < start {
                return Err(WindowError::InvertedHours { start, end });
            }
        }
        Ok(())
    }
}

/// One window per calendar day from `start` to `end` inclusive, in day order.
pub fn resolve_windows(
    station: &str,
    start: NaiveDate,
    end: NaiveDate,
    hours: &OperatingHours,
    timezone: Tz,
) -> Result<Vec<FetchWindow>, WindowError> {
    if end < start {
        return Err(WindowError::InvertedRange { start, end });
    }
    hours.validate()?;

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| resolve_day(station, day, hours, timezone))
        .collect()
}

fn resolve_day(
    station: &str,
    day: NaiveDate,
    hours: &OperatingHours,
    timezone: Tz,
) -> Result<FetchWindow, WindowError> {
    let (mut start_hour, mut end_hour) = hours.winter();
    let reference = localize(timezone, day, start_hour)?;
    if reference.offset().dst_offset() != TimeDelta::zero() {
        (start_hour, end_hour) = hours.summer();
    }

    let begin = localize(timezone, day, start_hour)?.with_timezone(&Utc);
    let end = localize(timezone, day, end_hour)?.with_timezone(&Utc);
    Ok(FetchWindow::new(station, begin, end))
}

/// Local `hour:00` on `day`. A time skipped by a spring-forward transition
/// resolves to the first valid instant after the gap, a repeated one to its
/// earlier occurrence.
fn localize(timezone: Tz, day: NaiveDate, hour: u32) -> Result<DateTime<Tz>, WindowError> {
    let naive = day
        .and_hms_opt(hour, 0, 0)
        .ok_or(WindowError::InvalidHour(hour))?;
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local),
        LocalResult::Ambiguous(first, second) => Ok(first.min(second)),
        LocalResult::None => timezone
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()
            .ok_or(WindowError::NonexistentLocalTime { date: day, hour }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn hours(start: u32, end: u32, summer_start: u32, summer_end: u32) -> OperatingHours {
        OperatingHours::builder()
            .start_hour(start)
            .end_hour(end)
            .summer_start_hour(summer_start)
            .summer_end_hour(summer_end)
            .build()
    }

    #[test]
    fn one_window_per_day_inclusive() {
        let windows = resolve_windows(
            "EGKA",
            date(2023, 1, 2),
            date(2023, 1, 8),
            &hours(8, 18, 8, 20),
            DEFAULT_TIMEZONE,
        )
        .unwrap();
        assert_eq!(windows.len(), 7);
        assert_eq!(windows[0], FetchWindow::new("EGKA", utc(2023, 1, 2, 8), utc(2023, 1, 2, 18)));
        assert_eq!(windows[6].begin, utc(2023, 1, 8, 8));
        assert!(windows.windows(2).all(|pair| pair[0].begin < pair[1].begin));
    }

    #[test]
    fn summer_hours_apply_under_daylight_saving() {
        let windows = resolve_windows(
            "EGKA",
            date(2023, 7, 1),
            date(2023, 7, 1),
            &hours(8, 18, 8, 20),
            DEFAULT_TIMEZONE,
        )
        .unwrap();
        // 08:00-20:00 BST
        assert_eq!(windows[0].begin, utc(2023, 7, 1, 7));
        assert_eq!(windows[0].end, utc(2023, 7, 1, 19));
    }

    #[test]
    fn spring_forward_days_use_different_offsets() {
        // Clocks go forward at 01:00 UTC on 2025-03-30 in London.
        let windows = resolve_windows(
            "EGKA",
            date(2025, 3, 29),
            date(2025, 3, 30),
            &hours(8, 18, 7, 20),
            DEFAULT_TIMEZONE,
        )
        .unwrap();
        assert_eq!(windows[0].begin, utc(2025, 3, 29, 8));
        assert_eq!(windows[0].end, utc(2025, 3, 29, 18));
        assert_eq!(windows[1].begin, utc(2025, 3, 30, 6));
        assert_eq!(windows[1].end, utc(2025, 3, 30, 19));
    }

    #[test]
    fn hour_inside_the_gap_moves_past_it() {
        let windows = resolve_windows(
            "EGKA",
            date(2025, 3, 30),
            date(2025, 3, 30),
            &hours(1, 5, 1, 5),
            DEFAULT_TIMEZONE,
        )
        .unwrap();
        // 01:00 local does not exist; 02:00 BST is 01:00 UTC.
        assert_eq!(windows[0].begin, utc(2025, 3, 30, 1));
        assert_eq!(windows[0].end, utc(2025, 3, 30, 4));
    }

    #[test]
    fn repeated_hour_takes_the_earlier_instant() {
        // Clocks go back at 01:00 UTC on 2025-10-26 in London, so 01:00 local
        // happens twice: 00:00Z (BST) and 01:00Z (GMT).
        let windows = resolve_windows(
            "EGKA",
            date(2025, 10, 26),
            date(2025, 10, 26),
            &hours(1, 5, 1, 5),
            DEFAULT_TIMEZONE,
        )
        .unwrap();
        assert_eq!(windows[0].begin, utc(2025, 10, 26, 0));
        assert_eq!(windows[0].end, utc(2025, 10, 26, 5));
    }

    #[test]
    fn fall_back_day_checks_summer_time_at_the_repeated_hour() {
        // The check at 01:00 local resolves to BST, so summer hours apply
        // on the day itself and winter hours from the next day.
        let windows = resolve_windows(
            "EGKA",
            date(2025, 10, 26),
            date(2025, 10, 27),
            &hours(1, 5, 2, 6),
            DEFAULT_TIMEZONE,
        )
        .unwrap();
        assert_eq!(windows[0].begin, utc(2025, 10, 26, 2));
        assert_eq!(windows[0].end, utc(2025, 10, 26, 6));
        assert_eq!(windows[1].begin, utc(2025, 10, 27, 1));
        assert_eq!(windows[1].end, utc(2025, 10, 27, 5));
    }

    #[test]
    fn other_timezones_resolve_too() {
        let windows = resolve_windows(
            "KJFK",
            date(2024, 1, 15),
            date(2024, 1, 15),
            &hours(9, 17, 9, 17),
            chrono_tz::America::New_York,
        )
        .unwrap();
        assert_eq!(windows[0].begin, utc(2024, 1, 15, 14));
        assert_eq!(windows[0].end, utc(2024, 1, 15, 22));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let london = DEFAULT_TIMEZONE;
        assert_eq!(
            resolve_windows("EGKA", date(2023, 1, 8), date(2023, 1, 2), &hours(8, 18, 8, 20), london),
            Err(WindowError::InvertedRange {
                start: date(2023, 1, 8),
                end: date(2023, 1, 2)
            })
        );
        assert_eq!(
            resolve_windows("EGKA", date(2023, 1, 2), date(2023, 1, 2), &hours(18, 8, 8, 20), london),
            Err(WindowError::InvertedHours { start: 18, end: 8 })
        );
        assert_eq!(
            resolve_windows("EGKA", date(2023, 1, 2), date(2023, 1, 2), &hours(8, 24, 8, 20), london),
            Err(WindowError::InvalidHour(24))
        );
    }

    #[test]
    fn summer_hours_default_to_winter_hours() {
        let plain = OperatingHours::builder().start_hour(9).end_hour(17).build();
        assert_eq!(plain.summer(), (9, 17));
    }
}
