use chrono::{Months, NaiveDate};

/// Inclusive range of calendar days to collect.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Every day of `month` (1-12) in `year`. `None` for an invalid month.
    ///
    /// ```
    /// # use metar_archive::DateRange;
    /// let february = DateRange::month(2024, 2).unwrap();
    /// assert_eq!(february.end.to_string(), "2024-02-29");
    /// ```
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(Self { start, end })
    }

    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    /// Reads `2023-01-02` or `02-01-2023` as one day, `2023-01` as a month,
    /// `2023` as a year and `<day>..<day>` as an explicit range.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some((start, end)) = text.split_once("..") {
            return Some(Self {
                start: parse_day(start)?,
                end: parse_day(end)?,
            });
        }
        if let Some(day) = parse_day(text) {
            return Some(Self::day(day));
        }
        match text.split_once('-') {
            Some((year, month)) if year.len() == 4 => Self::month(year.parse().ok()?, month.parse().ok()?),
            None if text.len() == 4 => Self::year(text.parse().ok()?),
            _ => None,
        }
    }

    pub fn days(&self) -> usize {
        self.start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .count()
    }
}

fn parse_day(text: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%d-%m-%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text.trim(), format).ok())
}

/// Anything that names a range of calendar days.
pub trait AnyDate {
    fn date_range(self) -> Option<DateRange>;
}

impl AnyDate for DateRange {
    fn date_range(self) -> Option<DateRange> {
        (self.start <= self.end).then_some(self)
    }
}

impl AnyDate for NaiveDate {
    fn date_range(self) -> Option<DateRange> {
        Some(DateRange::day(self))
    }
}

impl AnyDate for (NaiveDate, NaiveDate) {
    fn date_range(self) -> Option<DateRange> {
        DateRange {
            start: self.0,
            end: self.1,
        }
        .date_range()
    }
}

impl AnyDate for &str {
    fn date_range(self) -> Option<DateRange> {
        DateRange::parse(self)?.date_range()
    }
}

impl AnyDate for String {
    fn date_range(self) -> Option<DateRange> {
        self.as_str().date_range()
    }
}
