use crate::types::fetch_window::FetchWindow;
use chrono::TimeDelta;

/// How close two windows must be to share one upstream request, and how long
/// a single request may become.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    /// Largest gap between the end of a request and the begin of the next
    /// window that still joins them. Defaults to one day.
    pub bridge: TimeDelta,
    /// Longest span from the begin to the end of one request. Defaults to
    /// four weeks.
    pub max_span: TimeDelta,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            bridge: TimeDelta::days(1),
            max_span: TimeDelta::weeks(4),
        }
    }
}

/// Coalesces windows into as few requests as the policy allows.
///
/// Windows of one station are merged when the next one begins no later than
/// `bridge` after the current request ends. A merge that would make the
/// request longer than `max_span` starts a new request instead.
pub fn merge_windows(mut windows: Vec<FetchWindow>, policy: &MergePolicy) -> Vec<FetchWindow> {
    windows.sort_by(|a, b| (&a.station, a.begin).cmp(&(&b.station, b.begin)));

    let mut merged: Vec<FetchWindow> = Vec::new();
    for window in windows {
        match merged.last_mut() {
            Some(current)
                if current.station == window.station
                    && window.begin <= current.end + policy.bridge
                    && current.end.max(window.end) - current.begin <= policy.max_span =>
            {
                current.end = current.end.max(window.end);
            }
            _ => merged.push(window),
        }
    }
    merged
}
