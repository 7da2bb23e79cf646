//! Publication-date window used to filter streamed results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Input format for window bounds. Zero padding is optional, so both
/// `2023-9-30` and `2023-09-30` parse.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a window bound such as `2023-9-30`.
pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
}

/// Check whether `date` lies within the inclusive `[start, end]` window.
///
/// A missing bound leaves that side of the window open.
pub fn within_window(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    match (start, end) {
        (None, None) => true,
        (Some(start), None) => date >= start,
        (None, Some(end)) => date <= end,
        (Some(start), Some(end)) => start <= date && date <= end,
    }
}

/// Inclusive calendar-date window with optional bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// Earliest accepted publication date
    pub start: Option<NaiveDate>,

    /// Latest accepted publication date
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    /// Create a window from optional bounds
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// A window that accepts every date
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether at least one bound is set
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Whether `date` is inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        within_window(date, self.start, self.end)
    }

    /// Whether `date` is later than the end bound
    pub fn is_after_end(&self, date: NaiveDate) -> bool {
        self.end.is_some_and(|end| date > end)
    }

    /// Whether `date` is earlier than the start bound
    pub fn is_before_start(&self, date: NaiveDate) -> bool {
        self.start.is_some_and(|start| date < start)
    }

    /// Whether the bounds are in order (always true when one is open)
    pub fn is_ordered(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "*".into());
        write!(f, "{}..{}", bound(self.start), bound(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_date_without_padding() {
        assert_eq!(date("2023-9-30"), date("2023-09-30"));
        assert_eq!(date(" 2023-8-5 "), NaiveDate::from_ymd_opt(2023, 8, 5).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("30/09/2023").is_err());
        assert!(parse_date("2023-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_within_window_bounds() {
        let d = date("2023-09-20");
        assert!(within_window(d, None, None));
        assert!(within_window(d, Some(date("2023-09-20")), None));
        assert!(!within_window(d, Some(date("2023-09-21")), None));
        assert!(within_window(d, None, Some(date("2023-09-20"))));
        assert!(!within_window(d, None, Some(date("2023-09-19"))));
        assert!(within_window(d, Some(date("2023-09-15")), Some(date("2023-09-30"))));
        assert!(!within_window(d, Some(date("2023-09-21")), Some(date("2023-09-30"))));
    }

    #[test]
    fn test_unbounded_accepts_everything() {
        let window = DateWindow::unbounded();
        assert!(!window.is_active());
        for s in ["1991-08-14", "2023-09-30", "2099-01-01"] {
            assert!(window.contains(date(s)));
        }
    }

    #[test]
    fn test_widening_never_excludes() {
        let dates = ["2023-09-01", "2023-09-10", "2023-09-15", "2023-09-20", "2023-09-30"];
        let narrow = [
            (Some(date("2023-09-10")), Some(date("2023-09-20"))),
            (Some(date("2023-09-15")), None),
            (None, Some(date("2023-09-15"))),
        ];

        for (start, end) in narrow {
            let wider = [
                (start.map(|s| s - chrono::Days::new(5)), end),
                (start, end.map(|e| e + chrono::Days::new(5))),
                (None, end),
                (start, None),
                (None, None),
            ];
            for d in dates.iter().map(|s| date(s)) {
                if within_window(d, start, end) {
                    for (ws, we) in wider {
                        assert!(within_window(d, ws, we), "{d} dropped by widening");
                    }
                }
            }
        }
    }

    #[test]
    fn test_window_edges() {
        let window = DateWindow::new(Some(date("2023-09-15")), Some(date("2023-09-30")));
        assert!(window.is_active());
        assert!(window.is_after_end(date("2023-10-01")));
        assert!(!window.is_after_end(date("2023-09-30")));
        assert!(window.is_before_start(date("2023-09-14")));
        assert!(!window.is_before_start(date("2023-09-15")));
        assert_eq!(window.to_string(), "2023-09-15..2023-09-30");
        assert_eq!(DateWindow::new(None, Some(date("2023-9-1"))).to_string(), "*..2023-09-01");
    }

    #[test]
    fn test_is_ordered() {
        assert!(DateWindow::new(Some(date("2023-09-01")), Some(date("2023-09-01"))).is_ordered());
        assert!(!DateWindow::new(Some(date("2023-09-02")), Some(date("2023-09-01"))).is_ordered());
        assert!(DateWindow::new(Some(date("2023-09-02")), None).is_ordered());
    }
}
