//! Lenient date parsing for spreadsheet-ish cells.
//!
//! Accepts the date shapes that show up in exported sheets; anything else is "not a date".

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &[
    // two-digit year first: "%Y" would accept "24" as year 24
    "%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y", "%B %d, %Y", "%b %d, %Y",
    "%d %B %Y", "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a cell into a calendar date. Empty and unrecognized values yield `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for f in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn accepts_common_shapes() {
        assert_eq!(parse_date("2024-03-05"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date(" 3/5/2024 "), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05 14:30:00"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T14:30:00+08:00"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("March 5, 2024"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("3/5/24"), Some(d(2024, 3, 5)));
    }

    #[test]
    fn rejects_status_strings_and_blanks() {
        assert_eq!(parse_date("On Process"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2024-13-40"), None);
    }
}
