//! # Filter Engine
//!
//! ANDs category/status/keyword/date-range predicates over a [`Dataset`] and returns an
//! order-preserving [`FilteredView`]. Predicates whose column is absent are skipped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::parse_date;
use crate::ingest::{Dataset, COL_CATEGORY, COL_RESOLVED, COL_TEXT};

/// Date-like columns, highest priority first. Matched case-insensitively.
pub const DATE_COLUMN_CANDIDATES: &[&str] = &["date", "created_at", "timestamp"];

pub const ALL: &str = "All";
const ON_PROCESS: &str = "on process";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Resolved,
    #[serde(rename = "On Process")]
    OnProcess,
}

impl StatusFilter {
    pub const OPTIONS: [StatusFilter; 3] =
        [StatusFilter::All, StatusFilter::Resolved, StatusFilter::OnProcess];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Resolved => "Resolved",
            StatusFilter::OnProcess => "On Process",
        }
    }

    /// Lenient parse for query strings; unknown values mean "All".
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "resolved" => StatusFilter::Resolved,
            "on process" | "on_process" | "onprocess" => StatusFilter::OnProcess,
            _ => StatusFilter::All,
        }
    }

    fn matches(self, resolved: Option<&str>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Resolved => resolved.and_then(parse_date).is_some(),
            StatusFilter::OnProcess => {
                resolved.is_some_and(|v| v.trim().to_lowercase() == ON_PROCESS)
            }
        }
    }
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        self.start <= d && d <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Canonical category label, or `None` for "All".
    pub category: Option<String>,
    pub status: StatusFilter,
    pub keyword: String,
    pub date_range: Option<DateRange>,
}

impl Filters {
    /// Label shown for the category selection ("All" when unset).
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(ALL)
    }
}

/// Matching row indices into a borrowed dataset, in original order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    rows: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of `column` for the rows in view (missing cells are `None`).
    pub fn column_values(&self, column: &str) -> Vec<Option<&'a str>> {
        match self.dataset.column_index(column) {
            Some(c) => self
                .rows
                .iter()
                .map(|&r| self.dataset.value(r, c))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Copies the matching rows out, for serialization.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|&r| self.dataset.records()[r].values.clone())
            .collect()
    }
}

/// First candidate date column with at least one parseable value.
pub fn detect_date_column(ds: &Dataset) -> Option<usize> {
    DATE_COLUMN_CANDIDATES.iter().find_map(|cand| {
        let idx = ds.columns().iter().position(|c| c.eq_ignore_ascii_case(cand))?;
        let any_valid = (0..ds.len()).any(|r| ds.value(r, idx).and_then(parse_date).is_some());
        any_valid.then_some(idx)
    })
}

/// (column name, earliest, latest) of the detected date column.
pub fn date_bounds(ds: &Dataset) -> Option<(String, NaiveDate, NaiveDate)> {
    let idx = detect_date_column(ds)?;
    let mut dates = (0..ds.len()).filter_map(|r| ds.value(r, idx).and_then(parse_date));
    let first = dates.next()?;
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some((ds.columns()[idx].clone(), min, max))
}

pub fn apply_filters<'a>(ds: &'a Dataset, f: &Filters) -> FilteredView<'a> {
    let cat_idx = f
        .category
        .as_deref()
        .filter(|c| *c != ALL)
        .and_then(|c| ds.column_index(COL_CATEGORY).map(|i| (i, c)));
    let status_idx = match f.status {
        StatusFilter::All => None,
        s => ds.column_index(COL_RESOLVED).map(|i| (i, s)),
    };
    // whitespace is part of the needle; only an empty keyword disables the predicate
    let keyword = f.keyword.to_lowercase();
    let text_idx = if keyword.is_empty() {
        None
    } else {
        ds.column_index(COL_TEXT)
    };
    let date_idx = f
        .date_range
        .and_then(|range| detect_date_column(ds).map(|i| (i, range)));

    let rows = (0..ds.len())
        .filter(|&r| match cat_idx {
            Some((i, want)) => ds.value(r, i) == Some(want),
            None => true,
        })
        .filter(|&r| match status_idx {
            Some((i, s)) => s.matches(ds.value(r, i)),
            None => true,
        })
        .filter(|&r| match text_idx {
            Some(i) => ds
                .value(r, i)
                .is_some_and(|t| t.to_lowercase().contains(&keyword)),
            None => true,
        })
        .filter(|&r| match date_idx {
            Some((i, range)) => ds
                .value(r, i)
                .and_then(parse_date)
                .is_some_and(|d| range.contains(d)),
            None => true,
        })
        .collect();

    FilteredView { dataset: ds, rows }
}
