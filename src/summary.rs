//! KPI and chart-series aggregation over a filtered view.
//!
//! Pure counting; the dashboard UI renders these as KPI cards, a sentiment pie/bar, a
//! category bar, and one "by category" bar per polarity.

use serde::Serialize;
use std::collections::HashMap;

use crate::filter::FilteredView;
use crate::ingest::{COL_CATEGORY, COL_SENTIMENT};
use crate::sentiment::Polarity;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Count {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub count: usize,
    /// 0..=100, over rows with a valid polarity label.
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total: usize,
    /// Rows carrying one of the three polarity labels.
    pub total_sentiments: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub kpis: Kpis,
    pub analyzed: bool,
    /// Positive, Neutral, Negative order; labels absent from the view are omitted.
    pub sentiment_distribution: Vec<Share>,
    /// Descending by count.
    pub category_distribution: Vec<Count>,
    /// Per polarity, categories descending by count. Empty polarities are omitted.
    pub by_category: Vec<(Polarity, Vec<Count>)>,
}

impl Summary {
    pub fn count_for(&self, p: Polarity) -> usize {
        match p {
            Polarity::Positive => self.kpis.positive,
            Polarity::Negative => self.kpis.negative,
            Polarity::Neutral => self.kpis.neutral,
        }
    }
}

/// Counts of distinct values, descending; ties keep first-seen order.
pub fn value_counts<'a, I>(values: I) -> Vec<Count>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        let e = counts.entry(v).or_insert_with(|| {
            order.push(v);
            0
        });
        *e += 1;
    }
    let mut out: Vec<Count> = order
        .into_iter()
        .map(|l| Count {
            label: l.to_string(),
            count: counts[l],
        })
        .collect();
    // stable sort keeps first-seen order among ties
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

pub fn summarize(view: &FilteredView<'_>) -> Summary {
    let sentiments: Vec<Option<Polarity>> = view
        .column_values(COL_SENTIMENT)
        .into_iter()
        .map(|v| v.and_then(Polarity::from_label))
        .collect();
    let analyzed = view.dataset().has_column(COL_SENTIMENT);
    let categories = view.column_values(COL_CATEGORY);

    let mut kpis = Kpis {
        total: view.len(),
        ..Default::default()
    };
    for p in sentiments.iter().flatten() {
        kpis.total_sentiments += 1;
        match p {
            Polarity::Positive => kpis.positive += 1,
            Polarity::Negative => kpis.negative += 1,
            Polarity::Neutral => kpis.neutral += 1,
        }
    }

    let mut summary = Summary {
        kpis,
        analyzed,
        category_distribution: value_counts(categories.iter().flatten().copied()),
        ..Default::default()
    };

    for p in Polarity::ALL {
        let n = summary.count_for(p);
        if n > 0 {
            summary.sentiment_distribution.push(Share {
                label: p.as_str().to_string(),
                count: n,
                percent: n as f64 * 100.0 / summary.kpis.total_sentiments as f64,
            });
        }
    }

    if !categories.is_empty() {
        for p in Polarity::ALL {
            let cats = sentiments
                .iter()
                .zip(categories.iter())
                .filter(|(s, _)| **s == Some(p))
                .filter_map(|(_, c)| *c);
            let counts = value_counts(cats);
            if !counts.is_empty() {
                summary.by_category.push((p, counts));
            }
        }
    }

    summary
}
