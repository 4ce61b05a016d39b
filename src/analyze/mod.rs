// src/analyze/mod.rs
//! Analysis pipeline entry: classifies every row of a dataset and writes the
//! `Sentiment` column.

pub mod ai_adapter;
pub mod classifier;

use serde::Serialize;
use tracing::info;

use crate::config::AnalysisMethod;
use crate::error::{DashboardError, Result};
use crate::ingest::{Dataset, COL_SENTIMENT, COL_TEXT};
use crate::sentiment::Polarity;

pub use classifier::{
    normalize_label, Classified, ClassifierState, Origin, RemoteStatus, SentimentClassifier,
};

/// Outcome of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub rows: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    /// Rows answered by the remote model (fresh or memoized).
    pub remote: usize,
    /// Rows answered locally, directly or after a remote problem.
    pub local: usize,
    pub remote_unavailable: bool,
}

/// Classify `Raw_Sentiments` row by row, in order, then store the labels.
///
/// The dataset is only touched once every row has a label.
pub async fn analyze_dataset(
    classifier: &SentimentClassifier,
    state: &mut ClassifierState,
    dataset: &mut Dataset,
    method: AnalysisMethod,
) -> Result<AnalysisReport> {
    let text_idx = dataset
        .column_index(COL_TEXT)
        .ok_or_else(|| DashboardError::MissingColumn(COL_TEXT.to_string()))?;

    let mut report = AnalysisReport {
        rows: dataset.len(),
        ..Default::default()
    };
    let mut labels = Vec::with_capacity(dataset.len());

    for row in 0..dataset.len() {
        let c = classifier
            .classify_with(state, method, dataset.value(row, text_idx))
            .await;
        match c.label {
            Polarity::Positive => report.positive += 1,
            Polarity::Negative => report.negative += 1,
            Polarity::Neutral => report.neutral += 1,
        }
        match c.origin {
            Origin::Remote | Origin::Memo => report.remote += 1,
            Origin::Local | Origin::UnrecognizedFallback | Origin::FailureFallback => {
                report.local += 1
            }
            Origin::Empty => {}
        }
        labels.push(c.label.as_str().to_string());
    }

    dataset.set_column(COL_SENTIMENT, labels);
    report.remote_unavailable = state.remote_unavailable();

    info!(
        rows = report.rows,
        method = ?method,
        provider = classifier.provider_name(),
        remote = report.remote,
        local = report.local,
        remote_unavailable = report.remote_unavailable,
        "sentiment analysis completed"
    );
    Ok(report)
}

/// Short anonymized id for log lines; raw sentiment text is never logged.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("The hostel wifi is terrible");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("The hostel wifi is terrible"));
        assert_ne!(a, anon_hash("The hostel wifi is great"));
    }
}
