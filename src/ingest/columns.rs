// src/ingest/columns.rs
//! Column-name normalization to the canonical schema.

use super::types::{Dataset, COL_CATEGORY, COL_RESOLVED, COL_STUDENT_ID, COL_TEXT};
use tracing::debug;

/// Canonical name → accepted variants, in priority order. Exact, case-sensitive.
const RENAMES: &[(&str, &[&str])] = &[
    (COL_STUDENT_ID, &["student_ID", "Student_id", "student_id"]),
    (
        COL_TEXT,
        &["raw_sentiment_text", "Raw_sentiment_text", "Raw_Sentiment"],
    ),
    (COL_CATEGORY, &["category"]),
    (COL_RESOLVED, &["resolved"]),
];

/// Rename the first matching variant per canonical name. A column already carrying the
/// canonical name wins and its variants are left alone.
pub fn normalize_columns(ds: &mut Dataset) {
    for (canonical, variants) in RENAMES {
        if ds.has_column(canonical) {
            continue;
        }
        let hit = variants
            .iter()
            .find_map(|v| ds.column_index(v).map(|i| (i, *v)));
        if let Some((idx, from)) = hit {
            debug!(from, to = canonical, "renaming column");
            ds.rename_column(idx, canonical);
        }
    }
}
