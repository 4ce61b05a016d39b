// src/ingest/mod.rs
//! Dataset Loader/Normalizer.
//!
//! `load` builds a brand-new [`Dataset`]; callers swap it into session state only on
//! success, so a failed load never exposes half-normalized data.

pub mod columns;
pub mod reader;
pub mod types;

use crate::category::classify_category;
use crate::error::{DashboardError, Result};
use metrics::{counter, gauge};
use std::path::Path;
use tracing::{debug, info, warn};

pub use types::{
    Dataset, Record, COL_CATEGORY, COL_RESOLVED, COL_SENTIMENT, COL_STUDENT_ID, COL_TEXT,
};

/// Read, rename columns, and re-derive categories.
pub fn load(path: &Path) -> Result<Dataset> {
    if !path.is_file() {
        counter!("dataset_load_errors_total").increment(1);
        return Err(DashboardError::NotFound(path.to_path_buf()));
    }

    let (header, rows) = match reader::read_csv(path) {
        Ok(t) => t,
        Err(csv_err) => {
            debug!(error = %csv_err, "csv parse failed, trying workbook");
            reader::read_workbook(path).map_err(|wb_err| {
                warn!(
                    path = %path.display(),
                    csv = %csv_err,
                    workbook = %wb_err,
                    "dataset unreadable"
                );
                counter!("dataset_load_errors_total").increment(1);
                DashboardError::Parse {
                    path: path.to_path_buf(),
                    reason: format!("csv: {csv_err:#}; workbook: {wb_err:#}"),
                }
            })?
        }
    };

    let ds = normalize(Dataset::new(header, rows));

    counter!("dataset_loads_total").increment(1);
    gauge!("dataset_rows").set(ds.len() as f64);
    info!(path = %path.display(), rows = ds.len(), columns = ds.columns().len(), "dataset loaded");
    Ok(ds)
}

/// Canonical column names, then one category per row when both inputs exist.
pub fn normalize(mut ds: Dataset) -> Dataset {
    columns::normalize_columns(&mut ds);

    if let (Some(cat_idx), Some(text_idx)) =
        (ds.column_index(COL_CATEGORY), ds.column_index(COL_TEXT))
    {
        let categories = (0..ds.len())
            .map(|row| {
                classify_category(ds.value(row, text_idx), ds.value(row, cat_idx))
                    .as_str()
                    .to_string()
            })
            .collect();
        ds.set_column(COL_CATEGORY, categories);
    }
    ds
}
