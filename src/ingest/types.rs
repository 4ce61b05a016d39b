// src/ingest/types.rs
//! In-memory table: a header plus string cells, rows aligned to the header.

use serde::Serialize;

pub const COL_STUDENT_ID: &str = "Student_ID";
pub const COL_TEXT: &str = "Raw_Sentiments";
pub const COL_CATEGORY: &str = "Category";
pub const COL_RESOLVED: &str = "Resolved";
pub const COL_SENTIMENT: &str = "Sentiment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Build a table, padding/truncating rows to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let records = rows
            .into_iter()
            .map(|mut values| {
                values.resize(width, String::new());
                Record { values }
            })
            .collect();
        Self { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell value; empty/whitespace cells count as missing.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.records
            .get(row)
            .and_then(|r| r.values.get(col))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Cell value looked up by column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        self.column_index(column).and_then(|c| self.value(row, c))
    }

    pub(crate) fn rename_column(&mut self, idx: usize, name: &str) {
        if let Some(c) = self.columns.get_mut(idx) {
            *c = name.to_string();
        }
    }

    /// Replace a column's cells, appending the column if it does not exist yet.
    /// `values` must have one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.records.len());
        let idx = match self.column_index(name) {
            Some(i) => i,
            None => {
                self.columns.push(name.to_string());
                for r in &mut self.records {
                    r.values.push(String::new());
                }
                self.columns.len() - 1
            }
        };
        for (r, v) in self.records.iter_mut().zip(values) {
            r.values[idx] = v;
        }
    }
}
