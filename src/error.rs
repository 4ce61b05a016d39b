//! Error taxonomy for the dashboard.
//!
//! Classification failures never reach this type: the remote classifier degrades to the
//! local one and records the failure in session state. What is left here are the errors
//! a user action can surface (load, analyze, chat plumbing).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// No file at the dataset path.
    #[error("dataset not found at {}", .0.display())]
    NotFound(PathBuf),

    /// Neither the CSV nor the spreadsheet reader could make sense of the file.
    #[error("could not parse dataset {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    /// Remote classification/chat service failed (timeout, auth, network, bad body).
    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(String),

    /// A column required by the operation is absent.
    #[error("column '{0}' not found")]
    MissingColumn(String),

    /// The session has no dataset yet.
    #[error("no dataset loaded; load the dataset first")]
    NoDataset,

    #[error("unknown session: {0}")]
    UnknownSession(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        let e = DashboardError::NotFound(PathBuf::from("data/x.csv"));
        assert_eq!(e.to_string(), "dataset not found at data/x.csv");

        let e = DashboardError::MissingColumn("Raw_Sentiments".into());
        assert_eq!(e.to_string(), "column 'Raw_Sentiments' not found");
    }
}
