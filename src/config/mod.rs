// src/config/mod.rs
pub mod ai;
pub mod dashboard;

pub use ai::AiConfig;
pub use dashboard::{AnalysisMethod, DashboardConfig};
