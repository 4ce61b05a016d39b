// src/config/dashboard.rs
//! Dashboard settings (`config/dashboard.toml`) plus env overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DASHBOARD_CONFIG_PATH: &str = "config/dashboard.toml";
pub const ENV_DASHBOARD_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_DATASET_PATH: &str = "DATASET_PATH";
pub const DEFAULT_DATASET_PATH: &str = "data/Datasetprojpowerbi.csv";

/// Which classifier an analysis run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMethod {
    /// Hosted model, falling back to local on failure.
    Remote,
    #[default]
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSection {
    pub path: PathBuf,
}

impl Default for DatasetSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATASET_PATH),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    pub default_method: AnalysisMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Sample texts included in the grounding context.
    pub sample_texts: usize,
    /// Categories listed under "Top categories".
    pub top_categories: usize,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 400,
            sample_texts: 3,
            top_categories: 5,
        }
    }
}

/// Idle expiry for sessions nobody closed. `idle_timeout_secs = 0` keeps them forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionsSection {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionsSection {
    /// `(sweep interval, idle timeout)`, or `None` when expiry is off.
    pub fn expiry(&self) -> Option<(Duration, Duration)> {
        if self.idle_timeout_secs == 0 {
            return None;
        }
        Some((
            Duration::from_secs(self.sweep_interval_secs.max(1)),
            Duration::from_secs(self.idle_timeout_secs),
        ))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dataset: DatasetSection,
    pub analysis: AnalysisSection,
    pub chat: ChatSection,
    pub sessions: SessionsSection,
}

impl DashboardConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load using env var + fallbacks:
    /// 1) $DASHBOARD_CONFIG_PATH
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    ///
    /// `$DATASET_PATH` overrides `dataset.path` in every case.
    pub fn load_default() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_DASHBOARD_CONFIG_PATH) {
            Ok(p) => Self::load_from(Path::new(&p))?,
            Err(_) => {
                let p = Path::new(DEFAULT_DASHBOARD_CONFIG_PATH);
                if p.exists() {
                    Self::load_from(p)?
                } else {
                    Self::default()
                }
            }
        };
        if let Ok(p) = std::env::var(ENV_DATASET_PATH) {
            if !p.trim().is_empty() {
                cfg.dataset.path = PathBuf::from(p);
            }
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: DashboardConfig = toml::from_str(
            r#"
            [analysis]
            default_method = "remote"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.default_method, AnalysisMethod::Remote);
        assert_eq!(cfg.dataset.path, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(cfg.chat.max_tokens, 400);
        assert_eq!(cfg.sessions.idle_timeout_secs, 3600);
    }

    #[test]
    fn zero_idle_timeout_disables_expiry() {
        let cfg: DashboardConfig = toml::from_str("[sessions]\nidle_timeout_secs = 0\n").unwrap();
        assert!(cfg.sessions.expiry().is_none());

        let cfg: DashboardConfig =
            toml::from_str("[sessions]\nidle_timeout_secs = 600\nsweep_interval_secs = 0\n")
                .unwrap();
        assert_eq!(
            cfg.sessions.expiry(),
            Some((Duration::from_secs(1), Duration::from_secs(600)))
        );
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_file_and_dataset_path() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("dash.toml");
        fs::write(&p, "[dataset]\npath = \"from-file.csv\"\n").unwrap();

        env::set_var(ENV_DASHBOARD_CONFIG_PATH, p.display().to_string());
        env::remove_var(ENV_DATASET_PATH);
        let cfg = DashboardConfig::load_default().unwrap();
        assert_eq!(cfg.dataset.path, PathBuf::from("from-file.csv"));

        env::set_var(ENV_DATASET_PATH, "from-env.csv");
        let cfg = DashboardConfig::load_default().unwrap();
        assert_eq!(cfg.dataset.path, PathBuf::from("from-env.csv"));

        env::remove_var(ENV_DATASET_PATH);
        env::remove_var(ENV_DASHBOARD_CONFIG_PATH);
    }
}
