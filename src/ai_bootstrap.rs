// src/ai_bootstrap.rs
use crate::analyze::ai_adapter::{build_provider, DynProvider};
use crate::analyze::{ClassifierState, SentimentClassifier};
use crate::config::ai::AiConfig;
use std::time::Duration;
use tracing::{info, warn};

pub struct AiRuntime {
    pub cfg: AiConfig,
    pub provider: DynProvider,
}

impl AiRuntime {
    /// `$AI_CONFIG_PATH` / `config/ai.json`, or a disabled runtime when neither exists.
    pub fn from_default() -> anyhow::Result<Self> {
        Ok(Self::from_config(AiConfig::load_default()?))
    }

    pub fn from_config(cfg: AiConfig) -> Self {
        // Safe diagnostics: only provider + enabled + key length
        info!(
            "AI cfg loaded: provider={}, model={}, enabled={}, key_len={}",
            cfg.provider,
            cfg.model,
            cfg.enabled,
            cfg.api_key.len()
        );
        let provider = build_provider(&cfg);
        Self { cfg, provider }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.cfg.timeout_secs)
    }

    /// One throwaway classification to check credentials/connectivity at boot.
    /// Uses its own state, so a failure here does not disable any session.
    pub async fn quick_probe(&self) {
        if !self.cfg.enabled {
            warn!("AI quick_probe skipped: AI is disabled in config");
            return;
        }
        let classifier = SentimentClassifier::new(self.provider.clone(), self.timeout());
        let mut state = ClassifierState::default();
        let out = classifier
            .classify(&mut state, Some("The library wifi keeps dropping during exams."))
            .await;
        info!(label = %out.label, origin = ?out.origin, "AI quick_probe finished");
    }
}
