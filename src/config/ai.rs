// src/config/ai.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "openai" (any OpenAI-compatible endpoint). Case-insensitive.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Client-side bound on every remote call; expiry counts as a failure.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading AI config from {}", path.display()))?;
        let cfg: AiConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing AI config {}", path.display()))?;
        cfg.resolved()
    }

    /// `$AI_CONFIG_PATH`, else `config/ai.json`. A missing file means "AI disabled".
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = env::var(ENV_AI_CONFIG_PATH) {
            return Self::load_from_file(p);
        }
        if Path::new(DEFAULT_AI_CONFIG_PATH).exists() {
            return Self::load_from_file(DEFAULT_AI_CONFIG_PATH);
        }
        Ok(Self::default())
    }

    fn resolved(mut self) -> anyhow::Result<Self> {
        self.provider = self.provider.to_lowercase();
        if self.provider != "openai" {
            anyhow::bail!("Unsupported provider in config: {}", self.provider);
        }

        if self.api_key.trim().eq_ignore_ascii_case("env") {
            // A missing key is not fatal: the provider reports it per call and the
            // session falls back to local classification.
            self.api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        }

        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}
