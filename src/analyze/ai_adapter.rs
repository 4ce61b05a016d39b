//! AI adapter: provider abstraction over an opaque text-in/text-out chat completion.
//!
//! Every call returns a typed `Result`; callers decide what a failure means (the
//! sentiment classifier flips the session to local, the chat assistant answers from stats).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AiConfig;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote AI is disabled")]
    Disabled,
    #[error("missing API key")]
    MissingApiKey,
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("empty completion")]
    EmptyResponse,
    #[error("{0}")]
    Other(String),
}

/// Low-level provider: one remote completion per call.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, RemoteError>;
    /// Provider name for diagnostics/headers.
    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn Provider>;

/// Factory: build a provider according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a mock that always answers "Neutral".
/// * Else if `config.enabled==false`, returns a disabled provider.
/// * Else builds the OpenAI-compatible provider.
pub fn build_provider(config: &AiConfig) -> DynProvider {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockProvider::always("Neutral"));
    }
    if !config.enabled {
        return Arc::new(DisabledProvider);
    }
    match OpenAiProvider::from_config(config) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            tracing::warn!(error = %e, "could not build AI http client; remote disabled");
            Arc::new(DisabledProvider)
        }
    }
}

// ------------------------------------------------------------
// Concrete providers
// ------------------------------------------------------------

/// OpenAI Chat Completions (or any compatible endpoint via `base_url`).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn from_config(cfg: &AiConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .user_agent("student-sentiment-dashboard/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            endpoint: format!("{}/chat/completions", cfg.base_url),
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, RemoteError> {
        if self.api_key.is_empty() {
            return Err(RemoteError::MissingApiKey);
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: &req.messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(RemoteError::Status(resp.status().as_u16()));
        }
        let parsed: Resp = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            Err(RemoteError::EmptyResponse)
        } else {
            Ok(content)
        }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Always fails with [`RemoteError::Disabled`]; used when AI is off.
pub struct DisabledProvider;

#[async_trait]
impl Provider for DisabledProvider {
    async fn complete(&self, _req: &CompletionRequest) -> Result<String, RemoteError> {
        Err(RemoteError::Disabled)
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Scripted provider for tests/local runs.
///
/// Pops queued replies first (`Ok` text or `Err` message), then answers with the
/// fixed reply. Records every request it receives.
pub struct MockProvider {
    fixed: Result<String, String>,
    script: Mutex<VecDeque<Result<String, String>>>,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn always(reply: &str) -> Self {
        Self {
            fixed: Ok(reply.to_string()),
            script: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            fixed: Err(reason.to_string()),
            script: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, reply: Result<&str, &str>) -> Self {
        self.script
            .lock()
            .expect("mock script mutex poisoned")
            .push_back(reply.map(str::to_string).map_err(str::to_string));
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().expect("mock seen mutex poisoned").len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().expect("mock seen mutex poisoned").clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, RemoteError> {
        self.seen
            .lock()
            .expect("mock seen mutex poisoned")
            .push(req.clone());
        let next = self
            .script
            .lock()
            .expect("mock script mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| self.fixed.clone());
        next.map_err(RemoteError::Other)
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}
