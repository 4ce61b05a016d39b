//! Remote sentiment classification with permanent per-session fallback.
//!
//! State machine per session: `RemoteActive` → `RemoteDisabled` on the first failed call,
//! never back. While active, labels are memoized by exact text.

use std::collections::HashMap;
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ai_adapter::{ChatMessage, CompletionRequest, DynProvider, RemoteError};
use super::anon_hash;
use crate::config::AnalysisMethod;
use crate::sentiment::{Polarity, SentimentAnalyzer};

const SYSTEM_PROMPT: &str = "You are a precise sentiment classifier. \
Return exactly one of: Positive, Negative, Neutral. No punctuation or extras.";

/// (input, expected label) pairs sent ahead of every request.
const FEW_SHOT: [(&str, &str); 3] = [
    ("I love the new library hours, thanks!", "Positive"),
    ("The hostel wifi is terrible and never works.", "Negative"),
    ("The exam schedule was released.", "Neutral"),
];

const TEMPERATURE: f32 = 0.0;
const MAX_TOKENS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    RemoteActive,
    RemoteDisabled,
}

/// Per-session classifier state. Owned by the session, passed in by the caller.
#[derive(Debug, Default)]
pub struct ClassifierState {
    remote_unavailable: bool,
    memo: HashMap<String, Polarity>,
}

impl ClassifierState {
    pub fn status(&self) -> RemoteStatus {
        if self.remote_unavailable {
            RemoteStatus::RemoteDisabled
        } else {
            RemoteStatus::RemoteActive
        }
    }

    pub fn remote_unavailable(&self) -> bool {
        self.remote_unavailable
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Check-and-set; returns true only on the actual transition.
    fn disable_remote(&mut self) -> bool {
        if self.remote_unavailable {
            return false;
        }
        self.remote_unavailable = true;
        true
    }
}

/// How a label was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Missing/empty text.
    Empty,
    Remote,
    Memo,
    /// Local classifier chosen directly (method or disabled remote).
    Local,
    /// Remote answered with something unrecognizable.
    UnrecognizedFallback,
    /// Remote failed; session switched to local.
    FailureFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classified {
    pub label: Polarity,
    pub origin: Origin,
}

pub struct SentimentClassifier {
    provider: DynProvider,
    local: SentimentAnalyzer,
    timeout: Duration,
}

impl SentimentClassifier {
    pub fn new(provider: DynProvider, timeout: Duration) -> Self {
        Self {
            provider,
            local: SentimentAnalyzer::new(),
            timeout,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Classify with the given method. `Local` never touches the remote or the state.
    pub async fn classify_with(
        &self,
        state: &mut ClassifierState,
        method: AnalysisMethod,
        text: Option<&str>,
    ) -> Classified {
        match method {
            AnalysisMethod::Remote => self.classify(state, text).await,
            AnalysisMethod::Local => match non_empty(text) {
                None => Classified {
                    label: Polarity::Neutral,
                    origin: Origin::Empty,
                },
                Some(t) => {
                    counter!("sentiment_local_total").increment(1);
                    Classified {
                        label: self.local.classify(Some(t)),
                        origin: Origin::Local,
                    }
                }
            },
        }
    }

    /// Remote-first classification with fallback.
    pub async fn classify(&self, state: &mut ClassifierState, text: Option<&str>) -> Classified {
        let Some(text) = non_empty(text) else {
            return Classified {
                label: Polarity::Neutral,
                origin: Origin::Empty,
            };
        };

        if state.remote_unavailable {
            counter!("sentiment_local_total").increment(1);
            return Classified {
                label: self.local.classify(Some(text)),
                origin: Origin::Local,
            };
        }

        if let Some(&label) = state.memo.get(text) {
            counter!("sentiment_memo_hits_total").increment(1);
            return Classified {
                label,
                origin: Origin::Memo,
            };
        }

        counter!("sentiment_remote_calls_total").increment(1);
        match self.call_remote(text).await {
            Ok(raw) => {
                let out = match normalize_label(&raw) {
                    Some(label) => Classified {
                        label,
                        origin: Origin::Remote,
                    },
                    None => {
                        debug!(
                            id = %anon_hash(text),
                            raw_len = raw.len(),
                            "unrecognized remote label"
                        );
                        counter!("sentiment_unrecognized_total").increment(1);
                        Classified {
                            label: self.local.classify(Some(text)),
                            origin: Origin::UnrecognizedFallback,
                        }
                    }
                };
                state.memo.insert(text.to_string(), out.label);
                out
            }
            Err(e) => {
                counter!("sentiment_remote_failures_total").increment(1);
                if state.disable_remote() {
                    warn!(
                        provider = self.provider.name(),
                        error = %e,
                        "remote classifier failed; local classifier for the rest of the session"
                    );
                }
                Classified {
                    label: self.local.classify(Some(text)),
                    origin: Origin::FailureFallback,
                }
            }
        }
    }

    async fn call_remote(&self, text: &str) -> Result<String, RemoteError> {
        let req = few_shot_request(text);
        match tokio::time::timeout(self.timeout, self.provider.complete(&req)).await {
            Ok(res) => res,
            Err(_) => Err(RemoteError::Timeout(self.timeout)),
        }
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// System instruction, three labelled examples, then the target text.
pub fn few_shot_request(text: &str) -> CompletionRequest {
    let mut messages = Vec::with_capacity(2 + FEW_SHOT.len() * 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    for (input, label) in FEW_SHOT {
        messages.push(ChatMessage::user(input));
        messages.push(ChatMessage::assistant(label));
    }
    messages.push(ChatMessage::user(format!("Classify: {text}")));
    CompletionRequest {
        messages,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

/// Map raw model output onto a label: whole string first, then its first token.
pub fn normalize_label(raw: &str) -> Option<Polarity> {
    let cleaned = raw
        .trim()
        .to_lowercase()
        .replace('.', "")
        .replace(['\n', '\r'], " ");
    let cleaned = cleaned.trim();

    fn lookup(s: &str) -> Option<Polarity> {
        match s {
            "pos" | "positive" => Some(Polarity::Positive),
            "neg" | "negative" => Some(Polarity::Negative),
            "neu" | "neutral" => Some(Polarity::Neutral),
            _ => None,
        }
    }

    lookup(cleaned).or_else(|| cleaned.split_whitespace().next().and_then(lookup))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_variants() {
        assert_eq!(normalize_label("Positive."), Some(Polarity::Positive));
        assert_eq!(normalize_label("  NEG\n"), Some(Polarity::Negative));
        assert_eq!(normalize_label("neutral sentiment"), Some(Polarity::Neutral));
        assert_eq!(normalize_label("Negative\nbecause wifi"), Some(Polarity::Negative));
        assert_eq!(normalize_label("Mixed feelings"), None);
        assert_eq!(normalize_label(""), None);
    }

    #[test]
    fn request_carries_three_examples_and_target() {
        let req = few_shot_request("The canteen is dirty");
        assert_eq!(req.messages.len(), 8);
        assert_eq!(req.temperature, 0.0);
        assert_eq!(req.max_tokens, 100);
        let labels: Vec<_> = req
            .messages
            .iter()
            .filter(|m| m.role == super::super::ai_adapter::Role::Assistant)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(labels, ["Positive", "Negative", "Neutral"]);
        assert_eq!(
            req.messages.last().unwrap().content,
            "Classify: The canteen is dirty"
        );
    }

    #[test]
    fn disable_is_check_and_set() {
        let mut s = ClassifierState::default();
        assert_eq!(s.status(), RemoteStatus::RemoteActive);
        assert!(s.disable_remote());
        assert!(!s.disable_remote());
        assert_eq!(s.status(), RemoteStatus::RemoteDisabled);
    }
}
