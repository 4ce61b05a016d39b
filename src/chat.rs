//! Chat assistant grounded on the current filtered view.
//!
//! The context block is rebuilt for every message from the live filters; only the
//! transcript persists (per session). Remote failure never surfaces as an error: the
//! assistant answers from basic stats or says the service is unreachable.

use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analyze::ai_adapter::{ChatMessage, CompletionRequest, DynProvider, RemoteError};
use crate::config::dashboard::ChatSection;
use crate::filter::{Filters, FilteredView};
use crate::ingest::{COL_CATEGORY, COL_SENTIMENT, COL_TEXT};
use crate::sentiment::Polarity;
use crate::summary::{value_counts, Count};

pub const NO_CONTEXT: &str = "No context available.";
pub const UNAVAILABLE_REPLY: &str =
    "I'm unable to reach the AI service right now. Please try again later.";

const SYSTEM_PROMPT: &str = "You are an expert data analyst for a student sentiments dashboard. \
Answer succinctly using ONLY the provided context when citing numbers. \
If a question is outside the context, say what extra info is needed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub text: String,
    /// False when the reply came from the local fallback.
    pub from_model: bool,
}

fn fmt_counts(counts: &[Count]) -> String {
    if counts.is_empty() {
        return "none".to_string();
    }
    counts
        .iter()
        .map(|c| format!("{}={}", c.label, c.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Context block describing the view: selections, size, columns, tallies, samples.
pub fn build_context(
    view: Option<&FilteredView<'_>>,
    filters: &Filters,
    cfg: &ChatSection,
) -> String {
    let Some(view) = view else {
        return NO_CONTEXT.to_string();
    };

    let sentiments = value_counts(view.column_values(COL_SENTIMENT).into_iter().flatten());
    let mut categories = value_counts(view.column_values(COL_CATEGORY).into_iter().flatten());
    categories.truncate(cfg.top_categories);

    let mut lines = vec![
        format!("Selected status: {}", filters.status.as_str()),
        format!("Selected category: {}", filters.category_label()),
        format!("Rows in current view: {}", view.len()),
        format!("Columns: {}", view.dataset().columns().join(", ")),
        format!("Sentiment counts: {}", fmt_counts(&sentiments)),
        format!("Top categories: {}", fmt_counts(&categories)),
    ];

    let samples: Vec<&str> = view
        .column_values(COL_TEXT)
        .into_iter()
        .flatten()
        .take(cfg.sample_texts)
        .collect();
    if !samples.is_empty() {
        lines.push(format!("Sample sentiments: {}", samples.join(" | ")));
    }
    lines.join("\n")
}

/// Reply used when the model is unreachable.
pub fn fallback_reply(message: &str, view: Option<&FilteredView<'_>>) -> String {
    let analyzed = view.is_some_and(|v| v.dataset().has_column(COL_SENTIMENT));
    match view {
        Some(v) if analyzed && message.to_lowercase().contains("negative") => {
            let neg = v
                .column_values(COL_SENTIMENT)
                .into_iter()
                .filter(|s| *s == Some(Polarity::Negative.as_str()))
                .count();
            format!("There are {neg} negative sentiments in the current view.")
        }
        _ => UNAVAILABLE_REPLY.to_string(),
    }
}

pub struct ChatAssistant {
    provider: DynProvider,
    cfg: ChatSection,
    timeout: Duration,
}

impl ChatAssistant {
    pub fn new(provider: DynProvider, cfg: ChatSection, timeout: Duration) -> Self {
        Self {
            provider,
            cfg,
            timeout,
        }
    }

    /// Answer one message and append both turns to `transcript`.
    pub async fn respond(
        &self,
        transcript: &mut Vec<ChatTurn>,
        message: &str,
        view: Option<&FilteredView<'_>>,
        filters: &Filters,
    ) -> ChatReply {
        counter!("chat_messages_total").increment(1);
        transcript.push(ChatTurn {
            role: ChatRole::User,
            text: message.to_string(),
        });

        let context = build_context(view, filters, &self.cfg);
        let req = CompletionRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!("Context about current view:\n{context}")),
                ChatMessage::user(message),
            ],
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
        };

        let result = match tokio::time::timeout(self.timeout, self.provider.complete(&req)).await {
            Ok(r) => r,
            Err(_) => Err(RemoteError::Timeout(self.timeout)),
        };

        let reply = match result {
            Ok(text) => ChatReply {
                text,
                from_model: true,
            },
            Err(e) => {
                counter!("chat_remote_failures_total").increment(1);
                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "chat completion failed; answering locally"
                );
                ChatReply {
                    text: fallback_reply(message, view),
                    from_model: false,
                }
            }
        };

        transcript.push(ChatTurn {
            role: ChatRole::Assistant,
            text: reply.text.clone(),
        });
        reply
    }
}
