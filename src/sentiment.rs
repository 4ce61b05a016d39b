//! Local lexicon-based polarity classifier.
//!
//! Score is the mean polarity of the lexicon words found in the text, each hit scaled by a
//! directly preceding intensifier and flipped (×-0.5) when a negator sits in the three
//! tokens before it. The result is clamped to [-1, 1] and cut at ±0.1.

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

static LEXICON: Lazy<HashMap<String, f32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, f32>>(raw).unwrap_or_else(|e| {
        // An empty lexicon scores everything as Neutral.
        warn!(error = %e, "sentiment lexicon unreadable");
        HashMap::new()
    })
});

/// Cut-off for a non-neutral label (exclusive).
pub const POLARITY_THRESHOLD: f32 = 0.1;

const NEGATION_FACTOR: f32 = -0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    /// Display order used by the dashboard charts.
    pub const ALL: [Polarity; 3] = [Polarity::Positive, Polarity::Neutral, Polarity::Negative];

    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Positive => "Positive",
            Polarity::Negative => "Negative",
            Polarity::Neutral => "Neutral",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    pub fn from_score(score: f32) -> Self {
        if !score.is_finite() {
            Polarity::Neutral
        } else if score > POLARITY_THRESHOLD {
            Polarity::Positive
        } else if score < -POLARITY_THRESHOLD {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_polarity(&self, w: &str) -> Option<f32> {
        LEXICON.get(w).copied()
    }

    /// Returns (polarity score in [-1, 1], number of lexicon hits).
    pub fn score_text(&self, text: &str) -> (f32, usize) {
        // indexed backwards for negation/intensifier lookups
        let tokens: Vec<String> = tokenize(text).collect();
        let mut hits: Vec<f32> = Vec::new();

        for i in 0..tokens.len() {
            let Some(base) = self.word_polarity(tokens[i].as_str()) else {
                continue;
            };

            let boost = if i >= 1 {
                intensity(tokens[i - 1].as_str()).unwrap_or(1.0)
            } else {
                1.0
            };
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));

            let mut p = base * boost;
            if negated {
                p *= NEGATION_FACTOR;
            }
            hits.push(p.clamp(-1.0, 1.0));
        }

        if hits.is_empty() {
            return (0.0, 0);
        }
        let mean = hits.iter().sum::<f32>() / hits.len() as f32;
        (mean.clamp(-1.0, 1.0), hits.len())
    }

    /// Polarity label for a possibly missing text. Empty/whitespace → Neutral.
    pub fn classify(&self, text: Option<&str>) -> Polarity {
        match text.map(str::trim) {
            None | Some("") => Polarity::Neutral,
            Some(t) => Polarity::from_score(self.score_text(t).0),
        }
    }
}

/// Convenience wrapper over [`SentimentAnalyzer::classify`].
pub fn classify_sentiment_local(text: Option<&str>) -> Polarity {
    SentimentAnalyzer::new().classify(text)
}

/// Lower-cased word tokens; apostrophes stay inside words so "isn't" survives.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    static RE_WORD: OnceCell<Regex> = OnceCell::new();
    let re = RE_WORD.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}]+(?:['\x{2019}][\p{L}\p{N}]+)*").expect("word regex")
    });
    re.find_iter(s)
        .map(|m| m.as_str().replace('\u{2019}', "'").to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "weren't"
            | "won't"
            | "can't"
            | "cannot"
            | "don't"
            | "doesn't"
            | "didn't"
            | "hardly"
            | "without"
    )
}

fn intensity(tok: &str) -> Option<f32> {
    match tok {
        "very" | "really" | "so" | "too" | "super" | "highly" => Some(1.3),
        "extremely" | "incredibly" | "totally" => Some(1.5),
        "quite" | "pretty" => Some(1.1),
        "slightly" | "somewhat" | "kinda" => Some(0.5),
        _ => None,
    }
}
