// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sentiment labels for journal entries.
//!
//! Scoring uses the VADER lexicon and rules (negation, intensifiers,
//! punctuation emphasis). The normalized compound score in [-1, 1] is
//! labelled with VADER's usual ±0.05 cutoffs.

use serde::{Deserialize, Serialize};
use std::fmt;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Compound scores within this distance of zero are neutral.
const NEUTRAL_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn from_compound(compound: f64) -> Self {
        if compound >= NEUTRAL_BAND {
            Sentiment::Positive
        } else if compound <= -NEUTRAL_BAND {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// VADER compound score in [-1, 1]; 0 for blank text.
pub fn score(text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }
    // Typographic apostrophes would hide negations like "didn’t".
    let text = text.replace(['\u{2018}', '\u{2019}'], "'");
    SentimentIntensityAnalyzer::new()
        .polarity_scores(&text)
        .get("compound")
        .copied()
        .unwrap_or(0.0)
}

pub fn analyze(text: &str) -> Sentiment {
    Sentiment::from_compound(score(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_compound_score() {
        assert_eq!(analyze("Today was a good day"), Sentiment::Positive);
        assert_eq!(analyze("I feel sad and lonely"), Sentiment::Negative);
        assert_eq!(analyze("I went to the store"), Sentiment::Neutral);
        assert_eq!(analyze(""), Sentiment::Neutral);
        assert_eq!(analyze("   "), Sentiment::Neutral);
    }

    #[test]
    fn covers_everyday_vocabulary() {
        assert_eq!(analyze("My grandmother died last night"), Sentiment::Negative);
        assert_eq!(analyze("What a lovely morning"), Sentiment::Positive);
        assert_eq!(analyze("I am so lucky to have friends"), Sentiment::Positive);
        assert_eq!(analyze("I miss home and feel lonely"), Sentiment::Negative);
    }

    #[test]
    fn negation_flips_polarity() {
        assert_eq!(analyze("I am happy"), Sentiment::Positive);
        assert_eq!(analyze("I am not happy"), Sentiment::Negative);
        assert_eq!(analyze("I didn’t feel good today"), Sentiment::Negative);
    }

    #[test]
    fn emphasis_strengthens_score() {
        assert!(score("This is great!!!") > score("This is great"));
        assert!(score("HAPPY") > 0.0);
        assert!((-1.0..=1.0).contains(&score("awful awful awful terrible horrible")));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Negative).unwrap(),
            "\"negative\""
        );
    }
}
