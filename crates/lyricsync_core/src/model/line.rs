//! Lyric line model.
//!
//! # Responsibility
//! - Hold one decoded line: start time, display text and token stream.
//!
//! # Invariants
//! - `timestamp_seconds` is finite and `>= 0`.
//! - `original_text` is non-empty.
//! - Lines are only produced by the line encoder or by deserializing stored
//!   tracks; a line is never mutated after it joins a track.

use crate::lyrics::line_encoder::MalformedLine;
use crate::model::token::Token;
use serde::{Deserialize, Serialize};

/// One time-stamped lyric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Line start in seconds from the beginning of the audio.
    #[serde(rename = "timestamp")]
    pub timestamp_seconds: f64,
    /// Display text as authored.
    #[serde(rename = "originalLine")]
    pub original_text: String,
    /// Ordered token stream for rendering.
    #[serde(rename = "parsedTokens", default)]
    pub tokens: Vec<Token>,
}

impl Line {
    /// Checks the timestamp and display-text invariants.
    pub fn validate(&self) -> Result<(), MalformedLine> {
        check_line_fields(self.timestamp_seconds, &self.original_text)
    }

    /// Canonical symbols of element tokens in order.
    pub fn element_symbols(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter_map(|token| match token {
                Token::Element { symbol, .. } => Some(symbol.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Rebuilds the lower-cased shorthand phrase from the token stream.
    pub fn shorthand_text(&self) -> String {
        self.tokens.iter().map(Token::raw_text).collect()
    }

    pub fn element_count(&self) -> usize {
        self.tokens.iter().filter(|token| token.is_element()).count()
    }
}

pub(crate) fn check_line_fields(
    timestamp_seconds: f64,
    original_text: &str,
) -> Result<(), MalformedLine> {
    if !timestamp_seconds.is_finite() || timestamp_seconds < 0.0 {
        return Err(MalformedLine::InvalidTimestamp(timestamp_seconds));
    }
    if original_text.trim().is_empty() {
        return Err(MalformedLine::EmptyOriginalText);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Line;
    use crate::lyrics::line_encoder::MalformedLine;

    fn line(timestamp_seconds: f64, text: &str) -> Line {
        Line {
            timestamp_seconds,
            original_text: text.to_string(),
            tokens: Vec::new(),
        }
    }

    #[test]
    fn validate_accepts_well_formed_line() {
        assert_eq!(line(0.0, "intro").validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_bad_timestamp_and_blank_text() {
        assert_eq!(
            line(-0.5, "x").validate(),
            Err(MalformedLine::InvalidTimestamp(-0.5))
        );
        assert!(matches!(
            line(f64::INFINITY, "x").validate(),
            Err(MalformedLine::InvalidTimestamp(_))
        ));
        assert_eq!(line(1.0, "  ").validate(), Err(MalformedLine::EmptyOriginalText));
    }
}
