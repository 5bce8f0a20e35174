//! Line encoder: shorthand phrase to one decoded line.
//!
//! # Responsibility
//! - Validate a raw line record and turn its phrase into one token stream.
//!
//! # Invariants
//! - Exactly one space token sits between consecutive words, none at the ends.
//! - A phrase with zero words yields a line with no tokens.
//! - A line either decodes fully or is rejected; there is no partial line.

use crate::lyrics::symbol_table::SymbolTable;
use crate::lyrics::tokenizer::{GroupTokenizer, UnmatchedPolicy};
use crate::model::line::{check_line_fields, Line};
use crate::model::token::Token;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Decoder knobs shared by the encoder and the import pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeOptions {
    pub unmatched: UnmatchedPolicy,
    /// Reject lines whose shorthand word count differs from the display text.
    pub strict_word_pairing: bool,
}

/// One undecoded line as delivered by ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub timestamp_seconds: f64,
    pub original_text: String,
    /// Space-separated shorthand words, e.g. `(ZnNa) (TeU)`.
    pub shorthand: String,
}

impl RawLine {
    pub fn new(
        timestamp_seconds: f64,
        original_text: impl Into<String>,
        shorthand: impl Into<String>,
    ) -> Self {
        Self {
            timestamp_seconds,
            original_text: original_text.into(),
            shorthand: shorthand.into(),
        }
    }
}

/// Reason a single line was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedLine {
    /// Timestamp is negative or not finite.
    InvalidTimestamp(f64),
    /// Timestamp source text is not a number.
    UnparseableTimestamp(String),
    EmptyOriginalText,
    /// Required source field absent or of the wrong JSON type.
    MissingField(&'static str),
    WordCountMismatch {
        shorthand_words: usize,
        text_words: usize,
    },
    /// A pre-parsed token list does not have the token wire shape.
    InvalidTokens(String),
}

impl Display for MalformedLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp(value) => {
                write!(f, "timestamp must be a finite number >= 0, got {value}")
            }
            Self::UnparseableTimestamp(value) => {
                write!(f, "timestamp `{value}` is not a number")
            }
            Self::EmptyOriginalText => write!(f, "original text must not be empty"),
            Self::MissingField(field) => write!(f, "line field `{field}` is missing or invalid"),
            Self::WordCountMismatch {
                shorthand_words,
                text_words,
            } => write!(
                f,
                "shorthand has {shorthand_words} words but original text has {text_words}"
            ),
            Self::InvalidTokens(detail) => write!(f, "invalid parsed tokens: {detail}"),
        }
    }
}

impl Error for MalformedLine {}

/// A rejected line and its position in the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRejection {
    pub source_index: usize,
    pub reason: MalformedLine,
}

impl Display for LineRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.source_index, self.reason)
    }
}

/// Builds [`Line`] values from raw records.
#[derive(Debug, Clone, Copy)]
pub struct LineEncoder<'t> {
    tokenizer: GroupTokenizer<'t>,
    strict_word_pairing: bool,
}

impl<'t> LineEncoder<'t> {
    pub fn new(table: &'t SymbolTable, options: &DecodeOptions) -> Self {
        Self {
            tokenizer: GroupTokenizer::new(table, options.unmatched),
            strict_word_pairing: options.strict_word_pairing,
        }
    }

    /// Encoder over the canonical table with default options.
    pub fn canonical() -> LineEncoder<'static> {
        LineEncoder::new(SymbolTable::canonical(), &DecodeOptions::default())
    }

    pub fn tokenizer(&self) -> &GroupTokenizer<'t> {
        &self.tokenizer
    }

    /// Validates and decodes one line.
    ///
    /// # Errors
    /// - `InvalidTimestamp` for negative or non-finite timestamps.
    /// - `EmptyOriginalText` for blank display text.
    /// - `WordCountMismatch` when strict pairing is on and counts differ.
    pub fn encode(&self, raw: &RawLine) -> Result<Line, MalformedLine> {
        check_line_fields(raw.timestamp_seconds, &raw.original_text)?;

        let words: Vec<&str> = raw.shorthand.split_whitespace().collect();
        if self.strict_word_pairing {
            let text_words = raw.original_text.split_whitespace().count();
            if !words.is_empty() && words.len() != text_words {
                return Err(MalformedLine::WordCountMismatch {
                    shorthand_words: words.len(),
                    text_words,
                });
            }
        }

        let mut tokens = Vec::new();
        for (index, word) in words.iter().enumerate() {
            if index > 0 {
                tokens.push(Token::Space);
            }
            self.tokenizer.tokenize_into(word, &mut tokens);
        }

        Ok(Line {
            timestamp_seconds: raw.timestamp_seconds,
            original_text: raw.original_text.clone(),
            tokens,
        })
    }
}
