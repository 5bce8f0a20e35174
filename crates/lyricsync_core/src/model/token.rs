//! Rendered token model.
//!
//! # Responsibility
//! - Define the tagged token union produced by shorthand decoding.
//! - Keep wire naming stable for playback/UI and persistence consumers.
//!
//! # Invariants
//! - Discriminant values are exactly `element | text | space`.
//! - `raw_text` is always lower-cased.
//! - Concatenating `raw_text` values (and `" "` for spaces) in order rebuilds
//!   the lower-cased, parenthesis-stripped shorthand phrase.

use crate::model::element::ElementDescriptor;
use serde::{Deserialize, Serialize};

/// One renderable unit of a decoded lyric line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    /// Shorthand group resolved through the symbol table.
    Element {
        symbol: String,
        name: String,
        #[serde(rename = "atomicNumber", alias = "number")]
        atomic_number: u32,
        #[serde(rename = "rawText", alias = "value")]
        raw_text: String,
    },
    /// Shorthand group with no table entry.
    Text {
        #[serde(rename = "rawText", alias = "value")]
        raw_text: String,
    },
    /// Separator between two shorthand words.
    Space,
}

impl Token {
    /// Builds an element token from a resolved descriptor and the matched group.
    pub fn element(descriptor: &ElementDescriptor, group: &str) -> Self {
        Self::Element {
            symbol: descriptor.symbol.clone(),
            name: descriptor.name.clone(),
            atomic_number: descriptor.atomic_number,
            raw_text: group.to_lowercase(),
        }
    }

    /// Builds a text token; the run is lower-cased.
    pub fn text(run: &str) -> Self {
        Self::Text {
            raw_text: run.to_lowercase(),
        }
    }

    /// Returns the wire discriminant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Element { .. } => "element",
            Self::Text { .. } => "text",
            Self::Space => "space",
        }
    }

    /// Returns the text this token contributes to the rebuilt phrase.
    pub fn raw_text(&self) -> &str {
        match self {
            Self::Element { raw_text, .. } | Self::Text { raw_text } => raw_text.as_str(),
            Self::Space => " ",
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }
}
