//! Shorthand group tokenizer.
//!
//! # Responsibility
//! - Decode one shorthand word, e.g. `(ZnNa)`, into element/text tokens.
//!
//! # Invariants
//! - Parentheses are stripped before scanning and never become tokens.
//! - Candidates are scanned greedily left to right as `[A-Z][a-z]?`.
//! - A lookup miss becomes a text token; it is never an error.
//! - Characters outside the pattern follow [`UnmatchedPolicy`].

use crate::lyrics::symbol_table::SymbolTable;
use crate::model::token::Token;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z]?").expect("valid shorthand group regex"));

/// Handling of characters the group pattern does not match (digits,
/// punctuation, a leading lowercase run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Silently skip them; matches the historical decoder output.
    #[default]
    Drop,
    /// Emit each unmatched run as a lower-cased text token in place.
    KeepAsText,
}

/// Pure tokenizer over an injected symbol table.
#[derive(Debug, Clone, Copy)]
pub struct GroupTokenizer<'t> {
    table: &'t SymbolTable,
    policy: UnmatchedPolicy,
}

impl<'t> GroupTokenizer<'t> {
    pub fn new(table: &'t SymbolTable, policy: UnmatchedPolicy) -> Self {
        Self { table, policy }
    }

    /// Tokenizer over the canonical table with the historical drop policy.
    pub fn canonical() -> GroupTokenizer<'static> {
        GroupTokenizer::new(SymbolTable::canonical(), UnmatchedPolicy::Drop)
    }

    pub fn table(&self) -> &'t SymbolTable {
        self.table
    }

    pub fn policy(&self) -> UnmatchedPolicy {
        self.policy
    }

    /// Decodes one word into tokens, appending to `out`.
    pub fn tokenize_into(&self, word: &str, out: &mut Vec<Token>) {
        let cleaned = word.replace(['(', ')'], "");
        let mut cursor = 0;

        for candidate in GROUP_RE.find_iter(&cleaned) {
            self.push_unmatched(&cleaned[cursor..candidate.start()], out);
            let group = candidate.as_str();
            match self.table.lookup(group) {
                Some(descriptor) => out.push(Token::element(descriptor, group)),
                None => out.push(Token::text(group)),
            }
            cursor = candidate.end();
        }
        self.push_unmatched(&cleaned[cursor..], out);
    }

    /// Decodes one word into a fresh token list.
    pub fn tokenize(&self, word: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        self.tokenize_into(word, &mut tokens);
        tokens
    }

    fn push_unmatched(&self, run: &str, out: &mut Vec<Token>) {
        if run.is_empty() {
            return;
        }
        match self.policy {
            UnmatchedPolicy::Drop => {}
            UnmatchedPolicy::KeepAsText => out.push(Token::text(run)),
        }
    }
}
