//! Lyric shorthand decoding and playback alignment.
//!
//! # Responsibility
//! - Resolve shorthand groups through the symbol table.
//! - Encode raw lines into token streams and assemble ordered tracks.
//! - Parse ingestion documents into raw line records.
//!
//! # Invariants
//! - Everything in this module is pure: no I/O, no shared mutable state.
//! - Per-line failures never abort a whole track.

pub mod line_encoder;
pub mod source;
pub mod symbol_table;
pub mod tokenizer;
pub mod track;
