//! Domain model for decoded lyrics and persisted songs.
//!
//! # Responsibility
//! - Define the token, line and song shapes shared by decoding, storage and
//!   playback consumers.
//!
//! # Invariants
//! - Token discriminants are exactly `element | text | space`.
//! - A song owns its lyric lines exclusively.

pub mod element;
pub mod line;
pub mod song;
pub mod token;
