//! Persistence collaborator for songs.
//!
//! # Responsibility
//! - Define the storage contract the merge service depends on.
//! - Keep SQLite query details out of decoding and merge logic.
//!
//! # Invariants
//! - Write paths validate songs before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod song_repo;
