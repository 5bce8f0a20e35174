//! Core lyric shorthand decoding and playback alignment.
//!
//! Decodes element-symbol shorthand (`(ZnNa) (TeU)`) into renderable token
//! streams, resolves the active lyric line for a playback position, and
//! reconciles decoded tracks into the song store.

pub mod config;
pub mod db;
pub mod logging;
pub mod lyrics;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LoggingConfig, LyricsyncConfig};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status};
pub use lyrics::line_encoder::{DecodeOptions, LineEncoder, LineRejection, MalformedLine, RawLine};
pub use lyrics::source::{
    decode_song_document, parse_song_document, DecodedSong, DocumentLine, SongDocument, SourceError,
};
pub use lyrics::symbol_table::{SymbolTable, SymbolTableError, SYMBOL_TABLE_VERSION};
pub use lyrics::tokenizer::{GroupTokenizer, UnmatchedPolicy};
pub use lyrics::track::{LyricTrack, TrackDecode};
pub use model::element::ElementDescriptor;
pub use model::line::Line;
pub use model::song::{Song, SongId, SongMetadata, SongValidationError, DEFAULT_COVER_STYLE};
pub use model::token::Token;
pub use repo::song_repo::{
    RepoError, RepoResult, SongListQuery, SongRepository, SqliteSongRepository,
};
pub use service::batch_import::{
    BatchSummary, ImportManifest, ManifestEntry, ManifestError, SkipReason, SkippedEntry,
};
pub use service::merge_service::{
    ImportError, ImportReport, MergeError, MergeOutcome, NaturalKey, SongImport,
    SongImportService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
