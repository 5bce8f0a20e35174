//! Manifest-driven batch import.
//!
//! # Responsibility
//! - Import every song document listed in a manifest in one run.
//! - Tally what each entry did to storage.
//!
//! # Invariants
//! - One entry failing never stops later entries.
//! - Every entry is merged in its own transaction.
//! - Relative document paths resolve against the manifest's directory.
//!
//! Manifest shape:
//! ```json
//! [
//!   { "lyricsFile": "lyrics2.json", "audioUrl": "https://cdn.example/paaro.mp3" },
//!   { "lyricsFile": "/srv/lyrics/sahiba.json", "title": "Sahiba" }
//! ]
//! ```

use crate::lyrics::line_encoder::LineEncoder;
use crate::model::song::SongMetadata;
use crate::repo::song_repo::SongRepository;
use crate::service::merge_service::{ImportReport, MergeOutcome, SongImportService};
use log::{info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One manifest row: a document plus metadata that overrides the document's.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    #[serde(rename = "lyricsFile")]
    pub lyrics_file: PathBuf,
    #[serde(default, rename = "audioUrl")]
    pub audio_locator: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ManifestEntry {
    fn overrides(&self) -> SongMetadata {
        SongMetadata {
            title: self.title.clone(),
            audio_locator: self.audio_locator.clone(),
            ..SongMetadata::default()
        }
    }
}

#[derive(Debug)]
pub enum ManifestError {
    Read { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl Display for ManifestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read manifest `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid import manifest: {err}"),
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Parsed manifest bound to the directory its relative paths start from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportManifest {
    base_dir: PathBuf,
    entries: Vec<ManifestEntry>,
}

impl ImportManifest {
    /// Parses a JSON array of entries.
    pub fn from_json(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self, ManifestError> {
        let entries = serde_json::from_str(json).map_err(ManifestError::Parse)?;
        Ok(Self {
            base_dir: base_dir.into(),
            entries,
        })
    }

    /// Reads a manifest file; relative entries resolve next to it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json(&json, base_dir)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Absolute or manifest-relative location of an entry's document.
    pub fn resolve(&self, entry: &ManifestEntry) -> PathBuf {
        if entry.lyrics_file.is_absolute() {
            entry.lyrics_file.clone()
        } else {
            self.base_dir.join(&entry.lyrics_file)
        }
    }
}

/// Why an entry was left out of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The document file does not exist.
    Missing,
    /// The document exists but could not be read.
    Unreadable(String),
    /// Decoding or merging failed; storage is untouched for this entry.
    ImportFailed(String),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "file not found"),
            Self::Unreadable(detail) => write!(f, "unreadable: {detail}"),
            Self::ImportFailed(detail) => write!(f, "import failed: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position in the manifest.
    pub index: usize,
    pub lyrics_file: PathBuf,
    pub reason: SkipReason,
}

/// Outcome tally of one batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: Vec<SkippedEntry>,
    /// Reports of the entries that merged, in manifest order.
    pub reports: Vec<ImportReport>,
}

impl BatchSummary {
    /// Entries that reached storage, whether or not they changed it.
    pub fn processed(&self) -> usize {
        self.added + self.updated + self.unchanged
    }

    fn record(&mut self, report: ImportReport) {
        match report.outcome {
            MergeOutcome::Created(_) => self.added += 1,
            MergeOutcome::Updated(_) => self.updated += 1,
            MergeOutcome::Unchanged(_) => self.unchanged += 1,
        }
        self.reports.push(report);
    }
}

impl<R: SongRepository> SongImportService<R> {
    /// Imports every manifest entry, continuing past missing files and
    /// failed merges.
    pub fn import_manifest(
        &self,
        manifest: &ImportManifest,
        encoder: &LineEncoder<'_>,
    ) -> BatchSummary {
        let started_at = Instant::now();
        let mut summary = BatchSummary::default();

        for (index, entry) in manifest.entries().iter().enumerate() {
            let path = manifest.resolve(entry);
            let skip = |reason: SkipReason| SkippedEntry {
                index,
                lyrics_file: entry.lyrics_file.clone(),
                reason,
            };

            let json = match std::fs::read_to_string(&path) {
                Ok(json) => json,
                Err(err) => {
                    let reason = if err.kind() == ErrorKind::NotFound {
                        SkipReason::Missing
                    } else {
                        SkipReason::Unreadable(err.to_string())
                    };
                    warn!(
                        "event=batch_entry module=service status=skip entry_index={} reason={}",
                        index, reason
                    );
                    summary.skipped.push(skip(reason));
                    continue;
                }
            };

            match self.import_document(&json, encoder, &entry.overrides()) {
                Ok(report) => summary.record(report),
                Err(err) => {
                    warn!(
                        "event=batch_entry module=service status=error entry_index={} error={}",
                        index, err
                    );
                    summary
                        .skipped
                        .push(skip(SkipReason::ImportFailed(err.to_string())));
                }
            }
        }

        info!(
            "event=batch_import module=service status=ok added={} updated={} unchanged={} skipped={} duration_ms={}",
            summary.added,
            summary.updated,
            summary.unchanged,
            summary.skipped.len(),
            started_at.elapsed().as_millis()
        );
        summary
    }
}
