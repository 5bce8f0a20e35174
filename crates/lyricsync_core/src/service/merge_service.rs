//! Song reconciliation merge.
//!
//! # Responsibility
//! - Upsert a freshly decoded track plus metadata onto the stored song that
//!   shares its natural key (title first, then audio locator).
//! - Chain document decoding and merging for import callers.
//!
//! # Invariants
//! - Validation failures perform no write.
//! - Ambiguous identity fails closed: nothing is written.
//! - Lyrics are replaced wholesale; absent metadata fields stay untouched.
//! - Re-running a merge with identical input writes nothing and never
//!   creates a duplicate.
//! - Each merge is one read-modify-write inside a single transaction.

use crate::lyrics::line_encoder::{LineEncoder, LineRejection};
use crate::lyrics::source::{decode_song_document, SourceError};
use crate::lyrics::track::LyricTrack;
use crate::model::song::{Song, SongId, SongMetadata, SongValidationError};
use crate::repo::song_repo::{RepoError, SongRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Natural identity used to find an existing song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NaturalKey {
    Title(String),
    AudioLocator(String),
}

impl Display for NaturalKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Title(value) => write!(f, "title `{value}`"),
            Self::AudioLocator(value) => write!(f, "audio locator `{value}`"),
        }
    }
}

/// Merge failures. Every variant leaves storage untouched.
#[derive(Debug)]
pub enum MergeError {
    Validation(SongValidationError),
    /// More than one stored song claims the natural key.
    IdentityConflict {
        key: NaturalKey,
        candidates: Vec<SongId>,
    },
    /// The store rejected the read or write.
    Persistence(RepoError),
}

impl MergeError {
    /// Stable machine-readable code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::IdentityConflict { .. } => "identity_conflict",
            Self::Persistence(_) => "persistence_failed",
        }
    }
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::IdentityConflict { key, candidates } => write!(
                f,
                "{key} matches {} stored songs; refusing to merge",
                candidates.len()
            ),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MergeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::IdentityConflict { .. } => None,
        }
    }
}

impl From<SongValidationError> for MergeError {
    fn from(value: SongValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for MergeError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Persistence(other),
        }
    }
}

/// Import pipeline failures: the document itself or the merge.
#[derive(Debug)]
pub enum ImportError {
    Source(SourceError),
    Merge(MergeError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "{err}"),
            Self::Merge(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Merge(err) => Some(err),
        }
    }
}

impl From<SourceError> for ImportError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<MergeError> for ImportError {
    fn from(value: MergeError) -> Self {
        Self::Merge(value)
    }
}

/// Freshly decoded input for one merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongImport {
    pub metadata: SongMetadata,
    pub track: LyricTrack,
}

/// What a merge did to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created(SongId),
    Updated(SongId),
    /// Stored record already matched the input; nothing was written.
    Unchanged(SongId),
}

impl MergeOutcome {
    pub fn song_id(&self) -> SongId {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Unchanged(id) => *id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Unchanged(_) => "unchanged",
        }
    }
}

/// Result of importing one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub outcome: MergeOutcome,
    /// Number of lines stored with the song.
    pub line_count: usize,
    /// Lines left out of the track, with their source index.
    pub rejections: Vec<LineRejection>,
}

/// Merge facade over a song repository.
pub struct SongImportService<R: SongRepository> {
    repo: R,
}

impl<R: SongRepository> SongImportService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Applies `import` onto the song sharing its natural key, or creates one.
    ///
    /// # Errors
    /// - `Validation` for malformed metadata or missing create-time fields.
    /// - `IdentityConflict` when a natural key is ambiguous in storage.
    /// - `Persistence` when the store fails; the transaction is rolled back.
    pub fn reconcile(&self, import: &SongImport) -> Result<MergeOutcome, MergeError> {
        let started_at = Instant::now();
        let result = import
            .metadata
            .validate()
            .map_err(MergeError::from)
            .and_then(|()| self.repo.in_transaction(|repo| reconcile_in(repo, import)));

        match &result {
            Ok(outcome) => info!(
                "event=song_merge module=service status=ok outcome={} lines={} duration_ms={}",
                outcome.as_str(),
                import.track.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=song_merge module=service status=error error_code={} duration_ms={} error={}",
                err.code(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Decodes a song document and merges it.
    ///
    /// Present fields in `overrides` replace the document's metadata. Per-line
    /// failures are reported in the returned [`ImportReport`]; a document with
    /// no valid lines still merges with an empty track.
    pub fn import_document(
        &self,
        json: &str,
        encoder: &LineEncoder<'_>,
        overrides: &SongMetadata,
    ) -> Result<ImportReport, ImportError> {
        let decoded = decode_song_document(json, encoder)?;
        let import = SongImport {
            metadata: overlay_metadata(decoded.metadata, overrides),
            track: decoded.decode.track,
        };
        let outcome = self.reconcile(&import)?;
        Ok(ImportReport {
            outcome,
            line_count: import.track.len(),
            rejections: decoded.decode.rejections,
        })
    }
}

fn reconcile_in<R: SongRepository>(
    repo: &R,
    import: &SongImport,
) -> Result<MergeOutcome, MergeError> {
    let metadata = &import.metadata;
    let Some(current) = resolve_target(repo, metadata)? else {
        let song = Song::from_metadata(metadata, import.track.clone())?;
        let id = repo.create_song(&song)?;
        return Ok(MergeOutcome::Created(id));
    };

    if let Some(audio_locator) = metadata.audio_locator.as_ref() {
        ensure_locator_unclaimed(repo, audio_locator, current.uuid)?;
    }

    let next = current.patched(metadata, import.track.clone());
    if next == current {
        return Ok(MergeOutcome::Unchanged(current.uuid));
    }
    repo.update_song(&next)?;
    Ok(MergeOutcome::Updated(next.uuid))
}

fn resolve_target<R: SongRepository>(
    repo: &R,
    metadata: &SongMetadata,
) -> Result<Option<Song>, MergeError> {
    if let Some(title) = metadata.title.as_ref() {
        let by_title = single_match(
            repo.find_by_title(title)?,
            NaturalKey::Title(title.clone()),
        )?;
        if by_title.is_some() {
            return Ok(by_title);
        }
    }

    match metadata.audio_locator.as_ref() {
        Some(audio_locator) => single_match(
            repo.find_by_audio_locator(audio_locator)?,
            NaturalKey::AudioLocator(audio_locator.clone()),
        ),
        None => Ok(None),
    }
}

fn single_match(mut songs: Vec<Song>, key: NaturalKey) -> Result<Option<Song>, MergeError> {
    if songs.len() > 1 {
        return Err(MergeError::IdentityConflict {
            key,
            candidates: songs.iter().map(|song| song.uuid).collect(),
        });
    }
    Ok(songs.pop())
}

fn ensure_locator_unclaimed<R: SongRepository>(
    repo: &R,
    audio_locator: &str,
    target: SongId,
) -> Result<(), MergeError> {
    let owners: Vec<SongId> = repo
        .find_by_audio_locator(audio_locator)?
        .into_iter()
        .map(|song| song.uuid)
        .collect();
    if owners.iter().any(|owner| *owner != target) {
        let mut candidates = vec![target];
        candidates.extend(owners.into_iter().filter(|owner| *owner != target));
        return Err(MergeError::IdentityConflict {
            key: NaturalKey::AudioLocator(audio_locator.to_string()),
            candidates,
        });
    }
    Ok(())
}

fn overlay_metadata(base: SongMetadata, overrides: &SongMetadata) -> SongMetadata {
    SongMetadata {
        title: overrides.title.clone().or(base.title),
        artist: overrides.artist.clone().or(base.artist),
        duration_seconds: overrides.duration_seconds.or(base.duration_seconds),
        cover_style: overrides.cover_style.clone().or(base.cover_style),
        audio_locator: overrides.audio_locator.clone().or(base.audio_locator),
    }
}

#[cfg(test)]
mod tests {
    use super::{overlay_metadata, single_match, MergeError, NaturalKey};
    use crate::model::song::SongMetadata;

    #[test]
    fn overlay_prefers_override_fields() {
        let base = SongMetadata {
            title: Some("doc title".to_string()),
            artist: Some("doc artist".to_string()),
            ..SongMetadata::default()
        };
        let overrides = SongMetadata {
            audio_locator: Some("https://cdn.example/a.mp3".to_string()),
            title: Some("cli title".to_string()),
            ..SongMetadata::default()
        };
        let merged = overlay_metadata(base, &overrides);
        assert_eq!(merged.title.as_deref(), Some("cli title"));
        assert_eq!(merged.artist.as_deref(), Some("doc artist"));
        assert_eq!(
            merged.audio_locator.as_deref(),
            Some("https://cdn.example/a.mp3")
        );
    }

    #[test]
    fn single_match_accepts_zero_or_one() {
        let none = single_match(Vec::new(), NaturalKey::Title("t".to_string())).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn merge_error_codes_are_stable() {
        let err = MergeError::IdentityConflict {
            key: NaturalKey::Title("t".to_string()),
            candidates: Vec::new(),
        };
        assert_eq!(err.code(), "identity_conflict");
    }
}
