//! Song domain model.
//!
//! # Responsibility
//! - Define the persisted song record and the partial metadata used by imports.
//! - Validate record fields before they reach storage.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another song.
//! - `title`, `artist`, `audio_locator` and `cover_style` are non-blank.
//! - `duration_seconds` is finite and `>= 0`.
//! - `lyrics` is replaced wholesale, never patched line by line.

use crate::lyrics::track::LyricTrack;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a persisted song.
pub type SongId = Uuid;

/// Cover styling applied when an import creates a song without one.
pub const DEFAULT_COVER_STYLE: &str = "from-pink-300 to-purple-300";

/// Field-level validation failures for songs and song metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum SongValidationError {
    NilUuid,
    /// A text field is present but blank.
    BlankField(&'static str),
    /// A field required to create a record is absent.
    MissingField(&'static str),
    InvalidDuration(f64),
    /// Neither title nor audio locator is available to identify the song.
    MissingNaturalKey,
}

impl Display for SongValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "song uuid must not be nil"),
            Self::BlankField(field) => write!(f, "song field `{field}` must not be blank"),
            Self::MissingField(field) => {
                write!(f, "song field `{field}` is required to create a song")
            }
            Self::InvalidDuration(value) => {
                write!(f, "song duration must be a finite number >= 0, got {value}")
            }
            Self::MissingNaturalKey => {
                write!(f, "song import needs a title or an audio locator")
            }
        }
    }
}

impl Error for SongValidationError {}

/// Song metadata as delivered by an ingestion collaborator.
///
/// Every field is optional: on update only present fields overwrite stored
/// values, on create the required ones must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default, rename = "duration")]
    pub duration_seconds: Option<f64>,
    #[serde(default, rename = "coverColor")]
    pub cover_style: Option<String>,
    #[serde(default, rename = "audioUrl")]
    pub audio_locator: Option<String>,
}

impl SongMetadata {
    /// Checks present fields; absence is not an error here.
    pub fn validate(&self) -> Result<(), SongValidationError> {
        check_optional_text("title", self.title.as_deref())?;
        check_optional_text("artist", self.artist.as_deref())?;
        check_optional_text("cover_style", self.cover_style.as_deref())?;
        check_optional_text("audio_locator", self.audio_locator.as_deref())?;
        if let Some(duration) = self.duration_seconds {
            check_duration(duration)?;
        }
        if self.title.is_none() && self.audio_locator.is_none() {
            return Err(SongValidationError::MissingNaturalKey);
        }
        Ok(())
    }
}

/// Canonical persisted song record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub uuid: SongId,
    pub title: String,
    pub artist: String,
    pub duration_seconds: f64,
    pub cover_style: String,
    pub audio_locator: String,
    pub lyrics: LyricTrack,
    /// Inactive songs are hidden from listings but keep their identity.
    pub is_active: bool,
}

impl Song {
    /// Builds a new record from metadata, requiring every create-time field.
    ///
    /// # Errors
    /// - `MissingField` when title, artist, duration or audio locator is absent.
    /// - Any field-level error from [`Song::validate`].
    pub fn from_metadata(
        metadata: &SongMetadata,
        lyrics: LyricTrack,
    ) -> Result<Self, SongValidationError> {
        let song = Self {
            uuid: Uuid::new_v4(),
            title: required("title", metadata.title.as_ref())?,
            artist: required("artist", metadata.artist.as_ref())?,
            duration_seconds: metadata
                .duration_seconds
                .ok_or(SongValidationError::MissingField("duration"))?,
            cover_style: metadata
                .cover_style
                .clone()
                .unwrap_or_else(|| DEFAULT_COVER_STYLE.to_string()),
            audio_locator: required("audio_locator", metadata.audio_locator.as_ref())?,
            lyrics,
            is_active: true,
        };
        song.validate()?;
        Ok(song)
    }

    /// Returns a copy with present metadata fields and the lyrics replaced.
    pub fn patched(&self, metadata: &SongMetadata, lyrics: LyricTrack) -> Self {
        let mut next = self.clone();
        if let Some(title) = &metadata.title {
            next.title = title.clone();
        }
        if let Some(artist) = &metadata.artist {
            next.artist = artist.clone();
        }
        if let Some(duration) = metadata.duration_seconds {
            next.duration_seconds = duration;
        }
        if let Some(cover_style) = &metadata.cover_style {
            next.cover_style = cover_style.clone();
        }
        if let Some(audio_locator) = &metadata.audio_locator {
            next.audio_locator = audio_locator.clone();
        }
        next.lyrics = lyrics;
        next
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), SongValidationError> {
        if self.uuid.is_nil() {
            return Err(SongValidationError::NilUuid);
        }
        check_optional_text("title", Some(self.title.as_str()))?;
        check_optional_text("artist", Some(self.artist.as_str()))?;
        check_optional_text("cover_style", Some(self.cover_style.as_str()))?;
        check_optional_text("audio_locator", Some(self.audio_locator.as_str()))?;
        check_duration(self.duration_seconds)
    }
}

fn required(field: &'static str, value: Option<&String>) -> Result<String, SongValidationError> {
    value
        .cloned()
        .ok_or(SongValidationError::MissingField(field))
}

fn check_optional_text(field: &'static str, value: Option<&str>) -> Result<(), SongValidationError> {
    match value {
        Some(text) if text.trim().is_empty() => Err(SongValidationError::BlankField(field)),
        _ => Ok(()),
    }
}

fn check_duration(value: f64) -> Result<(), SongValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SongValidationError::InvalidDuration(value))
    }
}
