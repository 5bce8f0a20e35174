//! Ingestion document parsing.
//!
//! # Responsibility
//! - Turn a JSON song document into metadata plus raw per-line records.
//! - Isolate per-line shape problems so one bad line never sinks a document.
//!
//! # Invariants
//! - Line entries keep document order (source index = position).
//! - Only a non-object document or malformed metadata fails the whole parse.
//!
//! Two document shapes are accepted:
//! - `{ title, artist, duration, coverColor, audioUrl, lines: [{ timestamp, originalLine, elements }] }`
//! - a range-keyed map `{ "0-5": { "lyrics": "...", "elements": "(ZnNa)" }, ... }`
//!   where the line timestamp is the numeric start of the key.
//!
//! A line carries either shorthand (`elements`) or an already decoded token
//! list (`parsedTokens`, old `number`/`value` field names accepted). A line
//! with neither is rejected; an explicit empty or null `elements` marks an
//! instrumental line.

use crate::lyrics::line_encoder::{LineEncoder, MalformedLine, RawLine};
use crate::lyrics::track::{LyricTrack, TrackDecode};
use crate::model::line::Line;
use crate::model::song::SongMetadata;
use crate::model::token::Token;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

const METADATA_KEYS: &[&str] = &["title", "artist", "duration", "coverColor", "audioUrl"];
const LINE_ARRAY_KEYS: &[&str] = &["lines", "lyrics"];
const TEXT_KEYS: &[&str] = &["originalLine", "lyrics", "originalText"];
const SHORTHAND_KEYS: &[&str] = &["elements", "shorthand"];
const PARSED_TOKENS_KEY: &str = "parsedTokens";
/// Stored-record fields that may ride along in exported documents.
const IGNORED_KEYS: &[&str] = &[
    "_id",
    "coverUrl",
    "isActive",
    "uploadedBy",
    "createdAt",
    "updatedAt",
    "__v",
];

/// Whole-document parse failures.
#[derive(Debug)]
pub enum SourceError {
    InvalidJson(serde_json::Error),
    /// Top-level value is not a JSON object.
    NotAnObject,
    InvalidMetadata(serde_json::Error),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(err) => write!(f, "song document is not valid JSON: {err}"),
            Self::NotAnObject => write!(f, "song document must be a JSON object"),
            Self::InvalidMetadata(err) => write!(f, "invalid song metadata: {err}"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(err) | Self::InvalidMetadata(err) => Some(err),
            Self::NotAnObject => None,
        }
    }
}

/// One well-shaped line entry of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentLine {
    /// Shorthand still to be decoded.
    Shorthand(RawLine),
    /// Tokens decoded by an earlier export; kept as authored.
    Parsed(Line),
}

/// Parsed document: metadata and line entries in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongDocument {
    pub metadata: SongMetadata,
    pub lines: Vec<Result<DocumentLine, MalformedLine>>,
}

/// Parses a JSON song document in either supported shape.
///
/// # Errors
/// - `InvalidJson` when the text is not JSON.
/// - `NotAnObject` when the top level is not an object.
/// - `InvalidMetadata` when a metadata field has the wrong type.
pub fn parse_song_document(json: &str) -> Result<SongDocument, SourceError> {
    let value: Value = serde_json::from_str(json).map_err(SourceError::InvalidJson)?;
    let Value::Object(object) = value else {
        return Err(SourceError::NotAnObject);
    };

    let line_array = LINE_ARRAY_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array));

    match line_array {
        Some(entries) => {
            let metadata = parse_metadata(&object)?;
            let lines = entries.iter().map(parse_line_object).collect();
            Ok(SongDocument { metadata, lines })
        }
        None => Ok(SongDocument {
            metadata: parse_metadata(&object)?,
            lines: object
                .iter()
                .filter(|(key, _)| {
                    !METADATA_KEYS.contains(&key.as_str()) && !IGNORED_KEYS.contains(&key.as_str())
                })
                .map(|(key, entry)| parse_range_entry(key, entry))
                .collect(),
        }),
    }
}

/// Fully decoded document: metadata plus the track and its rejections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedSong {
    pub metadata: SongMetadata,
    pub decode: TrackDecode,
}

/// Parses and decodes a song document without touching storage.
pub fn decode_song_document(
    json: &str,
    encoder: &LineEncoder<'_>,
) -> Result<DecodedSong, SourceError> {
    let document = parse_song_document(json)?;
    let entries = document.lines.into_iter().map(|entry| match entry? {
        DocumentLine::Shorthand(raw) => encoder.encode(&raw),
        DocumentLine::Parsed(line) => line.validate().map(|()| line),
    });
    Ok(DecodedSong {
        metadata: document.metadata,
        decode: LyricTrack::collect_entries(entries),
    })
}

fn parse_metadata(object: &Map<String, Value>) -> Result<SongMetadata, SourceError> {
    let subset: Map<String, Value> = object
        .iter()
        .filter(|(key, value)| METADATA_KEYS.contains(&key.as_str()) && !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    serde_json::from_value(Value::Object(subset)).map_err(SourceError::InvalidMetadata)
}

fn parse_line_object(entry: &Value) -> Result<DocumentLine, MalformedLine> {
    let object = entry.as_object().ok_or(MalformedLine::MissingField("line"))?;
    let timestamp_seconds = match object.get("timestamp") {
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| MalformedLine::UnparseableTimestamp(number.to_string()))?,
        Some(Value::String(text)) => parse_seconds(text)?,
        Some(other) => return Err(MalformedLine::UnparseableTimestamp(other.to_string())),
        None => return Err(MalformedLine::MissingField("timestamp")),
    };
    line_from_fields(timestamp_seconds, object)
}

fn parse_range_entry(key: &str, entry: &Value) -> Result<DocumentLine, MalformedLine> {
    let start = key.split('-').next().unwrap_or_default();
    let timestamp_seconds = parse_seconds(start).map_err(|_| {
        MalformedLine::UnparseableTimestamp(key.to_string())
    })?;
    let object = entry.as_object().ok_or(MalformedLine::MissingField("line"))?;
    line_from_fields(timestamp_seconds, object)
}

fn line_from_fields(
    timestamp_seconds: f64,
    object: &Map<String, Value>,
) -> Result<DocumentLine, MalformedLine> {
    let original_text = first_string(object, TEXT_KEYS)
        .ok_or(MalformedLine::MissingField("originalLine"))?;
    let shorthand = match SHORTHAND_KEYS.iter().find_map(|key| object.get(*key)) {
        Some(Value::Null) => "",
        Some(Value::String(text)) => text.as_str(),
        Some(_) => return Err(MalformedLine::MissingField("elements")),
        None => {
            let Some(tokens) = object.get(PARSED_TOKENS_KEY) else {
                return Err(MalformedLine::MissingField("elements"));
            };
            return Ok(DocumentLine::Parsed(Line {
                timestamp_seconds,
                original_text: original_text.to_string(),
                tokens: parse_tokens(tokens)?,
            }));
        }
    };
    Ok(DocumentLine::Shorthand(RawLine::new(
        timestamp_seconds,
        original_text,
        shorthand,
    )))
}

fn parse_tokens(value: &Value) -> Result<Vec<Token>, MalformedLine> {
    Vec::<Token>::deserialize(value)
        .map_err(|err| MalformedLine::InvalidTokens(err.to_string()))
}

fn first_string<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
}

fn parse_seconds(text: &str) -> Result<f64, MalformedLine> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| MalformedLine::UnparseableTimestamp(text.to_string()))
}
