//! Lyric track construction and playback alignment.
//!
//! # Responsibility
//! - Decode a song's raw lines into an ordered, immutable track.
//! - Resolve the active line for a playback position in `O(log n)`.
//!
//! # Invariants
//! - `lines` is sorted by `timestamp_seconds`, non-decreasing.
//! - Equal timestamps keep their source order.
//! - A track is never mutated after construction; re-decoding builds a new one.

use crate::lyrics::line_encoder::{LineEncoder, LineRejection, MalformedLine, RawLine};
use crate::model::line::Line;
use log::debug;
use serde::{Deserialize, Serialize};

/// Ordered lyric lines for one song.
///
/// Serialized as a plain array of lines; deserializing validates every line
/// and re-sorts, so stored tracks always satisfy the line and ordering
/// invariants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Line>", into = "Vec<Line>")]
pub struct LyricTrack {
    lines: Vec<Line>,
}

/// Result of decoding a whole song: the valid lines plus per-line rejections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackDecode {
    pub track: LyricTrack,
    /// Rejections ordered by `source_index`.
    pub rejections: Vec<LineRejection>,
}

impl LyricTrack {
    /// Builds a track from decoded lines in any order.
    pub fn from_lines(mut lines: Vec<Line>) -> Self {
        // `sort_by` is stable, so ties keep source order.
        lines.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));
        Self { lines }
    }

    /// Decodes raw lines; malformed ones are reported and skipped.
    pub fn decode(raw_lines: &[RawLine], encoder: &LineEncoder<'_>) -> TrackDecode {
        Self::collect_entries(raw_lines.iter().map(|raw| encoder.encode(raw)))
    }

    /// Collects per-line outcomes into a track plus rejections.
    ///
    /// `source_index` of each rejection is the entry's position in `entries`.
    pub fn collect_entries<I>(entries: I) -> TrackDecode
    where
        I: IntoIterator<Item = Result<Line, MalformedLine>>,
    {
        let mut lines = Vec::new();
        let mut rejections = Vec::new();

        for (source_index, entry) in entries.into_iter().enumerate() {
            match entry {
                Ok(line) => lines.push(line),
                Err(reason) => {
                    debug!(
                        "event=line_rejected module=lyrics status=skip source_index={} reason={}",
                        source_index, reason
                    );
                    rejections.push(LineRejection {
                        source_index,
                        reason,
                    });
                }
            }
        }

        let track = Self::from_lines(lines);
        debug!(
            "event=track_decode module=lyrics status=ok lines={} rejected={}",
            track.len(),
            rejections.len()
        );
        TrackDecode { track, rejections }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the line active at `position_seconds`.
    ///
    /// Returns `None` before the first line, for an empty track, and for a
    /// NaN position.
    pub fn active_index_at(&self, position_seconds: f64) -> Option<usize> {
        let after = self
            .lines
            .partition_point(|line| line.timestamp_seconds <= position_seconds);
        after.checked_sub(1)
    }

    /// Line with the greatest timestamp not exceeding `position_seconds`.
    pub fn active_line_at(&self, position_seconds: f64) -> Option<&Line> {
        self.active_index_at(position_seconds)
            .map(|index| &self.lines[index])
    }

    /// `(start, next_start)` of the line at `index`; the last line has no end.
    pub fn line_window(&self, index: usize) -> Option<(f64, Option<f64>)> {
        let line = self.lines.get(index)?;
        let next = self.lines.get(index + 1).map(|next| next.timestamp_seconds);
        Some((line.timestamp_seconds, next))
    }

    /// Total element tokens across all lines.
    pub fn total_elements(&self) -> usize {
        self.lines.iter().map(Line::element_count).sum()
    }
}

impl TryFrom<Vec<Line>> for LyricTrack {
    type Error = LineRejection;

    fn try_from(lines: Vec<Line>) -> Result<Self, Self::Error> {
        for (source_index, line) in lines.iter().enumerate() {
            line.validate().map_err(|reason| LineRejection {
                source_index,
                reason,
            })?;
        }
        Ok(Self::from_lines(lines))
    }
}

impl From<LyricTrack> for Vec<Line> {
    fn from(track: LyricTrack) -> Self {
        track.lines
    }
}
