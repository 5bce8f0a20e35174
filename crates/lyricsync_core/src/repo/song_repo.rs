//! Song repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/lookup APIs over the `songs` table.
//! - Provide natural-key lookups (title, audio locator) for merges.
//! - Run a caller's read-modify-write inside one write transaction.
//!
//! # Invariants
//! - `Song::validate()` runs before every insert and update.
//! - Lyrics are stored as one serialized line array and replaced wholesale.
//! - `in_transaction` holds the SQLite write lock for its whole closure, so
//!   concurrent merges never observe a half-written song.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::lyrics::track::LyricTrack;
use crate::model::song::{Song, SongId, SongValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const SONG_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    artist,
    duration_seconds,
    cover_style,
    audio_locator,
    lyrics_json,
    is_active
FROM songs";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for song persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(SongValidationError),
    Db(DbError),
    NotFound(SongId),
    /// Lyrics could not be serialized for storage.
    Serialization(serde_json::Error),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "song not found: {id}"),
            Self::Serialization(err) => write!(f, "failed to serialize lyrics: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "song repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted song data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::NotFound(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<SongValidationError> for RepoError {
    fn from(value: SongValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing songs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongListQuery {
    /// Exact artist filter.
    pub artist: Option<String>,
    pub include_inactive: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for song persistence.
pub trait SongRepository {
    fn create_song(&self, song: &Song) -> RepoResult<SongId>;
    /// Overwrites every stored field of an existing song.
    fn update_song(&self, song: &Song) -> RepoResult<()>;
    fn get_song(&self, id: SongId) -> RepoResult<Option<Song>>;
    /// All songs whose title equals `title` exactly.
    fn find_by_title(&self, title: &str) -> RepoResult<Vec<Song>>;
    /// All songs whose audio locator equals `audio_locator` exactly.
    fn find_by_audio_locator(&self, audio_locator: &str) -> RepoResult<Vec<Song>>;
    /// Lists songs, newest first.
    fn list_songs(&self, query: &SongListQuery) -> RepoResult<Vec<Song>>;
    fn set_song_active(&self, id: SongId, is_active: bool) -> RepoResult<()>;

    /// Runs `work` as one atomic unit; any error rolls every write back.
    fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>;
}

/// SQLite-backed song repository.
pub struct SqliteSongRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSongRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    fn query_songs(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Song>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut songs = Vec::new();
        while let Some(row) = rows.next()? {
            songs.push(parse_song_row(row)?);
        }
        Ok(songs)
    }
}

impl SongRepository for SqliteSongRepository<'_> {
    fn create_song(&self, song: &Song) -> RepoResult<SongId> {
        song.validate()?;
        let lyrics_json = serialize_lyrics(&song.lyrics)?;

        self.conn.execute(
            "INSERT INTO songs (
                uuid,
                title,
                artist,
                duration_seconds,
                cover_style,
                audio_locator,
                lyrics_json,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                song.uuid.to_string(),
                song.title.as_str(),
                song.artist.as_str(),
                song.duration_seconds,
                song.cover_style.as_str(),
                song.audio_locator.as_str(),
                lyrics_json,
                bool_to_int(song.is_active),
            ],
        )?;

        Ok(song.uuid)
    }

    fn update_song(&self, song: &Song) -> RepoResult<()> {
        song.validate()?;
        let lyrics_json = serialize_lyrics(&song.lyrics)?;

        let changed = self.conn.execute(
            "UPDATE songs
             SET
                title = ?1,
                artist = ?2,
                duration_seconds = ?3,
                cover_style = ?4,
                audio_locator = ?5,
                lyrics_json = ?6,
                is_active = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?8;",
            params![
                song.title.as_str(),
                song.artist.as_str(),
                song.duration_seconds,
                song.cover_style.as_str(),
                song.audio_locator.as_str(),
                lyrics_json,
                bool_to_int(song.is_active),
                song.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(song.uuid));
        }

        Ok(())
    }

    fn get_song(&self, id: SongId) -> RepoResult<Option<Song>> {
        let mut songs = self.query_songs(
            &format!("{SONG_SELECT_SQL} WHERE uuid = ?1;"),
            vec![Value::Text(id.to_string())],
        )?;
        Ok(songs.pop())
    }

    fn find_by_title(&self, title: &str) -> RepoResult<Vec<Song>> {
        self.query_songs(
            &format!("{SONG_SELECT_SQL} WHERE title = ?1 ORDER BY created_at ASC, uuid ASC;"),
            vec![Value::Text(title.to_string())],
        )
    }

    fn find_by_audio_locator(&self, audio_locator: &str) -> RepoResult<Vec<Song>> {
        self.query_songs(
            &format!(
                "{SONG_SELECT_SQL} WHERE audio_locator = ?1 ORDER BY created_at ASC, uuid ASC;"
            ),
            vec![Value::Text(audio_locator.to_string())],
        )
    }

    fn list_songs(&self, query: &SongListQuery) -> RepoResult<Vec<Song>> {
        let mut sql = format!("{SONG_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_inactive {
            sql.push_str(" AND is_active = 1");
        }

        if let Some(artist) = query.artist.as_ref() {
            sql.push_str(" AND artist = ?");
            bind_values.push(Value::Text(artist.clone()));
        }

        sql.push_str(" ORDER BY created_at DESC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.query_songs(&sql, bind_values)
    }

    fn set_song_active(&self, id: SongId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE songs
             SET
                is_active = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2;",
            params![bool_to_int(is_active), id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        // IMMEDIATE takes the write lock up front so the read half of a
        // read-modify-write cannot go stale.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let value = work(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

fn serialize_lyrics(lyrics: &LyricTrack) -> RepoResult<String> {
    serde_json::to_string(lyrics).map_err(RepoError::Serialization)
}

fn parse_song_row(row: &Row<'_>) -> RepoResult<Song> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in songs.uuid"))
    })?;

    let lyrics_json: String = row.get("lyrics_json")?;
    let lyrics: LyricTrack = serde_json::from_str(&lyrics_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid lyrics for song {uuid_text}: {err}"))
    })?;

    let is_active = match row.get::<_, i64>("is_active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_active value `{other}` in songs.is_active"
            )));
        }
    };

    let song = Song {
        uuid,
        title: row.get("title")?,
        artist: row.get("artist")?,
        duration_seconds: row.get("duration_seconds")?,
        cover_style: row.get("cover_style")?,
        audio_locator: row.get("audio_locator")?,
        lyrics,
        is_active,
    };
    song.validate()?;
    Ok(song)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
