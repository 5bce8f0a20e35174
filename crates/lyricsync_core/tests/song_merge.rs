use lyricsync_core::db::{open_db, open_db_in_memory};
use lyricsync_core::{
    ImportError, LineEncoder, LyricTrack, MergeError, MergeOutcome, NaturalKey, RawLine, Song,
    SongImport, SongImportService, SongListQuery, SongMetadata, SongRepository,
    SongValidationError, SqliteSongRepository,
};
use std::sync::Arc;

const AUDIO_A: &str = "https://cdn.example/finding-her.mp3";
const AUDIO_B: &str = "https://cdn.example/paaro.mp3";

fn full_metadata(title: &str, audio_locator: &str) -> SongMetadata {
    SongMetadata {
        title: Some(title.to_string()),
        artist: Some("The Elements".to_string()),
        duration_seconds: Some(52.0),
        cover_style: Some("from-pink-300 to-purple-300".to_string()),
        audio_locator: Some(audio_locator.to_string()),
    }
}

fn track(lines: &[(f64, &str, &str)]) -> LyricTrack {
    let raw: Vec<RawLine> = lines
        .iter()
        .map(|(timestamp, text, shorthand)| RawLine::new(*timestamp, *text, *shorthand))
        .collect();
    LyricTrack::decode(&raw, &LineEncoder::canonical()).track
}

fn import(title: &str, audio_locator: &str) -> SongImport {
    SongImport {
        metadata: full_metadata(title, audio_locator),
        track: track(&[(0.0, "zinc sodium", "(ZnNa)"), (4.0, "tell you", "(TeU)")]),
    }
}

fn count_songs(repo: &SqliteSongRepository<'_>) -> usize {
    repo.list_songs(&SongListQuery {
        include_inactive: true,
        ..SongListQuery::default()
    })
    .unwrap()
    .len()
}

#[test]
fn first_merge_creates_song() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());

    let outcome = service.reconcile(&import("Finding Her", AUDIO_A)).unwrap();
    let MergeOutcome::Created(id) = outcome else {
        panic!("expected create, got {outcome:?}");
    };

    let stored = service.repo().get_song(id).unwrap().unwrap();
    assert_eq!(stored.title, "Finding Her");
    assert_eq!(stored.lyrics.len(), 2);
}

#[test]
fn repeated_merge_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let input = import("Finding Her", AUDIO_A);

    let first = service.reconcile(&input).unwrap();
    let before = service.repo().get_song(first.song_id()).unwrap().unwrap();
    let updated_at_before: i64 = updated_at(&conn, &before);

    let second = service.reconcile(&input).unwrap();
    assert_eq!(second, MergeOutcome::Unchanged(first.song_id()));

    let after = service.repo().get_song(first.song_id()).unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(updated_at(&conn, &after), updated_at_before);
    assert_eq!(service.repo().find_by_title("Finding Her").unwrap().len(), 1);
    assert_eq!(count_songs(service.repo()), 1);
}

#[test]
fn update_replaces_lyrics_wholesale_and_keeps_absent_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let created = service.reconcile(&import("Finding Her", AUDIO_A)).unwrap();

    let patch = SongImport {
        metadata: SongMetadata {
            title: Some("Finding Her".to_string()),
            duration_seconds: Some(61.5),
            ..SongMetadata::default()
        },
        track: track(&[(2.0, "only line", "(U)")]),
    };
    let outcome = service.reconcile(&patch).unwrap();
    assert_eq!(outcome, MergeOutcome::Updated(created.song_id()));

    let stored = service.repo().get_song(created.song_id()).unwrap().unwrap();
    assert_eq!(stored.duration_seconds, 61.5);
    assert_eq!(stored.artist, "The Elements");
    assert_eq!(stored.audio_locator, AUDIO_A);
    assert_eq!(stored.lyrics.len(), 1);
    assert_eq!(stored.lyrics.lines()[0].element_symbols(), vec!["U"]);
}

#[test]
fn falls_back_to_audio_locator_when_title_is_new() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let created = service.reconcile(&import("Jana Tu Aata Nahi", AUDIO_A)).unwrap();

    let renamed = service.reconcile(&import("Finding Her", AUDIO_A)).unwrap();
    assert_eq!(renamed, MergeOutcome::Updated(created.song_id()));

    let stored = service.repo().get_song(created.song_id()).unwrap().unwrap();
    assert_eq!(stored.title, "Finding Her");
    assert_eq!(count_songs(service.repo()), 1);
}

#[test]
fn title_match_wins_over_audio_locator() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let by_title = service.reconcile(&import("Finding Her", AUDIO_A)).unwrap();

    let mut input = import("Finding Her", AUDIO_B);
    input.metadata.artist = Some("Renamed Artist".to_string());
    let outcome = service.reconcile(&input).unwrap();

    assert_eq!(outcome, MergeOutcome::Updated(by_title.song_id()));
    let stored = service.repo().get_song(by_title.song_id()).unwrap().unwrap();
    assert_eq!(stored.audio_locator, AUDIO_B);
}

#[test]
fn ambiguous_title_fails_closed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSongRepository::try_new(&conn).unwrap();
    let first = Song::from_metadata(&full_metadata("Dhun", AUDIO_A), LyricTrack::default()).unwrap();
    let second = Song::from_metadata(&full_metadata("Dhun", AUDIO_B), LyricTrack::default()).unwrap();
    repo.create_song(&first).unwrap();
    repo.create_song(&second).unwrap();
    let service = SongImportService::new(repo);

    let err = service.reconcile(&import("Dhun", AUDIO_A)).unwrap_err();
    match err {
        MergeError::IdentityConflict { key, candidates } => {
            assert_eq!(key, NaturalKey::Title("Dhun".to_string()));
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    let untouched = service.repo().get_song(first.uuid).unwrap().unwrap();
    assert!(untouched.lyrics.is_empty());
}

#[test]
fn taking_a_locator_owned_by_another_song_fails_closed() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let finding_her = service.reconcile(&import("Finding Her", AUDIO_A)).unwrap();
    service.reconcile(&import("Paaro", AUDIO_B)).unwrap();

    let err = service.reconcile(&import("Finding Her", AUDIO_B)).unwrap_err();
    assert!(matches!(
        err,
        MergeError::IdentityConflict {
            key: NaturalKey::AudioLocator(_),
            ..
        }
    ));
    let stored = service.repo().get_song(finding_her.song_id()).unwrap().unwrap();
    assert_eq!(stored.audio_locator, AUDIO_A);
}

#[test]
fn create_without_required_fields_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());

    let input = SongImport {
        metadata: SongMetadata {
            title: Some("Sahiba".to_string()),
            ..SongMetadata::default()
        },
        track: LyricTrack::default(),
    };
    let err = service.reconcile(&input).unwrap_err();
    assert!(matches!(
        err,
        MergeError::Validation(SongValidationError::MissingField("artist"))
    ));
    assert_eq!(count_songs(service.repo()), 0);
}

#[test]
fn invalid_metadata_is_rejected_before_lookup() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let mut input = import("Haseen", AUDIO_A);
    input.metadata.duration_seconds = Some(f64::INFINITY);

    let err = service.reconcile(&input).unwrap_err();
    assert_eq!(err.code(), "validation_failed");
    assert_eq!(count_songs(service.repo()), 0);
}

#[test]
fn import_document_merges_partial_track_and_reports_rejections() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let document = r#"{
        "title": "Finding Her",
        "artist": "The Elements",
        "duration": 52,
        "coverColor": "from-pink-300 to-purple-300",
        "lines": [
            { "timestamp": 9, "originalLine": "xy you", "elements": "(Xy) (U)" },
            { "timestamp": -1, "originalLine": "broken", "elements": "(U)" },
            { "timestamp": 0, "originalLine": "zinc sodium", "elements": "(ZnNa)" }
        ]
    }"#;
    let overrides = SongMetadata {
        audio_locator: Some(AUDIO_A.to_string()),
        ..SongMetadata::default()
    };

    let report = service
        .import_document(document, &LineEncoder::canonical(), &overrides)
        .unwrap();
    assert!(matches!(report.outcome, MergeOutcome::Created(_)));
    assert_eq!(report.line_count, 2);
    assert_eq!(report.rejections.len(), 1);
    assert_eq!(report.rejections[0].source_index, 1);

    let stored = service
        .repo()
        .get_song(report.outcome.song_id())
        .unwrap()
        .unwrap();
    assert_eq!(stored.audio_locator, AUDIO_A);
    let active = stored.lyrics.active_line_at(10.0).unwrap();
    assert_eq!(active.original_text, "xy you");

    let again = service
        .import_document(document, &LineEncoder::canonical(), &overrides)
        .unwrap();
    assert_eq!(again.outcome, MergeOutcome::Unchanged(report.outcome.song_id()));
}

#[test]
fn import_document_with_no_valid_lines_still_merges() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let document = r#"{
        "title": "Apna Bana Le",
        "artist": "Unknown",
        "duration": 60,
        "audioUrl": "https://cdn.example/abl.mp3",
        "lines": [ { "timestamp": "soon", "originalLine": "x", "elements": "(U)" } ]
    }"#;

    let report = service
        .import_document(document, &LineEncoder::canonical(), &SongMetadata::default())
        .unwrap();
    assert_eq!(report.line_count, 0);
    assert_eq!(report.rejections.len(), 1);
    assert!(matches!(report.outcome, MergeOutcome::Created(_)));
}

#[test]
fn import_of_pre_parsed_export_keeps_tokens() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let overrides = SongMetadata {
        audio_locator: Some(AUDIO_A.to_string()),
        ..SongMetadata::default()
    };
    let shorthand = r#"{
        "title": "Finding Her", "artist": "The Elements", "duration": 52,
        "lines": [ { "timestamp": 0, "originalLine": "zinc sodium", "elements": "(ZnNa)" } ]
    }"#;
    let created = service
        .import_document(shorthand, &LineEncoder::canonical(), &overrides)
        .unwrap();

    let exported = r#"{
        "title": "Finding Her", "artist": "The Elements", "duration": 52,
        "coverColor": "from-pink-300 to-purple-300",
        "lyrics": [
            { "timestamp": 0, "originalLine": "zinc sodium", "parsedTokens": [
                { "type": "element", "symbol": "Zn", "name": "Zinc", "number": 30, "value": "zn" },
                { "type": "element", "symbol": "Na", "name": "Sodium", "number": 11, "value": "na" }
            ] },
            { "timestamp": 6, "originalLine": "no tokens at all" }
        ]
    }"#;
    let report = service
        .import_document(exported, &LineEncoder::canonical(), &overrides)
        .unwrap();

    assert_eq!(report.outcome.song_id(), created.outcome.song_id());
    assert_eq!(report.line_count, 1);
    assert_eq!(report.rejections.len(), 1);
    assert_eq!(report.rejections[0].source_index, 1);

    let stored = service
        .repo()
        .get_song(created.outcome.song_id())
        .unwrap()
        .unwrap();
    assert_eq!(stored.lyrics.total_elements(), 2);
    assert_eq!(stored.lyrics.lines()[0].element_symbols(), vec!["Zn", "Na"]);
}

#[test]
fn import_document_surfaces_document_errors() {
    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());

    let err = service
        .import_document("[]", &LineEncoder::canonical(), &SongMetadata::default())
        .unwrap_err();
    assert!(matches!(err, ImportError::Source(_)));
}

#[test]
fn concurrent_merges_on_same_key_never_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let path = Arc::new(dir.path().join("songs.sqlite3"));
    drop(open_db(path.as_path()).unwrap());

    let handles: Vec<_> = (0..4u32)
        .map(|worker| {
            let path = Arc::clone(&path);
            std::thread::spawn(move || {
                let conn = open_db(path.as_path()).unwrap();
                let service =
                    SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
                let mut input = import("Finding Her", AUDIO_A);
                input.metadata.duration_seconds = Some(50.0 + f64::from(worker));
                service.reconcile(&input).unwrap()
            })
        })
        .collect();

    let outcomes: Vec<MergeOutcome> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    let created = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, MergeOutcome::Created(_)))
        .count();
    assert_eq!(created, 1);

    let conn = open_db(path.as_path()).unwrap();
    let repo = SqliteSongRepository::try_new(&conn).unwrap();
    assert_eq!(repo.find_by_title("Finding Her").unwrap().len(), 1);
}

fn updated_at(conn: &rusqlite::Connection, song: &Song) -> i64 {
    conn.query_row(
        "SELECT updated_at FROM songs WHERE uuid = ?1",
        [song.uuid.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}
