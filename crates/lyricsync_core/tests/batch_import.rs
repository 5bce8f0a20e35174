use lyricsync_core::db::open_db_in_memory;
use lyricsync_core::{
    ImportManifest, LineEncoder, SkipReason, SongImportService, SongListQuery, SongRepository,
    SqliteSongRepository,
};
use std::fs;

fn song_document(title: &str) -> String {
    format!(
        r#"{{
            "title": "{title}",
            "artist": "The Elements",
            "duration": 60,
            "lines": [ {{ "timestamp": 0, "originalLine": "tell you", "elements": "(TeU)" }} ]
        }}"#
    )
}

#[test]
fn manifest_import_tallies_outcomes_and_skips_failures() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("lyrics.json"), song_document("Finding Her")).unwrap();
    fs::write(dir.path().join("lyrics2.json"), song_document("Paaro")).unwrap();
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    let manifest_path = dir.path().join("songs.json");
    fs::write(
        &manifest_path,
        r#"[
            { "lyricsFile": "lyrics.json", "audioUrl": "https://cdn.example/finding-her.mp3" },
            { "lyricsFile": "lyrics2.json", "audioUrl": "https://cdn.example/paaro.mp3" },
            { "lyricsFile": "missing.json", "audioUrl": "https://cdn.example/sahiba.mp3" },
            { "lyricsFile": "broken.json", "audioUrl": "https://cdn.example/dhun.mp3" },
            { "lyricsFile": "lyrics2.json" }
        ]"#,
    )
    .unwrap();

    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let manifest = ImportManifest::load(&manifest_path).unwrap();
    let summary = service.import_manifest(&manifest, &LineEncoder::canonical());

    assert_eq!(summary.added, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.processed(), 3);
    assert_eq!(summary.reports.len(), 3);

    assert_eq!(summary.skipped.len(), 2);
    assert_eq!(summary.skipped[0].index, 2);
    assert_eq!(summary.skipped[0].reason, SkipReason::Missing);
    assert_eq!(summary.skipped[1].index, 3);
    assert!(matches!(summary.skipped[1].reason, SkipReason::ImportFailed(_)));

    let stored = service
        .repo()
        .list_songs(&SongListQuery::default())
        .unwrap();
    assert_eq!(stored.len(), 2);
}

#[test]
fn rerunning_a_manifest_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("lyrics.json"), song_document("Haseen")).unwrap();
    let manifest = ImportManifest::from_json(
        r#"[{ "lyricsFile": "lyrics.json", "audioUrl": "https://cdn.example/haseen.mp3" }]"#,
        dir.path(),
    )
    .unwrap();

    let conn = open_db_in_memory().unwrap();
    let service = SongImportService::new(SqliteSongRepository::try_new(&conn).unwrap());
    let first = service.import_manifest(&manifest, &LineEncoder::canonical());
    let second = service.import_manifest(&manifest, &LineEncoder::canonical());

    assert_eq!(first.added, 1);
    assert_eq!(second.added, 0);
    assert_eq!(second.unchanged, 1);
    assert!(second.skipped.is_empty());
}
