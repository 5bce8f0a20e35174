//! Command-line wrapper around `lyricsync_core`.
//!
//! # Responsibility
//! - Decode song documents and print the result as JSON.
//! - Import documents into the song store and query stored tracks.
//!
//! # Invariants
//! - Flags override values loaded from the config file.
//! - Failures exit with status 1 and a single-line message on stderr.

use clap::{Args, Parser, Subcommand};
use log::info;
use lyricsync_core::db::open_db;
use lyricsync_core::{
    decode_song_document, init_logging_from, BatchSummary, ImportManifest, Line, LineEncoder,
    LineRejection, LyricsyncConfig, Song, SongImportService, SongListQuery, SongMetadata,
    SongRepository, SqliteSongRepository, SymbolTable,
};
use serde_json::{json, Value};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "lyricsync")]
#[command(about = "Decode element shorthand lyrics and align them to playback")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "LYRICSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, env = "LYRICSYNC_DB")]
    db: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for log files; logging is off without one
    #[arg(long, global = true, env = "LYRICSYNC_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a song document and print the track with rejected lines
    Decode { document: PathBuf },
    /// Decode a song document and merge it into the store
    Import {
        document: PathBuf,
        #[arg(long)]
        audio_url: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
    /// Import every document listed in a JSON manifest of
    /// `{ "lyricsFile", "audioUrl"?, "title"? }` entries
    ImportBatch { manifest: PathBuf },
    /// Print a stored song's lines with their element symbols
    Show(TitleArg),
    /// Print the line active at a playback position
    At {
        #[command(flatten)]
        song: TitleArg,
        /// Playback position in seconds
        #[arg(long)]
        time: f64,
    },
    /// List stored songs
    List {
        #[arg(long)]
        artist: Option<String>,
        /// Include inactive songs
        #[arg(long)]
        all: bool,
    },
}

#[derive(Args, Debug)]
struct TitleArg {
    #[arg(long)]
    title: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lyricsync: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;
    init_logging_from(&config.logging)?;
    let encoder = LineEncoder::new(SymbolTable::canonical(), &config.decode);

    match cli.command {
        Command::Decode { document } => {
            let decoded = decode_song_document(&std::fs::read_to_string(document)?, &encoder)?;
            print_json(&json!({
                "metadata": decoded.metadata,
                "lines": decoded.decode.track,
                "rejections": rejections_json(&decoded.decode.rejections),
            }))
        }
        Command::Import {
            document,
            audio_url,
            title,
        } => {
            let json = std::fs::read_to_string(&document)?;
            let conn = open_db(config.resolved_db_path())?;
            let service = SongImportService::new(SqliteSongRepository::try_new(&conn)?);
            let overrides = SongMetadata {
                title,
                audio_locator: audio_url,
                ..SongMetadata::default()
            };
            let report = service.import_document(&json, &encoder, &overrides)?;
            info!(
                "event=cli_import module=cli status=ok outcome={} lines={} rejected={}",
                report.outcome.as_str(),
                report.line_count,
                report.rejections.len()
            );
            print_json(&json!({
                "outcome": report.outcome.as_str(),
                "uuid": report.outcome.song_id(),
                "lines": report.line_count,
                "rejections": rejections_json(&report.rejections),
            }))
        }
        Command::ImportBatch { manifest } => {
            let manifest = ImportManifest::load(manifest)?;
            let conn = open_db(config.resolved_db_path())?;
            let service = SongImportService::new(SqliteSongRepository::try_new(&conn)?);
            let summary = service.import_manifest(&manifest, &encoder);
            print_json(&summary_json(&summary))
        }
        Command::Show(TitleArg { title }) => {
            let conn = open_db(config.resolved_db_path())?;
            let repo = SqliteSongRepository::try_new(&conn)?;
            let song = song_by_title(&repo, &title)?;
            println!("{} - {} ({})", song.title, song.artist, format_time(song.duration_seconds));
            for line in song.lyrics.lines() {
                println!("{}", format_line(line));
            }
            Ok(())
        }
        Command::At { song, time } => {
            let conn = open_db(config.resolved_db_path())?;
            let repo = SqliteSongRepository::try_new(&conn)?;
            let song = song_by_title(&repo, &song.title)?;
            match song.lyrics.active_index_at(time) {
                Some(index) => {
                    let line = &song.lyrics.lines()[index];
                    let (start, end) = song
                        .lyrics
                        .line_window(index)
                        .unwrap_or((line.timestamp_seconds, None));
                    print_json(&json!({
                        "index": index,
                        "start": start,
                        "end": end,
                        "line": line,
                    }))
                }
                None => print_json(&Value::Null),
            }
        }
        Command::List { artist, all } => {
            let conn = open_db(config.resolved_db_path())?;
            let repo = SqliteSongRepository::try_new(&conn)?;
            let songs = repo.list_songs(&SongListQuery {
                artist,
                include_inactive: all,
                ..SongListQuery::default()
            })?;
            for song in songs {
                println!(
                    "{}\t{}\t{}\t{} lines",
                    song.uuid,
                    song.title,
                    song.artist,
                    song.lyrics.len()
                );
            }
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> CliResult<LyricsyncConfig> {
    let mut config = match cli.config.as_ref() {
        Some(path) => LyricsyncConfig::load(path)?,
        None => LyricsyncConfig::default(),
    };
    if let Some(db) = cli.db.clone() {
        config.db_path = Some(db);
    }
    if let Some(level) = cli.log_level.clone() {
        config.logging.level = Some(level);
    }
    if let Some(dir) = cli.log_dir.clone() {
        config.logging.dir = Some(dir);
    }
    Ok(config)
}

fn song_by_title<R: SongRepository>(repo: &R, title: &str) -> CliResult<Song> {
    let mut songs = repo.find_by_title(title)?;
    match songs.len() {
        0 => Err(format!("no song titled `{title}`").into()),
        1 => Ok(songs.remove(0)),
        count => Err(format!("{count} songs share the title `{title}`").into()),
    }
}

fn rejections_json(rejections: &[LineRejection]) -> Vec<Value> {
    rejections
        .iter()
        .map(|rejection| {
            json!({
                "index": rejection.source_index,
                "reason": rejection.reason.to_string(),
            })
        })
        .collect()
}

fn summary_json(summary: &BatchSummary) -> Value {
    json!({
        "added": summary.added,
        "updated": summary.updated,
        "unchanged": summary.unchanged,
        "processed": summary.processed(),
        "skipped": summary
            .skipped
            .iter()
            .map(|skipped| {
                json!({
                    "index": skipped.index,
                    "lyricsFile": skipped.lyrics_file.display().to_string(),
                    "reason": skipped.reason.to_string(),
                })
            })
            .collect::<Vec<Value>>(),
    })
}

fn format_line(line: &Line) -> String {
    let symbols = line.element_symbols().join(" ");
    format!(
        "[{}] {}  | {}",
        format_time(line.timestamp_seconds),
        line.original_text,
        symbols
    )
}

fn format_time(seconds: f64) -> String {
    let whole = seconds.max(0.0);
    let minutes = (whole / 60.0).floor();
    format!("{:02}:{:05.2}", minutes as u64, whole - minutes * 60.0)
}

fn print_json(value: &Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
