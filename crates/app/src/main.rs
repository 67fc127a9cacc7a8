use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use services::{AppServices, Clock, IdentityProvider, StaticIdentity, UploadRequest};
use tracing_subscriber::EnvFilter;
use voice_core::model::{SessionRecord, UserId};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidLimit { raw: String },
    InvalidDbUrl { raw: String },
    MissingFile,
    MissingQuestion,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingFile => write!(f, "upload requires --file <path>"),
            ArgsError::MissingQuestion => write!(f, "coach requires a question"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  voice-coach upload  --file <path> [--notes <text>] [common flags]");
    eprintln!("  voice-coach history [--limit <n>] [common flags]");
    eprintln!("  voice-coach report  [common flags]");
    eprintln!("  voice-coach coach   <question> [common flags]");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: sqlite:voice.sqlite3)");
    eprintln!("  --blobs <dir>         Artifact directory (default: blobs)");
    eprintln!("  --user <uuid>         Acting user id");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VOICE_DB_URL, VOICE_BLOB_DIR, VOICE_USER_ID");
    eprintln!("  VOICE_COACH_API_KEY, VOICE_COACH_BASE_URL, VOICE_COACH_MODEL");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Upload { file: PathBuf, notes: Option<String> },
    History { limit: u32 },
    Report,
    Coach { question: String },
}

struct Args {
    db_url: String,
    blob_dir: PathBuf,
    user: Option<UserId>,
    command: Command,
}

impl Args {
    fn parse(subcommand: &str, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("VOICE_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://voice.sqlite3".into(), normalize_sqlite_url);
        let mut blob_dir = std::env::var("VOICE_BLOB_DIR")
            .ok()
            .map_or_else(|| PathBuf::from("blobs"), PathBuf::from);
        let mut user = std::env::var("VOICE_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok());

        let mut file: Option<PathBuf> = None;
        let mut notes: Option<String> = None;
        let mut limit: u32 = services::DEFAULT_HISTORY_LIMIT;
        let mut question_words: Vec<String> = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--blobs" => {
                    blob_dir = PathBuf::from(require_value(args, "--blobs")?);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    user = Some(
                        value
                            .parse::<UserId>()
                            .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?,
                    );
                }
                "--file" => {
                    file = Some(PathBuf::from(require_value(args, "--file")?));
                }
                "--notes" => {
                    notes = Some(require_value(args, "--notes")?);
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    limit = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if subcommand == "coach" && !arg.starts_with("--") => {
                    question_words.push(arg);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match subcommand {
            "upload" => Command::Upload {
                file: file.ok_or(ArgsError::MissingFile)?,
                notes,
            },
            "history" => Command::History { limit },
            "coach" => {
                if question_words.is_empty() {
                    return Err(ArgsError::MissingQuestion);
                }
                Command::Coach {
                    question: question_words.join(" "),
                }
            }
            _ => Command::Report,
        };

        Ok(Self {
            db_url,
            blob_dir,
            user,
            command,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn print_record_line(record: &SessionRecord) {
    let m = record.metrics();
    println!(
        "{}  {}s  C{} P{} A{} Cons{} PC{} B{} WPM{}  streak {}  credits {}",
        record.created_at().format("%Y-%m-%d %H:%M:%S"),
        record.duration_sec(),
        m.clarity(),
        m.pronunciation(),
        m.articulation(),
        m.consistency(),
        m.pitch_control(),
        m.breath(),
        m.wpm(),
        record.day_streak_after(),
        record.credit_points_after(),
    );
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let subcommand = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => match first.as_str() {
            "upload" | "history" | "report" | "coach" => first,
            other => {
                eprintln!("unknown subcommand: {other}");
                print_usage();
                return Err(Box::new(ArgsError::UnknownArg(other.to_string())));
            }
        },
    };

    let parsed = Args::parse(&subcommand, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;

    let identity: Arc<dyn IdentityProvider> = Arc::new(match parsed.user {
        Some(user) => StaticIdentity::signed_in(user),
        None => StaticIdentity::signed_out(),
    });
    let app = AppServices::new_sqlite(
        &parsed.db_url,
        &parsed.blob_dir,
        Clock::default_clock(),
        identity,
    )
    .await?;

    match parsed.command {
        Command::Upload { file, notes } => {
            let bytes = std::fs::read(&file)?;
            let file_name = file
                .file_name()
                .map_or_else(|| "upload.wav".to_string(), |n| n.to_string_lossy().into_owned());

            let record = app
                .upload()
                .process_upload(UploadRequest {
                    file_name,
                    bytes,
                    notes,
                })
                .await?;
            println!(
                "Saved! New credits: {}, streak: {}",
                record.credit_points_after(),
                record.day_streak_after()
            );
        }
        Command::History { limit } => {
            let records = app.history().list_history(limit).await?;
            if records.is_empty() {
                println!("No sessions yet.");
            }
            for record in &records {
                print_record_line(record);
            }
        }
        Command::Report => match app.history().latest_report().await? {
            None => println!("No sessions yet."),
            Some(record) => {
                print_record_line(&record);
                if let Some(standing) = app.history().standings().await? {
                    match standing.points_to_next {
                        Some(remaining) => println!(
                            "League: {} ({} pts, {} to next)",
                            standing.league, standing.credit_points, remaining
                        ),
                        None => println!(
                            "League: {} ({} pts)",
                            standing.league, standing.credit_points
                        ),
                    }
                }
            }
        },
        Command::Coach { question } => {
            let reply = app.coach().ask(&question).await?;
            println!("{reply}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("Error: {err}");
        std::process::exit(2);
    }
}
