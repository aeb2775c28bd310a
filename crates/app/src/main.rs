use std::fmt;

use quiz_core::model::{QuestionDraft, QuizId};
use services::{AppServices, Clock};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuizId { raw: String },
    InvalidLimit { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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
    eprintln!("  cargo run -p app -- seed     [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- list     [--db <sqlite_url>] [--limit <n>]");
    eprintln!("  cargo run -p app -- attempts [--db <sqlite_url>] --quiz-id <id> [--limit <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:dev.sqlite3");
    eprintln!("  --limit 20");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Seed,
    List,
    Attempts,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "seed" => Some(Self::Seed),
            "list" => Some(Self::List),
            "attempts" => Some(Self::Attempts),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    quiz_id: Option<QuizId>,
    limit: u32,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://dev.sqlite3".into(), normalize_sqlite_url);
        let mut quiz_id = None;
        let mut limit = 20;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--quiz-id" => {
                    let value = require_value(args, "--quiz-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: value.clone() })?;
                    quiz_id = Some(QuizId::new(parsed));
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
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            quiz_id,
            limit,
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

fn sample_questions() -> Vec<QuestionDraft> {
    vec![
        QuestionDraft::new(
            "What does `Option::take` leave behind?",
            vec!["None".into(), "Some(Default::default())".into(), "A panic".into()],
            0,
            Some("`take` moves the value out and replaces it with `None`.".into()),
        ),
        QuestionDraft::new(
            "Which trait makes a type usable with the `?` operator's error path?",
            vec!["Display".into(), "From".into(), "Iterator".into()],
            1,
            None,
        ),
        QuestionDraft::new(
            "What is the size of `()` in memory?",
            vec!["1 byte".into(), "8 bytes".into(), "0 bytes".into()],
            2,
            None,
        ),
    ]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::List,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock()).await?;

    match cmd {
        Command::Seed => {
            let quizzes = services.quiz_service().list_quizzes(1).await?;
            if let Some(existing) = quizzes.first() {
                println!(
                    "quiz {} already present: \"{}\"",
                    existing.id(),
                    existing.title()
                );
                return Ok(());
            }
            let quiz_id = services
                .quiz_service()
                .create_quiz(
                    "Rust Basics".into(),
                    Some("A short sample quiz.".into()),
                    5,
                    sample_questions(),
                )
                .await?;
            println!("seeded quiz {quiz_id}");
            Ok(())
        }
        Command::List => {
            let quizzes = services.quiz_service().list_quizzes(parsed.limit).await?;
            if quizzes.is_empty() {
                println!("no quizzes (run `seed` first)");
                return Ok(());
            }
            for quiz in quizzes {
                let timing = if quiz.is_timed() {
                    format!("{} min", quiz.time_limit_minutes())
                } else {
                    "untimed".into()
                };
                println!(
                    "{}  {}  ({} questions, {timing})",
                    quiz.id(),
                    quiz.title(),
                    quiz.question_count()
                );
            }
            Ok(())
        }
        Command::Attempts => {
            let quiz_id = parsed.quiz_id.ok_or_else(|| {
                eprintln!("attempts requires --quiz-id");
                print_usage();
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing --quiz-id")
            })?;
            let attempts = services.attempt_service();
            let rows = attempts.list_attempts(quiz_id, parsed.limit).await?;
            if rows.is_empty() {
                println!("no attempts recorded for quiz {quiz_id}");
                return Ok(());
            }
            for row in rows {
                let review = attempts.review(row.id).await?;
                println!(
                    "attempt {}  score {}%  {}/{} correct  {}s  {}  at {}",
                    row.id,
                    row.result.score(),
                    review.correct_count(),
                    review.items().len(),
                    row.result.time_spent_seconds(),
                    row.result.trigger(),
                    row.result.submitted_at().format("%Y-%m-%d %H:%M:%S"),
                );
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
