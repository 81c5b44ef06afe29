use std::fmt;

use quiz_core::model::{Question, Quiz, QuizId};
use storage::repository::{QuizRepository, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    quiz_id: QuizId,
    quiz_title: String,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3?mode=rwc".into());
        let mut quiz_id = std::env::var("QUIZ_SEED_ID")
            .map_or_else(|_| QuizId::new("sample-geography"), QuizId::new);
        let mut quiz_title =
            std::env::var("QUIZ_SEED_TITLE").unwrap_or_else(|_| "World Geography".into());

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--quiz-id" => {
                    let value = require_value(&mut args, "--quiz-id")?;
                    quiz_id = QuizId::new(value);
                }
                "--fresh-id" => {
                    quiz_id = QuizId::generate();
                }
                "--title" => {
                    let value = require_value(&mut args, "--title")?;
                    quiz_title = value;
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
            quiz_title,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite:quiz.sqlite3?mode=rwc)");
    eprintln!("  --quiz-id <id>      Quiz id to upsert (default: sample-geography)");
    eprintln!("  --fresh-id          Mint a random quiz id instead");
    eprintln!("  --title <name>      Quiz title (default: World Geography)");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_SEED_ID, QUIZ_SEED_TITLE");
}

fn sample_questions() -> Result<Vec<Question>, Box<dyn std::error::Error>> {
    let samples = [
        (
            "What is the capital of Australia?",
            ["Sydney", "Canberra", "Melbourne", "Perth"],
            "Canberra",
        ),
        (
            "Which river is the longest in the world?",
            ["Amazon", "Yangtze", "Nile", "Mississippi"],
            "Nile",
        ),
        (
            "Mount Kilimanjaro is located in which country?",
            ["Kenya", "Tanzania", "Uganda", "Ethiopia"],
            "Tanzania",
        ),
        (
            "Which ocean borders the west coast of South America?",
            ["Atlantic", "Indian", "Arctic", "Pacific"],
            "Pacific",
        ),
    ];

    let mut questions = Vec::with_capacity(samples.len());
    for (prompt, options, correct) in samples {
        let options = options.iter().map(|o| (*o).to_owned()).collect();
        questions.push(Question::new(prompt, options, correct)?);
    }
    Ok(questions)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let quiz = Quiz::new(args.quiz_id.clone(), args.quiz_title.clone(), sample_questions()?)?;
    storage.quizzes.upsert_quiz(&quiz).await?;

    println!(
        "Seeded quiz '{}' ({}) with {} questions into {}",
        quiz.title(),
        quiz.id(),
        quiz.total_questions(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("seed failed: {e}");
        std::process::exit(1);
    }
}
