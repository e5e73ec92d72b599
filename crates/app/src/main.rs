use std::collections::HashMap;
use std::fmt;

use elearn_core::model::{
    Actor, Course, CourseId, Lesson, LessonId, QuestionDraft, UserId,
};
use elearn_core::time::Clock;
use services::{AppServices, HistoryFilter, ProfileUpdate};
use storage::repository::{CourseRepository, LessonRepository, QuizRepository, Storage};

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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- demo [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- seed [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:elearn.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ELEARN_DB_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Seed sample data and run a demo student through the flows.
    Demo,
    /// Seed sample data only.
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "demo" => Some(Self::Demo),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ELEARN_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://elearn.sqlite3".into(), normalize_sqlite_url);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = args.next().ok_or(ArgsError::MissingValue { flag: "--db" })?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:") {
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
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite:file:") {
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

struct SeededCourse {
    course_id: CourseId,
    lesson_ids: Vec<LessonId>,
}

/// Create the sample course, lessons, and a four-question quiz on the
/// first lesson. Idempotent: upserts by fixed ids, and question seeding is
/// skipped when the lesson already has questions.
async fn seed(
    storage: &Storage,
    services: &AppServices,
    clock: &Clock,
) -> Result<SeededCourse, Box<dyn std::error::Error>> {
    let course = Course::new(
        CourseId::new(1),
        "Rust Basics",
        Some("A short introduction to ownership and borrowing.".into()),
        Some("programming".into()),
        Some("beginner".into()),
        clock.now(),
    )?;
    storage.courses.upsert_course(&course).await?;

    let lesson_titles = ["Ownership", "Borrowing", "Lifetimes"];
    let mut lesson_ids = Vec::new();
    for (index, title) in lesson_titles.iter().enumerate() {
        let lesson = Lesson::new(
            LessonId::new(index as u64 + 1),
            course.id(),
            *title,
            Some(format!("Notes on {title}.")),
            i32::try_from(index)? + 1,
        )?;
        storage.lessons.upsert_lesson(&lesson).await?;
        lesson_ids.push(lesson.id());
    }

    let quiz_lesson = lesson_ids[0];
    if storage.quizzes.count_for_lesson(quiz_lesson).await? == 0 {
        let admin = Actor::admin(UserId::new(1));
        for (index, (text, correct)) in [
            ("Who owns a value in Rust?", "exactly one binding"),
            ("What does borrowing create?", "a reference"),
            ("When is a value dropped?", "when its owner goes out of scope"),
            ("What does `&mut` grant?", "exclusive mutable access"),
        ]
        .iter()
        .enumerate()
        {
            let draft = QuestionDraft {
                question_text: (*text).to_string(),
                explanation: String::new(),
                sort_order: (index + 1).to_string(),
                choices: [
                    (*correct).to_string(),
                    "a garbage collector".into(),
                    "the runtime".into(),
                    String::new(),
                ],
                correct_choice: Some("1".into()),
            };
            services.authoring.create_question(&admin, quiz_lesson, &draft).await?;
        }
    }

    tracing::info!(course = %course.id(), lessons = lesson_ids.len(), "sample data seeded");
    Ok(SeededCourse {
        course_id: course.id(),
        lesson_ids,
    })
}

/// Walk a demo student through the whole flow and print what the read side
/// derives from it.
async fn demo(
    storage: &Storage,
    services: &AppServices,
    clock: &Clock,
) -> Result<(), Box<dyn std::error::Error>> {
    let seeded = seed(storage, services, clock).await?;

    let student_id = UserId::new(2);
    let student = Actor::student(student_id);

    services.enrollment.enroll(student_id, seeded.course_id).await?;
    services
        .profile
        .update(
            student_id,
            &ProfileUpdate {
                display_name: Some("Demo Student".into()),
                weekly_goal: Some("5".into()),
                avatar_filename: None,
            },
        )
        .await?;

    for lesson_id in &seeded.lesson_ids[..2] {
        services.lessons.complete_lesson(&student, *lesson_id).await?;
    }

    let questions = services
        .quiz
        .quiz_questions(&student, seeded.lesson_ids[0])
        .await?;
    let mut answers = HashMap::new();
    for question in &questions[..3] {
        if let Some(correct) = question.correct_choice() {
            answers.insert(question.id(), correct.id());
        }
    }
    let graded = services
        .quiz
        .take_quiz(&student, seeded.lesson_ids[0], &answers)
        .await?;
    println!("graded attempt: {graded:#?}");

    let review = services.quiz.result_review(&student, graded.result_id).await?;
    println!("answer trail: {:#?}", review.details);

    let dashboard = services.analytics.dashboard(student_id).await?;
    println!("dashboard: {dashboard:#?}");

    let history = services
        .history
        .history(student_id, &HistoryFilter::default())
        .await?;
    println!(
        "history: {} completions, {} quiz attempts",
        history.completions.len(),
        history.attempts.len()
    );

    let summary = services.quiz.summary_for_user(student_id).await?;
    println!("quiz summary: {summary:#?}");

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Demo,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Demo,
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
    let storage = Storage::sqlite(&parsed.db_url).await?;

    let clock = Clock::default_clock();
    let services = AppServices::new(clock, &storage);

    match cmd {
        Command::Demo => demo(&storage, &services, &clock).await,
        Command::Seed => {
            seed(&storage, &services, &clock).await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        tracing::error!("{err}");
        std::process::exit(2);
    }
}
