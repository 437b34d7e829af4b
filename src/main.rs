// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Luminara: Local AI Study Companion
//!
//! Cheatsheets and quizzes from PDFs with a local Ollama model, plus the
//! study desk around them: library, notes, calendar and focus clocks.

use chrono::{Local, Timelike, Utc};
use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use luminara::calendar::{self, CalendarStore};
use luminara::cheatsheet::{self, CheatsheetOptions};
use luminara::config::AppConfig;
use luminara::db::{ArtifactKind, ArtifactRecord, Database, FocusKind, FocusSession};
use luminara::documents;
use luminara::library;
use luminara::notes::{self, NoteStore};
use luminara::ollama::OllamaClient;
use luminara::quiz::{self, setup::prompt_setup, Question, QuestionType, QuizOptions};
use luminara::timer::{self, AlarmBook, Countdown, Stopwatch, Tick};
use luminara::watcher::{cheatsheet_output_path, should_process, wait_for_stable, FileWatcher, WatchEvent};
use luminara::{LuminaraError, Result};

/// Luminara CLI - Local AI Study Companion
#[derive(Parser, Debug)]
#[command(name = "luminara")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "0.1.0")]
#[command(about = "Local AI study companion: cheatsheets, quizzes, notes, calendar and focus timers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a cheatsheet (definitions, comparisons, timelines, concepts)
    Cheatsheet {
        /// PDF or text file to summarise
        path: PathBuf,

        /// Output JSON file (default from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,

        /// Pages per chunk
        #[arg(long)]
        pages_per_chunk: Option<usize>,

        /// Pages shared between chunks
        #[arg(long)]
        overlap: Option<usize>,

        /// Regenerate even if this file already has a cheatsheet
        #[arg(long)]
        force: bool,
    },

    /// Generate quiz questions from a PDF
    Quiz {
        /// PDF or text file (asks interactively when omitted)
        pdf: Option<PathBuf>,

        /// Question type: mcq, true/false or long answer (1-3 also accepted)
        #[arg(short = 't', long = "type")]
        question_type: Option<String>,

        /// Approximate character limit for answers
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output JSON file (default from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// PDF library
    Library {
        #[command(subcommand)]
        action: LibraryCommands,
    },

    /// Notes history
    Notes {
        #[command(subcommand)]
        action: NotesCommands,
    },

    /// Exam and event calendar
    Calendar {
        #[command(subcommand)]
        action: CalendarCommands,
    },

    /// Countdown focus timer (Enter pauses/resumes, Ctrl+C stops)
    Timer {
        /// Duration in minutes
        #[arg(short, long, conflicts_with = "hms")]
        minutes: Option<u64>,

        /// Duration as H:M:S
        #[arg(long)]
        hms: Option<String>,
    },

    /// Stopwatch (Enter records a lap, Ctrl+C stops)
    Stopwatch,

    /// Wall-clock alarms
    Alarm {
        #[command(subcommand)]
        action: AlarmCommands,
    },

    /// Watch the library for new documents and write cheatsheets next to them
    Watch {
        /// Directory to watch (default: library directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Skip Ollama health check on startup
        #[arg(long)]
        skip_health_check: bool,

        /// Process documents already in the directory on startup
        #[arg(long)]
        process_existing: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show AI engine status
    Status {
        /// Check specific model availability
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Initialize a new Luminara workspace
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum LibraryCommands {
    /// List PDFs in the library
    List {
        /// Only names containing this text
        query: Option<String>,
    },

    /// Copy PDFs into the library
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show page count, title and author of a document
    Info {
        file: PathBuf,
    },

    /// Print the library directory
    Path,
}

#[derive(Subcommand, Debug)]
enum NotesCommands {
    /// Save a note (reads stdin when no text is given)
    Add {
        text: Vec<String>,
    },

    /// List saved notes, newest first
    List {
        /// Only notes containing this text
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Print one note
    Show {
        /// Note id or id prefix
        id: String,
    },

    /// Import notes and Q&A from an exported JSON file
    Import {
        file: PathBuf,

        /// Write imported Q&A pairs here as quiz questions
        #[arg(long)]
        qna_output: Option<PathBuf>,
    },

    /// Delete all notes
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CalendarCommands {
    /// Add an event
    Add {
        /// Date as YYYY-MM-DD
        date: String,

        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List events
    List {
        /// Only this month (YYYY-MM)
        #[arg(short, long, conflicts_with = "date")]
        month: Option<String>,

        /// Only this day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Remove an event
    Remove {
        /// Event id or id prefix
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum AlarmCommands {
    /// Add an alarm (HH:MM or h:mm AM/PM)
    Add { time: String },

    /// List alarms
    List,

    /// Remove an alarm
    Remove { time: String },

    /// Ring alarms until Ctrl+C
    Run,
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// Show database statistics
    Stats,

    /// Recent cheatsheets and quizzes
    Artifacts {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Recent focus sessions
    Sessions {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Vacuum database (reclaim space)
    Vacuum,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    // RUST_LOG applies only when no verbosity flag was given
    let env_filter = if cli.trace || cli.verbose || cli.quiet {
        EnvFilter::new(filter)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    if !cli.quiet {
        debug!("Luminara v0.1.0 - Local AI Study Companion");
    }

    let config = AppConfig::load(&cli.config)?;
    let json = cli.format == "json";

    match cli.command {
        Some(Commands::Cheatsheet { path, output, model, pages_per_chunk, overlap, force }) => {
            run_cheatsheet(config, path, output, model, pages_per_chunk, overlap, force, json).await
        }
        Some(Commands::Quiz { pdf, question_type, limit, output, model }) => {
            run_quiz(config, pdf, question_type, limit, output, model, json).await
        }
        Some(Commands::Library { action }) => run_library_command(config, action, json),
        Some(Commands::Notes { action }) => run_notes_command(config, action, json),
        Some(Commands::Calendar { action }) => run_calendar_command(config, action, json),
        Some(Commands::Timer { minutes, hms }) => run_timer(config, minutes, hms).await,
        Some(Commands::Stopwatch) => run_stopwatch(config).await,
        Some(Commands::Alarm { action }) => run_alarm_command(config, action, json).await,
        Some(Commands::Watch { dir, skip_health_check, process_existing }) => {
            run_watch(config, dir, skip_health_check, process_existing).await
        }
        Some(Commands::Db { action }) => run_db_command(config, action, json),
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        Some(Commands::Status { model }) => run_status(config, model).await,
        Some(Commands::Init { dir, force }) => run_init(dir, force),
        None => {
            // Default: start a focus session
            run_timer(config, None, None).await
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_db(config: &AppConfig) -> Result<Database> {
    Database::open(&config.storage.database)
}

/// Fail early with a hint when the model server is down
async fn ensure_engine(client: &OllamaClient, model: &str) -> Result<()> {
    if let Err(e) = client.health_check().await {
        return Err(LuminaraError::OllamaUnavailable(format!(
            "Failed to connect to Ollama at {}: {}. Is `ollama serve` running?",
            client.base_url(),
            e
        )));
    }
    if !client.model_available(model).await.unwrap_or(true) {
        warn!("Model '{}' not found. Try: ollama pull {}", model, model);
    }
    Ok(())
}

fn record_artifact(db: &Database, record: &ArtifactRecord) {
    if let Err(e) = db.record_artifact(record) {
        warn!("Failed to store in database: {}", e);
    }
}

/// An earlier run can stand in for this one when it used the same model
/// and its output is the requested file, still on disk
fn reusable_cheatsheet(previous: &ArtifactRecord, output: &Path, model: &str) -> bool {
    previous.model == model
        && Path::new(&previous.output_path) == output
        && output.exists()
}

/// Generate a cheatsheet for one document
#[allow(clippy::too_many_arguments)]
async fn run_cheatsheet(
    config: AppConfig,
    path: PathBuf,
    output: Option<PathBuf>,
    model: Option<String>,
    pages_per_chunk: Option<usize>,
    overlap: Option<usize>,
    force: bool,
    json: bool,
) -> Result<()> {
    if !path.exists() {
        return Err(LuminaraError::NotFound(format!("File not found at {}", path.display())));
    }

    let mut options = CheatsheetOptions::from_config(&config);
    if let Some(model) = model {
        options.model = model;
    }
    if let Some(size) = pages_per_chunk {
        options.pages_per_chunk = size.max(1);
    }
    if let Some(overlap) = overlap {
        options.page_overlap = overlap;
    }
    let output = output.unwrap_or_else(|| PathBuf::from(&config.cheatsheet.output));

    let db = open_db(&config)?;
    let hash = documents::file_hash(&path)?;
    let chunking_overridden = pages_per_chunk.is_some() || overlap.is_some();
    if !force && !chunking_overridden {
        if let Some(previous) = db.find_artifact(&hash, ArtifactKind::Cheatsheet)? {
            if reusable_cheatsheet(&previous, &output, &options.model) {
                info!(
                    "Cheatsheet already generated at {} (use --force to regenerate)",
                    previous.output_path
                );
                return Ok(());
            }
        }
    }

    let client = OllamaClient::from_config(&config)?;
    ensure_engine(&client, &options.model).await?;

    let run = cheatsheet::generate_cheatsheet(&client, &options, &path).await?;
    cheatsheet::save(&run.extraction, &output)?;
    record_artifact(
        &db,
        &ArtifactRecord::new(
            ArtifactKind::Cheatsheet,
            &path,
            &hash,
            &output,
            &options.model,
            run.extraction.item_count(),
        ),
    );

    if run.failed_chunks > 0 {
        warn!("{} of {} chunks failed and were skipped", run.failed_chunks, run.chunk_count);
    }

    if json {
        print_json(&run.extraction)?;
    } else {
        let e = &run.extraction;
        println!("Saved cheatsheet to {}", output.display());
        println!("  Definitions: {}", e.definitions.len());
        println!("  Comparisons: {}", e.comparisons.len());
        println!("  Timelines:   {}", e.timelines.len());
        println!("  Concepts:    {}", e.concepts.len());
    }
    Ok(())
}

/// Generate quiz questions for one document
async fn run_quiz(
    config: AppConfig,
    pdf: Option<PathBuf>,
    question_type: Option<String>,
    limit: Option<usize>,
    output: Option<PathBuf>,
    model: Option<String>,
    json: bool,
) -> Result<()> {
    let mut options = QuizOptions::from_config(&config);
    if let Some(model) = model {
        options.model = model;
    }

    let path = match pdf {
        Some(path) => {
            if let Some(choice) = question_type {
                options.question_type = QuestionType::from_choice(&choice);
            }
            if let Some(limit) = limit {
                options.char_limit = limit;
            }
            path
        }
        None => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut out = std::io::stdout();
            let setup = prompt_setup(&mut input, &mut out, options.char_limit)?;
            options.question_type = setup.question_type;
            options.char_limit = setup.char_limit;
            setup.path
        }
    };
    let output = output.unwrap_or_else(|| PathBuf::from(&config.quiz.output));

    if !path.exists() {
        return Err(LuminaraError::NotFound(format!("File not found at {}", path.display())));
    }

    let client = OllamaClient::from_config(&config)?;
    ensure_engine(&client, &options.model).await?;

    info!("Generating {} questions", options.question_type);
    let run = quiz::generate_quiz(&client, &options, &path).await?;

    if run.questions.is_empty() {
        warn!("No questions generated; nothing written");
        return Ok(());
    }

    quiz::save(&run.questions, &output)?;
    let hash = documents::file_hash(&path)?;
    match open_db(&config) {
        Ok(db) => record_artifact(
            &db,
            &ArtifactRecord::new(
                ArtifactKind::Quiz,
                &path,
                &hash,
                &output,
                &options.model,
                run.questions.len(),
            ),
        ),
        Err(e) => warn!("Failed to open database: {}", e),
    }

    if json {
        print_json(&run.questions)?;
    } else {
        println!(
            "Generated {} questions. Saved to '{}'",
            run.questions.len(),
            output.display()
        );
    }
    Ok(())
}

fn run_library_command(config: AppConfig, action: LibraryCommands, json: bool) -> Result<()> {
    let dir = PathBuf::from(&config.storage.library_dir);
    match action {
        LibraryCommands::List { query } => {
            let names = library::list_pdfs(&dir)?;
            let shown: Vec<&String> = match query.as_deref() {
                Some(q) => library::filter(&names, q),
                None => names.iter().collect(),
            };
            if json {
                print_json(&shown)?;
            } else if shown.is_empty() {
                println!("No PDFs found in {}", dir.display());
            } else {
                for name in shown {
                    println!("  {}", name);
                }
            }
        }
        LibraryCommands::Add { files } => {
            let added = library::import_pdfs(&files, &dir)?;
            if json {
                print_json(&added)?;
            } else {
                println!("Added {} PDF(s) to {}", added.len(), dir.display());
            }
        }
        LibraryCommands::Info { file } => {
            // Bare names resolve inside the library
            let file = if file.exists() { file } else { dir.join(&file) };
            let mut info = documents::metadata(&file)?;
            info["hash"] = serde_json::Value::String(documents::file_hash(&file)?);
            if json {
                print_json(&info)?;
            } else if let Some(fields) = info.as_object() {
                println!("{}", file.display());
                for (key, value) in fields {
                    println!("  {}: {}", key, value.as_str().map(String::from).unwrap_or_else(|| value.to_string()));
                }
            }
        }
        LibraryCommands::Path => {
            std::fs::create_dir_all(&dir)?;
            println!("{}", dir.display());
        }
    }
    Ok(())
}

fn run_notes_command(config: AppConfig, action: NotesCommands, json: bool) -> Result<()> {
    let store = NoteStore::new(config.storage.notes_path());
    match action {
        NotesCommands::Add { text } => {
            let content = if text.is_empty() {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            } else {
                text.join(" ")
            };
            let note = store.add(&content)?;
            if json {
                print_json(&note)?;
            } else {
                println!("Saved: {} ({})", note.title, &note.id[..8]);
            }
        }
        NotesCommands::List { search, limit } => {
            let found = match search.as_deref() {
                Some(q) => store.search(q)?,
                None => store.list()?,
            };
            let found: Vec<_> = found.into_iter().take(limit).collect();
            if json {
                print_json(&found)?;
            } else if found.is_empty() {
                println!("No notes yet");
            } else {
                for note in found {
                    println!("  {}  {}", &note.id[..8], note.title);
                }
            }
        }
        NotesCommands::Show { id } => {
            let note = store.get(&id)?;
            if json {
                print_json(&note)?;
            } else {
                println!("{}\n", note.title);
                println!("{}", note.content);
            }
        }
        NotesCommands::Import { file, qna_output } => {
            let content = std::fs::read_to_string(&file)?;
            let data: serde_json::Value = serde_json::from_str(&content)?;
            let (imported, qna) = notes::parse_export(&data);
            if imported.is_empty() && qna.is_empty() {
                return Err(LuminaraError::InvalidInput(
                    "No notes or Q&A found in that file".to_string(),
                ));
            }
            let added = store.add_imported(&imported)?;

            if let Some(path) = qna_output.as_deref() {
                let questions: Vec<Question> = qna
                    .iter()
                    .map(|pair| Question {
                        question: pair.question.clone(),
                        answer: pair.answer.clone(),
                        question_type: QuestionType::LongAnswer.label().to_string(),
                        context_snippet: None,
                        extra: serde_json::Map::new(),
                    })
                    .collect();
                quiz::save(&questions, path)?;
            }

            if json {
                print_json(&serde_json::json!({ "notes": added, "qna": qna }))?;
            } else {
                println!("Imported:\n  Notes: {}\n  Q&A:   {}", added, qna.len());
                if qna_output.is_none() {
                    for (i, pair) in qna.iter().enumerate() {
                        println!("\nQ{}. {}\nA: {}", i + 1, pair.question, pair.answer);
                    }
                }
            }
        }
        NotesCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing all notes");
                return Ok(());
            }
            store.clear()?;
            println!("Notes cleared");
        }
    }
    Ok(())
}

/// First eight characters of an id, or the whole id when shorter
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn run_calendar_command(config: AppConfig, action: CalendarCommands, json: bool) -> Result<()> {
    let store = CalendarStore::new(config.storage.calendar_path());
    match action {
        CalendarCommands::Add { date, text } => {
            let event = store.add(calendar::parse_date(&date)?, &text.join(" "))?;
            if json {
                print_json(&event)?;
            } else {
                println!("Added {} on {} ({})", event.text, event.date, short_id(&event.id));
            }
        }
        CalendarCommands::List { month, date } => {
            let events = match (month, date) {
                (Some(month), _) => {
                    let (year, month) = calendar::parse_month(&month)?;
                    store.month(year, month)?
                }
                (None, Some(date)) => store.on(calendar::parse_date(&date)?)?,
                (None, None) => store.all()?,
            };
            if json {
                print_json(&events)?;
            } else if events.is_empty() {
                println!("No events");
            } else {
                for event in events {
                    println!("  {}  {}  {}", event.date, short_id(&event.id), event.text);
                }
            }
        }
        CalendarCommands::Remove { id } => {
            let removed = store.remove(&id)?;
            println!("Removed {} on {}", removed.text, removed.date);
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C; a failed handler install never fires
async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn redraw(line: &str) {
    print!("\r{}   ", line);
    let _ = std::io::stdout().flush();
}

fn record_session(config: &AppConfig, session: FocusSession) {
    if session.elapsed_secs == 0 {
        return;
    }
    match open_db(config) {
        Ok(db) => {
            if let Err(e) = db.record_focus_session(&session) {
                warn!("Failed to record focus session: {}", e);
            }
        }
        Err(e) => warn!("Failed to open database: {}", e),
    }
}

async fn run_timer(config: AppConfig, minutes: Option<u64>, hms: Option<String>) -> Result<()> {
    let mut countdown = Countdown::from_minutes(config.focus.default_minutes);
    let accepted = match (minutes, hms) {
        (Some(m), _) => countdown.set_preset(m)?,
        (None, Some(hms)) => {
            let (h, m, s) = timer::parse_hms(&hms)?;
            countdown.set(h, m, s)?
        }
        (None, None) => true,
    };
    if !accepted {
        return Err(LuminaraError::InvalidInput("timer duration must be above zero".to_string()));
    }

    println!("Focus for {} (Enter: pause/resume, Ctrl+C: stop)", countdown.display());
    let started_at = Utc::now();
    countdown.toggle();

    let mut enter = timer::spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    let mut stdin_open = true;
    let mut ticker = tokio::time::interval(Duration::from_millis(20));
    let mut last_tick = Instant::now();
    let mut shown = String::new();
    let stop = ctrl_c();
    tokio::pin!(stop);

    let completed = loop {
        tokio::select! {
            _ = &mut stop => break false,
            line = enter.recv(), if stdin_open => match line {
                Some(_) => {
                    countdown.toggle();
                    debug!("Timer toggled; next action: {}", countdown.label());
                }
                None => stdin_open = false,
            },
            _ = ticker.tick() => {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick).as_millis() as u64;
                last_tick = now;
                if countdown.tick(elapsed) == Tick::Finished {
                    break true;
                }
                let line = format!(
                    "{} {} {}",
                    countdown.display(),
                    progress_bar(countdown.progress(), 30),
                    if countdown.is_running() { "" } else { "(paused)" }
                );
                if line != shown {
                    redraw(&line);
                    shown = line;
                }
            }
        }
    };

    println!();
    if completed {
        println!("DONE! Take a break.");
    } else {
        println!("Stopped at {}", countdown.display());
    }
    record_session(
        &config,
        FocusSession::new(
            FocusKind::Timer,
            countdown.total_ms() / 1000,
            countdown.elapsed_ms() / 1000,
            completed,
            started_at,
        ),
    );
    Ok(())
}

async fn run_stopwatch(config: AppConfig) -> Result<()> {
    println!("Stopwatch running (Enter: lap, Ctrl+C: stop)");
    let mut stopwatch = Stopwatch::new();
    let started_at = Utc::now();
    stopwatch.toggle();

    let mut enter = timer::spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    let mut stdin_open = true;
    let mut ticker = tokio::time::interval(Duration::from_millis(10));
    let mut last_tick = Instant::now();
    let stop = ctrl_c();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            line = enter.recv(), if stdin_open => match line {
                Some(_) => {
                    if let Some(lap) = stopwatch.lap() {
                        println!("\r{}", lap);
                    }
                }
                None => stdin_open = false,
            },
            _ = ticker.tick() => {
                let now = Instant::now();
                stopwatch.tick(now.duration_since(last_tick).as_millis() as u64);
                last_tick = now;
                redraw(&stopwatch.display());
            }
        }
    }

    println!();
    for lap in stopwatch.laps() {
        println!("  {}", lap);
    }
    record_session(
        &config,
        FocusSession::new(FocusKind::Stopwatch, 0, stopwatch.elapsed_ms() / 1000, true, started_at),
    );
    Ok(())
}

async fn run_alarm_command(config: AppConfig, action: AlarmCommands, json: bool) -> Result<()> {
    let mut book = AlarmBook::load(config.storage.alarms_path())?;
    match action {
        AlarmCommands::Add { time } => {
            let alarm = timer::parse_alarm_time(&time)?;
            book.add(alarm);
            book.save()?;
            println!("Alarm set for {}", alarm);
        }
        AlarmCommands::List => {
            if json {
                print_json(book.list())?;
            } else if book.is_empty() {
                println!("No alarms set.");
            } else {
                for alarm in book.list() {
                    println!("  {}", alarm);
                }
            }
        }
        AlarmCommands::Remove { time } => {
            let alarm = timer::parse_alarm_time(&time)?;
            if !book.remove(alarm) {
                return Err(LuminaraError::NotFound(format!("alarm at {}", alarm)));
            }
            book.save()?;
            println!("Removed alarm at {}", alarm);
        }
        AlarmCommands::Run => {
            if book.is_empty() {
                println!("No alarms set.");
                return Ok(());
            }
            println!("Waiting for {} alarm(s). Press Ctrl+C to stop.", book.list().len());
            let mut ticker = tokio::time::interval(Duration::from_millis(250));
            let mut last_rung: Option<(u32, u32)> = None;
            let stop = ctrl_c();
            tokio::pin!(stop);

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        let now = Local::now().time();
                        let minute = (now.hour(), now.minute());
                        if last_rung == Some(minute) {
                            continue;
                        }
                        for alarm in book.due(&now) {
                            println!("\x07⏰ It is {}!", alarm);
                            last_rung = Some(minute);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Run the library watcher loop
async fn run_watch(
    config: AppConfig,
    dir_override: Option<PathBuf>,
    skip_health_check: bool,
    process_existing: bool,
) -> Result<()> {
    let dir = dir_override.unwrap_or_else(|| PathBuf::from(&config.storage.library_dir));
    let client = OllamaClient::from_config(&config)?;

    if !skip_health_check {
        info!("Checking Ollama availability...");
        ensure_engine(&client, &config.ai_engine.model).await?;
        info!("Ollama is running");
    } else {
        warn!("Skipping Ollama health check");
    }

    let db = open_db(&config)?;
    info!("Database initialized: {}", config.storage.database);

    let mut watcher = FileWatcher::new()?;
    watcher.watch(&dir)?;

    if process_existing {
        info!("Processing existing files...");
        for entry in std::fs::read_dir(&dir)?.flatten() {
            let path = entry.path();
            if path.is_file() && should_process(&path) {
                if let Err(e) = process_document(&path, &config, &client, &db).await {
                    error!("Failed to process {:?}: {}", path, e);
                }
            }
        }
    }

    // Setup graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        ctrl_c().await;
        info!("Received Ctrl+C, shutting down...");
        let _ = shutdown_tx.send(true);
    });

    info!("Watching {:?}. Press Ctrl+C to stop.", dir);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match watcher.next_event(Duration::from_millis(100)) {
            Some(WatchEvent::FileCreated(path) | WatchEvent::FileRenamed(path))
                if should_process(&path) =>
            {
                if !wait_for_stable(&path, Duration::from_secs(10)).await {
                    debug!("File disappeared during stability check: {:?}", path);
                    continue;
                }
                if let Err(e) = process_document(&path, &config, &client, &db).await {
                    error!("Failed to process {:?}: {}", path, e);
                }
            }
            Some(WatchEvent::Error(e)) => warn!("Watch error: {}", e),
            _ => {}
        }
    }

    info!("Luminara watcher stopped.");
    Ok(())
}

/// Write a cheatsheet next to a document unless one already exists for its contents
async fn process_document(
    path: &Path,
    config: &AppConfig,
    client: &OllamaClient,
    db: &Database,
) -> Result<()> {
    let hash = documents::file_hash(path)?;
    if db.find_artifact(&hash, ArtifactKind::Cheatsheet)?.is_some() {
        info!("Already summarised: {:?}", path);
        return Ok(());
    }

    info!("Summarising: {:?}", path);
    let options = CheatsheetOptions::from_config(config);
    let run = cheatsheet::generate_cheatsheet(client, &options, path).await?;
    let output = cheatsheet_output_path(path);
    cheatsheet::save(&run.extraction, &output)?;
    record_artifact(
        db,
        &ArtifactRecord::new(
            ArtifactKind::Cheatsheet,
            path,
            &hash,
            &output,
            &options.model,
            run.extraction.item_count(),
        ),
    );
    info!("Wrote {:?} ({} items)", output, run.extraction.item_count());
    Ok(())
}

/// Run database commands
fn run_db_command(config: AppConfig, action: DbCommands, json: bool) -> Result<()> {
    let db = open_db(&config)?;

    match action {
        DbCommands::Stats => {
            let stats = db.stats()?;
            if json {
                print_json(&stats)?;
            } else {
                println!("Database Statistics:");
                println!("  Cheatsheets & quizzes: {}", stats.artifact_count);
                println!("  Focus sessions: {}", stats.focus_session_count);
                println!("  Focus minutes: {}", stats.focus_minutes);
            }
        }
        DbCommands::Artifacts { limit } => {
            let records = db.recent_artifacts(limit)?;
            if json {
                print_json(&records)?;
            } else {
                for r in records {
                    println!(
                        "  {} {:<10} {} -> {} ({} items)",
                        r.created_at.format("%Y-%m-%d %H:%M"),
                        r.kind.as_str(),
                        r.source_path,
                        r.output_path,
                        r.item_count
                    );
                }
            }
        }
        DbCommands::Sessions { limit } => {
            let sessions = db.recent_focus_sessions(limit)?;
            if json {
                print_json(&sessions)?;
            } else {
                for s in sessions {
                    println!(
                        "  {} {:<9} {:>4} min {}",
                        s.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        s.kind.as_str(),
                        s.elapsed_secs / 60,
                        if s.completed { "done" } else { "stopped" }
                    );
                }
            }
        }
        DbCommands::Vacuum => {
            db.vacuum()?;
            println!("Database vacuumed successfully");
        }
    }

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => print_json(&config)?,
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            println!("Configuration at {:?} is valid", config_path);
            println!("  Ollama: {}", config.ai_engine.url);
            println!("  Model: {}", config.ai_engine.model);
            println!("  Library: {}", config.storage.library_dir);
            println!("  Database: {}", config.storage.database);
        }
    }
    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig, model: Option<String>) -> Result<()> {
    let client = OllamaClient::from_config(&config)?;
    let wanted = model.unwrap_or_else(|| config.ai_engine.model.clone());

    println!("Luminara v0.1.0 Status");
    println!("======================");

    match client.health_check().await {
        Ok(()) => println!("Ollama: Running ({})", client.base_url()),
        Err(e) => println!("Ollama: Error - {}", e),
    }

    match client.list_models().await {
        Ok(models) => {
            println!("\nAvailable models:");
            for m in &models {
                let marker = if m.starts_with(wanted.as_str()) { "→" } else { " " };
                println!("  {} {}", marker, m);
            }
        }
        Err(e) => println!("  Error listing models: {}", e),
    }

    match open_db(&config) {
        Ok(db) => {
            let stats = db.stats()?;
            println!("\nDatabase ({}):", config.storage.database);
            println!("  Cheatsheets & quizzes: {}", stats.artifact_count);
            println!("  Focus minutes: {}", stats.focus_minutes);
        }
        Err(e) => println!("\nDatabase: ✗ Error - {}", e),
    }

    println!("\nStudy desk:");
    println!(
        "  Library: {} PDF(s) in {}",
        library::list_pdfs(Path::new(&config.storage.library_dir))?.len(),
        config.storage.library_dir
    );
    println!("  Notes: {}", NoteStore::new(config.storage.notes_path()).read_all()?.len());
    println!(
        "  Upcoming events: {}",
        CalendarStore::new(config.storage.calendar_path())
            .upcoming(Local::now().date_naive(), usize::MAX)?
            .len()
    );
    Ok(())
}

/// Initialize a new Luminara workspace
fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(LuminaraError::Config(
            "config.json already exists. Use --force to overwrite".to_string(),
        ));
    }

    let mut config = AppConfig::default();
    let data_dir = target.join(&config.storage.data_dir);
    let library_dir = target.join(&config.storage.library_dir);
    std::fs::create_dir_all(&data_dir)?;
    std::fs::create_dir_all(&library_dir)?;

    config.storage.data_dir = data_dir.to_string_lossy().to_string();
    config.storage.library_dir = library_dir.to_string_lossy().to_string();
    config.storage.database = target.join(&config.storage.database).to_string_lossy().to_string();
    config.save(&config_path)?;

    println!("Luminara initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - config.json");
    println!("  - data/");
    println!("  - library/");
    println!("\nNext steps:");
    println!("  1. Start Ollama: ollama serve && ollama pull {}", config.ai_engine.model);
    println!("  2. Add PDFs: luminara library add <file.pdf>");
    println!("  3. Summarise: luminara cheatsheet library/<file.pdf>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reusable_cheatsheet_needs_same_output_and_model() {
        let dir = tempfile::tempdir().unwrap();
        let earlier = dir.path().join("output.json");
        std::fs::write(&earlier, "{}").unwrap();
        let previous = ArtifactRecord::new(
            ArtifactKind::Cheatsheet,
            Path::new("bio.pdf"),
            "hash",
            &earlier,
            "llama3.1:8b",
            4,
        );

        assert!(reusable_cheatsheet(&previous, &earlier, "llama3.1:8b"));
        assert!(!reusable_cheatsheet(&previous, &dir.path().join("new.json"), "llama3.1:8b"));
        assert!(!reusable_cheatsheet(&previous, &earlier, "mistral"));

        std::fs::remove_file(&earlier).unwrap();
        assert!(!reusable_cheatsheet(&previous, &earlier, "llama3.1:8b"));
    }

    #[test]
    fn test_short_id_tolerates_short_ids() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["luminara"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
        assert_eq!(cli.format, "text");
    }

    #[test]
    fn test_cli_cheatsheet_command() {
        let cli = Cli::try_parse_from([
            "luminara", "cheatsheet", "notes.pdf", "-o", "bio.json", "--pages-per-chunk", "4", "--force",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Cheatsheet { path, output, pages_per_chunk, force, .. }) => {
                assert_eq!(path, PathBuf::from("notes.pdf"));
                assert_eq!(output, Some(PathBuf::from("bio.json")));
                assert_eq!(pages_per_chunk, Some(4));
                assert!(force);
            }
            _ => panic!("Expected Cheatsheet command"),
        }
    }

    #[test]
    fn test_cli_quiz_without_pdf() {
        let cli = Cli::try_parse_from(["luminara", "quiz", "--type", "tf"]).unwrap();
        match cli.command {
            Some(Commands::Quiz { pdf, question_type, .. }) => {
                assert!(pdf.is_none());
                assert_eq!(question_type.as_deref(), Some("tf"));
            }
            _ => panic!("Expected Quiz command"),
        }
    }

    #[test]
    fn test_cli_timer_flags_conflict() {
        assert!(Cli::try_parse_from(["luminara", "timer", "--minutes", "25", "--hms", "0:25:00"]).is_err());
        let cli = Cli::try_parse_from(["luminara", "timer", "-m", "55"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Timer { minutes: Some(55), hms: None })));
    }

    #[test]
    fn test_cli_calendar_add_joins_words() {
        let cli = Cli::try_parse_from(["luminara", "calendar", "add", "2025-06-01", "Physics", "final"]).unwrap();
        match cli.command {
            Some(Commands::Calendar { action: CalendarCommands::Add { date, text } }) => {
                assert_eq!(date, "2025-06-01");
                assert_eq!(text.join(" "), "Physics final");
            }
            _ => panic!("Expected Calendar add"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["luminara", "db", "stats", "--format", "json", "-q"]).unwrap();
        assert_eq!(cli.format, "json");
        assert!(cli.quiet);
        assert!(Cli::try_parse_from(["luminara", "db", "stats", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(1.0, 4), "[####]");
        assert_eq!(progress_bar(0.5, 4), "[##--]");
        assert_eq!(progress_bar(0.0, 4), "[----]");
    }
}
