//! # CLI Module
//!
//! Command-line interface for the wallpaper finder.
//!
//! ## Usage
//! ```bash
//! # Index a folder or a ZIP archive of wallpapers
//! wallfind index ~/Pictures/Wallpapers
//! wallfind index ~/Downloads/walls.zip
//!
//! # Find the current wallpaper in the collection
//! wallfind match
//! wallfind match --reference ~/screenshot.png --output json
//!
//! # Keep watching the desktop, printing whenever the wallpaper changes
//! wallfind match --watch --interval 10
//!
//! # Show what is indexed
//! wallfind status
//! ```
//!
//! ## Exit codes
//! - `0` - success (for `match`: a match was found)
//! - `1` - `match` found nothing because the index is empty
//! - `2` - error (source, index, reference image or settings unavailable)

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;
use wallpaper_finder::core::index::{IndexStore, SqliteIndexStore};
use wallpaper_finder::core::indexer::Indexer;
use wallpaper_finder::core::matcher::{Matcher, NearestMatch};
use wallpaper_finder::core::source::SourceRef;
use wallpaper_finder::error::{IndexError, Result};
use wallpaper_finder::events::{Event, EventChannel, IndexEvent};
use wallpaper_finder::settings::{AppPaths, Settings, MIN_INTERVAL_SECS};

/// Wallpaper Finder - Find where the wallpaper on screen came from
#[derive(Parser, Debug)]
#[command(name = "wallfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Index database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Settings file path
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index a wallpaper folder or ZIP archive, replacing any previous source
    Index {
        /// Folder or .zip file containing wallpapers
        path: PathBuf,
    },

    /// Find the indexed image closest to the current wallpaper
    Match {
        /// Reference image (defaults to the desktop's active wallpaper)
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Keep matching periodically, printing whenever the result changes
        #[arg(short, long)]
        watch: bool,

        /// Seconds between matches in watch mode (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show the selected source and index size
    Status,

    /// Update auto-refresh preferences
    Config {
        /// Refresh automatically in the tray front end
        #[arg(long)]
        auto_refresh: Option<bool>,

        /// Seconds between automatic matches (minimum 1)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (location only)
    Minimal,
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    wallpaper_finder::init_tracing(cli.verbose);

    let defaults = AppPaths::default();
    let paths = AppPaths {
        db_path: cli.db.clone().unwrap_or(defaults.db_path),
        settings_path: cli.settings.clone().unwrap_or(defaults.settings_path),
        data_dir: defaults.data_dir,
    };

    let result = match cli.command {
        Commands::Index { path } => run_index(&paths, &path, cli.verbose),
        Commands::Match {
            reference,
            output,
            watch,
            interval,
        } => run_match(&paths, reference, output, watch, interval),
        Commands::Status => run_status(&paths),
        Commands::Config {
            auto_refresh,
            interval,
        } => run_config(&paths, auto_refresh, interval),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            Term::stderr()
                .write_line(&format!("{} {}", style("error:").red().bold(), e))
                .ok();
            ExitCode::from(2)
        }
    }
}

fn run_index(paths: &AppPaths, path: &Path, verbose: bool) -> Result<ExitCode> {
    let term = Term::stderr();

    let source = SourceRef::detect(path)?;
    let mut settings = Settings::load(&paths.settings_path)?;
    let store = Arc::new(SqliteIndexStore::open_or_create(&paths.db_path)?);

    // Anything already indexed belongs to the previous source
    let replace = settings.source().is_some() || store.count()? > 0;

    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));

    let (sender, receiver) = EventChannel::new();
    let spinner_clone = spinner.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match &event {
                Event::Index(IndexEvent::EntryIndexed(p)) => {
                    spinner_clone.set_message(format!("{} indexed  {}", p.indexed, p.entry_name));
                }
                Event::Index(IndexEvent::EntrySkipped { .. }) => {
                    if verbose {
                        spinner_clone.println(format!("  {}", style(&event).yellow()));
                    }
                }
                _ => spinner_clone.set_message(event.to_string()),
            }
        }
        spinner_clone.finish_and_clear();
    });

    let result = {
        let indexer = Indexer::new(store).events(sender);
        if replace {
            indexer.reindex(&source)
        } else {
            indexer.index(&source)
        }
    };
    event_thread.join().ok();
    let summary = result?;

    settings.set_source(&source);
    settings.save(&paths.settings_path)?;

    term.write_line(&format!(
        "{} Indexed {} images from {} in {:.1}s",
        style("✓").green().bold(),
        style(summary.records_written).cyan(),
        summary.source,
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    if summary.entries_skipped > 0 {
        term.write_line(&format!(
            "  {} unreadable images skipped",
            style(summary.entries_skipped).yellow()
        ))
        .ok();
    }

    Ok(ExitCode::SUCCESS)
}

fn run_match(
    paths: &AppPaths,
    reference: Option<PathBuf>,
    output: OutputFormat,
    watch: bool,
    interval: Option<u64>,
) -> Result<ExitCode> {
    let settings = Settings::load(&paths.settings_path)?;

    let Some(reference) = reference.or_else(AppPaths::active_wallpaper) else {
        Term::stderr()
            .write_line(&format!(
                "{} no active wallpaper on this platform; pass --reference",
                style("error:").red().bold()
            ))
            .ok();
        return Ok(ExitCode::from(2));
    };

    let store = Arc::new(SqliteIndexStore::open_existing(&paths.db_path)?);
    let matcher = Matcher::new(store);

    if watch {
        let interval = interval.unwrap_or(settings.interval).max(MIN_INTERVAL_SECS);
        return watch_matches(&matcher, &reference, output, interval);
    }

    match matcher.find_nearest_file(&reference)? {
        Some(best) => {
            print_match(&best, output);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("No match found");
            Ok(ExitCode::from(1))
        }
    }
}

fn watch_matches(
    matcher: &Matcher,
    reference: &Path,
    output: OutputFormat,
    interval: u64,
) -> Result<ExitCode> {
    // Location of the last printed outcome; `Some(None)` = "No match found"
    let mut last: Option<Option<String>> = None;

    loop {
        match matcher.find_nearest_file(reference) {
            Ok(best) => {
                let outcome = best.as_ref().map(|b| b.record.location());
                if last.as_ref() != Some(&outcome) {
                    match &best {
                        Some(best) => print_match(best, output),
                        None => println!("No match found"),
                    }
                    last = Some(outcome);
                }
            }
            // The desktop may be rewriting the wallpaper file; try again next tick
            Err(e) if e.is_decode() => warn!(error = %e, "reference image unreadable"),
            Err(e) => return Err(e),
        }

        thread::sleep(Duration::from_secs(interval));
    }
}

fn print_match(best: &NearestMatch, output: OutputFormat) {
    match output {
        OutputFormat::Pretty => print_pretty_match(&Term::stdout(), best),
        OutputFormat::Json => print_json_match(best),
        OutputFormat::Minimal => println!("{}", best.record.location()),
    }
}

fn print_pretty_match(term: &Term, best: &NearestMatch) {
    let record = &best.record;

    term.write_line(&format!(
        "{} Match found",
        style("✓").green().bold()
    ))
    .ok();
    term.write_line(&format!("  Type:     {}", style(record.source.kind()).cyan()))
        .ok();
    term.write_line(&format!("  Source:   {}", record.source.path().display()))
        .ok();
    term.write_line(&format!("  Entry:    {}", style(&record.entry_name).bold()))
        .ok();
    term.write_line(&format!(
        "  Distance: {} ({:.1}% similar)",
        style(best.distance).yellow(),
        best.similarity
    ))
    .ok();
    term.write_line(&format!("  Location: {}", style(record.location()).dim()))
        .ok();
}

fn print_json_match(best: &NearestMatch) {
    let output = serde_json::json!({
        "type": best.record.source.kind(),
        "source_path": best.record.source.path(),
        "entry_name": best.record.entry_name,
        "location": best.record.location(),
        "fingerprint": best.record.fingerprint,
        "distance": best.distance,
        "similarity": best.similarity,
    });

    println!("{:#}", output);
}

fn run_status(paths: &AppPaths) -> Result<ExitCode> {
    let term = Term::stdout();
    let settings = Settings::load(&paths.settings_path)?;

    let source_line = match settings.source() {
        Some(source) => format!("Source:   {}", style(source).cyan()),
        None => format!("Source:   {}", style("none selected").dim()),
    };
    term.write_line(&source_line).ok();

    match SqliteIndexStore::open_existing(&paths.db_path) {
        Ok(store) => {
            term.write_line(&format!("Records:  {}", style(store.count()?).cyan()))
                .ok();
        }
        Err(IndexError::Missing { .. }) => {
            term.write_line(&format!("Records:  {}", style("no index yet").dim()))
                .ok();
        }
        Err(e) => return Err(e.into()),
    }

    term.write_line(&format!("Database: {}", paths.db_path.display()))
        .ok();
    term.write_line(&format!(
        "Refresh:  {}",
        if settings.auto_refresh {
            format!("every {}s", settings.interval)
        } else {
            "manual".to_string()
        }
    ))
    .ok();

    Ok(ExitCode::SUCCESS)
}

fn run_config(
    paths: &AppPaths,
    auto_refresh: Option<bool>,
    interval: Option<u64>,
) -> Result<ExitCode> {
    let mut settings = Settings::load(&paths.settings_path)?;

    if let Some(enabled) = auto_refresh {
        settings.auto_refresh = enabled;
    }
    if let Some(seconds) = interval {
        settings.set_interval(seconds);
    }
    settings.save(&paths.settings_path)?;

    println!("{:#}", serde_json::json!(settings));
    Ok(ExitCode::SUCCESS)
}
