//! ThreadMan CLI
//!
//! CLI tool for inspecting and editing ThreadMan state outside the browser,
//! and for dry-running the visibility engine over a list of threads.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use tm_core::{
    ConfigStore, Decision, EvaluationSummary, ThreadAction, ThreadId, ThreadRecord, Timestamp, VisibilityEngine,
};
use tm_settings::SettingsForm;

mod file_store;

use file_store::FileStore;

#[derive(Parser)]
#[command(name = "tm-cli")]
#[command(about = "ThreadMan thread visibility state tools")]
struct Cli {
    /// Store file (defaults to the user data directory)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored settings
    Show,

    /// Add threads to the block list
    Block {
        /// Thread ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Add threads to the allow list
    Allow {
        /// Thread ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Mark threads as viewed
    Viewed {
        /// Thread ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// View time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Replace settings fields, as the settings dialog does
    Edit {
        /// Comma-separated block list
        #[arg(long)]
        blocked: Option<String>,

        /// Comma-separated allow list
        #[arg(long)]
        allowed: Option<String>,

        /// Viewed log as a JSON array of {id, lastClicked}
        #[arg(long)]
        viewed: Option<String>,
    },

    /// Decide visibility for threads listed in a JSON file
    Evaluate {
        /// JSON array of {id, title, lastActivity}
        #[arg(short, long)]
        threads: PathBuf,

        /// Print decisions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear all stored settings
    Reset,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = open_store(cli.store).and_then(|store| match cli.command {
        Commands::Show => cmd_show(&store),
        Commands::Block { ids } => cmd_action(&store, ThreadAction::Block, &ids, None),
        Commands::Allow { ids } => cmd_action(&store, ThreadAction::Allow, &ids, None),
        Commands::Viewed { ids, at } => cmd_action(&store, ThreadAction::MarkViewed, &ids, at.as_deref()),
        Commands::Edit {
            blocked,
            allowed,
            viewed,
        } => cmd_edit(&store, blocked, allowed, viewed),
        Commands::Evaluate { threads, json } => cmd_evaluate(&store, &threads, json),
        Commands::Reset => cmd_reset(&store),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn open_store(path: Option<PathBuf>) -> Result<ConfigStore<FileStore>, String> {
    let path = path
        .or_else(FileStore::default_path)
        .ok_or_else(|| "No data directory; pass --store".to_string())?;
    let backend = FileStore::open(&path);
    log::debug!("Using store '{}'", backend.path().display());
    Ok(ConfigStore::new(backend))
}

fn cmd_show(store: &ConfigStore<FileStore>) -> Result<(), String> {
    let doc = store.load();
    let form = SettingsForm::from_document(&doc).map_err(|e| e.to_string())?;

    println!("Blocked ({}):  {}", doc.blocked.len(), form.blocked);
    println!("Allowed ({}):  {}", doc.allowed.len(), form.allowed);
    if doc.is_allow_list_mode() {
        println!("  Allow-list mode: only allowed threads are shown, block list ignored");
    }
    println!("Viewed ({}):", doc.viewed.len());
    for record in doc.viewed.iter() {
        println!("  {}  {}", record.id, record.last_viewed.to_rfc3339());
    }

    Ok(())
}

fn cmd_action(
    store: &ConfigStore<FileStore>,
    action: ThreadAction,
    ids: &[String],
    at: Option<&str>,
) -> Result<(), String> {
    let now = match at {
        Some(raw) => parse_time(raw)?,
        None => Utc::now(),
    };

    let ids = ids
        .iter()
        .map(|raw| {
            let id = ThreadId::from(raw.trim());
            if id.is_numeric() {
                Ok(id)
            } else {
                Err(format!("Invalid thread id '{}'", raw))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let count = ids.len();
    store
        .update(|doc| {
            for id in ids {
                action.apply(doc, id, now);
            }
        })
        .map_err(|e| e.to_string())?;

    println!("Applied {:?} to {} thread(s)", action, count);
    Ok(())
}

fn cmd_edit(
    store: &ConfigStore<FileStore>,
    blocked: Option<String>,
    allowed: Option<String>,
    viewed: Option<String>,
) -> Result<(), String> {
    let mut form = SettingsForm::load(store).map_err(|e| e.to_string())?;
    if let Some(blocked) = blocked {
        form.blocked = blocked;
    }
    if let Some(allowed) = allowed {
        form.allowed = allowed;
    }
    if let Some(viewed) = viewed {
        form.viewed = viewed;
    }

    let doc = form.save(store).map_err(|e| e.to_string())?;
    println!(
        "Saved settings: {} blocked, {} allowed, {} viewed",
        doc.blocked.len(),
        doc.allowed.len(),
        doc.viewed.len()
    );
    Ok(())
}

fn cmd_evaluate(store: &ConfigStore<FileStore>, threads_path: &Path, json: bool) -> Result<(), String> {
    let (records, decisions) = evaluate_file(store, threads_path)?;

    if json {
        let text = serde_json::to_string_pretty(&decisions_to_json(&decisions)).map_err(|e| e.to_string())?;
        println!("{}", text);
        return Ok(());
    }

    for (record, decision) in records.iter().zip(&decisions) {
        println!(
            "  {:<7} {:>8}  {:<18} {}",
            if decision.hidden { "hidden" } else { "shown" },
            record.id,
            format!("{:?}", decision.reason),
            record.title
        );
    }

    let summary = EvaluationSummary::from_decisions(&decisions);
    println!();
    println!("Threads:  {} ({} shown, {} hidden)", summary.total, summary.visible(), summary.hidden);
    println!(
        "  Hidden by: not allowed {}, blocked {}, viewed {}",
        summary.not_allowed, summary.blocked, summary.viewed
    );
    Ok(())
}

/// Read a thread list and decide each thread against the stored document.
fn evaluate_file(
    store: &ConfigStore<FileStore>,
    threads_path: &Path,
) -> Result<(Vec<ThreadRecord>, Vec<Decision>), String> {
    let text = fs::read_to_string(threads_path)
        .map_err(|e| format!("Failed to read '{}': {}", threads_path.display(), e))?;
    let records: Vec<ThreadRecord> = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid thread list '{}': {}", threads_path.display(), e))?;

    let doc = store.load();
    let decisions = VisibilityEngine::new(&doc).evaluate(&records);
    Ok((records, decisions))
}

fn decisions_to_json(decisions: &[Decision]) -> serde_json::Value {
    decisions
        .iter()
        .map(|d| {
            serde_json::json!({
                "id": d.id,
                "hidden": d.hidden,
                "reason": format!("{:?}", d.reason),
            })
        })
        .collect()
}

fn cmd_reset(store: &ConfigStore<FileStore>) -> Result<(), String> {
    store.reset().map_err(|e| e.to_string())?;
    println!("Cleared all settings");
    Ok(())
}

fn parse_time(raw: &str) -> Result<Timestamp, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid time '{}': {}", raw, e))
}
