pub mod anki_connect;
pub mod config;
pub mod document;
pub mod markdown;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ankimark_core::{
    parse_document, sync_document, CardDraft, Editor, FrontMatterDefaults, SyncReport,
    SyncSettings,
};

use crate::anki_connect::AnkiConnect;
use crate::document::FileEditor;
use crate::markdown::MarkdownRenderer;

#[derive(Debug, Parser)]
#[command(author, version, about = "Sync markdown flashcards with Anki", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML settings file.
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize the cards of a markdown file with Anki.
    Sync {
        /// Markdown document to synchronize.
        file: PathBuf,
    },
    /// Print the cards found in a markdown file as JSON without contacting Anki.
    Parse {
        /// Markdown document to parse.
        file: PathBuf,
    },
    /// Check that AnkiConnect is reachable.
    Check,
    /// Print the effective settings.
    Config {
        /// Write the effective settings to the config file.
        #[arg(long, default_value_t = false)]
        save: bool,
    },
}

/// Dry-run output of `parse`.
#[derive(Debug, Serialize)]
struct ParseOutput<'a> {
    front_matter: &'a FrontMatterDefaults,
    cards: Vec<&'a CardDraft>,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    let config_path = config::resolve_path(cli.config.as_deref())?;
    let settings = config::load(&config_path)?;

    match cli.command {
        Commands::Sync { file } => sync(&file, &settings).await,
        Commands::Parse { file } => parse(&file, &settings),
        Commands::Check => check(&settings).await,
        Commands::Config { save } => show_config(&settings, save, &config_path),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn sync(file: &Path, settings: &SyncSettings) -> anyhow::Result<()> {
    let mut editor = FileEditor::new(file);
    let store = AnkiConnect::new(&settings.anki_endpoint);

    tracing::info!(file = %file.display(), endpoint = store.endpoint(), "starting sync");
    let report = sync_document(&mut editor, &store, &MarkdownRenderer, settings)
        .await
        .with_context(|| format!("sync of {} aborted", file.display()))?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!("{report}");
    for error in &report.errors {
        match error.note_id {
            Some(id) => println!("  line {} (note {id}): {}", error.line, error.message),
            None => println!("  line {}: {}", error.line, error.message),
        }
    }
}

fn parse(file: &Path, settings: &SyncSettings) -> anyhow::Result<()> {
    let content = FileEditor::new(file)
        .text()
        .with_context(|| format!("cannot read {}", file.display()))?;
    let doc = parse_document(&content, settings);

    let output = ParseOutput {
        front_matter: &doc.front_matter,
        cards: doc.cards().collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn check(settings: &SyncSettings) -> anyhow::Result<()> {
    let store = AnkiConnect::new(&settings.anki_endpoint);
    let version = store
        .check_connectivity()
        .await
        .with_context(|| format!("AnkiConnect not reachable at {}", store.endpoint()))?;
    println!("AnkiConnect v{version} reachable at {}", store.endpoint());
    Ok(())
}

fn show_config(settings: &SyncSettings, save: bool, config_path: &Path) -> anyhow::Result<()> {
    print!("{}", config::to_toml(settings)?);
    if save {
        config::save_to_path(settings, config_path)?;
        tracing::info!(path = %config_path.display(), "settings saved");
    }
    Ok(())
}
