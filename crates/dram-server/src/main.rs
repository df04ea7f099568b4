//! `dram`: serve the tasting quiz API and run the extraction pipeline.
//!
//! # Usage
//!
//! ```text
//! dram import-vocabulary descriptors.json
//! dram import-reviews reviews.json
//! dram rebuild --dry-run
//! dram rebuild
//! dram serve
//! ```
//!
//! Configuration is read from `dram.toml` (or `--config`) and `DRAM_*`
//! environment variables.

mod import;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use dram_core::{assignment::ExtractionMethod, descriptor::Section, store::TastingStore};
use dram_extract::{Extractor, Vocabulary};
use dram_store_sqlite::SqliteStore;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Whiskey tasting-note descriptor pipeline")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "dram.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API under `/api`.
  Serve,

  /// Re-extract every review and replace all assignments and aggregates.
  Rebuild {
    /// Compute and report statistics without writing anything.
    #[arg(long)]
    dry_run: bool,
  },

  /// Extract descriptors from a piece of text and print them as JSON.
  Extract {
    #[arg(long)]
    section: Section,
    text:    String,
  },

  /// Add descriptors from a JSON file to the vocabulary.
  ImportVocabulary { file: PathBuf },

  /// Add reviews from a JSON file, creating whiskeys as needed.
  ImportReviews { file: PathBuf },

  /// Print the reviews flagged for manual review by the latest rebuild.
  Flags,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.database_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.database_path))?;

  match cli.command {
    Command::Serve => serve(store, &cfg).await,
    Command::Rebuild { dry_run } => rebuild(&store, &cfg, dry_run).await,
    Command::Extract { section, text } => extract(&store, &cfg, section, &text).await,
    Command::ImportVocabulary { file } => {
      import::import_vocabulary(&store, &file).await.map(drop)
    }
    Command::ImportReviews { file } => import::import_reviews(&store, &file).await.map(drop),
    Command::Flags => flags(&store).await,
  }
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn serve(store: SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = Router::new().nest("/api", dram_api::api_router(Arc::new(store)));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

// ─── Rebuild ─────────────────────────────────────────────────────────────────

async fn load_vocabulary(store: &SqliteStore) -> anyhow::Result<Vocabulary> {
  let terms = store
    .list_active_descriptors()
    .await
    .context("failed to load descriptor vocabulary")?;
  Vocabulary::new(terms).context("cannot extract without a vocabulary")
}

async fn rebuild(store: &SqliteStore, cfg: &ServerConfig, dry_run: bool) -> anyhow::Result<()> {
  let vocabulary = load_vocabulary(store).await?;
  let reviews = store.list_reviews().await.context("failed to load reviews")?;
  let review_whiskey = store
    .review_whiskey_map()
    .await
    .context("failed to load review → whiskey map")?;

  let output = dram_extract::rebuild(&vocabulary, &reviews, &review_whiskey, &cfg.matcher)?;
  println!("{}", serde_json::to_string_pretty(&output.run.stats)?);

  if dry_run {
    tracing::info!("dry run; nothing committed");
    return Ok(());
  }
  store
    .commit_rebuild(output)
    .await
    .context("failed to commit rebuild")?;
  Ok(())
}

// ─── Extract ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ExtractedRow<'a> {
  descriptor_id: i64,
  name:          &'a str,
  confidence:    f64,
  method:        ExtractionMethod,
}

async fn extract(
  store: &SqliteStore,
  cfg: &ServerConfig,
  section: Section,
  text: &str,
) -> anyhow::Result<()> {
  let vocabulary = load_vocabulary(store).await?;
  let extractor = Extractor::new(&vocabulary, cfg.matcher.clone())?;

  let found = extractor.extract_assignments(Some(text), section);
  let rows: Vec<ExtractedRow<'_>> = found
    .iter()
    .filter_map(|e| {
      vocabulary.get(e.descriptor_id).map(|term| ExtractedRow {
        descriptor_id: e.descriptor_id.0,
        name:          &term.name,
        confidence:    e.confidence,
        method:        e.method,
      })
    })
    .collect();

  println!("{}", serde_json::to_string_pretty(&rows)?);
  Ok(())
}

// ─── Flags ───────────────────────────────────────────────────────────────────

async fn flags(store: &SqliteStore) -> anyhow::Result<()> {
  let Some(run) = store.latest_run().await? else {
    println!("no rebuild has been committed yet");
    return Ok(());
  };
  let flags = store.run_flags(run.run_id).await?;
  tracing::info!(run_id = %run.run_id, flagged = flags.len(), "latest rebuild");
  println!("{}", serde_json::to_string_pretty(&flags)?);
  Ok(())
}
