//! Langtrend CLI - record trending-repository snapshots into SQLite

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use langtrend::config::{self, TrendConfig};
use langtrend::record::load_records;
use langtrend::storage::TrendStore;
use langtrend::ui::{self, Icons};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "langtrend")]
#[command(version)]
#[command(about = "Record per-language trending-repository rankings into SQLite")]
#[command(long_about = r#"
Langtrend stores periodic snapshots of trending repositories per language:
  • One update batch per ingestion run
  • Languages, repositories and categories created on first sight
  • Ranked top-project rows and per-language summary rows per batch

Example usage:
  langtrend init
  langtrend ingest --input trending.json
  langtrend stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the schema
    Init {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Record one batch from a JSON records file
    Ingest {
        /// JSON object mapping language name to its trending record
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Exit with an error when any row was skipped
        #[arg(long)]
        strict: bool,
    },

    /// Show row counts for every table
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Init { database, force } => {
            let location = config.database_location(database.as_deref());
            let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let new_config = TrendConfig {
                database: Some(location.clone()),
                ..config
            };
            config::write_config(&config_path, &new_config, force)?;
            config::ensure_db_dir(&location)?;

            let store = TrendStore::open_location(&location)?;
            let report = store.schema_report().clone();
            store.close()?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                ui::header("Initialized langtrend");
                ui::status(Icons::FILE, "Config", &config_path.display().to_string());
                ui::status(Icons::DATABASE, "Database", &location);
                print!("{}", report);
            }

            if !report.is_complete() {
                anyhow::bail!("schema incomplete: {}", report.failures().join(", "));
            }
        }

        Commands::Ingest { input, database, strict } => {
            let input = input
                .or_else(|| config.input.as_ref().map(PathBuf::from))
                .ok_or_else(|| anyhow::anyhow!("no input file (use --input or set `input` in the config)"))?;
            let location = config.database_location(database.as_deref());
            config::ensure_db_dir(&location)?;

            let records = load_records(&input)?;
            tracing::info!(
                input = %input.display(),
                languages = records.len(),
                entries = records.values().map(|r| r.total_entries()).sum::<usize>(),
                "loaded records"
            );

            let mut store = TrendStore::open_location(&location)?;
            let summary = store.record_batch(&records);
            let resolver = store.resolver_stats();
            store.close()?;

            if cli.json {
                let data = serde_json::json!({
                    "summary": summary,
                    "resolver": resolver,
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                ui::header(&format!("Ingested {}", input.display()));
                ui::status(Icons::DATABASE, "Database", &location);
                ui::section("Batch");
                match summary.batch_id {
                    Some(id) => ui::summary_row("Batch id:", &id.to_string()),
                    None => ui::summary_row("Batch id:", "<not created>"),
                }
                ui::summary_row("Languages:", &summary.languages.to_string());
                ui::summary_row("Top-project facts:", &summary.top_project_facts.to_string());
                ui::summary_row("Language facts:", &summary.language_facts.to_string());
                ui::summary_row("Skipped:", &summary.skipped.to_string());
                ui::summary_row(
                    "Resolver:",
                    &format!(
                        "{} cache hits, {} lookups, {} inserts",
                        resolver.cache_hits, resolver.lookups, resolver.inserts
                    ),
                );
                for err in &summary.errors {
                    ui::warn(err);
                }
                if summary.is_clean() {
                    println!();
                    ui::success("Batch recorded");
                }
            }

            if strict && !summary.is_clean() {
                anyhow::bail!("batch recorded with {} skipped row(s)", summary.skipped);
            }
        }

        Commands::Stats { database } => {
            let location = config.database_location(database.as_deref());
            let store = if location == ":memory:" {
                TrendStore::open_in_memory()?
            } else {
                let path = PathBuf::from(&location);
                if !path.exists() {
                    anyhow::bail!("no database at {} (run `langtrend init` or `langtrend ingest` first)", location);
                }
                TrendStore::open_existing(&path)?
            };
            let stats = store.stats()?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                ui::header(&format!("{} {}", Icons::STATS, location));
                println!("{}", ui::stats_table(&stats.rows()));
            }
        }
    }

    Ok(())
}
