//! fsearch - filesystem metadata indexer and search service
//!
//! Runs the indexing daemon with its HTTP API, or works against the persisted
//! snapshot from the command line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fsearch::config::Config;
use fsearch::database::Database;
use fsearch::index::{IndexService, IndexSnapshot};
use fsearch::indexer::Indexer;
use fsearch::search::{RawSearchParams, evaluate};
use fsearch::server::{self, ServerState, format_size, format_timestamp};
use fsearch::platform;

/// fsearch - filesystem metadata indexer and search service
#[derive(Parser)]
#[command(name = "fsearch")]
#[command(author = "Misha")]
#[command(version)]
#[command(about = "Filesystem metadata indexer and search service", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the indexing daemon and HTTP API
    Serve,

    /// Run one scan and persist the snapshot
    Scan,

    /// Search the persisted snapshot
    Search {
        /// Text to match (substring, or a regex with --mode regex)
        #[arg(default_value = "")]
        query: String,

        /// Match mode: substring or regex
        #[arg(short, long)]
        mode: Option<String>,

        /// Only files at or below this directory
        #[arg(short, long)]
        dir: Option<String>,

        /// Extension filter; repeat or comma-separate for several
        #[arg(short, long)]
        ext: Vec<String>,

        /// Minimum size in bytes
        #[arg(long)]
        size_min: Option<String>,

        /// Maximum size in bytes
        #[arg(long)]
        size_max: Option<String>,

        /// Earliest modification time (epoch seconds)
        #[arg(long)]
        mtime_from: Option<String>,

        /// Latest modification time (epoch seconds)
        #[arg(long)]
        mtime_to: Option<String>,

        /// Sort order, e.g. mtime_desc, name_asc, size
        #[arg(short, long)]
        sort: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long)]
        page: Option<String>,

        /// Results per page
        #[arg(long)]
        per_page: Option<String>,
    },

    /// Show persisted index statistics
    Status,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config.service.log_level);

    match cli.command {
        Commands::Serve => {
            info!("Starting fsearch daemon...");
            run_daemon(config).await?;
        }

        Commands::Scan => {
            run_scan(config).await?;
        }

        Commands::Search {
            query,
            mode,
            dir,
            ext,
            size_min,
            size_max,
            mtime_from,
            mtime_to,
            sort,
            page,
            per_page,
        } => {
            let params = RawSearchParams {
                q: Some(query),
                mode,
                dir,
                ext,
                size_min,
                size_max,
                mtime_from,
                mtime_to,
                sort,
                page,
                per_page,
            };
            search_files(&config, params)?;
        }

        Commands::Status => {
            show_status(&config)?;
        }

        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn open_database(config: &Config) -> Result<Option<Database>> {
    if !config.storage.persist {
        return Ok(None);
    }
    let db = Database::new(&config.db_path)?;
    db.init_schema()?;
    info!("Database initialized at {:?}", db.path());
    Ok(Some(db))
}

fn load_persisted(db: &Database) -> Result<IndexSnapshot> {
    db.load_snapshot()?
        .context("No persisted index yet; run `fsearch scan` or start the daemon first")
}

/// Run the main daemon process
async fn run_daemon(config: Config) -> Result<()> {
    info!(
        "Configuration loaded: roots={:?}, bind={}",
        config.index.roots, config.server.bind
    );

    let db = open_database(&config)?;
    let index = IndexService::new();

    // Serve the last persisted snapshot until the first scan completes
    if let Some(db) = &db {
        match db.load_snapshot() {
            Ok(Some(snapshot)) => {
                info!("Restored {} files from the database", snapshot.total_files());
                index.publish(snapshot);
            }
            Ok(None) => info!("No persisted snapshot found"),
            Err(e) => warn!("Failed to load persisted snapshot: {:#}", e),
        }
    }

    let indexer = Indexer::new(index, db, config.index.clone());

    if config.index.scan_on_startup {
        indexer.request_scan()?;
    }

    let timer = match config.index.rescan_interval_secs {
        0 => None,
        secs => {
            info!("Rescanning every {}s", secs);
            Some(indexer.spawn_rescan_timer(Duration::from_secs(secs)))
        }
    };

    let state = Arc::new(ServerState::new(indexer.clone(), config.search.clone()));
    server::serve(&config.server.bind, state, platform::shutdown_signal()).await?;

    info!("Shutting down...");
    indexer.request_stop();
    if let Some(timer) = timer {
        timer.abort();
    }

    Ok(())
}

/// Scan once in the foreground
async fn run_scan(config: Config) -> Result<()> {
    let db = open_database(&config)?;
    let indexer = Indexer::new(IndexService::new(), db, config.index.clone());
    let report = indexer.scan().await?;

    println!("Scan complete");
    println!("=============");
    println!("Roots:            {}", report.roots.join(", "));
    println!("Files:            {}", report.files);
    println!("Skipped:          {}", report.skipped);
    println!("Excluded:         {}", report.excluded);
    println!("Duration:         {:.2}s", report.duration_ms as f64 / 1000.0);
    for entry in &report.skipped_entries {
        println!("  ! {}: {}", entry.path, entry.reason);
    }

    Ok(())
}

/// Search the persisted snapshot
fn search_files(config: &Config, params: RawSearchParams) -> Result<()> {
    let db = Database::new(&config.db_path)?;
    db.init_schema()?;
    let snapshot = load_persisted(&db)?;

    let query = params.into_query(&config.search)?;
    let result = evaluate(&snapshot, &query)?;

    println!(
        "Found {} files (page {} of {}):",
        result.total, result.page, result.total_pages
    );
    println!();

    for file in &result.items {
        println!(
            "  {}  {:>10}  {}",
            format_timestamp(file.mtime),
            format_size(file.size),
            file.path
        );
    }

    println!();
    println!("Query time: {}ms", result.took_ms);

    Ok(())
}

/// Show persisted index statistics
fn show_status(config: &Config) -> Result<()> {
    let db = Database::new(&config.db_path)?;
    db.init_schema()?;
    let stats = db.stored_stats()?;

    println!("fsearch Status");
    println!("==============");
    println!("Indexed files:    {}", stats.total_files);
    println!("Indexed size:     {}", format_size(stats.total_size));
    match stats.last_scan {
        Some(ts) => println!("Last scan:        {}", format_timestamp(ts)),
        None => println!("Last scan:        never"),
    }
    println!("Database size:    {}", format_size(db.get_size()?));
    println!("Database path:    {:?}", db.path());

    Ok(())
}
