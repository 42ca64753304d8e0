//! marquee CLI entry point

use clap::{Parser, Subcommand};
use marquee::{
    commands::{
        cmd_init, cmd_report, cmd_run, cmd_status, print_report, print_run_stats, print_status,
        RunOverrides,
    },
    config::Config,
    error::{Error, Result},
    progress::LogWriterFactory,
    store::MovieStore,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "marquee")]
#[command(version, about = "MovieLens to SQLite loader with OMDb enrichment", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default marquee.toml
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Extract the CSVs, enrich via OMDb, normalize, and replace the output tables
    Run {
        /// movies.csv to read instead of the configured one
        #[arg(long)]
        movies: Option<PathBuf>,

        /// ratings.csv to read instead of the configured one
        #[arg(long)]
        ratings: Option<PathBuf>,

        /// SQLite database to write instead of the configured one
        #[arg(long)]
        db: Option<PathBuf>,

        /// Number of catalog rows to enrich and load
        #[arg(short, long)]
        limit: Option<usize>,

        /// Pause between OMDb requests in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Answer the analytical questions over the loaded tables
    Report,

    /// Show inputs, credentials, and output table counts
    Status,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(LogWriterFactory::default()),
        )
        .with(filter)
        .init();

    // Init doesn't need an existing config
    if let Commands::Init { force } = cli.command {
        let config_path = cli.config.unwrap_or_else(Config::default_config_path);
        let written = cmd_init(&config_path, force)?;

        println!("✓ marquee initialized successfully");
        println!("  Config: {}", written.display());
        println!("\nNext steps:");
        println!("  1. Edit the config file to point at movies.csv and ratings.csv");
        println!("  2. Export your OMDb key: export OMDB_API_KEY=...");
        println!("  3. Load the database: marquee run");
        return Ok(());
    }

    let mut config = Config::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Run {
            movies,
            ratings,
            db,
            limit,
            interval_ms,
        } => {
            let overrides = RunOverrides {
                movies_csv: movies,
                ratings_csv: ratings,
                db_path: db,
                max_movies: limit,
                request_interval_ms: interval_ms,
            };
            overrides.apply(&mut config)?;

            let stats = cmd_run(&config).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_run_stats(&stats);
            }
        }

        Commands::Report => {
            let db_label = config.paths.db_file.display().to_string();
            if !config.paths.db_file.exists() {
                return Err(Error::NotLoaded(db_label));
            }

            let store = MovieStore::connect(&config.paths.db_file).await?;
            let report = cmd_report(&store, &db_label).await;
            store.close().await;
            let report = report?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}
