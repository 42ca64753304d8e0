//! Run command implementation: extract, enrich, normalize, load

use crate::catalog::{read_movies, read_ratings};
use crate::config::Config;
use crate::enrich::{EnrichStats, Enricher};
use crate::error::Result;
use crate::normalize::normalize;
use crate::omdb::{MetadataLookup, OmdbClient};
use crate::store::{LoadStats, MovieStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Command-line overrides for a run
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub movies_csv: Option<PathBuf>,
    pub ratings_csv: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub max_movies: Option<usize>,
    pub request_interval_ms: Option<u64>,
}

impl RunOverrides {
    /// Apply overrides on top of the loaded configuration
    pub fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(path) = self.movies_csv {
            config.input.movies_csv = path.display().to_string();
        }
        if let Some(path) = self.ratings_csv {
            config.input.ratings_csv = path.display().to_string();
        }
        if let Some(path) = self.db_path {
            config.database.path = path.display().to_string();
        }
        if let Some(max_movies) = self.max_movies {
            config.enrich.max_movies = max_movies;
        }
        if let Some(interval) = self.request_interval_ms {
            config.enrich.request_interval_ms = interval;
        }
        config.resolve_paths();
        config.validate()
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub started_at: String,
    pub completed_at: String,
    pub movies_read: usize,
    pub movies_rejected: usize,
    pub ratings_read: usize,
    pub ratings_rejected: usize,
    pub enrich: EnrichStats,
    pub load: LoadStats,
}

/// Run the full pipeline against OMDb.
///
/// The API key is resolved before any file or database is touched.
pub async fn cmd_run(config: &Config) -> Result<RunStats> {
    let api_key = config.api_key()?;
    let client = OmdbClient::new(&config.omdb, api_key)?;
    let store = MovieStore::connect(&config.paths.db_file).await?;

    let stats = run_pipeline(config, &client, &store).await;
    store.close().await;
    stats
}

/// Run the pipeline with any metadata provider
pub async fn run_pipeline<L: MetadataLookup + ?Sized>(
    config: &Config,
    lookup: &L,
    store: &MovieStore,
) -> Result<RunStats> {
    let started_at = Utc::now().to_rfc3339();

    let movies = read_movies(&config.paths.movies_csv, Some(config.enrich.max_movies))?;
    let ratings = read_ratings(&config.paths.ratings_csv)?;
    info!(
        "Extracted {} movies and {} ratings from CSV",
        movies.rows.len(),
        ratings.rows.len()
    );

    let outcome = Enricher::new(lookup, &config.enrich)
        .enrich(&movies.rows)
        .await;
    let tables = normalize(&movies.rows, &outcome.records)?;
    let load = store.replace_all(&tables, &ratings.rows).await?;

    let stats = RunStats {
        started_at,
        completed_at: Utc::now().to_rfc3339(),
        movies_read: movies.rows.len(),
        movies_rejected: movies.skipped,
        ratings_read: ratings.rows.len(),
        ratings_rejected: ratings.skipped,
        enrich: outcome.stats,
        load,
    };

    info!(
        "ETL completed: {} movies enriched, {} ratings saved",
        stats.enrich.processed, stats.load.ratings
    );
    Ok(stats)
}

/// Print run summary to console
pub fn print_run_stats(stats: &RunStats) {
    println!("\n✓ ETL run complete");
    println!(
        "  Movies read: {} ({} rejected rows)",
        stats.movies_read, stats.movies_rejected
    );
    println!(
        "  Ratings read: {} ({} rejected rows)",
        stats.ratings_read, stats.ratings_rejected
    );
    println!(
        "  Lookups: {} found ({} via title-only retry), {} missed, {} skipped",
        stats.enrich.found, stats.enrich.fallback_found, stats.enrich.missed, stats.enrich.skipped
    );
    println!("\nTables written:");
    println!("  movies: {}", stats.load.movies);
    println!("  genres: {}", stats.load.genres);
    println!("  movie_genres: {}", stats.load.movie_genres);
    println!("  ratings: {}", stats.load.ratings);
    println!("  movie_details: {}", stats.load.movie_details);
}
