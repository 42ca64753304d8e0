//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::store::{MovieStore, TableCount, OUTPUT_TABLES};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub movies_csv: String,
    pub movies_csv_exists: bool,
    pub ratings_csv: String,
    pub ratings_csv_exists: bool,
    pub db_path: String,
    pub db_exists: bool,
    pub omdb_url: String,
    pub api_key_env: String,
    pub api_key_set: bool,
    pub max_movies: usize,
    pub tables: Vec<TableCount>,
}

/// Get pipeline status. A missing database is reported, never created.
pub async fn cmd_status(config: &Config) -> Result<StatusInfo> {
    info!("Getting status");

    let db_exists = config.paths.db_file.exists();
    let tables = if db_exists {
        let store = MovieStore::connect(&config.paths.db_file).await?;
        let counts = store.table_counts().await;
        store.close().await;
        counts?
    } else {
        debug!("No database at {:?}", config.paths.db_file);
        OUTPUT_TABLES
            .iter()
            .map(|t| TableCount {
                table: t.to_string(),
                exists: false,
                rows: 0,
            })
            .collect()
    };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        movies_csv: config.paths.movies_csv.display().to_string(),
        movies_csv_exists: config.paths.movies_csv.exists(),
        ratings_csv: config.paths.ratings_csv.display().to_string(),
        ratings_csv_exists: config.paths.ratings_csv.exists(),
        db_path: config.paths.db_file.display().to_string(),
        db_exists,
        omdb_url: config.omdb.base_url.clone(),
        api_key_env: config.omdb.api_key_env.clone(),
        api_key_set: config.api_key().is_ok(),
        max_movies: config.enrich.max_movies,
        tables,
    })
}

fn presence(exists: bool) -> &'static str {
    if exists { "✓" } else { "✗ missing" }
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 marquee Status\n");
    println!("Configuration: {}", status.config_path);
    println!("\nInputs:");
    println!("  {} {}", status.movies_csv, presence(status.movies_csv_exists));
    println!("  {} {}", status.ratings_csv, presence(status.ratings_csv_exists));
    println!("\nOMDb:");
    println!("  URL: {}", status.omdb_url);
    let key_status = if status.api_key_set {
        "✓ set"
    } else {
        "✗ not set"
    };
    println!("  API key (${}): {}", status.api_key_env, key_status);
    println!("  Movies per run: {}", status.max_movies);

    println!("\nDatabase: {}", status.db_path);
    if !status.db_exists {
        println!("  Not created yet (run 'marquee run' to load it)");
        return;
    }
    for count in &status.tables {
        if count.exists {
            println!("  {}: {} rows", count.table, count.rows);
        } else {
            println!("  {}: ✗ missing", count.table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.base_dir = tmp.path().to_path_buf();
        config.resolve_paths();
        config
    }

    #[tokio::test]
    async fn test_status_does_not_create_database() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);

        let status = cmd_status(&config).await.unwrap();
        assert!(!status.db_exists);
        assert!(!status.movies_csv_exists);
        assert_eq!(status.tables.len(), 5);
        assert!(status.tables.iter().all(|t| !t.exists));
        assert!(!config.paths.db_file.exists());
    }

    #[tokio::test]
    async fn test_status_counts_loaded_tables() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let store = MovieStore::connect(&config.paths.db_file).await.unwrap();
        store.replace_all(&Default::default(), &[]).await.unwrap();
        store.close().await;

        let status = cmd_status(&config).await.unwrap();
        assert!(status.db_exists);
        assert!(status.tables.iter().all(|t| t.exists && t.rows == 0));
    }
}
