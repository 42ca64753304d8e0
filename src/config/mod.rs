//! Configuration management for marquee
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! Every component receives the pieces of [`Config`] it needs at construction;
//! nothing reads process-wide state except [`Config::api_key`].

mod defaults;

pub use defaults::*;

use crate::enrich::UnparseableTitlePolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input CSV files
    #[serde(default)]
    pub input: InputConfig,

    /// Destination database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// OMDb lookup configuration
    #[serde(default)]
    pub omdb: OmdbConfig,

    /// Batch enrichment configuration
    #[serde(default)]
    pub enrich: EnrichConfig,

    /// Resolved paths (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Input file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// MovieLens movies file (movieId, title, genres)
    #[serde(default = "default_movies_csv")]
    pub movies_csv: String,

    /// MovieLens ratings file (userId, movieId, rating, timestamp)
    #[serde(default = "default_ratings_csv")]
    pub ratings_csv: String,
}

/// Destination database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// OMDb client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmdbConfig {
    /// Base endpoint for title lookups
    #[serde(default = "default_omdb_base_url")]
    pub base_url: String,

    /// Environment variable name for the OMDb API key
    #[serde(default = "default_omdb_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_omdb_timeout")]
    pub timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_omdb_user_agent")]
    pub user_agent: String,
}

/// Batch enrichment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Only the first `max_movies` catalog rows are enriched and loaded
    #[serde(default = "default_enrich_max_movies")]
    pub max_movies: usize,

    /// Fixed pause between OMDb requests (milliseconds)
    #[serde(default = "default_enrich_request_interval")]
    pub request_interval_ms: u64,

    /// What to do with rows whose title cannot be parsed
    #[serde(default = "default_unparseable_titles")]
    pub unparseable_titles: UnparseableTitlePolicy,
}

/// Resolved paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Directory relative paths are resolved against
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to movies.csv
    pub movies_csv: PathBuf,

    /// Path to ratings.csv
    pub ratings_csv: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            input: InputConfig::default(),
            database: DatabaseConfig::default(),
            omdb: OmdbConfig::default(),
            enrich: EnrichConfig::default(),
            paths: PathsConfig::default(),
        };
        config.init_paths(PathBuf::from("."));
        config
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            movies_csv: default_movies_csv(),
            ratings_csv: default_ratings_csv(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            base_url: default_omdb_base_url(),
            api_key_env: default_omdb_api_key_env(),
            timeout_secs: default_omdb_timeout(),
            user_agent: default_omdb_user_agent(),
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            max_movies: default_enrich_max_movies(),
            request_interval_ms: default_enrich_request_interval(),
            unparseable_titles: default_unparseable_titles(),
        }
    }
}

impl EnrichConfig {
    /// Pause applied between requests
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }
}

impl Config {
    /// Get the default config file path (in the working directory)
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Initialize paths relative to `base_dir`
    fn init_paths(&mut self, base_dir: PathBuf) {
        self.paths.config_file = base_dir.join(DEFAULT_CONFIG_FILE);
        self.paths.base_dir = base_dir;
        self.resolve_paths();
    }

    /// Re-resolve file paths after `input` or `database` changed
    pub fn resolve_paths(&mut self) {
        let base = self.paths.base_dir.clone();
        let resolve = |p: &str| {
            let path = Path::new(p);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        };
        self.paths.movies_csv = resolve(&self.input.movies_csv);
        self.paths.ratings_csv = resolve(&self.input.ratings_csv);
        self.paths.db_file = resolve(&self.database.path);
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Relative paths follow the config file
        let base = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        config.init_paths(base);
        config.paths.config_file = config_path.to_path_buf();

        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, or the default one if present, or defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    debug!("No config file found, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }

    /// Save configuration to `paths.config_file`
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Read the OMDb API key from the configured environment variable.
    ///
    /// A missing or empty key is fatal: there is no degraded mode without it.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.omdb.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::MissingApiKey(self.omdb.api_key_env.clone())),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.enrich.max_movies == 0 {
            return Err(Error::Config(
                "enrich.max_movies must be at least 1".to_string(),
            ));
        }

        if self.omdb.timeout_secs == 0 {
            return Err(Error::Config(
                "omdb.timeout_secs must be positive".to_string(),
            ));
        }

        if self.omdb.api_key_env.trim().is_empty() {
            return Err(Error::Config(
                "omdb.api_key_env must name an environment variable".to_string(),
            ));
        }

        Url::parse(&self.omdb.base_url)
            .map_err(|e| Error::Config(format!("omdb.base_url is invalid: {}", e)))?;

        Ok(())
    }
}
