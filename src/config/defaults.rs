//! Default values for configuration

use crate::enrich::UnparseableTitlePolicy;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "marquee.toml";

/// Default MovieLens movies file
pub fn default_movies_csv() -> String {
    "movies.csv".to_string()
}

/// Default MovieLens ratings file
pub fn default_ratings_csv() -> String {
    "ratings.csv".to_string()
}

/// Default SQLite database file
pub fn default_db_path() -> String {
    "movies.db".to_string()
}

/// Default OMDb endpoint
pub fn default_omdb_base_url() -> String {
    std::env::var("MARQUEE_OMDB_URL").unwrap_or_else(|_| "http://www.omdbapi.com/".to_string())
}

/// Default environment variable holding the OMDb API key
pub fn default_omdb_api_key_env() -> String {
    "OMDB_API_KEY".to_string()
}

/// Default request timeout in seconds
pub fn default_omdb_timeout() -> u64 {
    10
}

/// Default user agent
pub fn default_omdb_user_agent() -> String {
    format!("marquee/{} (MovieLens enrichment)", env!("CARGO_PKG_VERSION"))
}

/// Default number of catalog rows to enrich (free OMDb keys are quota-limited)
pub fn default_enrich_max_movies() -> usize {
    100
}

/// Default pause between OMDb requests (milliseconds)
pub fn default_enrich_request_interval() -> u64 {
    250
}

/// Default: emit a miss record for titles that cannot be parsed
pub fn default_unparseable_titles() -> UnparseableTitlePolicy {
    UnparseableTitlePolicy::Miss
}
