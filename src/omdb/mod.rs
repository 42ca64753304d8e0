//! OMDb metadata lookups
//!
//! This module provides:
//! - A trait for title/year metadata providers
//! - The OMDb HTTP client
//! - Mapping of the provider's response into [`EnrichmentFields`]
//!
//! Every failure mode (transport error, non-2xx status, undecodable body,
//! `"Response": "False"`) collapses into "not found". The client never retries;
//! the batch enricher owns the fallback policy.

use crate::config::OmdbConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Metadata fields recognized from a successful lookup.
///
/// All values are provider strings, including numeric-looking ones. The
/// provider's `"N/A"` for unknown values is kept as sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrichmentFields {
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub genre: Option<String>,
    pub runtime: Option<String>,
    pub plot: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub awards: Option<String>,
    pub box_office: Option<String>,
    pub metascore: Option<String>,
    pub imdb_rating: Option<String>,
    pub kind: Option<String>,
}

/// Trait for title metadata providers
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Look up one title, optionally narrowed by release year.
    ///
    /// Returns `None` when nothing was found or the provider could not be reached.
    async fn lookup(&self, title: &str, year: Option<i32>) -> Option<EnrichmentFields>;
}

/// Raw OMDb response body
#[derive(Debug, Clone, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: Option<String>,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "Actors", default)]
    actors: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Runtime", default)]
    runtime: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Language", default)]
    language: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "Awards", default)]
    awards: Option<String>,
    #[serde(rename = "BoxOffice", default)]
    box_office: Option<String>,
    #[serde(rename = "Metascore", default)]
    metascore: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
    #[serde(rename = "Type", default)]
    kind: Option<String>,
}

impl OmdbResponse {
    fn is_found(&self) -> bool {
        self.response.as_deref() == Some("True")
    }

    fn into_fields(self) -> EnrichmentFields {
        EnrichmentFields {
            imdb_id: self.imdb_id,
            title: self.title,
            year: self.year,
            director: self.director,
            actors: self.actors,
            genre: self.genre,
            runtime: self.runtime,
            plot: self.plot,
            language: self.language,
            country: self.country,
            awards: self.awards,
            box_office: self.box_office,
            metascore: self.metascore,
            imdb_rating: self.imdb_rating,
            kind: self.kind,
        }
    }
}

/// Render an optional year for log lines
pub fn display_year(year: Option<i32>) -> String {
    match year {
        Some(y) => y.to_string(),
        None => "-".to_string(),
    }
}

/// OMDb HTTP client
pub struct OmdbClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl OmdbClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &OmdbConfig, api_key: String) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl MetadataLookup for OmdbClient {
    async fn lookup(&self, title: &str, year: Option<i32>) -> Option<EnrichmentFields> {
        // A zero year is no year
        let year = year.filter(|y| *y != 0);
        let year_param = year.map(|y| y.to_string());
        let mut params = vec![("apikey", self.api_key.as_str()), ("t", title)];
        if let Some(y) = year_param.as_deref() {
            params.push(("y", y));
        }

        debug!("OMDb lookup: '{}' ({})", title, display_year(year));

        // without_url() keeps the API key out of the logs
        let response = match self
            .client
            .get(self.base_url.clone())
            .query(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "Request error for '{}' ({}): {}",
                    title,
                    display_year(year),
                    e.without_url()
                );
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP {} for '{}' ({})", status, title, display_year(year));
            return None;
        }

        let body: OmdbResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    "Undecodable OMDb response for '{}' ({}): {}",
                    title,
                    display_year(year),
                    e.without_url()
                );
                return None;
            }
        };

        if !body.is_found() {
            debug!(
                "OMDb has no match for '{}' ({}): {}",
                title,
                display_year(year),
                body.error.as_deref().unwrap_or("no error message")
            );
            return None;
        }

        Some(body.into_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: &str) -> OmdbClient {
        let config = OmdbConfig {
            base_url: base_url.to_string(),
            timeout_secs: 2,
            ..OmdbConfig::default()
        };
        OmdbClient::new(&config, "test-key".to_string()).expect("client should build")
    }

    fn toy_story() -> serde_json::Value {
        json!({
            "Title": "Toy Story",
            "Year": "1995",
            "Rated": "G",
            "Runtime": "81 min",
            "Genre": "Animation, Adventure, Comedy",
            "Director": "John Lasseter",
            "Actors": "Tom Hanks, Tim Allen, Don Rickles",
            "Plot": "A cowboy doll is profoundly threatened and jealous when a new spaceman action figure supplants him as top toy in a boy's bedroom.",
            "Language": "English",
            "Country": "United States",
            "Awards": "Nominated for 3 Oscars. 29 wins & 24 nominations total",
            "Metascore": "96",
            "imdbRating": "8.3",
            "imdbID": "tt0114709",
            "Type": "movie",
            "BoxOffice": "N/A",
            "Response": "True"
        })
    }

    #[tokio::test]
    async fn test_found_response_maps_fields() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("apikey", "test-key"))
            .and(query_param("t", "Toy Story"))
            .and(query_param("y", "1995"))
            .respond_with(ResponseTemplate::new(200).set_body_json(toy_story()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&format!("{}/", mock_server.uri()));
        let fields = client
            .lookup("Toy Story", Some(1995))
            .await
            .expect("lookup should find the movie");

        assert_eq!(fields.imdb_id.as_deref(), Some("tt0114709"));
        assert_eq!(fields.director.as_deref(), Some("John Lasseter"));
        assert_eq!(fields.year.as_deref(), Some("1995"));
        assert_eq!(fields.kind.as_deref(), Some("movie"));
        // Unknown values stay as the provider sent them
        assert_eq!(fields.box_office.as_deref(), Some("N/A"));
    }

    #[tokio::test]
    async fn test_year_parameter_omitted_when_absent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("t", "Heat"))
            .and(query_param_is_missing("y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Title": "Heat",
                "Year": "1995",
                "imdbID": "tt0113277",
                "Response": "True"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&format!("{}/", mock_server.uri()));
        let fields = client.lookup("Heat", None).await.unwrap();
        assert_eq!(fields.imdb_id.as_deref(), Some("tt0113277"));
        assert_eq!(fields.director, None);
    }

    #[tokio::test]
    async fn test_zero_year_is_not_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("t", "Unknown Pleasures"))
            .and(query_param_is_missing("y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Title": "Unknown Pleasures",
                "imdbID": "tt0000001",
                "Response": "True"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&format!("{}/", mock_server.uri()));
        let fields = client.lookup("Unknown Pleasures", Some(0)).await.unwrap();
        assert_eq!(fields.imdb_id.as_deref(), Some("tt0000001"));
    }

    #[tokio::test]
    async fn test_not_found_body_is_miss() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Response": "False",
                "Error": "Movie not found!"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&format!("{}/", mock_server.uri()));
        assert!(client.lookup("Nonexistent", Some(2001)).await.is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_miss() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "Response": "False",
                "Error": "Invalid API key!"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&format!("{}/", mock_server.uri()));
        assert!(client.lookup("Toy Story", Some(1995)).await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_miss() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&format!("{}/", mock_server.uri()));
        assert!(client.lookup("Toy Story", None).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_miss() {
        // Nothing listens on port 9 (discard) in test environments
        let client = client_for("http://127.0.0.1:9/");
        assert!(client.lookup("Toy Story", Some(1995)).await.is_none());
    }

    #[test]
    fn test_display_year() {
        assert_eq!(display_year(Some(1995)), "1995");
        assert_eq!(display_year(None), "-");
    }
}
