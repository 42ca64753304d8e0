//! Batch enrichment of catalog rows
//!
//! Drives a [`MetadataLookup`] over the catalog in input order, one request at a
//! time, with a single title-only fallback and a fixed pause between requests.
//! Every processed row yields exactly one [`EnrichmentRecord`]; rows with an
//! unusable title follow [`UnparseableTitlePolicy`].

use crate::catalog::RawMovie;
use crate::config::EnrichConfig;
use crate::omdb::{display_year, EnrichmentFields, MetadataLookup};
use crate::progress::{advance_progress, finish_progress, start_progress_bar};
use crate::title::parse_title;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Handling of rows whose title is missing or empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnparseableTitlePolicy {
    /// Emit a miss record so the row still joins in the normalizer
    Miss,
    /// Legacy behaviour: emit nothing. The row's enrichment columns stay null.
    Skip,
}

impl std::fmt::Display for UnparseableTitlePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnparseableTitlePolicy::Miss => write!(f, "miss"),
            UnparseableTitlePolicy::Skip => write!(f, "skip"),
        }
    }
}

/// Outcome of enriching one catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub movie_id: i64,
    pub raw_title: Option<String>,
    pub title_searched: Option<String>,
    pub year_searched: Option<i32>,
    /// Provider fields; `None` for a miss
    pub details: Option<EnrichmentFields>,
}

impl EnrichmentRecord {
    fn miss(movie: &RawMovie, title: Option<String>, year: Option<i32>) -> Self {
        Self {
            movie_id: movie.movie_id,
            raw_title: movie.title.clone(),
            title_searched: title,
            year_searched: year,
            details: None,
        }
    }

    /// IMDb id of the matched title; absent exactly when the lookup missed
    pub fn imdb_id(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.imdb_id.as_deref())
    }

    pub fn is_miss(&self) -> bool {
        self.details.is_none()
    }
}

/// Counters for one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichStats {
    pub processed: usize,
    pub found: usize,
    pub missed: usize,
    /// Rows dropped under [`UnparseableTitlePolicy::Skip`]
    pub skipped: usize,
    /// Found only by the title-only retry
    pub fallback_found: usize,
}

/// Records plus counters
#[derive(Debug, Clone, Default)]
pub struct EnrichOutcome {
    pub records: Vec<EnrichmentRecord>,
    pub stats: EnrichStats,
}

/// Sequential, paced enrichment driver
pub struct Enricher<'a, L: MetadataLookup + ?Sized> {
    lookup: &'a L,
    max_movies: usize,
    request_interval: Duration,
    unparseable_titles: UnparseableTitlePolicy,
}

impl<'a, L: MetadataLookup + ?Sized> Enricher<'a, L> {
    pub fn new(lookup: &'a L, config: &EnrichConfig) -> Self {
        Self {
            lookup,
            max_movies: config.max_movies,
            request_interval: config.request_interval(),
            unparseable_titles: config.unparseable_titles,
        }
    }

    async fn pause(&self) {
        if !self.request_interval.is_zero() {
            tokio::time::sleep(self.request_interval).await;
        }
    }

    /// Enrich the first `max_movies` rows, in order
    pub async fn enrich(&self, movies: &[RawMovie]) -> EnrichOutcome {
        let rows = &movies[..movies.len().min(self.max_movies)];
        info!(
            "Enriching {} of {} movies (max_movies={})",
            rows.len(),
            movies.len(),
            self.max_movies
        );

        let mut outcome = EnrichOutcome {
            records: Vec::with_capacity(rows.len()),
            stats: EnrichStats::default(),
        };
        let progress = start_progress_bar(rows.len(), "Looking up movies");

        for movie in rows {
            let record = self.enrich_one(movie, &mut outcome.stats).await;
            if let Some(record) = record {
                outcome.records.push(record);
            }
            advance_progress(&progress);
        }

        finish_progress(progress, "Lookups complete");
        info!(
            "Enrichment finished: {} found ({} via title-only retry), {} missed, {} skipped",
            outcome.stats.found,
            outcome.stats.fallback_found,
            outcome.stats.missed,
            outcome.stats.skipped
        );
        outcome
    }

    async fn enrich_one(
        &self,
        movie: &RawMovie,
        stats: &mut EnrichStats,
    ) -> Option<EnrichmentRecord> {
        let parsed = parse_title(movie.title.as_deref());

        let Some(title) = parsed.searchable_title() else {
            match self.unparseable_titles {
                UnparseableTitlePolicy::Skip => {
                    warn!(
                        "Skipping movieId {} due to invalid title: {:?}",
                        movie.movie_id, movie.title
                    );
                    stats.skipped += 1;
                    return None;
                }
                UnparseableTitlePolicy::Miss => {
                    info!(
                        "[MISS] movieId={} -> invalid title {:?}, not looked up",
                        movie.movie_id, movie.title
                    );
                    stats.processed += 1;
                    stats.missed += 1;
                    return Some(EnrichmentRecord::miss(movie, None, parsed.year));
                }
            }
        };

        stats.processed += 1;
        let year = parsed.year;

        let mut details = self.lookup.lookup(title, year).await;
        // Year 0 was already a title-only request
        if details.is_none() && year.is_some_and(|y| y != 0) {
            self.pause().await;
            details = self.lookup.lookup(title, None).await;
            if details.is_some() {
                stats.fallback_found += 1;
            }
        }

        let record = match details {
            Some(details) => {
                info!(
                    "[OK] movieId={} -> {} ({})",
                    movie.movie_id,
                    details.title.as_deref().unwrap_or(title),
                    details.year.as_deref().unwrap_or("-")
                );
                stats.found += 1;
                EnrichmentRecord {
                    movie_id: movie.movie_id,
                    raw_title: movie.title.clone(),
                    title_searched: Some(title.to_string()),
                    year_searched: year,
                    details: Some(details),
                }
            }
            None => {
                info!(
                    "[MISS] movieId={} -> '{}' ({}) not found in OMDb",
                    movie.movie_id,
                    title,
                    display_year(year)
                );
                stats.missed += 1;
                EnrichmentRecord::miss(movie, Some(title.to_string()), year)
            }
        };

        self.pause().await;
        Some(record)
    }
}
