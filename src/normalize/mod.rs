//! Normalization of enriched catalog rows into output tables
//!
//! Joins enrichment records back onto the catalog, explodes the pipe-delimited
//! genre field into a genre dimension, derives decade buckets, and projects the
//! row sets the loader writes.

use crate::catalog::RawMovie;
use crate::enrich::EnrichmentRecord;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::{debug, warn};

/// `movies` table row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovieRow {
    pub movie_id: i64,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub decade: i32,
}

/// `genres` table row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenreRow {
    pub genre_id: i64,
    pub name: String,
}

/// `movie_genres` table row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovieGenreRow {
    pub movie_id: i64,
    pub genre_id: i64,
}

/// `movie_details` table row
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovieDetailsRow {
    pub movie_id: i64,
    pub imdb_id: Option<String>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub plot: Option<String>,
    pub box_office: Option<String>,
    pub runtime: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub awards: Option<String>,
    pub metascore: Option<String>,
    pub imdb_rating: Option<String>,
    pub kind: Option<String>,
}

/// Every derived table of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTables {
    pub movies: Vec<MovieRow>,
    pub genres: Vec<GenreRow>,
    pub movie_genres: Vec<MovieGenreRow>,
    pub details: Vec<MovieDetailsRow>,
}

/// Split a pipe-delimited genre field, dropping empty tokens
pub fn split_genres(genres: Option<&str>) -> Vec<&str> {
    genres
        .map(|g| g.split('|').filter(|token| !token.is_empty()).collect())
        .unwrap_or_default()
}

/// Coerce a provider year string to a number (`"1995"` → 1995, `"2005–2010"` → None)
pub fn numeric_year(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

/// Decade bucket: `floor(year / 10) * 10`, or 0 when the year is unknown
pub fn decade(year: Option<i32>) -> i32 {
    year.map(|y| y.div_euclid(10) * 10).unwrap_or(0)
}

/// Keep the first occurrence of each row, preserving order
fn dedupe_rows<T: Hash + Eq + Clone>(rows: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

/// Genre names in order of first appearance, numbered from 1
struct GenreDimension {
    rows: Vec<GenreRow>,
    ids: HashMap<String, i64>,
}

impl GenreDimension {
    fn build<'a>(token_lists: impl Iterator<Item = &'a [&'a str]>) -> Self {
        let mut dimension = Self {
            rows: Vec::new(),
            ids: HashMap::new(),
        };
        for tokens in token_lists {
            for token in tokens {
                if !dimension.ids.contains_key(*token) {
                    let genre_id = dimension.rows.len() as i64 + 1;
                    dimension.ids.insert(token.to_string(), genre_id);
                    dimension.rows.push(GenreRow {
                        genre_id,
                        name: token.to_string(),
                    });
                }
            }
        }
        dimension
    }

    fn id_of(&self, name: &str) -> Result<i64> {
        self.ids.get(name).copied().ok_or_else(|| {
            Error::Inconsistency(format!("genre '{}' missing from the genre dimension", name))
        })
    }
}

fn movie_row(movie: &RawMovie, record: Option<&EnrichmentRecord>) -> MovieRow {
    let (title, year) = match record {
        Some(record) => match &record.details {
            Some(details) => (
                details.title.clone(),
                details.year.as_deref().and_then(numeric_year),
            ),
            None => (record.title_searched.clone(), record.year_searched),
        },
        None => (None, None),
    };

    MovieRow {
        movie_id: movie.movie_id,
        title,
        year,
        decade: decade(year),
    }
}

fn details_row(movie: &RawMovie, record: Option<&EnrichmentRecord>) -> MovieDetailsRow {
    let Some(details) = record.and_then(|r| r.details.as_ref()) else {
        return MovieDetailsRow {
            movie_id: movie.movie_id,
            ..MovieDetailsRow::default()
        };
    };

    MovieDetailsRow {
        movie_id: movie.movie_id,
        imdb_id: details.imdb_id.clone(),
        director: details.director.clone(),
        actors: details.actors.clone(),
        plot: details.plot.clone(),
        box_office: details.box_office.clone(),
        runtime: details.runtime.clone(),
        language: details.language.clone(),
        country: details.country.clone(),
        awards: details.awards.clone(),
        metascore: details.metascore.clone(),
        imdb_rating: details.imdb_rating.clone(),
        kind: details.kind.clone(),
    }
}

/// Build the output tables from the catalog and its enrichment records.
///
/// Catalog rows without a record (dropped by the legacy skip policy) keep null
/// enrichment columns; they are reported with a warning.
pub fn normalize(movies: &[RawMovie], records: &[EnrichmentRecord]) -> Result<NormalizedTables> {
    let mut by_movie: HashMap<i64, Vec<&EnrichmentRecord>> = HashMap::new();
    for record in records {
        by_movie.entry(record.movie_id).or_default().push(record);
    }

    // Left join: one joined row per matching record, or one with no record
    let mut joined: Vec<(&RawMovie, Option<&EnrichmentRecord>)> = Vec::with_capacity(movies.len());
    let mut unmatched = 0usize;
    for movie in movies {
        match by_movie.get(&movie.movie_id) {
            Some(matches) => joined.extend(matches.iter().map(|r| (movie, Some(*r)))),
            None => {
                unmatched += 1;
                joined.push((movie, None));
            }
        }
    }
    if unmatched > 0 {
        warn!(
            "{} catalog rows have no enrichment record; their details stay null",
            unmatched
        );
    }

    let token_lists: Vec<Vec<&str>> = joined
        .iter()
        .map(|(movie, _)| split_genres(movie.genres.as_deref()))
        .collect();
    let dimension = GenreDimension::build(token_lists.iter().map(Vec::as_slice));

    let mut movie_genres = Vec::new();
    for ((movie, _), tokens) in joined.iter().zip(&token_lists) {
        for token in tokens {
            movie_genres.push(MovieGenreRow {
                movie_id: movie.movie_id,
                genre_id: dimension.id_of(token)?,
            });
        }
    }

    let movie_rows = joined
        .iter()
        .map(|(movie, record)| movie_row(movie, *record))
        .collect();
    let detail_rows = joined
        .iter()
        .map(|(movie, record)| details_row(movie, *record))
        .collect();

    let tables = NormalizedTables {
        movies: dedupe_rows(movie_rows),
        genres: dimension.rows,
        movie_genres: dedupe_rows(movie_genres),
        details: dedupe_rows(detail_rows),
    };

    debug!(
        "Normalized {} movies, {} genres, {} movie/genre links, {} detail rows ({} lookup misses)",
        tables.movies.len(),
        tables.genres.len(),
        tables.movie_genres.len(),
        tables.details.len(),
        records.iter().filter(|r| r.is_miss()).count()
    );
    Ok(tables)
}
