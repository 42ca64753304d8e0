//! Destination SQLite store
//!
//! This module handles:
//! - Full replacement of the five output tables in a single transaction
//! - Row counts for `marquee status`
//! - The analytical queries behind `marquee report`

mod schema;

pub use schema::*;

use crate::catalog::RatingRow;
use crate::error::Result;
use crate::normalize::NormalizedTables;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::path::Path;
use tracing::{debug, info};

/// Rows written per table by one load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub movies: usize,
    pub genres: usize,
    pub movie_genres: usize,
    pub ratings: usize,
    pub movie_details: usize,
}

/// Presence and size of one output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCount {
    pub table: String,
    pub exists: bool,
    pub rows: i64,
}

/// Movie with the highest average rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMovie {
    pub title: Option<String>,
    pub avg_rating: f64,
}

/// Genre ranked by average rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreRating {
    pub genre: String,
    pub avg_rating: f64,
}

/// Director ranked by number of movies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorCount {
    pub director: String,
    pub movie_count: i64,
}

/// Average rating for one release year (`None` groups unknown years)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRating {
    pub year: Option<i64>,
    pub avg_rating: f64,
}

/// SQLite store handle
#[derive(Clone)]
pub struct MovieStore {
    pool: SqlitePool,
}

impl MovieStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        // Single writer, strictly sequential
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Underlying pool, for ad-hoc queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Replace every output table with the given rows.
    ///
    /// All five tables are dropped, recreated, and refilled in one transaction:
    /// either the whole new generation is visible or the previous one remains.
    pub async fn replace_all(
        &self,
        tables: &NormalizedTables,
        ratings: &[RatingRow],
    ) -> Result<LoadStats> {
        info!("Replacing output tables");
        let mut tx = self.pool.begin().await?;

        sqlx::query(DROP_SQL).execute(&mut *tx).await?;
        sqlx::query(SCHEMA_SQL).execute(&mut *tx).await?;

        let stats = LoadStats {
            movies: insert_movies(&mut tx, tables).await?,
            genres: insert_genres(&mut tx, tables).await?,
            movie_genres: insert_movie_genres(&mut tx, tables).await?,
            ratings: insert_ratings(&mut tx, ratings).await?,
            movie_details: insert_details(&mut tx, tables).await?,
        };

        tx.commit().await?;
        info!(
            "Loaded {} movies, {} genres, {} movie/genre links, {} ratings, {} detail rows",
            stats.movies, stats.genres, stats.movie_genres, stats.ratings, stats.movie_details
        );
        Ok(stats)
    }

    /// Row counts of the output tables (absent tables report `exists: false`)
    pub async fn table_counts(&self) -> Result<Vec<TableCount>> {
        let mut counts = Vec::with_capacity(OUTPUT_TABLES.len());
        for table in OUTPUT_TABLES {
            let exists: Option<(i32,)> =
                sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?")
                    .bind(table)
                    .fetch_optional(&self.pool)
                    .await?;

            let rows = if exists.is_some() {
                sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
                    .fetch_one(&self.pool)
                    .await?
            } else {
                0
            };

            counts.push(TableCount {
                table: table.to_string(),
                exists: exists.is_some(),
                rows,
            });
        }
        Ok(counts)
    }

    /// Movie with the highest average rating
    pub async fn top_rated_movie(&self) -> Result<Option<TopMovie>> {
        let row: Option<(Option<String>, f64)> = sqlx::query_as(
            r#"
            SELECT m.title, AVG(r.rating) AS avg_rating
            FROM movies m
            JOIN ratings r ON m.movieId = r.movieId
            GROUP BY m.movieId
            ORDER BY avg_rating DESC, m.movieId
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(title, avg_rating)| TopMovie { title, avg_rating }))
    }

    /// Genres with the highest average rating
    pub async fn top_genres(&self, limit: i64) -> Result<Vec<GenreRating>> {
        let rows: Vec<(String, f64)> = sqlx::query_as(
            r#"
            SELECT g.name AS genre, AVG(r.rating) AS avg_rating
            FROM genres g
            JOIN movie_genres mg ON g.genreId = mg.genreId
            JOIN ratings r ON mg.movieId = r.movieId
            GROUP BY g.genreId
            ORDER BY avg_rating DESC, g.genreId
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(genre, avg_rating)| GenreRating { genre, avg_rating })
            .collect())
    }

    /// Director credited on the most movies (misses, with no director, are ignored)
    pub async fn top_director(&self) -> Result<Option<DirectorCount>> {
        let row: Option<(String, i64)> = sqlx::query_as(
            r#"
            SELECT md.Director, COUNT(*) AS movie_count
            FROM movie_details md
            WHERE md.Director IS NOT NULL
            GROUP BY md.Director
            ORDER BY movie_count DESC, md.Director
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(director, movie_count)| DirectorCount {
            director,
            movie_count,
        }))
    }

    /// Average rating per release year
    pub async fn rating_by_year(&self) -> Result<Vec<YearRating>> {
        let rows: Vec<(Option<i64>, f64)> = sqlx::query_as(
            r#"
            SELECT m.year, AVG(r.rating) AS avg_rating
            FROM movies m
            JOIN ratings r ON m.movieId = r.movieId
            GROUP BY m.year
            ORDER BY m.year
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(year, avg_rating)| YearRating { year, avg_rating })
            .collect())
    }
}

async fn insert_movies(
    tx: &mut Transaction<'_, Sqlite>,
    tables: &NormalizedTables,
) -> Result<usize> {
    for row in &tables.movies {
        sqlx::query("INSERT INTO movies (movieId, title, year, decade) VALUES (?, ?, ?, ?)")
            .bind(row.movie_id)
            .bind(&row.title)
            .bind(row.year)
            .bind(row.decade)
            .execute(&mut **tx)
            .await?;
    }
    Ok(tables.movies.len())
}

async fn insert_genres(
    tx: &mut Transaction<'_, Sqlite>,
    tables: &NormalizedTables,
) -> Result<usize> {
    for row in &tables.genres {
        sqlx::query("INSERT INTO genres (genreId, name) VALUES (?, ?)")
            .bind(row.genre_id)
            .bind(&row.name)
            .execute(&mut **tx)
            .await?;
    }
    Ok(tables.genres.len())
}

async fn insert_movie_genres(
    tx: &mut Transaction<'_, Sqlite>,
    tables: &NormalizedTables,
) -> Result<usize> {
    for row in &tables.movie_genres {
        sqlx::query("INSERT INTO movie_genres (movieId, genreId) VALUES (?, ?)")
            .bind(row.movie_id)
            .bind(row.genre_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(tables.movie_genres.len())
}

async fn insert_ratings(
    tx: &mut Transaction<'_, Sqlite>,
    ratings: &[RatingRow],
) -> Result<usize> {
    for row in ratings {
        sqlx::query(
            "INSERT INTO ratings (userId, movieId, rating, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(row.user_id)
        .bind(row.movie_id)
        .bind(row.rating)
        .bind(row.timestamp)
        .execute(&mut **tx)
        .await?;
    }
    Ok(ratings.len())
}

async fn insert_details(
    tx: &mut Transaction<'_, Sqlite>,
    tables: &NormalizedTables,
) -> Result<usize> {
    for row in &tables.details {
        sqlx::query(
            r#"
            INSERT INTO movie_details (
                movieId, imdbID, Director, Actors, Plot, BoxOffice, Runtime,
                Language, Country, Awards, Metascore, imdbRating, Type
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.movie_id)
        .bind(&row.imdb_id)
        .bind(&row.director)
        .bind(&row.actors)
        .bind(&row.plot)
        .bind(&row.box_office)
        .bind(&row.runtime)
        .bind(&row.language)
        .bind(&row.country)
        .bind(&row.awards)
        .bind(&row.metascore)
        .bind(&row.imdb_rating)
        .bind(&row.kind)
        .execute(&mut **tx)
        .await?;
    }
    Ok(tables.details.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{GenreRow, MovieDetailsRow, MovieGenreRow, MovieRow};
    use tempfile::TempDir;

    fn rows_per_table(counts: Vec<TableCount>) -> Vec<(String, i64)> {
        counts.into_iter().map(|c| (c.table, c.rows)).collect()
    }

    async fn setup_test_store() -> (MovieStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = MovieStore::connect(&tmp.path().join("test.db"))
            .await
            .unwrap();
        (store, tmp)
    }

    fn sample_tables() -> NormalizedTables {
        NormalizedTables {
            movies: vec![
                MovieRow {
                    movie_id: 1,
                    title: Some("Toy Story".to_string()),
                    year: Some(1995),
                    decade: 1990,
                },
                MovieRow {
                    movie_id: 2,
                    title: Some("Jumanji".to_string()),
                    year: Some(1995),
                    decade: 1990,
                },
            ],
            genres: vec![
                GenreRow {
                    genre_id: 1,
                    name: "Animation".to_string(),
                },
                GenreRow {
                    genre_id: 2,
                    name: "Adventure".to_string(),
                },
            ],
            movie_genres: vec![
                MovieGenreRow {
                    movie_id: 1,
                    genre_id: 1,
                },
                MovieGenreRow {
                    movie_id: 1,
                    genre_id: 2,
                },
                MovieGenreRow {
                    movie_id: 2,
                    genre_id: 2,
                },
            ],
            details: vec![
                MovieDetailsRow {
                    movie_id: 1,
                    imdb_id: Some("tt0114709".to_string()),
                    director: Some("John Lasseter".to_string()),
                    ..MovieDetailsRow::default()
                },
                MovieDetailsRow {
                    movie_id: 2,
                    ..MovieDetailsRow::default()
                },
            ],
        }
    }

    fn rating(user_id: i64, movie_id: i64, rating: f64, timestamp: i64) -> RatingRow {
        RatingRow {
            user_id,
            movie_id,
            rating,
            timestamp,
        }
    }

    fn sample_ratings() -> Vec<RatingRow> {
        vec![
            rating(1, 1, 5.0, 964982703),
            rating(2, 1, 4.0, 964982224),
            rating(1, 2, 3.0, 0),
        ]
    }

    #[tokio::test]
    async fn test_replace_all_writes_every_table() {
        let (store, _tmp) = setup_test_store().await;

        let stats = store
            .replace_all(&sample_tables(), &sample_ratings())
            .await
            .unwrap();
        assert_eq!(
            stats,
            LoadStats {
                movies: 2,
                genres: 2,
                movie_genres: 3,
                ratings: 3,
                movie_details: 2,
            }
        );

        let director: Option<String> =
            sqlx::query_scalar("SELECT Director FROM movie_details WHERE movieId = 1")
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(director.as_deref(), Some("John Lasseter"));
    }

    #[tokio::test]
    async fn test_replace_all_discards_previous_generation() {
        let (store, _tmp) = setup_test_store().await;
        store
            .replace_all(&sample_tables(), &sample_ratings())
            .await
            .unwrap();

        let mut smaller = sample_tables();
        smaller.movies.truncate(1);
        store.replace_all(&smaller, &[]).await.unwrap();

        let counts = store.table_counts().await.unwrap();
        assert_eq!(
            rows_per_table(counts),
            vec![
                ("movies".to_string(), 1),
                ("genres".to_string(), 2),
                ("movie_genres".to_string(), 3),
                ("ratings".to_string(), 0),
                ("movie_details".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_generation() {
        let (store, _tmp) = setup_test_store().await;
        store
            .replace_all(&sample_tables(), &sample_ratings())
            .await
            .unwrap();
        let before = rows_per_table(store.table_counts().await.unwrap());

        // NaN binds as NULL and violates `rating REAL NOT NULL` after the
        // drop and the first inserts have already run
        let mut smaller = sample_tables();
        smaller.movies.truncate(1);
        let result = store
            .replace_all(&smaller, &[rating(9, 1, f64::NAN, 0)])
            .await;
        assert!(matches!(result, Err(crate::error::Error::Database(_))));

        let after = rows_per_table(store.table_counts().await.unwrap());
        assert_eq!(after, before);
        assert_eq!(
            after,
            vec![
                ("movies".to_string(), 2),
                ("genres".to_string(), 2),
                ("movie_genres".to_string(), 3),
                ("ratings".to_string(), 3),
                ("movie_details".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_table_counts_on_empty_database() {
        let (store, _tmp) = setup_test_store().await;
        let counts = store.table_counts().await.unwrap();
        assert_eq!(counts.len(), 5);
        assert!(counts.iter().all(|c| !c.exists && c.rows == 0));
    }

    #[tokio::test]
    async fn test_analytical_queries() {
        let (store, _tmp) = setup_test_store().await;
        store
            .replace_all(&sample_tables(), &sample_ratings())
            .await
            .unwrap();

        let top = store.top_rated_movie().await.unwrap().unwrap();
        assert_eq!(top.title.as_deref(), Some("Toy Story"));
        assert!((top.avg_rating - 4.5).abs() < 1e-9);

        let genres = store.top_genres(5).await.unwrap();
        assert_eq!(genres[0].genre, "Animation");
        assert!((genres[1].avg_rating - 4.0).abs() < 1e-9);

        let director = store.top_director().await.unwrap().unwrap();
        assert_eq!(director.director, "John Lasseter");
        assert_eq!(director.movie_count, 1);

        let by_year = store.rating_by_year().await.unwrap();
        assert_eq!(by_year.len(), 1);
        assert_eq!(by_year[0].year, Some(1995));
        assert!((by_year[0].avg_rating - 4.0).abs() < 1e-9);
    }
}
