//! Report command implementation

use crate::error::{Error, Result};
use crate::store::{DirectorCount, GenreRating, MovieStore, TopMovie, YearRating};
use serde::{Deserialize, Serialize};

/// Number of genres listed in a report
pub const TOP_GENRES: i64 = 5;

/// Answers to the analytical questions over the loaded tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub top_rated_movie: Option<TopMovie>,
    pub top_genres: Vec<GenreRating>,
    pub top_director: Option<DirectorCount>,
    pub rating_by_year: Vec<YearRating>,
}

/// Run the analytical queries against a loaded store
pub async fn cmd_report(store: &MovieStore, db_label: &str) -> Result<Report> {
    let counts = store.table_counts().await?;
    if counts.iter().any(|c| !c.exists) {
        return Err(Error::NotLoaded(db_label.to_string()));
    }

    Ok(Report {
        top_rated_movie: store.top_rated_movie().await?,
        top_genres: store.top_genres(TOP_GENRES).await?,
        top_director: store.top_director().await?,
        rating_by_year: store.rating_by_year().await?,
    })
}

/// Print a report to console
pub fn print_report(report: &Report) {
    println!("\nHighest rated movie:");
    match &report.top_rated_movie {
        Some(top) => println!(
            "  {} ({:.2})",
            top.title.as_deref().unwrap_or("<unknown title>"),
            top.avg_rating
        ),
        None => println!("  (no ratings)"),
    }

    println!("\nTop {} genres by average rating:", TOP_GENRES);
    if report.top_genres.is_empty() {
        println!("  (no ratings)");
    }
    for (rank, genre) in report.top_genres.iter().enumerate() {
        println!("  {}. {} ({:.2})", rank + 1, genre.genre, genre.avg_rating);
    }

    println!("\nDirector with the most movies:");
    match &report.top_director {
        Some(d) => println!("  {} ({} movies)", d.director, d.movie_count),
        None => println!("  (no directors found)"),
    }

    println!("\nAverage rating by year:");
    if report.rating_by_year.is_empty() {
        println!("  (no ratings)");
    }
    for row in &report.rating_by_year {
        let year = row
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("  {}: {:.2}", year, row.avg_rating);
    }
}
