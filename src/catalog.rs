//! MovieLens CSV input
//!
//! Reads `movies.csv` and `ratings.csv`. Columns are located by header name.
//! Missing or empty fields become `None`; rows whose key columns cannot be
//! parsed are skipped with a warning instead of failing the run.

use crate::error::{Error, Result};
use csv::{ByteRecord, ReaderBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// A catalog row as read from `movies.csv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMovie {
    pub movie_id: i64,
    pub title: Option<String>,
    pub genres: Option<String>,
}

/// A rating row, with null rating and timestamp defaulted to zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRow {
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: f64,
    pub timestamp: i64,
}

/// Rows read from one CSV file
#[derive(Debug, Clone)]
pub struct CsvLoad<T> {
    pub rows: Vec<T>,
    /// Rows dropped because a key column was missing or malformed
    pub skipped: usize,
}

struct CsvTable {
    reader: csv::Reader<std::fs::File>,
    columns: Vec<Option<usize>>,
}

impl CsvTable {
    fn open(path: &Path, wanted: &[&str], required: &[&str]) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Input(format!("{} does not exist", path.display())));
        }

        let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();

        for name in required {
            if !headers.iter().any(|h| h == name) {
                return Err(Error::Input(format!(
                    "{} is missing required column '{}'",
                    path.display(),
                    name
                )));
            }
        }

        let columns = wanted
            .iter()
            .map(|name| headers.iter().position(|h| h == name))
            .collect();

        Ok(Self { reader, columns })
    }

    fn field(&self, record: &ByteRecord, column: usize) -> Option<String> {
        self.columns[column]
            .and_then(|idx| record.get(idx))
            .filter(|raw| !raw.is_empty())
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
    }

    fn int(&self, record: &ByteRecord, column: usize) -> Option<i64> {
        parse_int(self.field(record, column).as_deref())
    }

    fn float(&self, record: &ByteRecord, column: usize) -> Option<f64> {
        parse_float(self.field(record, column).as_deref())
    }
}

fn parse_int(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

fn parse_float(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Read up to `limit` valid rows from `movies.csv`
pub fn read_movies(path: &Path, limit: Option<usize>) -> Result<CsvLoad<RawMovie>> {
    debug!("Reading movies from {:?}", path);
    let mut table = CsvTable::open(path, &["movieId", "title", "genres"], &["movieId"])?;

    let mut rows = Vec::new();
    let mut skipped = 0;
    let mut record = ByteRecord::new();
    let mut line = 1usize;

    while table.reader.read_byte_record(&mut record)? {
        line += 1;
        if limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }

        let Some(movie_id) = table.int(&record, 0) else {
            warn!("{}:{}: skipping row with invalid movieId", path.display(), line);
            skipped += 1;
            continue;
        };

        rows.push(RawMovie {
            movie_id,
            title: table.field(&record, 1),
            genres: table.field(&record, 2),
        });
    }

    info!("Read {} movies from {}", rows.len(), path.display());
    Ok(CsvLoad { rows, skipped })
}

/// Read every row from `ratings.csv`
pub fn read_ratings(path: &Path) -> Result<CsvLoad<RatingRow>> {
    debug!("Reading ratings from {:?}", path);
    let mut table = CsvTable::open(
        path,
        &["userId", "movieId", "rating", "timestamp"],
        &["userId", "movieId"],
    )?;

    let mut rows = Vec::new();
    let mut skipped = 0;
    let mut record = ByteRecord::new();
    let mut line = 1usize;

    while table.reader.read_byte_record(&mut record)? {
        line += 1;
        let user_id = table.int(&record, 0);
        let movie_id = table.int(&record, 1);
        let (Some(user_id), Some(movie_id)) = (user_id, movie_id) else {
            warn!(
                "{}:{}: skipping rating with invalid userId/movieId",
                path.display(),
                line
            );
            skipped += 1;
            continue;
        };

        rows.push(RatingRow {
            user_id,
            movie_id,
            rating: table.float(&record, 2).unwrap_or(0.0),
            timestamp: table.int(&record, 3).unwrap_or(0),
        });
    }

    info!("Read {} ratings from {}", rows.len(), path.display());
    Ok(CsvLoad { rows, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(tmp: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = tmp.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_movies_with_quoted_titles() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "movies.csv",
            "movieId,title,genres\n\
             1,Toy Story (1995),Adventure|Animation|Children\n\
             11,\"American President, The (1995)\",Comedy|Drama|Romance\n",
        );

        let load = read_movies(&path, None).unwrap();
        assert_eq!(load.skipped, 0);
        assert_eq!(load.rows.len(), 2);
        assert_eq!(load.rows[1].movie_id, 11);
        assert_eq!(
            load.rows[1].title.as_deref(),
            Some("American President, The (1995)")
        );
    }

    #[test]
    fn test_read_movies_nulls_and_malformed_keys() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "movies.csv",
            "movieId,title,genres\n\
             1,,Comedy\n\
             abc,Broken (2001),Drama\n\
             3,Short Row (1990)\n",
        );

        let load = read_movies(&path, None).unwrap();
        assert_eq!(load.skipped, 1);
        assert_eq!(load.rows.len(), 2);
        assert_eq!(load.rows[0].title, None);
        assert_eq!(load.rows[1].movie_id, 3);
        assert_eq!(load.rows[1].genres, None);
    }

    #[test]
    fn test_read_movies_respects_limit() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "movies.csv",
            "movieId,title,genres\n1,A (2000),Drama\n2,B (2001),Drama\n3,C (2002),Drama\n",
        );

        let load = read_movies(&path, Some(2)).unwrap();
        let ids: Vec<i64> = load.rows.iter().map(|m| m.movie_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_read_ratings_defaults_nulls() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "ratings.csv",
            "userId,movieId,rating,timestamp\n\
             1,1,4.0,964982703\n\
             1,3,,\n\
             2,x,3.5,964982224\n",
        );

        let load = read_ratings(&path).unwrap();
        assert_eq!(load.skipped, 1);
        assert_eq!(
            load.rows[1],
            RatingRow {
                user_id: 1,
                movie_id: 3,
                rating: 0.0,
                timestamp: 0,
            }
        );
        assert_eq!(load.rows[0].timestamp, 964982703);
    }

    #[test]
    fn test_missing_required_column() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "ratings.csv", "user,movieId,rating\n1,1,4.0\n");
        assert!(matches!(read_ratings(&path), Err(Error::Input(_))));
    }

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = read_movies(&tmp.path().join("movies.csv"), None);
        assert!(matches!(result, Err(Error::Input(_))));
    }

    #[test]
    fn test_parse_int_accepts_float_text() {
        assert_eq!(parse_int(Some("964982703.0")), Some(964982703));
        assert_eq!(parse_int(Some(" 42 ")), Some(42));
        assert_eq!(parse_int(Some("nan")), None);
        assert_eq!(parse_int(None), None);
    }
}
