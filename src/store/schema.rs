//! SQLite schema for the output tables

/// Output tables, in load order
pub const OUTPUT_TABLES: [&str; 5] = [
    "movies",
    "genres",
    "movie_genres",
    "ratings",
    "movie_details",
];

/// Drop every output table. Each run replaces the whole set.
pub const DROP_SQL: &str = r#"
DROP TABLE IF EXISTS movies;
DROP TABLE IF EXISTS genres;
DROP TABLE IF EXISTS movie_genres;
DROP TABLE IF EXISTS ratings;
DROP TABLE IF EXISTS movie_details;
"#;

/// SQL schema for the output tables
pub const SCHEMA_SQL: &str = r#"
-- Movies: one row per catalog movie, title/year resolved from OMDb when found
CREATE TABLE movies (
    movieId INTEGER NOT NULL,
    title TEXT,
    year INTEGER,
    decade INTEGER NOT NULL
);

-- Genres: dimension built from the catalog's genre tokens
CREATE TABLE genres (
    genreId INTEGER NOT NULL,
    name TEXT NOT NULL
);

-- Movie/genre association
CREATE TABLE movie_genres (
    movieId INTEGER NOT NULL,
    genreId INTEGER NOT NULL
);

-- Ratings: passed through from ratings.csv
CREATE TABLE ratings (
    userId INTEGER NOT NULL,
    movieId INTEGER NOT NULL,
    rating REAL NOT NULL,
    timestamp INTEGER NOT NULL
);

-- Movie details: OMDb fields, all null for a lookup miss
CREATE TABLE movie_details (
    movieId INTEGER NOT NULL,
    imdbID TEXT,
    Director TEXT,
    Actors TEXT,
    Plot TEXT,
    BoxOffice TEXT,
    Runtime TEXT,
    Language TEXT,
    Country TEXT,
    Awards TEXT,
    Metascore TEXT,
    imdbRating TEXT,
    Type TEXT
);

-- Indexes for the analytical joins
CREATE INDEX idx_movies_id ON movies(movieId);
CREATE INDEX idx_movie_genres_movie ON movie_genres(movieId);
CREATE INDEX idx_movie_genres_genre ON movie_genres(genreId);
CREATE INDEX idx_ratings_movie ON ratings(movieId);
CREATE INDEX idx_details_movie ON movie_details(movieId);
"#;
