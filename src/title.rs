//! MovieLens title parsing
//!
//! MovieLens stores titles denormalized as `"Toy Story (1995)"`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static TITLE_YEAR: OnceLock<Regex> = OnceLock::new();

fn title_year_pattern() -> &'static Regex {
    TITLE_YEAR.get_or_init(|| {
        Regex::new(r"^(.*)\s+\(([0-9]{4})\)\s*$").expect("title/year pattern is valid")
    })
}

/// A title split into its name and optional release year
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTitle {
    pub title: Option<String>,
    pub year: Option<i32>,
}

impl ParsedTitle {
    /// Title usable as a lookup key (present and non-empty)
    pub fn searchable_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

/// Split `"Name (YYYY)"` into `("Name", Some(YYYY))`.
///
/// A missing title yields neither part. A title without a trailing year keeps
/// the whole trimmed string as the name.
pub fn parse_title(raw: Option<&str>) -> ParsedTitle {
    let Some(raw) = raw else {
        return ParsedTitle::default();
    };

    let trimmed = raw.trim();
    if let Some(caps) = title_year_pattern().captures(trimmed) {
        let year = caps[2].parse::<i32>().ok();
        if year.is_some() {
            return ParsedTitle {
                title: Some(caps[1].trim().to_string()),
                year,
            };
        }
    }

    ParsedTitle {
        title: Some(trimmed.to_string()),
        year: None,
    }
}
