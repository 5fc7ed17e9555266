use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::extract::RawRow;
use crate::normalize::{normalize_str, Cell};

/// One row of `academy_award_winning_films`. Field order is the export
/// column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmRecord {
    pub id: Uuid,
    #[serde(rename = "film")]
    pub title: String,
    pub year: Option<i64>,
    pub awards: Option<i64>,
    pub nominations: Option<i64>,
}

impl FilmRecord {
    pub fn new(
        title: impl Into<String>,
        year: Option<i64>,
        awards: Option<i64>,
        nominations: Option<i64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            year,
            awards,
            nominations,
        }
    }
}

/// One row of `TestTable`, used to exercise the store without scraping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub id: Uuid,
    pub text: String,
}

impl DiagnosticRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }
}

/// Turn extracted rows into records, each with a fresh id. The year range
/// is left for the store to enforce.
pub fn build_records(rows: &[RawRow]) -> Vec<FilmRecord> {
    rows.iter()
        .map(|r| {
            FilmRecord::new(
                r.title.clone(),
                to_int(&r.title, "year", &r.year),
                to_int(&r.title, "awards", &r.awards),
                to_int(&r.title, "nominations", &r.nominations),
            )
        })
        .collect()
}

fn to_int(title: &str, field: &str, raw: &str) -> Option<i64> {
    match normalize_str(raw) {
        Cell::Int(n) => Some(n),
        Cell::Text(t) => {
            if !t.is_empty() {
                debug!("{}: {} {:?} is not numeric, storing NULL", title, field, t);
            }
            None
        }
    }
}
