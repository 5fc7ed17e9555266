use std::fmt;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

static WIKITABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.wikitable").unwrap());

/// Number of leading cells a film row must carry.
pub const MIN_CELLS: usize = 4;

/// One film row as it appears on the page, before any conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub title: String,
    pub year: String,
    pub awards: String,
    pub nominations: String,
}

/// Why a table row did not produce a [`RawRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Only `th` cells; the column header row.
    Header,
    TooFewCells { found: usize },
    EmptyTitle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Header => write!(f, "header row"),
            SkipReason::TooFewCells { found } => write!(
                f,
                "expected at least {} columns, found {}",
                MIN_CELLS, found
            ),
            SkipReason::EmptyTitle => write!(f, "film title is empty"),
        }
    }
}

/// Rows pulled out of the wikitable plus the ones that were dropped.
#[derive(Debug, Default)]
pub struct Extraction {
    pub rows: Vec<RawRow>,
    /// `(row index within tbody, reason)`
    pub skipped: Vec<(usize, SkipReason)>,
}

impl Extraction {
    /// Malformed rows only; the header row is expected and not counted.
    pub fn malformed(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(_, r)| *r != SkipReason::Header)
            .count()
    }
}

pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

/// Locate the first `wikitable`, walk its body rows and keep every row
/// that has at least [`MIN_CELLS`] data cells.
pub fn extract_rows(document: &Html) -> Result<Extraction> {
    let table = document.select(&WIKITABLE_SEL).next().ok_or_else(|| {
        PipelineError::Structure("no table with class \"wikitable\" found".into())
    })?;

    let tbody = child_elements(table, "tbody").next().ok_or_else(|| {
        PipelineError::Structure("wikitable has no tbody".into())
    })?;

    let mut extraction = Extraction::default();
    for (idx, tr) in child_elements(tbody, "tr").enumerate() {
        match parse_row(tr) {
            Ok(row) => extraction.rows.push(row),
            Err(SkipReason::Header) => {
                debug!("Skipping header row {}", idx);
                extraction.skipped.push((idx, SkipReason::Header));
            }
            Err(reason) => {
                warn!("Skipping row {}: {}", idx, reason);
                extraction.skipped.push((idx, reason));
            }
        }
    }

    if extraction.rows.is_empty() {
        return Err(PipelineError::EmptyResult {
            skipped: extraction.malformed(),
        });
    }

    info!(
        "Extracted {} rows ({} malformed rows skipped)",
        extraction.rows.len(),
        extraction.malformed()
    );
    Ok(extraction)
}

/// Split one `tr` into the four raw fields.
pub fn parse_row(tr: ElementRef<'_>) -> std::result::Result<RawRow, SkipReason> {
    let cells: Vec<ElementRef<'_>> = child_elements(tr, "td").collect();

    if cells.is_empty() && child_elements(tr, "th").next().is_some() {
        return Err(SkipReason::Header);
    }
    if cells.len() < MIN_CELLS {
        return Err(SkipReason::TooFewCells { found: cells.len() });
    }

    let title = cell_text(cells[0]);
    if title.is_empty() {
        return Err(SkipReason::EmptyTitle);
    }

    Ok(RawRow {
        title,
        year: cell_text(cells[1]),
        awards: cell_text(cells[2]),
        nominations: cell_text(cells[3]),
    })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Direct element children with the given tag name. Nested tables inside a
/// cell must not leak their rows into the outer table.
fn child_elements<'a>(
    parent: ElementRef<'a>,
    tag: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == tag)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Result<Extraction> {
        extract_rows(&parse_document(html))
    }

    #[test]
    fn single_row_table() {
        let html = r#"<html><body>
            <table class="wikitable sortable">
              <tbody>
                <tr><th>Film</th><th>Year</th><th>Awards</th><th>Nominations</th></tr>
                <tr><td>Title X</td><td>2020</td><td>1</td><td>5</td></tr>
              </tbody>
            </table></body></html>"#;
        let ex = extract(html).unwrap();
        assert_eq!(
            ex.rows,
            vec![RawRow {
                title: "Title X".into(),
                year: "2020".into(),
                awards: "1".into(),
                nominations: "5".into(),
            }]
        );
        assert_eq!(ex.skipped, vec![(0, SkipReason::Header)]);
        assert_eq!(ex.malformed(), 0);
    }

    #[test]
    fn fixture_skips_short_rows_and_keeps_going() {
        let html = std::fs::read_to_string("tests/fixtures/films.html").unwrap();
        let ex = extract(&html).unwrap();
        let titles: Vec<&str> = ex.rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Oppenheimer", "Everything Everywhere All at Once", "Parasite", "Wings"]
        );
        assert_eq!(ex.malformed(), 2);
        assert!(ex
            .skipped
            .iter()
            .any(|(_, r)| *r == SkipReason::TooFewCells { found: 1 }));
        assert!(ex.skipped.iter().any(|(_, r)| *r == SkipReason::EmptyTitle));
    }

    #[test]
    fn fixture_cell_text_is_trimmed_and_flattened() {
        let html = std::fs::read_to_string("tests/fixtures/films.html").unwrap();
        let ex = extract(&html).unwrap();
        let wings = ex.rows.iter().find(|r| r.title == "Wings").unwrap();
        assert_eq!(wings.year, "1927/28");
        assert_eq!(wings.awards, "2");
        let eeaao = &ex.rows[1];
        assert_eq!(eeaao.awards, "7");
        assert_eq!(eeaao.nominations, "11");
    }

    #[test]
    fn only_first_wikitable_is_read() {
        let html = std::fs::read_to_string("tests/fixtures/films.html").unwrap();
        let ex = extract(&html).unwrap();
        assert!(ex.rows.iter().all(|r| r.title != "Not a film"));
    }

    #[test]
    fn missing_table_is_structure_error() {
        let html = "<html><body><table class=\"infobox\"><tr><td>x</td></tr></table></body></html>";
        assert!(matches!(extract(html), Err(PipelineError::Structure(_))));
    }

    #[test]
    fn no_usable_rows_is_empty_result() {
        let html = r#"<table class="wikitable">
            <tr><th>Film</th><th>Year</th><th>Awards</th><th>Nominations</th></tr>
            <tr><td>Lonely</td><td>1999</td></tr>
            </table>"#;
        match extract(html) {
            Err(PipelineError::EmptyResult { skipped }) => assert_eq!(skipped, 1),
            other => panic!("expected EmptyResult, got {:?}", other.map(|e| e.rows)),
        }
    }

    #[test]
    fn header_only_table_is_empty_result() {
        let html = r#"<table class="wikitable">
            <tr><th>Film</th><th>Year</th><th>Awards</th><th>Nominations</th></tr>
            </table>"#;
        assert!(matches!(
            extract(html),
            Err(PipelineError::EmptyResult { skipped: 0 })
        ));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let html = r#"<table class="wikitable"><tbody>
            <tr><td>A</td><td>2001</td><td>3</td><td>4</td><td>extra</td></tr>
            </tbody></table>"#;
        let ex = extract(html).unwrap();
        assert_eq!(ex.rows.len(), 1);
        assert_eq!(ex.rows[0].nominations, "4");
    }
}
