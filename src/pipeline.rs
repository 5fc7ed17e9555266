use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::error::{PipelineError, Result};
use crate::export;
use crate::extract;
use crate::fetch::PageSource;
use crate::records::{self, DiagnosticRecord, FilmRecord};
use crate::settings::Settings;
use crate::store::{LoadOutcome, Store};

/// Where a run currently is. Stages only move forward; any failure jumps
/// to `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    SchemaReady,
    Fetched,
    Extracted,
    Built,
    Persisted,
    Verified,
    Exported,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub extracted: usize,
    pub skipped: usize,
    pub persisted: LoadOutcome,
    pub stage: Stage,
}

/// ensure schema → fetch → extract → build → persist → verify → export
pub struct Pipeline<S> {
    store: Store,
    source: S,
    url: String,
    csv_path: PathBuf,
    json_path: PathBuf,
    replace: bool,
    stage: Stage,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(store: Store, source: S, settings: &Settings) -> Self {
        Self {
            store,
            source,
            url: settings.url.clone(),
            csv_path: settings.csv_path.clone(),
            json_path: settings.json_path.clone(),
            replace: settings.replace,
            stage: Stage::Init,
        }
    }

    #[cfg(test)]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn run(&mut self) -> Result<RunReport> {
        match self.run_stages() {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Pipeline aborted after {:?}: {}", self.stage, e);
                self.stage = Stage::Aborted;
                Err(e)
            }
        }
    }

    fn run_stages(&mut self) -> Result<RunReport> {
        self.store.ensure_schema()?;
        if !self.store.tables_exist() {
            return Err(PipelineError::TablesMissing("after schema initialization"));
        }
        self.advance(Stage::SchemaReady);

        let html = self.source.fetch(&self.url)?;
        self.advance(Stage::Fetched);

        let document = extract::parse_document(&html);
        let extraction = extract::extract_rows(&document)?;
        self.advance(Stage::Extracted);

        let films = records::build_records(&extraction.rows);
        self.advance(Stage::Built);

        let persisted = self.store.bulk_load(&films, self.replace)?;
        if persisted == LoadOutcome::Skipped {
            warn!("Nothing persisted; exports would not match the store");
        }
        self.advance(Stage::Persisted);

        // The file may have been dropped or replaced underneath us.
        if !self.store.tables_exist() {
            return Err(PipelineError::TablesMissing("after persisting records"));
        }
        self.advance(Stage::Verified);

        // Exports come from the in-memory records, not a re-read of the store.
        export::to_csv(&films, &self.csv_path)?;
        export::to_json(&films, &self.json_path)?;
        self.advance(Stage::Exported);

        self.advance(Stage::Done);
        Ok(RunReport {
            extracted: films.len(),
            skipped: extraction.malformed(),
            persisted,
            stage: self.stage,
        })
    }

    fn advance(&mut self, next: Stage) {
        info!("{:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

/// Push one known film and one `TestTable` entry through the single-row
/// path, independent of scraping.
pub fn probe(store: &Store) -> Result<(LoadOutcome, LoadOutcome)> {
    store.ensure_schema()?;
    let film = FilmRecord::new("Test Film", Some(2023), Some(1), Some(5));
    let entry = DiagnosticRecord::new("Test entry");
    let film_outcome = store.insert_one(&film)?;
    let entry_outcome = store.insert_one(&entry)?;
    Ok((film_outcome, entry_outcome))
}

// ── Tests ──
