use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, Statement, Transaction};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::records::{DiagnosticRecord, FilmRecord};

pub const FILMS_TABLE: &str = "academy_award_winning_films";
pub const TEST_TABLE: &str = "TestTable";
pub const REQUIRED_TABLES: [&str; 2] = [FILMS_TABLE, TEST_TABLE];

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS academy_award_winning_films (
        id          TEXT PRIMARY KEY,
        film        TEXT NOT NULL,
        year        INTEGER,
        awards      INTEGER,
        nominations INTEGER,
        CONSTRAINT check_year CHECK (year >= 1888)
    );

    CREATE TABLE IF NOT EXISTS \"TestTable\" (
        id   TEXT PRIMARY KEY,
        text TEXT NOT NULL
    );
";

/// A row type the store knows how to insert.
pub trait Persist {
    const TABLE: &'static str;
    const INSERT_SQL: &'static str;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

impl Persist for FilmRecord {
    const TABLE: &'static str = FILMS_TABLE;
    const INSERT_SQL: &'static str = "INSERT INTO academy_award_winning_films
         (id, film, year, awards, nominations) VALUES (?1, ?2, ?3, ?4, ?5)";

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id.to_string(),
            self.title,
            self.year,
            self.awards,
            self.nominations,
        ])
    }
}

impl Persist for DiagnosticRecord {
    const TABLE: &'static str = TEST_TABLE;
    const INSERT_SQL: &'static str = "INSERT INTO \"TestTable\" (id, text) VALUES (?1, ?2)";

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.id.to_string(), self.text])
    }
}

/// What a gated write actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Inserted(usize),
    /// Required tables were absent; nothing was written.
    Skipped,
}

/// Handle to the SQLite file. Each operation opens its own connection and
/// closes it before returning.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Point at `path`, creating its parent directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }

    // ── Schema ──

    /// Create both tables if they are missing. Safe to call on every run.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect().map_err(PipelineError::Schema)?;
        conn.execute_batch(SCHEMA_SQL).map_err(|e| {
            error!("Error initializing database schema: {}", e);
            PipelineError::Schema(e)
        })?;
        info!("Database schema initialized at {:?}", self.path);

        let tables = table_names(&conn).map_err(PipelineError::Schema)?;
        info!("Tables in the database: {:?}", tables);
        if REQUIRED_TABLES.iter().all(|t| tables.iter().any(|n| n == t)) {
            info!("All required tables are present");
        } else {
            error!("Not all required tables were created");
        }
        Ok(())
    }

    /// True iff both required tables are in the catalog. Always reads the
    /// catalog; the file may have been replaced since the last call.
    /// Never creates the file.
    pub fn tables_exist(&self) -> bool {
        let opened = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_WRITE);
        let conn = match opened {
            Ok(c) => c,
            Err(e) => {
                debug!("No database at {:?}: {}", self.path, e);
                return false;
            }
        };
        let tables = match table_names(&conn) {
            Ok(t) => t,
            Err(e) => {
                warn!("Could not read table catalog: {}", e);
                return false;
            }
        };
        REQUIRED_TABLES.iter().all(|t| tables.iter().any(|n| n == t))
    }

    // ── Writes ──

    /// Insert every record in one transaction. With `replace`, both tables
    /// are emptied inside the same transaction first, so old rows survive
    /// unless the new ones land.
    pub fn bulk_load<R: Persist>(&self, records: &[R], replace: bool) -> Result<LoadOutcome> {
        if !self.tables_exist() {
            error!("Tables do not exist. Cannot insert {} records.", records.len());
            return Ok(LoadOutcome::Skipped);
        }

        let inserted = self.write_in_tx(R::TABLE, |tx| {
            if replace {
                for table in REQUIRED_TABLES {
                    let removed = tx.execute(&format!("DELETE FROM \"{}\"", table), [])?;
                    info!("Cleared {} rows from {}", removed, table);
                }
            }
            let mut stmt = tx.prepare(R::INSERT_SQL)?;
            let mut count = 0;
            for r in records {
                count += r.insert(&mut stmt)?;
            }
            Ok(count)
        })?;

        info!("{} records inserted into {}", inserted, R::TABLE);
        Ok(LoadOutcome::Inserted(inserted))
    }

    /// Insert a single row and commit.
    pub fn insert_one<R: Persist>(&self, record: &R) -> Result<LoadOutcome> {
        if !self.tables_exist() {
            error!("Tables do not exist. Cannot insert row into {}.", R::TABLE);
            return Ok(LoadOutcome::Skipped);
        }

        let inserted = self.write_in_tx(R::TABLE, |tx| {
            let mut stmt = tx.prepare(R::INSERT_SQL)?;
            record.insert(&mut stmt)
        })?;

        info!("Row inserted into {}", R::TABLE);
        Ok(LoadOutcome::Inserted(inserted))
    }

    /// Run `write` inside a transaction: commit on success, roll back and
    /// surface a persistence error otherwise.
    fn write_in_tx<F>(&self, table: &'static str, write: F) -> Result<usize>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<usize>,
    {
        let persistence = |source| PipelineError::Persistence { table, source };

        let mut conn = self.connect().map_err(persistence)?;
        let tx = conn.transaction().map_err(persistence)?;

        match write(&tx) {
            Ok(n) => {
                tx.commit().map_err(|e| {
                    error!("Commit into {} failed: {}", table, e);
                    persistence(e)
                })?;
                Ok(n)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback() {
                    warn!("Rollback on {} failed: {}", table, rb);
                }
                error!("Error inserting into {}: {}", table, e);
                Err(persistence(e))
            }
        }
    }

    // ── Reads ──

    pub fn count(&self, table: &'static str) -> Result<usize> {
        let persistence = |source| PipelineError::Persistence { table, source };
        let conn = self.connect().map_err(persistence)?;
        conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |r| {
            r.get(0)
        })
        .map_err(persistence)
    }

    /// Every stored film in insertion order.
    pub fn load_films(&self) -> Result<Vec<FilmRecord>> {
        let persistence = |source| PipelineError::Persistence {
            table: FILMS_TABLE,
            source,
        };
        let conn = self.connect().map_err(persistence)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, film, year, awards, nominations
                 FROM academy_award_winning_films ORDER BY rowid",
            )
            .map_err(persistence)?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                Ok(FilmRecord {
                    id: parse_id(&id)?,
                    title: row.get(1)?,
                    year: row.get(2)?,
                    awards: row.get(3)?,
                    nominations: row.get(4)?,
                })
            })
            .map_err(persistence)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(persistence)?;
        Ok(rows)
    }
}

fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

fn parse_id(raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ── Tests ──
