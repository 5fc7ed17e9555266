mod error;
mod export;
mod extract;
mod fetch;
mod normalize;
mod pipeline;
mod records;
mod settings;
mod store;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::fetch::HttpFetcher;
use crate::pipeline::Pipeline;
use crate::settings::Settings;
use crate::store::{LoadOutcome, Store, FILMS_TABLE, TEST_TABLE};

#[derive(Parser)]
#[command(name = "oscar_films", about = "Academy Award-winning films scraper")]
struct Cli {
    /// SQLite file (overrides FILMS_DB_PATH / config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape, store and export in one pass
    Run {
        /// Keep existing rows instead of replacing them
        #[arg(long)]
        append: bool,
        /// CSV output path
        #[arg(long)]
        csv: Option<PathBuf>,
        /// JSON output path
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Create the tables if missing
    Init,
    /// Insert a test film and a TestTable entry
    Probe,
    /// Show row counts
    Stats,
    /// Export what is currently stored
    Export {
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }
    let store = Store::open(&settings.db_path)
        .with_context(|| format!("Failed to prepare {:?}", settings.db_path))?;

    let result = match cli.command {
        Commands::Run { append, csv, json } => {
            if append {
                settings.replace = false;
            }
            if let Some(p) = csv {
                settings.csv_path = p;
            }
            if let Some(p) = json {
                settings.json_path = p;
            }

            let fetcher = HttpFetcher::new(&settings.user_agent)?;
            let mut pipeline = Pipeline::new(store, fetcher, &settings);
            let report = pipeline.run()?;
            println!(
                "Extracted {} films ({} malformed rows skipped), {}.",
                report.extracted,
                report.skipped,
                describe(report.persisted)
            );
            println!(
                "Exported to {} and {}",
                settings.csv_path.display(),
                settings.json_path.display()
            );
            Ok(())
        }
        Commands::Init => {
            store.ensure_schema()?;
            if store.tables_exist() {
                println!("Schema ready at {}", store.path().display());
                Ok(())
            } else {
                Err(anyhow::anyhow!("Tables missing after schema initialization"))
            }
        }
        Commands::Probe => {
            let (film, entry) = pipeline::probe(&store)?;
            println!("Test film: {}", describe(film));
            println!("Test entry: {}", describe(entry));
            Ok(())
        }
        Commands::Stats => {
            if !store.tables_exist() {
                println!("No schema at {}. Run 'init' first.", store.path().display());
                return Ok(());
            }
            println!("{:<30} {:>6}", FILMS_TABLE, store.count(FILMS_TABLE)?);
            println!("{:<30} {:>6}", TEST_TABLE, store.count(TEST_TABLE)?);
            Ok(())
        }
        Commands::Export { csv, json } => {
            if !store.tables_exist() {
                println!("No schema at {}. Run 'init' first.", store.path().display());
                return Ok(());
            }
            let films = store.load_films()?;
            let csv = csv.unwrap_or(settings.csv_path);
            let json = json.unwrap_or(settings.json_path);
            export::to_csv(&films, &csv)?;
            export::to_json(&films, &json)?;
            println!("Exported {} stored films.", films.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn describe(outcome: LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Inserted(n) => format!("{} rows stored", n),
        LoadOutcome::Skipped => "nothing stored (tables missing)".to_string(),
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
