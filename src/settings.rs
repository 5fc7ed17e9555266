use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_URL: &str =
    "https://en.wikipedia.org/wiki/List_of_Academy_Award%E2%80%93winning_films";
const DEFAULT_DB_PATH: &str = "data/films.sqlite";
const DEFAULT_CSV_PATH: &str = "data/output.csv";
const DEFAULT_JSON_PATH: &str = "data/output.json";
const DEFAULT_USER_AGENT: &str = concat!("oscar_films/", env!("CARGO_PKG_VERSION"));

/// Runtime settings: defaults, then `oscar_films.toml`, then `FILMS_*` env vars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub url: String,
    pub db_path: PathBuf,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub user_agent: String,
    /// Truncate both tables before loading.
    pub replace: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            db_path: DEFAULT_DB_PATH.into(),
            csv_path: DEFAULT_CSV_PATH.into(),
            json_path: DEFAULT_JSON_PATH.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            replace: true,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::with_name("oscar_films").required(false))
            .add_source(Environment::with_prefix("FILMS"))
            .build()?
            .try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("url", DEFAULT_URL)?
        .set_default("db_path", DEFAULT_DB_PATH)?
        .set_default("csv_path", DEFAULT_CSV_PATH)?
        .set_default("json_path", DEFAULT_JSON_PATH)?
        .set_default("user_agent", DEFAULT_USER_AGENT)?
        .set_default("replace", true)
}
