//! Application configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an absent
//! file or a partial one is fine. `AVALIA_DB_PATH` and
//! `AVALIA_RELOAD_DATABASE` override the file.
//!
//! ```toml
//! log_filter = "avalia=debug,info"
//!
//! [database]
//! path = "/tmp/avalia.db"
//! reload_database = true
//! seed_semesters = ["2022.1", "2023.1"]
//! administrators = ["190000001"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::models::Semester;

pub const CONFIG_ENV: &str = "AVALIA_CONFIG";
pub const DB_PATH_ENV: &str = "AVALIA_DB_PATH";
pub const RELOAD_DATABASE_ENV: &str = "AVALIA_RELOAD_DATABASE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Delete the database file before connecting, recreating schema and data.
    pub reload_database: bool,
    /// Semesters (`"2022.1"`) whose catalogue is loaded at startup.
    pub seed_semesters: Vec<String>,
    /// Read `<year>.<number>.json` data sets from here instead of the
    /// built-in ones.
    pub seed_dir: Option<PathBuf>,
    /// Registration numbers granted the administrator flag at startup.
    pub administrators: Vec<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            reload_database: false,
            seed_semesters: vec!["2022.1".into(), "2022.2".into(), "2023.1".into()],
            seed_dir: None,
            administrators: Vec::new(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn semesters(&self) -> Result<Vec<Semester>> {
        self.seed_semesters
            .iter()
            .map(|s| s.parse().with_context(|| format!("invalid seed semester {s:?}")))
            .collect()
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("avalia")
        .join("avalia.db")
}

impl AppConfig {
    /// Reads `path` when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.is_empty()) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(flag) = lookup(RELOAD_DATABASE_ENV) {
            self.database.reload_database = matches!(flag.trim(), "1" | "true" | "yes");
        }
    }
}
