//! Store configuration loaded with figment
//!
//! Sources are merged in precedence order, later ones overriding earlier:
//!
//! 1. Built-in defaults
//! 2. `stemdir.toml` / `stemdir.yaml` in the current directory, or an
//!    explicit file passed to [`StoreConfig::load_from`]
//! 3. Environment variables prefixed `STEMDIR_` (e.g. `STEMDIR_TABLE_PREFIX`)

use crate::db::OpenStyle;
use crate::error::{DirError, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Default database file name
pub const DEFAULT_DATABASE_PATH: &str = "stemdir.db";

/// Default table-name prefix; the table is `<prefix>Dir`
pub const DEFAULT_TABLE_PREFIX: &str = "Stem";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "STEMDIR_";

/// Config file names looked up in the current directory
const CONFIG_FILE_NAMES: [&str; 2] = ["stemdir.toml", "stemdir.yaml"];

/// Where and how the persisted engine stores its directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub table_prefix: String,
    pub open_style: OpenStyle,
    /// SQLite `journal_mode` to apply on open, e.g. `WAL`.
    pub journal_mode: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            open_style: OpenStyle::default(),
            journal_mode: None,
        }
    }
}

impl StoreConfig {
    /// Load from the default sources.
    pub fn load() -> Result<Self> {
        let mut figment = Self::defaults();
        for name in CONFIG_FILE_NAMES {
            trace!("Looking for config file {}", name);
            figment = figment.merge(file_provider(Path::new(name)));
        }
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load with `path` as the config file. A missing file contributes
    /// nothing.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading store configuration from {}", path.display());
        let figment = Self::defaults()
            .merge(file_provider(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::extract(figment)
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(StoreConfig::default()))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: StoreConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Name of the directory table.
    pub fn table_name(&self) -> String {
        format!("{}Dir", self.table_prefix)
    }

    pub fn validate(&self) -> Result<()> {
        validate_table_prefix(&self.table_prefix)
    }
}

fn file_provider(path: &Path) -> Figment {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Figment::from(Yaml::file(path)),
        Some("json") => Figment::from(Json::file(path)),
        _ => Figment::from(Toml::file(path)),
    }
}

/// The prefix is spliced into bracketed SQL identifiers, so only ASCII
/// alphanumerics and `_` are accepted.
pub fn validate_table_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(DirError::config("table prefix must not be empty"));
    }
    if let Some(bad) = prefix
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(DirError::config(format!(
            "table prefix '{}' contains invalid character '{}'",
            prefix, bad
        )));
    }
    Ok(())
}
