use std::path::{Path, PathBuf};

use crate::errors::*;

fn default_table_prefix() -> String {
    "t".to_string()
}

fn default_busy_timeout_ms() -> u32 {
    1000
}

fn default_run_migrations() -> bool {
    true
}

/// Where the database lives and how to talk to it.
#[derive(Clone, Debug, derive_builder::Builder, serde::Serialize, serde::Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct DatabaseConfig {
    /// Path to the sqlite file.  Created if it doesn't exist.
    #[builder(setter(into))]
    path: PathBuf,

    /// Prepended to entity names to get table names, so `Project` lives in `tProject`.
    #[builder(setter(into), default = "default_table_prefix()")]
    #[serde(default = "default_table_prefix")]
    table_prefix: String,

    /// How long a statement waits on a lock held by another connection before failing.
    #[builder(default = "default_busy_timeout_ms()")]
    #[serde(default = "default_busy_timeout_ms")]
    busy_timeout_ms: u32,

    /// Bring the schema up to date when the database is opened.
    #[builder(default = "default_run_migrations()")]
    #[serde(default = "default_run_migrations")]
    run_migrations: bool,
}

impl DatabaseConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(p) = self.table_prefix.as_ref() {
            if !p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(format!("Table prefix {:?} must be alphanumeric", p));
            }
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Shorthand for a config with everything but the path defaulted.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DatabaseConfig {
            path: path.into(),
            table_prefix: default_table_prefix(),
            busy_timeout_ms: default_busy_timeout_ms(),
            run_migrations: default_run_migrations(),
        }
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: DatabaseConfig = serde_json::from_str(&text)?;
        config.check()?;
        Ok(config)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config("path may not be empty".into()));
        }
        if !self
            .table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::Config(format!(
                "table prefix {:?} must be alphanumeric",
                self.table_prefix
            )));
        }
        Ok(())
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn get_table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn get_busy_timeout_ms(&self) -> u32 {
        self.busy_timeout_ms
    }

    pub fn should_run_migrations(&self) -> bool {
        self.run_migrations
    }

    /// Table name for an entity.
    pub fn table_name(&self, entity: &str) -> String {
        format!("{}{}", self.table_prefix, entity)
    }
}
