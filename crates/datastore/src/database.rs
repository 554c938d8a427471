//! The database is the configured endpoint: it knows where the sqlite file is, scaffolds the schema, and hands out
//! sessions.
use std::sync::Arc;
use std::time::Duration;

use log::*;

use crate::config::DatabaseConfig;
use crate::errors::*;
use crate::reflect::SchemaCache;
use crate::schema::{ENTITY_NAMES, MIGRATIONS};
use crate::session::Session;
use crate::statements::quote_ident;

/// SQL that we run as part of opening a connection.
///
/// - Raises the default cache size because the one sqlite sets up for us is only a couple megabytes.
/// - Enables foreign key enforcement, which the schema relies on for cascading deletes.
/// - Checkpoints less often than the default.
const CONNECTION_SQL: &str = r#"
PRAGMA cache_size = -100000;
PRAGMA foreign_keys = 1;
PRAGMA wal_autocheckpoint = 10000;
"#;

/// SQL that we run once, when the database is opened.
///
/// - Sets up WAL, so that sessions reading don't block the one writing.  This sticks to the file.
/// - Makes sure the WAL file is truncated because they can grow quite large under some obscure conditions.
const INITIAL_SQL: &str = r#"
pragma journal_mode = WAL;
PRAGMA wal_checkpoint(full);
"#;

/// Open and configure a new connection.
pub(crate) fn open_connection(config: &DatabaseConfig) -> Result<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(config.get_path())?;
    conn.busy_timeout(Duration::from_millis(config.get_busy_timeout_ms() as u64))?;
    conn.execute_batch(CONNECTION_SQL)?;
    Ok(conn)
}

/// Run the migrations for a given database, creating the initial migrations infrastructure if necessary.
///
/// Note that the initial migrations table is, in effect, the only thing we can't migrate without a lot of work.
fn run_migrations(conn: &mut rusqlite::Connection, config: &DatabaseConfig) -> Result<()> {
    let transaction = conn.transaction()?;

    transaction.execute(
        r#"CREATE TABLE IF NOT EXISTS migrations (
        id INTEGER PRIMARY KEY,
        -- Name of the migration.
        name TEXT NOT NULL,
        -- The table prefix it ran for.
        table_prefix TEXT NOT NULL,
        -- The specific sql run for this migration after template rendering, which can be useful for debugging.
        sql TEXT NOT NULL,
        -- Unix timestamp as real seconds
        ran_at REAL,
        -- Duration taken as real seconds.
        duration REAL NOT NULL,
        UNIQUE (name, table_prefix)
    )"#,
        [],
    )?;

    // Every entity's table identifier goes in the template, so that a migration may `{{ Project }}`.
    let prefix = config.get_table_prefix();
    let mut ctx = tera::Context::new();
    ctx.insert("prefix", prefix);
    for entity in ENTITY_NAMES {
        ctx.insert(*entity, &quote_ident(&config.table_name(entity)));
    }

    for mig in MIGRATIONS {
        let had_migration = transaction
            .prepare("SELECT * FROM migrations WHERE name = ? AND table_prefix = ?")?
            .exists([mig.get_name(), prefix])?;
        if had_migration {
            continue;
        }

        let ran_at = (std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap_or_default())
        .as_secs_f64();

        let start_time = std::time::Instant::now();
        let statements = tera::Tera::one_off(mig.get_sql(), &ctx, false)?;
        transaction.execute_batch(&statements)?;
        let duration = start_time.elapsed().as_secs_f64();
        info!(
            "Ran migration {} for prefix {:?} in {:.3}s",
            mig.get_name(),
            prefix,
            duration
        );

        transaction.execute(
            "INSERT INTO migrations(name, table_prefix, sql, ran_at, duration) VALUES(?, ?, ?, ?, ?)",
            rusqlite::params![mig.get_name(), prefix, statements.as_str(), ran_at, duration],
        )?;
    }

    transaction.commit()?;
    Ok(())
}

pub struct Database {
    config: Arc<DatabaseConfig>,
    schema: SchemaCache,
}

impl Database {
    /// Open the database, creating the file and bringing the schema up to date as configured.
    pub fn open(config: DatabaseConfig) -> Result<Database> {
        config.check()?;
        info!("Opening database at {}", config.get_path().display());

        let mut conn = open_connection(&config)?;
        conn.execute_batch(INITIAL_SQL)?;
        if config.should_run_migrations() {
            run_migrations(&mut conn, &config)?;
        }
        conn.close().map_err(|(_, e)| e)?;

        Ok(Database {
            config: Arc::new(config),
            schema: Default::default(),
        })
    }

    pub fn get_config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Start a new session.  Sessions connect lazily, so this is cheap.
    pub fn session(&self) -> Session {
        Session::new(self.config.clone(), self.schema.clone())
    }

    /// How many tables have been reflected so far.
    pub fn reflected_table_count(&self) -> usize {
        self.schema.len()
    }
}
