//! Sessions.
//!
//! A session is one logical user of the database: a service request, a test, a batch import.  It owns at most one
//! connection, opened the first time anything needs it, and that connection's transaction.  Entities borrow the
//! session they were made from, so they can't outlive it and the connection can't be closed out from under them.
//!
//! Transactions work the way they do in most database client libraries: the first write opens one implicitly, and it
//! stays open until [Session::commit] or [Session::rollback].  Reads don't open a transaction.  Dropping or
//! disconnecting a session with an open transaction rolls it back.
use std::cell::{Cell, OnceCell};
use std::sync::Arc;

use log::*;

use crate::config::DatabaseConfig;
use crate::errors::*;
use crate::reflect::{SchemaCache, Table};
use crate::value::Value;

pub struct Session {
    config: Arc<DatabaseConfig>,
    schema: SchemaCache,
    conn: OnceCell<rusqlite::Connection>,
    statements: Cell<u64>,
}

impl Session {
    pub(crate) fn new(config: Arc<DatabaseConfig>, schema: SchemaCache) -> Session {
        Session {
            config,
            schema,
            conn: OnceCell::new(),
            statements: Cell::new(0),
        }
    }

    pub fn get_config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get the connection, opening it if this is the first use.
    ///
    /// Calling this again returns the connection that is already open.
    pub fn connect(&self) -> Result<&rusqlite::Connection> {
        if let Some(c) = self.conn.get() {
            return Ok(c);
        }

        let conn = crate::database::open_connection(&self.config)?;
        debug!("Session connected to {}", self.config.get_path().display());
        Ok(self.conn.get_or_init(|| conn))
    }

    pub fn is_connected(&self) -> bool {
        self.conn.get().is_some()
    }

    /// Close the connection.  Anything uncommitted is lost.
    ///
    /// The session may be used again afterwards, in which case it reconnects.
    pub fn disconnect(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            if !conn.is_autocommit() {
                warn!("Disconnecting with an open transaction; rolling it back");
            }
            conn.close().map_err(|(_, e)| e)?;
        }
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.conn.get().map(|c| !c.is_autocommit()).unwrap_or(false)
    }

    /// Commit the open transaction, if there is one.
    pub fn commit(&self) -> Result<()> {
        if let Some(conn) = self.conn.get() {
            if !conn.is_autocommit() {
                conn.execute_batch("COMMIT")?;
                debug!("Committed");
            }
        }
        Ok(())
    }

    /// Roll back the open transaction, if there is one.
    pub fn rollback(&self) -> Result<()> {
        if let Some(conn) = self.conn.get() {
            if !conn.is_autocommit() {
                conn.execute_batch("ROLLBACK")?;
                debug!("Rolled back");
            }
        }
        Ok(())
    }

    /// Number of statements run against tables through this session.
    ///
    /// Transaction control and schema reflection aren't counted.
    pub fn statements_executed(&self) -> u64 {
        self.statements.get()
    }

    /// Get a reflected table by its full name.
    pub fn table(&self, name: &str) -> Result<Arc<Table>> {
        let conn = self.connect()?;
        self.schema.get_or_reflect(conn, name)
    }

    /// Get the reflected table backing an entity name, e.g. `Project`.
    pub fn entity_table(&self, entity: &str) -> Result<Arc<Table>> {
        self.table(&self.config.table_name(entity))
    }

    fn bump(&self) {
        self.statements.set(self.statements.get() + 1);
    }

    /// Run a statement which changes data, opening a transaction first if needed.  Returns the rows changed.
    pub(crate) fn execute(&self, sql: &str, params: &[&Value]) -> Result<usize> {
        let conn = self.connect()?;
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN IMMEDIATE")?;
        }

        trace!("Executing {}", sql.trim());
        let mut stmt = conn.prepare_cached(sql)?;
        self.bump();
        Ok(stmt.execute(rusqlite::params_from_iter(params.iter()))?)
    }

    /// Run a query, handing every row to `callback`.
    pub(crate) fn query(
        &self,
        sql: &str,
        params: &[&Value],
        mut callback: impl FnMut(&rusqlite::Row) -> Result<()>,
    ) -> Result<()> {
        let conn = self.connect()?;

        trace!("Querying {}", sql.trim());
        let mut stmt = conn.prepare_cached(sql)?;
        self.bump();
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        while let Some(r) = rows.next()? {
            callback(r)?;
        }
        Ok(())
    }

    pub(crate) fn last_insert_rowid(&self) -> Result<i64> {
        Ok(self.connect()?.last_insert_rowid())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.in_transaction() {
            warn!("Session dropped with uncommitted changes; they will be rolled back");
        }
    }
}
