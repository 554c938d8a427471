//! Schema reflection.
//!
//! Tables are described by asking sqlite about them, once per table per [crate::Database].  The result lives for as
//! long as the database handle does: if the schema changes underneath a running process, nothing notices.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use log::*;

use crate::descriptor::{TableBuilder, TableDescriptor};
use crate::errors::*;
use crate::statements::TableStatements;

lazy_static! {
    static ref TABLE_NAME: regex::Regex =
        regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Table name pattern should compile");
}

const TABLE_INFO_SQL: &str =
    r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1) ORDER BY cid"#;

/// A reflected table: its descriptor and the statements built from it.
#[derive(Debug)]
pub struct Table {
    descriptor: TableDescriptor,
    statements: TableStatements,
}

impl Table {
    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn statements(&self) -> &TableStatements {
        &self.statements
    }

    pub fn get_name(&self) -> &str {
        self.descriptor.get_name()
    }
}

/// Read the columns of `name` from the live schema.
///
/// Fails with [SchemaError::NoSuchTable] if sqlite knows of no such table.
pub fn reflect_table(conn: &rusqlite::Connection, name: &str) -> Result<TableDescriptor> {
    if !TABLE_NAME.is_match(name) {
        return Err(SchemaError::InvalidTableName(name.to_string()).into());
    }

    let mut builder = TableBuilder::new(name.to_string());
    let mut stmt = conn.prepare_cached(TABLE_INFO_SQL)?;
    let mut rows = stmt.query([name])?;
    while let Some(r) = rows.next()? {
        let column: String = r.get(0)?;
        let sql_type: String = r.get(1)?;
        let not_null: i64 = r.get(2)?;
        let pk_position: i64 = r.get(3)?;
        builder.add_column(column, sql_type, not_null == 0, pk_position > 0)?;
    }

    builder.build()
}

/// Reflected tables, shared by every session of a database.
#[derive(Clone, Debug, Default)]
pub(crate) struct SchemaCache {
    tables: Arc<Mutex<HashMap<String, Arc<Table>>>>,
}

impl SchemaCache {
    /// Get the table, reflecting it through `conn` if this is the first time anyone asked.
    pub(crate) fn get_or_reflect(
        &self,
        conn: &rusqlite::Connection,
        name: &str,
    ) -> Result<Arc<Table>> {
        // A panic elsewhere can't leave a half-inserted entry, so a poisoned map is still good.
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(t) = tables.get(name) {
            return Ok(t.clone());
        }

        let descriptor = reflect_table(conn, name)?;
        let statements = TableStatements::build(&descriptor)?;
        debug!(
            "Reflected {} with columns: {}",
            name,
            itertools::join(
                descriptor
                    .iter_columns()
                    .map(|c| format!("{} {}", c.get_name(), c.get_sql_type())),
                ", "
            )
        );

        let table = Arc::new(Table {
            descriptor,
            statements,
        });
        tables.insert(name.to_string(), table.clone());
        Ok(table)
    }

    pub(crate) fn len(&self) -> usize {
        self.tables.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
