//! Descriptors for reflected tables.
//!
//! A table descriptor is built once, by reflecting a live table, and is immutable afterwards.  All records of a table
//! share the same descriptor through an `Arc`.
use crate::errors::*;

/// The type a column was declared with, reduced to sqlite's affinity rules.
///
/// This is what decides whether a value is quoted when rendered as a literal.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnType {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl ColumnType {
    /// Classify a declared type, following <https://www.sqlite.org/datatype3.html#determination_of_column_affinity>.
    pub fn from_declared(declared: &str) -> ColumnType {
        let upper = declared.to_ascii_uppercase();

        if upper.contains("INT") {
            ColumnType::Integer
        } else if ["CHAR", "CLOB", "TEXT"].iter().any(|x| upper.contains(x)) {
            ColumnType::Text
        } else if upper.contains("BLOB") || upper.trim().is_empty() {
            ColumnType::Blob
        } else if ["REAL", "FLOA", "DOUB"].iter().any(|x| upper.contains(x)) {
            ColumnType::Real
        } else {
            ColumnType::Numeric
        }
    }
}

/// A column in a table.
#[derive(Clone, Debug)]
pub struct ColumnDescriptor {
    name: String,
    sql_type: String,
    column_type: ColumnType,
    nullable: bool,
    primary_key: bool,
    auto_increment: bool,
}

impl ColumnDescriptor {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// The type exactly as declared in the schema.
    pub fn get_sql_type(&self) -> &str {
        &self.sql_type
    }

    pub fn get_column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }
}

/// Description of a table.
#[derive(Debug)]
pub struct TableDescriptor {
    name: String,
    columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn iter_key_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_primary_key())
    }

    pub fn has_primary_key(&self) -> bool {
        self.iter_key_columns().next().is_some()
    }

    /// Position of the named column, if the table has one.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.get_name() == name)
    }

    pub fn get_column(&self, index: usize) -> &ColumnDescriptor {
        &self.columns[index]
    }

    /// Index of the column which generates keys on insert, if any.
    pub fn auto_increment_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.is_auto_increment())
    }
}

/// A helper to build tables.
///
/// Columns are added in table order.  Which of them generates keys is worked out at build time.
pub struct TableBuilder {
    name: String,
    columns: Vec<ColumnDescriptor>,
}

impl TableBuilder {
    pub fn new(name: String) -> Self {
        Self {
            name,
            columns: vec![],
        }
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if self.columns.iter().any(|x| x.get_name() == name) {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: name.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn add_column(
        &mut self,
        name: String,
        sql_type: String,
        nullable: bool,
        primary_key: bool,
    ) -> Result<()> {
        self.check_name(&name)?;
        self.columns.push(ColumnDescriptor {
            column_type: ColumnType::from_declared(&sql_type),
            name,
            sql_type,
            nullable,
            primary_key,
            auto_increment: false,
        });
        Ok(())
    }

    /// Build the descriptor.
    ///
    /// A table gets an auto-increment column when its key is exactly one column declared `INTEGER`: that column is an
    /// alias for the rowid, and sqlite fills it in when it's inserted as null.
    pub fn build(mut self) -> Result<TableDescriptor> {
        if self.columns.is_empty() {
            return Err(SchemaError::NoSuchTable(self.name).into());
        }

        let keys = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary_key)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if let [only] = keys[..] {
            let col = &mut self.columns[only];
            if col.sql_type.eq_ignore_ascii_case("INTEGER") {
                col.auto_increment = true;
                // Rowid aliases are never null once stored, whatever the schema says.
                col.nullable = false;
            }
        }

        Ok(TableDescriptor {
            name: self.name,
            columns: self.columns,
        })
    }
}
