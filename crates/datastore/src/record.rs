//! Record proxies.
//!
//! A record holds one value per column of its table, in column order, and nothing else: writes to names the table
//! doesn't have are refused.  Any write marks the record dirty, whether or not the value changed.  Successful inserts,
//! updates and loads mark it clean again.
use std::sync::Arc;

use log::*;
use smallvec::SmallVec;

use crate::errors::*;
use crate::reflect::Table;
use crate::session::Session;
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct RecordProxy {
    table: Arc<Table>,
    values: SmallVec<[Value; 16]>,
    dirty: bool,
}

impl RecordProxy {
    /// A record for `table` with every column null.
    pub fn new(table: Arc<Table>) -> RecordProxy {
        let values = (0..table.descriptor().column_count())
            .map(|_| Value::Null)
            .collect();
        RecordProxy {
            table,
            values,
            dirty: false,
        }
    }

    /// Build a clean record from a row selected with every column of the table, in order.
    pub(crate) fn from_row(table: Arc<Table>, row: &rusqlite::Row) -> Result<RecordProxy> {
        let mut record = RecordProxy::new(table);
        record.overwrite_from_row(row)?;
        Ok(record)
    }

    fn overwrite_from_row(&mut self, row: &rusqlite::Row) -> Result<()> {
        for (i, v) in self.values.iter_mut().enumerate() {
            *v = row.get(i)?;
        }
        self.dirty = false;
        Ok(())
    }

    pub fn get_table(&self) -> &Table {
        &self.table
    }

    pub fn get_table_name(&self) -> &str {
        self.table.get_name()
    }

    fn index_of(&self, column: &str) -> Result<usize> {
        self.table
            .descriptor()
            .column_index(column)
            .ok_or_else(|| Error::UnknownColumn {
                table: self.get_table_name().to_string(),
                column: column.to_string(),
            })
    }

    pub fn get(&self, column: &str) -> Result<&Value> {
        Ok(&self.values[self.index_of(column)?])
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index_of(column)?;
        self.values[index] = value.into();
        self.dirty = true;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Iterate over `(column, value)` in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.table
            .descriptor()
            .iter_columns()
            .map(|c| c.get_name())
            .zip(self.values.iter())
    }

    /// Render the value of `column` as a SQL literal.  For display only.
    pub fn value_literal(&self, column: &str) -> Result<String> {
        let index = self.index_of(column)?;
        let col = self.table.descriptor().get_column(index);
        Ok(self.values[index].to_literal(col.get_column_type()))
    }

    /// `col=literal` for every column, for logging.
    pub fn describe(&self) -> String {
        itertools::join(
            self.table
                .descriptor()
                .iter_columns()
                .zip(self.values.iter())
                .map(|(c, v)| format!("{}={}", c.get_name(), v.to_literal(c.get_column_type()))),
            ", ",
        )
    }

    /// Whether every primary key column has a value.  False for tables without a key.
    pub fn has_complete_key(&self) -> bool {
        let keys = self.table.statements().key_indices();
        !keys.is_empty() && keys.iter().all(|i| !self.values[*i].is_null())
    }

    fn require_key_statement<'a>(&self, statement: Option<&'a str>) -> Result<&'a str> {
        statement.ok_or_else(|| SchemaError::NoPrimaryKey(self.get_table_name().to_string()).into())
    }

    /// Key values in bind order, failing if any is null.
    fn key_params(&self) -> Result<SmallVec<[&Value; 4]>> {
        self.table
            .statements()
            .key_indices()
            .iter()
            .map(|i| {
                let v = &self.values[*i];
                if v.is_null() {
                    Err(Error::MissingKey {
                        table: self.get_table_name().to_string(),
                        column: self.table.descriptor().get_column(*i).get_name().to_string(),
                    })
                } else {
                    Ok(v)
                }
            })
            .collect()
    }

    /// Insert every column as a new row.  If the table generates keys, the generated key is stored back.
    pub fn insert(&mut self, session: &Session) -> Result<()> {
        debug!("INSERT {}: {}", self.get_table_name(), self.describe());
        {
            let params = self.values.iter().collect::<SmallVec<[&Value; 16]>>();
            session.execute(self.table.statements().insert(), &params[..])?;
        }

        if let Some(i) = self.table.descriptor().auto_increment_index() {
            self.values[i] = Value::Integer(session.last_insert_rowid()?);
        }
        self.dirty = false;
        Ok(())
    }

    /// Write every non-key column to the row with this record's key.
    ///
    /// Returns the number of rows changed, which is 0 if no row has the key.  Tables made only of key columns have
    /// nothing to update, and no statement is run.
    pub fn update(&mut self, session: &Session) -> Result<usize> {
        if !self.table.descriptor().has_primary_key() {
            return Err(SchemaError::NoPrimaryKey(self.get_table_name().to_string()).into());
        }
        let sql = match self.table.statements().update() {
            Some(s) => s,
            None => {
                self.dirty = false;
                return Ok(0);
            }
        };

        debug!("UPDATE {}: {}", self.get_table_name(), self.describe());
        let changed = {
            let mut params = self
                .table
                .statements()
                .non_key_indices()
                .iter()
                .map(|i| &self.values[*i])
                .collect::<SmallVec<[&Value; 16]>>();
            params.extend(self.key_params()?);
            session.execute(sql, &params[..])?
        };
        if changed == 0 {
            warn!("UPDATE {} matched no rows", self.get_table_name());
        }
        self.dirty = false;
        Ok(changed)
    }

    /// Replace every value with those of the row having this record's key.
    ///
    /// Fails with [Error::NotFound] if there isn't one.
    pub fn select_by_key(&mut self, session: &Session) -> Result<()> {
        let sql = self.require_key_statement(self.table.statements().select())?;
        let width = self.values.len();

        let mut found: Option<Vec<Value>> = None;
        {
            let params = self.key_params()?;
            session.query(sql, &params[..], |row| {
                if found.is_none() {
                    let mut vals = Vec::with_capacity(width);
                    for i in 0..width {
                        vals.push(row.get(i)?);
                    }
                    found = Some(vals);
                }
                Ok(())
            })?;
        }

        match found {
            Some(vals) => {
                self.values = vals.into_iter().collect();
                self.dirty = false;
                Ok(())
            }
            None => Err(Error::NotFound {
                table: self.get_table_name().to_string(),
            }),
        }
    }

    /// Delete the row with this record's key.  Returns the number of rows deleted, without checking there was one.
    pub fn delete_by_key(&self, session: &Session) -> Result<usize> {
        let sql = self.require_key_statement(self.table.statements().delete())?;
        let params = self.key_params()?;
        debug!("DELETE {}: {}", self.get_table_name(), self.describe());
        session.execute(sql, &params[..])
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(c, v)| (c.to_string(), v.to_json()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{Database, DatabaseConfig};

    fn open() -> (tempfile::TempDir, Database) {
        let tdir = tempfile::TempDir::new().unwrap();
        let db =
            Database::open(DatabaseConfig::new(tdir.path().join("hydra.sqlite"))).unwrap();
        (tdir, db)
    }

    #[test]
    fn test_unknown_column() {
        let (_tdir, db) = open();
        let session = db.session();
        let mut r = RecordProxy::new(session.entity_table("Project").unwrap());
        let before = session.statements_executed();
        assert!(matches!(
            r.set("not_a_column", 1),
            Err(Error::UnknownColumn { .. })
        ));
        assert!(matches!(r.get("nope"), Err(Error::UnknownColumn { .. })));
        assert!(!r.is_dirty());
        assert_eq!(session.statements_executed(), before);
    }

    #[test]
    fn test_set_always_dirties() {
        let (_tdir, db) = open();
        let session = db.session();
        let mut r = RecordProxy::new(session.entity_table("Attr").unwrap());
        r.set("attr_name", Value::Null).unwrap();
        assert!(r.is_dirty());
    }

    #[test]
    fn test_literals_follow_column_types() {
        let (_tdir, db) = open();
        let session = db.session();
        let mut r = RecordProxy::new(session.entity_table("Node").unwrap());
        r.set("node_name", "O'Brien's weir").unwrap();
        r.set("node_x", 1.5).unwrap();
        r.set("network_id", 3).unwrap();
        assert_eq!(r.value_literal("node_name").unwrap(), "'O''Brien''s weir'");
        assert_eq!(r.value_literal("node_x").unwrap(), "1.5");
        assert_eq!(r.value_literal("network_id").unwrap(), "3");
        assert_eq!(r.value_literal("node_description").unwrap(), "NULL");
    }

    #[test]
    fn test_insert_select_round_trip() {
        let (_tdir, db) = open();
        let session = db.session();
        let table = session.entity_table("Attr").unwrap();

        let mut r = RecordProxy::new(table.clone());
        r.set("attr_name", "flow").unwrap();
        r.set("attr_dimen", "volume/time").unwrap();
        r.insert(&session).unwrap();
        assert!(!r.is_dirty());
        let id = r.get("attr_id").unwrap().as_i64().expect("Key should be generated");

        let mut loaded = RecordProxy::new(table);
        loaded.set("attr_id", id).unwrap();
        loaded.select_by_key(&session).unwrap();
        pretty_assertions::assert_eq!(loaded.to_json(), r.to_json());
    }

    #[test]
    fn test_select_missing_row() {
        let (_tdir, db) = open();
        let session = db.session();
        let mut r = RecordProxy::new(session.entity_table("Attr").unwrap());
        r.set("attr_id", 12345).unwrap();
        assert!(r.select_by_key(&session).unwrap_err().is_not_found());
    }

    #[test]
    fn test_null_key_refused() {
        let (_tdir, db) = open();
        let session = db.session();
        let mut r = RecordProxy::new(session.entity_table("ResourceScenario").unwrap());
        r.set("scenario_id", 1).unwrap();
        assert!(!r.has_complete_key());
        assert!(matches!(
            r.delete_by_key(&session),
            Err(Error::MissingKey { .. })
        ));
    }

    #[test]
    fn test_update_without_row_is_silent() {
        let (_tdir, db) = open();
        let session = db.session();
        let mut r = RecordProxy::new(session.entity_table("Attr").unwrap());
        r.set("attr_id", 99).unwrap();
        r.set("attr_name", "ghost").unwrap();
        assert_eq!(r.update(&session).unwrap(), 0);
        assert!(!r.is_dirty());
    }

    /// Insert a row of `entity`'s table with the given values, then select it back by key.
    fn round_trip(
        session: &Session,
        entity: &str,
        values: &[(&str, Value)],
    ) -> (RecordProxy, RecordProxy) {
        let table = session.entity_table(entity).unwrap();
        let mut inserted = RecordProxy::new(table.clone());
        for (c, v) in values {
            inserted.set(c, v.clone()).unwrap();
        }
        inserted.insert(session).unwrap();

        let mut loaded = RecordProxy::new(table.clone());
        for i in table.statements().key_indices() {
            let name = table.descriptor().get_column(*i).get_name();
            loaded.set(name, inserted.get(name).unwrap().clone()).unwrap();
        }
        loaded.select_by_key(session).unwrap();
        (inserted, loaded)
    }

    fn values(r: &RecordProxy) -> Vec<Value> {
        r.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Sqlite stores NaN as null.
    fn finite() -> impl Strategy<Value = f64> {
        any::<f64>().prop_filter("must be finite", |f| f.is_finite())
    }

    #[test]
    fn test_arbitrary_values_round_trip() {
        let (_tdir, db) = open();
        let session = db.session();

        let (project, _) = round_trip(
            &session,
            "Project",
            &[
                ("project_name", Value::from("p")),
                ("status", Value::from("A")),
            ],
        );
        let (network, _) = round_trip(
            &session,
            "Network",
            &[
                ("project_id", project.get("project_id").unwrap().clone()),
                ("network_name", Value::from("n")),
                ("status", Value::from("A")),
            ],
        );
        let network_id = network.get("network_id").unwrap().clone();
        let (attr, _) = round_trip(&session, "Attr", &[("attr_name", Value::from("a"))]);
        let attr_id = attr.get("attr_id").unwrap().clone();

        proptest!(ProptestConfig::with_cases(64), |(
            name in "\\PC{1,40}",
            description in proptest::option::of("\\PC{0,40}"),
            x in proptest::option::of(finite()),
            y in proptest::option::of(finite()),
            ref_id in any::<i64>(),
            ref_key in prop_oneof![Just("NETWORK"), Just("NODE"), Just("LINK")],
            is_var in prop_oneof![Just("Y"), Just("N")],
            units in proptest::option::of("\\PC{0,10}"),
        )| {
            let (inserted, loaded) = round_trip(
                &session,
                "Node",
                &[
                    ("network_id", network_id.clone()),
                    ("node_name", Value::from(name.clone())),
                    ("node_description", Value::from(description.clone())),
                    ("node_x", Value::from(x)),
                    ("node_y", Value::from(y)),
                    ("status", Value::from("A")),
                ],
            );
            prop_assert_eq!(values(&loaded), values(&inserted));

            let (inserted, loaded) = round_trip(
                &session,
                "ResourceAttr",
                &[
                    ("attr_id", attr_id.clone()),
                    ("ref_key", Value::from(ref_key)),
                    ("ref_id", Value::from(ref_id)),
                    ("attr_is_var", Value::from(is_var)),
                    ("cr_date", Value::from(description.clone())),
                ],
            );
            prop_assert_eq!(values(&loaded), values(&inserted));

            let (inserted, loaded) = round_trip(
                &session,
                "Dataset",
                &[
                    ("data_type", Value::from("descriptor")),
                    ("data_name", Value::from(name.clone())),
                    ("data_units", Value::from(units.clone())),
                    ("value", Value::from(description.clone().unwrap_or_default())),
                ],
            );
            prop_assert_eq!(values(&loaded), values(&inserted));
        });
    }
}
