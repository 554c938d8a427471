//! Entities.
//!
//! There is one entity type, [Entity], parameterized by a kind which names the table.  Kinds are zero-sized markers:
//! all the structure comes from reflecting the table.  Some kinds get helpers for walking to related entities.
//!
//! An entity is `New` until it is saved or successfully loaded, then `Persisted`.  Deleting a persisted entity makes it
//! `Deleted`, which is terminal: anything but reading its values fails from then on.
use std::marker::PhantomData;

use log::*;

use crate::errors::*;
use crate::record::RecordProxy;
use crate::session::Session;
use crate::statements::build_select_where;
use crate::value::Value;

/// A kind of entity, backed by the table named by the configured prefix plus [EntityKind::NAME].
pub trait EntityKind {
    const NAME: &'static str;
}

/// Kinds which can have attributes attached through `ResourceAttr`.
pub trait AttributeHolder: EntityKind {
    /// What `ResourceAttr.ref_key` holds for this kind.
    const REF_KEY: &'static str;
    /// The column holding this kind's id.
    const ID_COLUMN: &'static str;
}

macro_rules! entity_kinds {
    ($($(#[$meta:meta])* $kind:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Copy, Clone, Debug, Eq, PartialEq)]
            pub struct $kind;

            impl EntityKind for $kind {
                const NAME: &'static str = stringify!($kind);
            }
        )*
    };
}

entity_kinds!(
    Project,
    Network,
    Node,
    Link,
    Scenario,
    /// An attribute definition, e.g. "capacity".
    Attr,
    /// An attribute attached to a network, node or link.
    ResourceAttr,
    Dataset,
    /// The value of a resource attribute within one scenario.
    ResourceScenario,
    Template,
    TemplateItem,
);

impl AttributeHolder for Network {
    const REF_KEY: &'static str = "NETWORK";
    const ID_COLUMN: &'static str = "network_id";
}

impl AttributeHolder for Node {
    const REF_KEY: &'static str = "NODE";
    const ID_COLUMN: &'static str = "node_id";
}

impl AttributeHolder for Link {
    const REF_KEY: &'static str = "LINK";
    const ID_COLUMN: &'static str = "link_id";
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EntityState {
    /// Not known to be in the database.
    New,
    /// Saved or loaded.
    Persisted,
    /// Deleted from the database.
    Deleted,
}

pub struct Entity<'s, K> {
    session: &'s Session,
    record: RecordProxy,
    state: EntityState,
    kind: PhantomData<fn() -> K>,
}

impl<'s, K: EntityKind> Entity<'s, K> {
    /// An empty entity.  Reflects the table if this is the first use of it.
    pub fn new(session: &'s Session) -> Result<Self> {
        let table = session.entity_table(K::NAME)?;
        Ok(Entity {
            session,
            record: RecordProxy::new(table),
            state: EntityState::New,
            kind: PhantomData,
        })
    }

    /// An entity with some values already set, usually the key for a following [Entity::load].
    pub fn with_values<C, V>(
        session: &'s Session,
        values: impl IntoIterator<Item = (C, V)>,
    ) -> Result<Self>
    where
        C: AsRef<str>,
        V: Into<Value>,
    {
        let mut ret = Self::new(session)?;
        for (c, v) in values {
            ret.record.set(c.as_ref(), v)?;
        }
        Ok(ret)
    }

    /// Load the entity whose auto-increment key is `id`, if there is one.
    pub fn get_by_id(session: &'s Session, id: i64) -> Result<Option<Self>> {
        let mut ret = Self::new(session)?;
        let index = match ret.record.get_table().descriptor().auto_increment_index() {
            Some(i) => i,
            None => {
                let table = ret.record.get_table_name().to_string();
                return Err(SchemaError::NoGeneratedKey(table).into());
            }
        };
        let column = ret
            .record
            .get_table()
            .descriptor()
            .get_column(index)
            .get_name()
            .to_string();
        ret.record.set(&column, id)?;
        Ok(if ret.load()? { Some(ret) } else { None })
    }

    /// Every entity of this kind matching all of `filters`, ordered by primary key.
    pub fn find_where(session: &'s Session, filters: &[(&str, Value)]) -> Result<Vec<Self>> {
        let table = session.entity_table(K::NAME)?;
        for (c, _) in filters {
            if table.descriptor().column_index(c).is_none() {
                return Err(Error::UnknownColumn {
                    table: table.get_name().to_string(),
                    column: c.to_string(),
                });
            }
        }

        let columns = filters.iter().map(|(c, _)| *c).collect::<Vec<_>>();
        let params = filters.iter().map(|(_, v)| v).collect::<Vec<_>>();
        let sql = build_select_where(table.descriptor(), &columns)?;

        let mut ret = vec![];
        session.query(&sql, &params[..], |row| {
            ret.push(Entity {
                session,
                record: RecordProxy::from_row(table.clone(), row)?,
                state: EntityState::Persisted,
                kind: PhantomData,
            });
            Ok(())
        })?;
        Ok(ret)
    }

    /// Every entity of this kind whose `column` equals `value`.
    pub fn find_by(
        session: &'s Session,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<Self>> {
        Self::find_where(session, &[(column, value.into())])
    }

    pub fn get_session(&self) -> &'s Session {
        self.session
    }

    pub fn get_record(&self) -> &RecordProxy {
        &self.record
    }

    pub fn get_state(&self) -> EntityState {
        self.state
    }

    pub fn is_in_db(&self) -> bool {
        self.state == EntityState::Persisted
    }

    pub fn is_dirty(&self) -> bool {
        self.record.is_dirty()
    }

    pub fn get(&self, column: &str) -> Result<&Value> {
        self.record.get(column)
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        self.record.set(column, value)
    }

    /// Value of the auto-increment key, once there is one.
    pub fn id(&self) -> Option<i64> {
        let index = self.record.get_table().descriptor().auto_increment_index()?;
        let name = self.record.get_table().descriptor().get_column(index).get_name();
        self.record.get(name).ok().and_then(Value::as_i64)
    }

    fn check_not_deleted(&self) -> Result<()> {
        if self.state == EntityState::Deleted {
            return Err(Error::Deleted {
                table: self.record.get_table_name().to_string(),
            });
        }
        Ok(())
    }

    /// Load by primary key.
    ///
    /// Returns false, without touching the database, if any key column is null; returns false if there's no such row,
    /// in which case the entity is `New` afterwards even if it was loaded or saved before.  On success every value is
    /// replaced by the stored one.
    pub fn load(&mut self) -> Result<bool> {
        self.check_not_deleted()?;
        if !self.record.get_table().descriptor().has_primary_key() {
            return Err(SchemaError::NoPrimaryKey(self.record.get_table_name().to_string()).into());
        }
        if !self.record.has_complete_key() {
            debug!(
                "Not loading {}: the key is incomplete",
                self.record.get_table_name()
            );
            return Ok(false);
        }

        match self.record.select_by_key(self.session) {
            Ok(()) => {
                self.state = EntityState::Persisted;
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                self.state = EntityState::New;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Insert if new, update if changed, otherwise do nothing.  Doesn't commit.
    pub fn save(&mut self) -> Result<()> {
        self.check_not_deleted()?;
        match self.state {
            EntityState::New => {
                self.record.insert(self.session)?;
                self.state = EntityState::Persisted;
            }
            EntityState::Persisted if self.record.is_dirty() => {
                self.record.update(self.session)?;
            }
            _ => {
                trace!("{} is unchanged", self.record.get_table_name());
            }
        }
        Ok(())
    }

    /// Delete the row, if this entity has one.  Doesn't commit.
    pub fn delete(&mut self) -> Result<()> {
        self.check_not_deleted()?;
        if self.state == EntityState::Persisted {
            self.record.delete_by_key(self.session)?;
            self.state = EntityState::Deleted;
        }
        Ok(())
    }

    /// Commit the session's transaction, which may hold other entities' changes too.
    pub fn commit(&self) -> Result<()> {
        self.session.commit()
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.record.to_json()
    }

    /// The `P` whose `their_column` equals our `own_column`, if our column is set and such a row exists.
    fn lookup<P: EntityKind>(
        &self,
        own_column: &str,
        their_column: &str,
    ) -> Result<Option<Entity<'s, P>>> {
        let v = self.get(own_column)?.clone();
        if v.is_null() {
            return Ok(None);
        }
        Ok(Entity::<P>::find_by(self.session, their_column, v)?
            .into_iter()
            .next())
    }

    /// Every `C` whose `column` equals our value of the same column.
    fn children<C: EntityKind>(&self, column: &str) -> Result<Vec<Entity<'s, C>>> {
        let v = self.get(column)?.clone();
        if v.is_null() {
            return Ok(vec![]);
        }
        Entity::<C>::find_by(self.session, column, v)
    }
}

impl<'s, K: AttributeHolder> Entity<'s, K> {
    pub fn resource_attributes(&self) -> Result<Vec<Entity<'s, ResourceAttr>>> {
        let id = self.get(K::ID_COLUMN)?.clone();
        if id.is_null() {
            return Ok(vec![]);
        }
        Entity::<ResourceAttr>::find_where(
            self.session,
            &[("ref_key", K::REF_KEY.into()), ("ref_id", id)],
        )
    }
}

impl<'s> Entity<'s, Project> {
    pub fn networks(&self) -> Result<Vec<Entity<'s, Network>>> {
        self.children("project_id")
    }
}

impl<'s> Entity<'s, Network> {
    pub fn project(&self) -> Result<Option<Entity<'s, Project>>> {
        self.lookup("project_id", "project_id")
    }

    pub fn nodes(&self) -> Result<Vec<Entity<'s, Node>>> {
        self.children("network_id")
    }

    pub fn links(&self) -> Result<Vec<Entity<'s, Link>>> {
        self.children("network_id")
    }

    pub fn scenarios(&self) -> Result<Vec<Entity<'s, Scenario>>> {
        self.children("network_id")
    }
}

impl<'s> Entity<'s, Link> {
    pub fn node_1(&self) -> Result<Option<Entity<'s, Node>>> {
        self.lookup("node_1_id", "node_id")
    }

    pub fn node_2(&self) -> Result<Option<Entity<'s, Node>>> {
        self.lookup("node_2_id", "node_id")
    }
}

impl<'s> Entity<'s, Scenario> {
    pub fn resource_scenarios(&self) -> Result<Vec<Entity<'s, ResourceScenario>>> {
        self.children("scenario_id")
    }
}

impl<'s> Entity<'s, ResourceScenario> {
    pub fn dataset(&self) -> Result<Option<Entity<'s, Dataset>>> {
        self.lookup("dataset_id", "dataset_id")
    }
}

impl<'s> Entity<'s, ResourceAttr> {
    pub fn attr(&self) -> Result<Option<Entity<'s, Attr>>> {
        self.lookup("attr_id", "attr_id")
    }
}

impl<'s> Entity<'s, Template> {
    pub fn items(&self) -> Result<Vec<Entity<'s, TemplateItem>>> {
        self.children("template_id")
    }
}

impl<'s, K> std::fmt::Debug for Entity<'s, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("table", &self.record.get_table_name())
            .field("state", &self.state)
            .field("dirty", &self.record.is_dirty())
            .finish()
    }
}
