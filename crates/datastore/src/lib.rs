//! The Hydra datastore.
//!
//! This crate maps Hydra's entities (projects, networks, nodes, links, scenarios, attributes, datasets, templates) onto
//! tables in an sqlite database, without knowing the shape of any of them ahead of time.  There are 4 layers:
//!
//! - Reflection, which asks sqlite what columns a table has and builds a [TableDescriptor] and the statements for it.
//!   This happens once per table per [Database].
//! - The [RecordProxy], which holds one value per column and tracks whether any were written.
//! - The [Entity], which wraps a record with whether the row exists, and provides load/save/delete.
//! - The [Session], which owns a connection and its transaction.  Each unit of work gets its own.
//!
//! Values never get formatted into SQL: every statement binds them as parameters.  [RecordProxy::value_literal] and
//! [RecordProxy::describe] render values the way they'd look in SQL for logs.
mod config;
mod database;
mod descriptor;
mod entity;
mod errors;
mod record;
mod reflect;
pub mod schema;
mod session;
mod statements;
mod value;

pub use config::*;
pub use database::*;
pub use descriptor::*;
pub use entity::*;
pub use errors::*;
pub use record::*;
pub use reflect::{reflect_table, Table};
pub use session::*;
pub use statements::{quote_ident, TableStatements};
pub use value::*;
