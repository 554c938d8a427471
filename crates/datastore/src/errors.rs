#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("Table {0} does not exist")]
    NoSuchTable(String),

    #[error("Table {table} reports column {column} more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("{0:?} is not a valid table name")]
    InvalidTableName(String),

    #[error("Table {0} has no primary key, so rows can't be addressed individually")]
    NoPrimaryKey(String),

    #[error("Table {0} has no generated key, so its rows have no single id")]
    NoGeneratedKey(String),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Schema error: {}", _0)]
    Schema(#[from] SchemaError),

    #[error("Table {table} has no column named {column}")]
    UnknownColumn { table: String, column: String },

    #[error("No row in {table} matches the primary key")]
    NotFound { table: String },

    #[error("Primary key column {table}.{column} is null")]
    MissingKey { table: String, column: String },

    #[error("This {table} entity was deleted and can no longer be used")]
    Deleted { table: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Sqlite error: {}", _0)]
    Sql(#[from] rusqlite::Error),

    #[error("Template error: {}", _0)]
    Template(#[from] tera::Error),

    #[error("I/O error: {}", _0)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {}", _0)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is the typed not-found condition, as opposed to a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
