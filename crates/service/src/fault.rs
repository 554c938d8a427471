use serde::{Deserialize, Serialize};

/// Broad categories of failure, for clients to branch on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum FaultCode {
    NotFound,
    SchemaError,
    InvalidInput,
    DatabaseError,
    InternalError,
}

/// What a failed request returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ServiceFault {
    pub code: FaultCode,
    pub message: String,
}

/// Failures a request handler raises itself, as opposed to those coming up from the datastore.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RequestError {
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("{0}")]
    InvalidInput(String),
}

pub(crate) fn invalid(message: impl Into<String>) -> anyhow::Error {
    RequestError::InvalidInput(message.into()).into()
}

pub(crate) fn not_found(kind: &'static str, id: i64) -> anyhow::Error {
    RequestError::NotFound { kind, id }.into()
}

fn classify(e: &anyhow::Error) -> FaultCode {
    if let Some(r) = e.downcast_ref::<RequestError>() {
        return match r {
            RequestError::NotFound { .. } => FaultCode::NotFound,
            RequestError::InvalidInput(_) => FaultCode::InvalidInput,
        };
    }

    if let Some(d) = e.downcast_ref::<hydra_datastore::Error>() {
        use hydra_datastore::Error;

        return match d {
            Error::Schema(_) | Error::UnknownColumn { .. } => FaultCode::SchemaError,
            Error::NotFound { .. } => FaultCode::NotFound,
            Error::MissingKey { .. } | Error::Deleted { .. } => FaultCode::InvalidInput,
            Error::Sql(_) => FaultCode::DatabaseError,
            _ => FaultCode::InternalError,
        };
    }

    FaultCode::InternalError
}

impl From<anyhow::Error> for ServiceFault {
    fn from(e: anyhow::Error) -> Self {
        ServiceFault {
            code: classify(&e),
            message: format!("{:#}", e),
        }
    }
}
