//! Hydra's service operations.
//!
//! Each public method of [HydraService] is one request: it gets its own session, commits if everything worked, and
//! otherwise rolls back and reports a [ServiceFault].  Requests and responses are plain serde models, so any RPC
//! layer can carry them.
mod attributes;
mod convert;
mod fault;
mod models;
mod networks;
mod projects;
mod scenarios;
mod service;
mod templates;

pub use fault::*;
pub use models::*;
pub use service::*;
