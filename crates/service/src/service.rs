use hydra_datastore::{Database, DatabaseConfig, Session};
use log::*;

use crate::fault::ServiceFault;

pub struct HydraService {
    db: Database,
}

impl HydraService {
    pub fn new(db: Database) -> HydraService {
        HydraService { db }
    }

    pub fn open(config: DatabaseConfig) -> Result<HydraService, ServiceFault> {
        let db = Database::open(config).map_err(anyhow::Error::from)?;
        Ok(HydraService::new(db))
    }

    pub fn get_database(&self) -> &Database {
        &self.db
    }

    /// Run one request against a fresh session.
    ///
    /// Commits if `work` succeeds.  Otherwise rolls back and turns the error into a fault.
    pub(crate) fn unit_of_work<T>(
        &self,
        operation: &str,
        work: impl FnOnce(&Session) -> anyhow::Result<T>,
    ) -> Result<T, ServiceFault> {
        let session = self.db.session();
        debug!("Starting {}", operation);

        let result = work(&session).and_then(|r| {
            session.commit()?;
            Ok(r)
        });

        match result {
            Ok(r) => {
                info!("{} succeeded", operation);
                Ok(r)
            }
            Err(e) => {
                warn!("{} failed: {:#}", operation, e);
                if let Err(rb) = session.rollback() {
                    error!("Rolling back {} failed: {}", operation, rb);
                }
                Err(e.into())
            }
        }
    }
}
