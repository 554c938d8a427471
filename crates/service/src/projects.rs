use anyhow::Result;
use hydra_datastore::{Entity, Project, Session};

use crate::convert::*;
use crate::fault::{invalid, not_found, ServiceFault};
use crate::models::*;
use crate::networks::network_model;
use crate::service::HydraService;

pub(crate) fn load_project<'s>(session: &'s Session, id: i64) -> Result<Entity<'s, Project>> {
    Entity::get_by_id(session, id)?.ok_or_else(|| not_found("project", id))
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid("project name may not be empty"));
    }
    Ok(())
}

impl HydraService {
    pub fn add_project(&self, project: &ProjectModel) -> Result<ProjectModel, ServiceFault> {
        self.unit_of_work("add_project", |session| {
            check_name(&project.name)?;

            let mut p = Entity::<Project>::new(session)?;
            p.set("project_name", project.name.as_str())?;
            p.set("project_description", project.description.clone())?;
            p.set("status", "A")?;
            p.set("cr_date", now()?)?;
            p.save()?;
            project_model(&p)
        })
    }

    pub fn get_project(&self, id: i64) -> Result<ProjectModel, ServiceFault> {
        self.unit_of_work("get_project", |session| {
            project_model(&load_project(session, id)?)
        })
    }

    /// Replace a project's name and description.
    pub fn update_project(&self, project: &ProjectModel) -> Result<ProjectModel, ServiceFault> {
        self.unit_of_work("update_project", |session| {
            let id = project
                .id
                .ok_or_else(|| invalid("updating a project requires its id"))?;
            check_name(&project.name)?;

            let mut p = load_project(session, id)?;
            p.set("project_name", project.name.as_str())?;
            p.set("project_description", project.description.clone())?;
            p.save()?;
            project_model(&p)
        })
    }

    /// Mark a project deleted.  Its rows stay.
    pub fn delete_project(&self, id: i64) -> Result<(), ServiceFault> {
        self.unit_of_work("delete_project", |session| {
            let mut p = load_project(session, id)?;
            p.set("status", "X")?;
            p.save()?;
            Ok(())
        })
    }

    /// The project's networks which haven't been deleted, with everything in them.
    pub fn get_networks(&self, project_id: i64) -> Result<Vec<NetworkModel>, ServiceFault> {
        self.unit_of_work("get_networks", |session| {
            load_project(session, project_id)?
                .networks()?
                .iter()
                .filter(|n| is_active(*n))
                .map(network_model)
                .collect()
        })
    }
}
