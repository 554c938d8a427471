use anyhow::{Context, Result};
use hydra_datastore::{Dataset, Entity, ResourceAttr, ResourceScenario, Scenario, Session};

use crate::convert::*;
use crate::fault::{invalid, not_found, ServiceFault};
use crate::models::*;
use crate::networks::{load_network, resource_attr_in_network, IdMap};
use crate::service::HydraService;

fn load_scenario<'s>(session: &'s Session, id: i64) -> Result<Entity<'s, Scenario>> {
    Entity::get_by_id(session, id)?.ok_or_else(|| not_found("scenario", id))
}

fn insert_dataset<'s>(session: &'s Session, data: &DatasetModel) -> Result<Entity<'s, Dataset>> {
    if data.name.trim().is_empty() {
        return Err(invalid("dataset name may not be empty"));
    }
    if data.data_type.trim().is_empty() {
        return Err(invalid(format!("dataset {} has no type", data.name)));
    }

    let mut d = Entity::<Dataset>::new(session)?;
    d.set("data_type", data.data_type.as_str())?;
    d.set("data_name", data.name.as_str())?;
    d.set("data_units", data.units.clone())?;
    d.set("data_dimen", data.dimension.clone())?;
    d.set("value", serde_json::to_string(&data.value)?)?;
    d.set("cr_date", now()?)?;
    d.save()?;
    Ok(d)
}

/// Point the resource attribute at a new dataset within the scenario, replacing whatever it had.
fn set_resource_data(
    session: &Session,
    scenario_id: i64,
    network_id: i64,
    resource_attr_id: i64,
    data: &DatasetModel,
) -> Result<()> {
    let ra = Entity::<ResourceAttr>::get_by_id(session, resource_attr_id)?
        .ok_or_else(|| not_found("resource attribute", resource_attr_id))?;
    if !resource_attr_in_network(session, &ra, network_id)? {
        return Err(invalid(format!(
            "resource attribute {} isn't part of network {}",
            resource_attr_id, network_id
        )));
    }

    let dataset = insert_dataset(session, data)?;
    let mut rs = Entity::<ResourceScenario>::with_values(
        session,
        [("resource_attr_id", resource_attr_id), ("scenario_id", scenario_id)],
    )?;
    // Loading replaces the values, so the new dataset goes in afterwards.
    rs.load()?;
    rs.set("dataset_id", id(&dataset)?)?;
    rs.save()?;
    Ok(())
}

/// Insert a scenario and its data, resolving placeholder resource attribute ids through `attrs`.
pub(crate) fn insert_scenario<'s>(
    session: &'s Session,
    network_id: i64,
    scenario: &ScenarioModel,
    attrs: &IdMap,
) -> Result<Entity<'s, Scenario>> {
    if scenario.name.trim().is_empty() {
        return Err(invalid("scenario name may not be empty"));
    }

    let mut s = Entity::<Scenario>::new(session)?;
    s.set("network_id", network_id)?;
    s.set("scenario_name", scenario.name.as_str())?;
    s.set("scenario_description", scenario.description.clone())?;
    s.set("status", "A")?;
    s.set("cr_date", now()?)?;
    s.save()?;
    let scenario_id = id(&s)?;

    for rs in &scenario.resource_scenarios {
        let resource_attr_id = attrs.resolve(rs.resource_attr_id)?;
        set_resource_data(session, scenario_id, network_id, resource_attr_id, &rs.value)
            .with_context(|| format!("setting data for resource attribute {}", resource_attr_id))?;
    }
    Ok(s)
}

pub(crate) fn scenario_model(e: &Entity<'_, Scenario>) -> Result<ScenarioModel> {
    let resource_scenarios = e
        .resource_scenarios()?
        .iter()
        .map(|rs| -> Result<ResourceScenarioModel> {
            let dataset = rs
                .dataset()?
                .ok_or_else(|| anyhow::anyhow!("resource scenario has no dataset"))?;
            Ok(ResourceScenarioModel {
                resource_attr_id: required_int(rs, "resource_attr_id")?,
                value: dataset_model(&dataset)?,
            })
        })
        .collect::<Result<_>>()?;

    Ok(ScenarioModel {
        id: Some(id(e)?),
        network_id: int(e, "network_id")?,
        name: required_text(e, "scenario_name")?,
        description: text(e, "scenario_description")?,
        status: text(e, "status")?,
        resource_scenarios,
    })
}

impl HydraService {
    /// Add a scenario to an existing network.  Its data must belong to resource attributes of that network.
    pub fn add_scenario(
        &self,
        network_id: i64,
        scenario: &ScenarioModel,
    ) -> Result<ScenarioModel, ServiceFault> {
        self.unit_of_work("add_scenario", |session| {
            load_network(session, network_id)?;
            let attrs = IdMap::new("resource attribute");
            let s = insert_scenario(session, network_id, scenario, &attrs)?;
            scenario_model(&s)
        })
    }

    pub fn get_scenario(&self, id: i64) -> Result<ScenarioModel, ServiceFault> {
        self.unit_of_work("get_scenario", |session| scenario_model(&load_scenario(session, id)?))
    }

    /// Give a resource attribute a new value within a scenario.
    ///
    /// The old dataset stays, since other scenarios may share it.
    pub fn update_resource_data(
        &self,
        scenario_id: i64,
        resource_attr_id: i64,
        data: &DatasetModel,
    ) -> Result<ScenarioModel, ServiceFault> {
        self.unit_of_work("update_resource_data", |session| {
            let s = load_scenario(session, scenario_id)?;
            if !is_active(&s) {
                return Err(not_found("scenario", scenario_id));
            }
            let network_id = required_int(&s, "network_id")?;
            set_resource_data(session, scenario_id, network_id, resource_attr_id, data)?;
            scenario_model(&s)
        })
    }
}
