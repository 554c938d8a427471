use std::collections::HashMap;

use anyhow::{Context, Result};
use hydra_datastore::{AttributeHolder, Entity, Link, Network, Node, ResourceAttr, Session};

use crate::attributes::{insert_resource_attr, load_attr};
use crate::convert::*;
use crate::fault::{invalid, not_found, ServiceFault};
use crate::models::*;
use crate::projects::load_project;
use crate::scenarios::{insert_scenario, scenario_model};
use crate::service::HydraService;

/// Maps the negative placeholder ids of a request to the ids the rows got.
#[derive(Debug, Default)]
pub(crate) struct IdMap {
    kind: &'static str,
    ids: HashMap<i64, i64>,
}

impl IdMap {
    pub(crate) fn new(kind: &'static str) -> IdMap {
        IdMap {
            kind,
            ids: Default::default(),
        }
    }

    pub(crate) fn record(&mut self, requested: Option<i64>, actual: i64) -> Result<()> {
        if let Some(r) = requested.filter(|r| *r < 0) {
            if self.ids.insert(r, actual).is_some() {
                return Err(invalid(format!(
                    "placeholder {} id {} is used twice",
                    self.kind, r
                )));
            }
        }
        Ok(())
    }

    /// Placeholders become real ids; real ids pass through.
    pub(crate) fn resolve(&self, id: i64) -> Result<i64> {
        if id >= 0 {
            return Ok(id);
        }
        self.ids
            .get(&id)
            .copied()
            .ok_or_else(|| invalid(format!("unknown placeholder {} id {}", self.kind, id)))
    }
}

pub(crate) fn load_network<'s>(session: &'s Session, id: i64) -> Result<Entity<'s, Network>> {
    Entity::get_by_id(session, id)?.ok_or_else(|| not_found("network", id))
}

fn load_node<'s>(session: &'s Session, id: i64) -> Result<Entity<'s, Node>> {
    Entity::get_by_id(session, id)?.ok_or_else(|| not_found("node", id))
}

fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid(format!("{} name may not be empty", kind)));
    }
    Ok(())
}

/// Attach each of `attrs` to `owner`, recording placeholder ids.
fn insert_attributes<K: AttributeHolder>(
    session: &Session,
    owner: &Entity<'_, K>,
    attrs: &[ResourceAttrModel],
    ids: &mut IdMap,
) -> Result<()> {
    for a in attrs {
        load_attr(session, a.attr_id)?;
        let ra = insert_resource_attr(session, K::REF_KEY, id(owner)?, a.attr_id, a.is_var)?;
        ids.record(a.id, id(&ra)?)?;
    }
    Ok(())
}

fn insert_node<'s>(
    session: &'s Session,
    network_id: i64,
    node: &NodeModel,
) -> Result<Entity<'s, Node>> {
    check_name("node", &node.name)?;

    let mut n = Entity::<Node>::new(session)?;
    n.set("network_id", network_id)?;
    n.set("node_name", node.name.as_str())?;
    n.set("node_description", node.description.clone())?;
    n.set("node_x", node.x)?;
    n.set("node_y", node.y)?;
    n.set("status", "A")?;
    n.set("cr_date", now()?)?;
    n.save()?;
    Ok(n)
}

/// Insert a link between nodes which must both be active members of `network_id`.
fn insert_link<'s>(
    session: &'s Session,
    network_id: i64,
    link: &LinkModel,
    nodes: &IdMap,
) -> Result<Entity<'s, Link>> {
    check_name("link", &link.name)?;

    let mut endpoints = [0i64; 2];
    for (slot, requested) in endpoints.iter_mut().zip([link.node_1_id, link.node_2_id]) {
        let node_id = nodes.resolve(requested)?;
        let node = load_node(session, node_id)?;
        if required_int(&node, "network_id")? != network_id || !is_active(&node) {
            return Err(invalid(format!(
                "link {} refers to node {}, which isn't in network {}",
                link.name, node_id, network_id
            )));
        }
        *slot = node_id;
    }

    let mut l = Entity::<Link>::new(session)?;
    l.set("network_id", network_id)?;
    l.set("node_1_id", endpoints[0])?;
    l.set("node_2_id", endpoints[1])?;
    l.set("link_name", link.name.as_str())?;
    l.set("link_description", link.description.clone())?;
    l.set("status", "A")?;
    l.set("cr_date", now()?)?;
    l.save()?;
    Ok(l)
}

/// Read a network back with its active nodes, links and scenarios.
pub(crate) fn network_model(e: &Entity<'_, Network>) -> Result<NetworkModel> {
    let nodes = e.nodes()?;
    let links = e.links()?;
    let scenarios = e.scenarios()?;

    Ok(NetworkModel {
        id: Some(id(e)?),
        project_id: required_int(e, "project_id")?,
        name: required_text(e, "network_name")?,
        description: text(e, "network_description")?,
        layout: json(e, "network_layout")?,
        status: text(e, "status")?,
        created_at: text(e, "cr_date")?,
        nodes: nodes
            .iter()
            .filter(|n| is_active(*n))
            .map(node_model)
            .collect::<Result<_>>()?,
        links: links
            .iter()
            .filter(|l| is_active(*l))
            .map(link_model)
            .collect::<Result<_>>()?,
        scenarios: scenarios
            .iter()
            .filter(|s| is_active(*s))
            .map(scenario_model)
            .collect::<Result<_>>()?,
        attributes: e
            .resource_attributes()?
            .iter()
            .map(resource_attr_model)
            .collect::<Result<_>>()?,
    })
}

impl HydraService {
    /// Create a network and everything in it.
    ///
    /// Nodes may be given negative placeholder ids for links in the same request to refer to, and likewise resource
    /// attributes for scenarios.
    pub fn add_network(&self, network: &NetworkModel) -> Result<NetworkModel, ServiceFault> {
        self.unit_of_work("add_network", |session| {
            check_name("network", &network.name)?;
            load_project(session, network.project_id)?;

            let mut net = Entity::<Network>::new(session)?;
            net.set("project_id", network.project_id)?;
            net.set("network_name", network.name.as_str())?;
            net.set("network_description", network.description.clone())?;
            net.set("network_layout", json_text(&network.layout)?)?;
            net.set("status", "A")?;
            net.set("cr_date", now()?)?;
            net.save()?;
            let network_id = id(&net)?;

            let mut node_ids = IdMap::new("node");
            let mut attr_ids = IdMap::new("resource attribute");
            insert_attributes(session, &net, &network.attributes, &mut attr_ids)?;

            for node in &network.nodes {
                let n = insert_node(session, network_id, node)
                    .with_context(|| format!("adding node {}", node.name))?;
                node_ids.record(node.id, id(&n)?)?;
                insert_attributes(session, &n, &node.attributes, &mut attr_ids)?;
            }

            for link in &network.links {
                let l = insert_link(session, network_id, link, &node_ids)
                    .with_context(|| format!("adding link {}", link.name))?;
                insert_attributes(session, &l, &link.attributes, &mut attr_ids)?;
            }

            for scenario in &network.scenarios {
                insert_scenario(session, network_id, scenario, &attr_ids)
                    .with_context(|| format!("adding scenario {}", scenario.name))?;
            }

            network_model(&net)
        })
    }

    pub fn get_network(&self, id: i64) -> Result<NetworkModel, ServiceFault> {
        self.unit_of_work("get_network", |session| {
            network_model(&load_network(session, id)?)
        })
    }

    /// Mark a network deleted.  Its rows stay.
    pub fn delete_network(&self, id: i64) -> Result<(), ServiceFault> {
        self.unit_of_work("delete_network", |session| {
            let mut n = load_network(session, id)?;
            n.set("status", "X")?;
            n.save()?;
            Ok(())
        })
    }

    pub fn add_node(&self, network_id: i64, node: &NodeModel) -> Result<NodeModel, ServiceFault> {
        self.unit_of_work("add_node", |session| {
            load_network(session, network_id)?;
            let n = insert_node(session, network_id, node)?;
            let mut attrs = IdMap::new("resource attribute");
            insert_attributes(session, &n, &node.attributes, &mut attrs)?;
            node_model(&n)
        })
    }

    /// Replace a node's name, description and position.
    pub fn update_node(&self, node: &NodeModel) -> Result<NodeModel, ServiceFault> {
        self.unit_of_work("update_node", |session| {
            let node_id = node
                .id
                .ok_or_else(|| invalid("updating a node requires its id"))?;
            check_name("node", &node.name)?;

            let mut n = load_node(session, node_id)?;
            n.set("node_name", node.name.as_str())?;
            n.set("node_description", node.description.clone())?;
            n.set("node_x", node.x)?;
            n.set("node_y", node.y)?;
            n.save()?;
            node_model(&n)
        })
    }

    /// Mark a node deleted, along with the links touching it.
    pub fn delete_node(&self, node_id: i64) -> Result<(), ServiceFault> {
        self.unit_of_work("delete_node", |session| {
            let mut n = load_node(session, node_id)?;
            n.set("status", "X")?;
            n.save()?;

            for column in ["node_1_id", "node_2_id"] {
                for mut l in Entity::<Link>::find_by(session, column, node_id)? {
                    l.set("status", "X")?;
                    l.save()?;
                }
            }
            Ok(())
        })
    }

    pub fn add_link(&self, network_id: i64, link: &LinkModel) -> Result<LinkModel, ServiceFault> {
        self.unit_of_work("add_link", |session| {
            load_network(session, network_id)?;
            let l = insert_link(session, network_id, link, &IdMap::new("node"))?;
            let mut attrs = IdMap::new("resource attribute");
            insert_attributes(session, &l, &link.attributes, &mut attrs)?;
            link_model(&l)
        })
    }
}

/// Whether a resource attribute hangs off `network_id` or something in it.
pub(crate) fn resource_attr_in_network(
    session: &Session,
    ra: &Entity<'_, ResourceAttr>,
    network_id: i64,
) -> Result<bool> {
    let ref_id = required_int(ra, "ref_id")?;
    let owner_network = match required_text(ra, "ref_key")?.as_str() {
        "NETWORK" => Some(ref_id),
        "NODE" => Entity::<Node>::get_by_id(session, ref_id)?
            .map(|n| required_int(&n, "network_id"))
            .transpose()?,
        "LINK" => Entity::<Link>::get_by_id(session, ref_id)?
            .map(|l| required_int(&l, "network_id"))
            .transpose()?,
        _ => None,
    };
    Ok(owner_network == Some(network_id))
}
