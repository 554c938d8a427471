use anyhow::Result;
use hydra_datastore::{Attr, Entity, Link, Network, Node, ResourceAttr, Session};

use crate::convert::*;
use crate::fault::{invalid, not_found, ServiceFault};
use crate::models::*;
use crate::service::HydraService;

pub(crate) fn load_attr<'s>(session: &'s Session, id: i64) -> Result<Entity<'s, Attr>> {
    Entity::get_by_id(session, id)?.ok_or_else(|| not_found("attribute", id))
}

pub(crate) fn insert_resource_attr<'s>(
    session: &'s Session,
    ref_key: &str,
    ref_id: i64,
    attr_id: i64,
    is_var: bool,
) -> Result<Entity<'s, ResourceAttr>> {
    let mut ra = Entity::<ResourceAttr>::new(session)?;
    ra.set("attr_id", attr_id)?;
    ra.set("ref_key", ref_key)?;
    ra.set("ref_id", ref_id)?;
    ra.set("attr_is_var", if is_var { "Y" } else { "N" })?;
    ra.set("cr_date", now()?)?;
    ra.save()?;
    Ok(ra)
}

/// Fails with not found unless the resource exists and hasn't been deleted.
fn check_resource(session: &Session, resource: ResourceRef) -> Result<()> {
    let (kind, active) = match resource {
        ResourceRef::Network(i) => (
            "network",
            Entity::<Network>::get_by_id(session, i)?.map(|e| is_active(&e)),
        ),
        ResourceRef::Node(i) => (
            "node",
            Entity::<Node>::get_by_id(session, i)?.map(|e| is_active(&e)),
        ),
        ResourceRef::Link(i) => (
            "link",
            Entity::<Link>::get_by_id(session, i)?.map(|e| is_active(&e)),
        ),
    };
    match active {
        Some(true) => Ok(()),
        _ => Err(not_found(kind, resource.id())),
    }
}

impl HydraService {
    pub fn add_attribute(&self, attr: &AttrModel) -> Result<AttrModel, ServiceFault> {
        self.unit_of_work("add_attribute", |session| {
            if attr.name.trim().is_empty() {
                return Err(invalid("attribute name may not be empty"));
            }

            let mut a = Entity::<Attr>::new(session)?;
            a.set("attr_name", attr.name.as_str())?;
            a.set("attr_dimen", attr.dimension.clone())?;
            a.set("cr_date", now()?)?;
            a.save()?;
            attr_model(&a)
        })
    }

    pub fn get_attribute(&self, id: i64) -> Result<AttrModel, ServiceFault> {
        self.unit_of_work("get_attribute", |session| attr_model(&load_attr(session, id)?))
    }

    /// Attribute names are unique, so there's at most one.
    pub fn get_attribute_by_name(&self, name: &str) -> Result<Option<AttrModel>, ServiceFault> {
        self.unit_of_work("get_attribute_by_name", |session| {
            Entity::<Attr>::find_by(session, "attr_name", name)?
                .first()
                .map(attr_model)
                .transpose()
        })
    }

    /// Attach an attribute to a network, node or link.
    pub fn add_resource_attribute(
        &self,
        resource: ResourceRef,
        attr_id: i64,
        is_var: bool,
    ) -> Result<ResourceAttrModel, ServiceFault> {
        self.unit_of_work("add_resource_attribute", |session| {
            check_resource(session, resource)?;
            load_attr(session, attr_id)?;

            let ra = insert_resource_attr(
                session,
                resource.ref_key(),
                resource.id(),
                attr_id,
                is_var,
            )?;
            resource_attr_model(&ra)
        })
    }
}
