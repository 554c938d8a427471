//! Reading typed values out of entities, and entities into models.
use anyhow::{anyhow, Context, Result};
use hydra_datastore::{
    Attr, Dataset, Entity, EntityKind, Link, Node, Project, ResourceAttr, Value,
};

use crate::models::*;

pub(crate) fn text<K: EntityKind>(e: &Entity<'_, K>, column: &str) -> Result<Option<String>> {
    match e.get(column)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s.clone())),
        other => Err(anyhow!("{}.{} should be text, not {:?}", K::NAME, column, other)),
    }
}

pub(crate) fn required_text<K: EntityKind>(e: &Entity<'_, K>, column: &str) -> Result<String> {
    text(e, column)?.ok_or_else(|| anyhow!("{}.{} is null", K::NAME, column))
}

pub(crate) fn int<K: EntityKind>(e: &Entity<'_, K>, column: &str) -> Result<Option<i64>> {
    match e.get(column)? {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(*i)),
        other => Err(anyhow!("{}.{} should be an integer, not {:?}", K::NAME, column, other)),
    }
}

pub(crate) fn required_int<K: EntityKind>(e: &Entity<'_, K>, column: &str) -> Result<i64> {
    int(e, column)?.ok_or_else(|| anyhow!("{}.{} is null", K::NAME, column))
}

/// Reals may come back as integers if they were whole when stored.
pub(crate) fn real<K: EntityKind>(e: &Entity<'_, K>, column: &str) -> Result<Option<f64>> {
    let v = e.get(column)?;
    if v.is_null() {
        return Ok(None);
    }
    v.as_f64()
        .map(Some)
        .ok_or_else(|| anyhow!("{}.{} should be a number, not {:?}", K::NAME, column, v))
}

/// A column holding JSON text.
pub(crate) fn json<K: EntityKind>(
    e: &Entity<'_, K>,
    column: &str,
) -> Result<Option<serde_json::Value>> {
    text(e, column)?
        .map(|s| {
            serde_json::from_str(&s)
                .with_context(|| format!("{}.{} isn't JSON", K::NAME, column))
        })
        .transpose()
}

pub(crate) fn json_text(v: &Option<serde_json::Value>) -> Result<Option<String>> {
    Ok(v.as_ref().map(serde_json::to_string).transpose()?)
}

pub(crate) fn id<K: EntityKind>(e: &Entity<'_, K>) -> Result<i64> {
    e.id().ok_or_else(|| anyhow!("{} has no id", K::NAME))
}

/// The current time, for `cr_date` columns.
pub(crate) fn now() -> Result<String> {
    Ok(time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339)?)
}

pub(crate) fn project_model(e: &Entity<'_, Project>) -> Result<ProjectModel> {
    Ok(ProjectModel {
        id: Some(id(e)?),
        name: required_text(e, "project_name")?,
        description: text(e, "project_description")?,
        status: text(e, "status")?,
        created_at: text(e, "cr_date")?,
    })
}

pub(crate) fn resource_attr_model(e: &Entity<'_, ResourceAttr>) -> Result<ResourceAttrModel> {
    Ok(ResourceAttrModel {
        id: Some(id(e)?),
        attr_id: required_int(e, "attr_id")?,
        is_var: required_text(e, "attr_is_var")? == "Y",
        ref_key: text(e, "ref_key")?,
        ref_id: int(e, "ref_id")?,
    })
}

fn resource_attr_models(attrs: Vec<Entity<'_, ResourceAttr>>) -> Result<Vec<ResourceAttrModel>> {
    attrs.iter().map(resource_attr_model).collect()
}

pub(crate) fn node_model(e: &Entity<'_, Node>) -> Result<NodeModel> {
    Ok(NodeModel {
        id: Some(id(e)?),
        name: required_text(e, "node_name")?,
        description: text(e, "node_description")?,
        x: real(e, "node_x")?,
        y: real(e, "node_y")?,
        status: text(e, "status")?,
        attributes: resource_attr_models(e.resource_attributes()?)?,
    })
}

pub(crate) fn link_model(e: &Entity<'_, Link>) -> Result<LinkModel> {
    Ok(LinkModel {
        id: Some(id(e)?),
        name: required_text(e, "link_name")?,
        description: text(e, "link_description")?,
        node_1_id: required_int(e, "node_1_id")?,
        node_2_id: required_int(e, "node_2_id")?,
        status: text(e, "status")?,
        attributes: resource_attr_models(e.resource_attributes()?)?,
    })
}

pub(crate) fn dataset_model(e: &Entity<'_, Dataset>) -> Result<DatasetModel> {
    Ok(DatasetModel {
        id: Some(id(e)?),
        data_type: required_text(e, "data_type")?,
        name: required_text(e, "data_name")?,
        units: text(e, "data_units")?,
        dimension: text(e, "data_dimen")?,
        value: json(e, "value")?.unwrap_or(serde_json::Value::Null),
    })
}

pub(crate) fn attr_model(e: &Entity<'_, Attr>) -> Result<AttrModel> {
    Ok(AttrModel {
        id: Some(id(e)?),
        name: required_text(e, "attr_name")?,
        dimension: text(e, "attr_dimen")?,
    })
}

pub(crate) fn is_active<K: EntityKind>(e: &Entity<'_, K>) -> bool {
    e.get("status").map(|s| s.as_str() != Some("X")).unwrap_or(true)
}
