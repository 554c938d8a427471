//! Request and response models.
//!
//! Ids are optional because requests creating things don't have them yet.  When a network is created in one request,
//! its nodes and resource attributes may be given negative placeholder ids, which links and scenarios in the same
//! request use to refer to them; the response carries the real ids.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectModel {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkModel {
    #[serde(default)]
    pub id: Option<i64>,
    pub project_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub layout: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeModel>,
    #[serde(default)]
    pub links: Vec<LinkModel>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioModel>,
    #[serde(default)]
    pub attributes: Vec<ResourceAttrModel>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeModel {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub attributes: Vec<ResourceAttrModel>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkModel {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub node_1_id: i64,
    pub node_2_id: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub attributes: Vec<ResourceAttrModel>,
}

/// An attribute attached to a network, node or link.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceAttrModel {
    #[serde(default)]
    pub id: Option<i64>,
    pub attr_id: i64,
    /// Whether the value is computed by a model rather than given as input.
    #[serde(default)]
    pub is_var: bool,
    /// Filled in on responses.
    #[serde(default)]
    pub ref_key: Option<String>,
    #[serde(default)]
    pub ref_id: Option<i64>,
}

/// What a resource attribute is attached to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ResourceRef {
    Network(i64),
    Node(i64),
    Link(i64),
}

impl ResourceRef {
    pub fn ref_key(&self) -> &'static str {
        match self {
            ResourceRef::Network(_) => "NETWORK",
            ResourceRef::Node(_) => "NODE",
            ResourceRef::Link(_) => "LINK",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ResourceRef::Network(i) | ResourceRef::Node(i) | ResourceRef::Link(i) => *i,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioModel {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub network_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub resource_scenarios: Vec<ResourceScenarioModel>,
}

/// The value of one resource attribute in one scenario.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceScenarioModel {
    pub resource_attr_id: i64,
    pub value: DatasetModel,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetModel {
    #[serde(default)]
    pub id: Option<i64>,
    /// e.g. `scalar`, `timeseries`, `array`, `descriptor`.
    pub data_type: String,
    pub name: String,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub dimension: Option<String>,
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrModel {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub dimension: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateModel {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub layout: Option<serde_json::Value>,
    #[serde(default)]
    pub items: Vec<TemplateItemModel>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateItemModel {
    pub attr_id: i64,
}
