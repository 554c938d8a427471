use hydra_datastore::DatabaseConfig;
use hydra_service::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn open() -> (tempfile::TempDir, HydraService) {
    hydra_logging::log_to_stderr();
    let tdir = tempfile::TempDir::new().unwrap();
    let service = HydraService::open(DatabaseConfig::new(tdir.path().join("hydra.sqlite")))
        .expect("Service should open");
    (tdir, service)
}

fn project(service: &HydraService) -> ProjectModel {
    service
        .add_project(&ProjectModel {
            name: "Project".into(),
            description: Some("A test project".into()),
            ..Default::default()
        })
        .unwrap()
}

fn attr(service: &HydraService, name: &str) -> AttrModel {
    service
        .add_attribute(&AttrModel {
            name: name.into(),
            dimension: Some("Volume".into()),
            ..Default::default()
        })
        .unwrap()
}

fn node(id: i64, name: &str, attr_id: i64, ra_id: i64) -> NodeModel {
    NodeModel {
        id: Some(id),
        name: name.into(),
        x: Some(1.5),
        y: Some(2.0),
        attributes: vec![ResourceAttrModel {
            id: Some(ra_id),
            attr_id,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn scalar(name: &str, v: f64) -> DatasetModel {
    DatasetModel {
        data_type: "scalar".into(),
        name: name.into(),
        units: Some("m^3".into()),
        value: json!(v),
        ..Default::default()
    }
}

/// Two nodes joined by a link, with a scenario giving the first node's attribute a value.
fn network(service: &HydraService) -> NetworkModel {
    let p = project(service);
    let a = attr(service, "capacity");
    let attr_id = a.id.unwrap();

    service
        .add_network(&NetworkModel {
            project_id: p.id.unwrap(),
            name: "Network".into(),
            layout: Some(json!({"color": "blue"})),
            nodes: vec![node(-1, "Source", attr_id, -10), node(-2, "Sink", attr_id, -11)],
            links: vec![LinkModel {
                name: "Pipe".into(),
                node_1_id: -1,
                node_2_id: -2,
                ..Default::default()
            }],
            scenarios: vec![ScenarioModel {
                name: "Baseline".into(),
                resource_scenarios: vec![ResourceScenarioModel {
                    resource_attr_id: -10,
                    value: scalar("capacity", 100.0),
                }],
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap()
}

#[test]
fn project_lifecycle() {
    let (_tdir, service) = open();
    let p = project(&service);
    let id = p.id.unwrap();
    assert_eq!(p.status.as_deref(), Some("A"));
    assert!(p.created_at.is_some());
    assert_eq!(service.get_project(id).unwrap(), p);

    let updated = service
        .update_project(&ProjectModel {
            name: "Renamed".into(),
            ..p.clone()
        })
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(service.get_project(id).unwrap().name, "Renamed");

    service.delete_project(id).unwrap();
    assert_eq!(service.get_project(id).unwrap().status.as_deref(), Some("X"));
}

#[test]
fn missing_things_are_not_found() {
    let (_tdir, service) = open();
    assert_eq!(service.get_project(42).unwrap_err().code, FaultCode::NotFound);
    assert_eq!(service.get_network(42).unwrap_err().code, FaultCode::NotFound);
    assert_eq!(service.get_scenario(42).unwrap_err().code, FaultCode::NotFound);
    assert_eq!(service.get_template(42).unwrap_err().code, FaultCode::NotFound);
    assert_eq!(service.get_attribute_by_name("nope").unwrap(), None);
}

#[test]
fn bad_input_is_rejected() {
    let (_tdir, service) = open();
    let fault = service
        .add_project(&ProjectModel {
            name: "  ".into(),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::InvalidInput);

    let fault = service
        .update_project(&ProjectModel {
            name: "No id".into(),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::InvalidInput);
}

#[test]
fn network_round_trips_with_real_ids() {
    let (_tdir, service) = open();
    let n = network(&service);

    assert_eq!(n.nodes.len(), 2);
    assert!(n.nodes.iter().all(|n| n.id.unwrap() > 0));
    assert_eq!(n.nodes[0].x, Some(1.5));
    assert_eq!(n.layout, Some(json!({"color": "blue"})));

    let link = &n.links[0];
    assert_eq!(link.node_1_id, n.nodes[0].id.unwrap());
    assert_eq!(link.node_2_id, n.nodes[1].id.unwrap());

    let ra = &n.nodes[0].attributes[0];
    assert_eq!(ra.ref_key.as_deref(), Some("NODE"));
    assert_eq!(ra.ref_id, n.nodes[0].id);
    assert!(!ra.is_var);

    let rs = &n.scenarios[0].resource_scenarios[0];
    assert_eq!(rs.resource_attr_id, ra.id.unwrap());
    assert_eq!(rs.value.value, json!(100.0));
    assert_eq!(rs.value.units.as_deref(), Some("m^3"));

    assert_eq!(service.get_network(n.id.unwrap()).unwrap(), n);
    assert_eq!(service.get_networks(n.project_id).unwrap(), vec![n]);
}

#[test]
fn failed_request_leaves_nothing_behind() {
    let (_tdir, service) = open();
    let p = project(&service);

    let fault = service
        .add_network(&NetworkModel {
            project_id: p.id.unwrap(),
            name: "Broken".into(),
            nodes: vec![NodeModel {
                id: Some(-1),
                name: "A".into(),
                ..Default::default()
            }],
            links: vec![LinkModel {
                name: "Nowhere".into(),
                node_1_id: -1,
                node_2_id: -7,
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::InvalidInput);
    assert!(fault.message.contains("Nowhere"), "{}", fault.message);

    assert!(service.get_networks(p.id.unwrap()).unwrap().is_empty());
}

#[test]
fn links_stay_within_their_network() {
    let (_tdir, service) = open();
    let first = network(&service);
    let second = service
        .add_network(&NetworkModel {
            project_id: first.project_id,
            name: "Other".into(),
            ..Default::default()
        })
        .unwrap();

    let fault = service
        .add_link(
            second.id.unwrap(),
            &LinkModel {
                name: "Across".into(),
                node_1_id: first.nodes[0].id.unwrap(),
                node_2_id: first.nodes[1].id.unwrap(),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::InvalidInput);
}

#[test]
fn deleting_a_node_deletes_its_links() {
    let (_tdir, service) = open();
    let n = network(&service);
    let network_id = n.id.unwrap();

    let added = service
        .add_node(
            network_id,
            &NodeModel {
                name: "Extra".into(),
                ..Default::default()
            },
        )
        .unwrap();
    let moved = service
        .update_node(&NodeModel {
            x: Some(10.0),
            ..added.clone()
        })
        .unwrap();
    assert_eq!(moved.x, Some(10.0));

    service.delete_node(n.nodes[0].id.unwrap()).unwrap();
    let after = service.get_network(network_id).unwrap();
    assert_eq!(
        after.nodes.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(),
        vec!["Sink", "Extra"]
    );
    assert!(after.links.is_empty());
}

#[test]
fn deleted_networks_are_hidden() {
    let (_tdir, service) = open();
    let n = network(&service);
    service.delete_network(n.id.unwrap()).unwrap();
    assert!(service.get_networks(n.project_id).unwrap().is_empty());
    assert_eq!(
        service.get_network(n.id.unwrap()).unwrap().status.as_deref(),
        Some("X")
    );
}

#[test]
fn resource_data_can_be_replaced() {
    let (_tdir, service) = open();
    let n = network(&service);
    let scenario_id = n.scenarios[0].id.unwrap();
    let ra_id = n.nodes[0].attributes[0].id.unwrap();

    let s = service
        .update_resource_data(scenario_id, ra_id, &scalar("capacity", 250.0))
        .unwrap();
    assert_eq!(s.resource_scenarios.len(), 1);
    assert_eq!(s.resource_scenarios[0].value.value, json!(250.0));

    // The second node's attribute had no value until now.
    let other_ra = n.nodes[1].attributes[0].id.unwrap();
    let s = service
        .update_resource_data(scenario_id, other_ra, &scalar("capacity", 5.0))
        .unwrap();
    assert_eq!(s.resource_scenarios.len(), 2);
    assert_eq!(service.get_scenario(scenario_id).unwrap(), s);
}

#[test]
fn scenarios_only_hold_their_own_network_data() {
    let (_tdir, service) = open();
    let first = network(&service);
    let second = service
        .add_network(&NetworkModel {
            project_id: first.project_id,
            name: "Other".into(),
            ..Default::default()
        })
        .unwrap();

    let fault = service
        .add_scenario(
            second.id.unwrap(),
            &ScenarioModel {
                name: "Stolen".into(),
                resource_scenarios: vec![ResourceScenarioModel {
                    resource_attr_id: first.nodes[0].attributes[0].id.unwrap(),
                    value: scalar("capacity", 1.0),
                }],
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::InvalidInput);
}

#[test]
fn attributes() {
    let (_tdir, service) = open();
    let a = attr(&service, "flow");
    assert_eq!(service.get_attribute_by_name("flow").unwrap(), Some(a.clone()));
    assert_eq!(service.get_attribute(a.id.unwrap()).unwrap(), a);

    // Names are unique.
    let fault = service
        .add_attribute(&AttrModel {
            name: "flow".into(),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::DatabaseError);

    let n = network(&service);
    let ra = service
        .add_resource_attribute(ResourceRef::Link(n.links[0].id.unwrap()), a.id.unwrap(), true)
        .unwrap();
    assert_eq!(ra.ref_key.as_deref(), Some("LINK"));
    assert!(ra.is_var);
    let link = &service.get_network(n.id.unwrap()).unwrap().links[0];
    assert_eq!(link.attributes, vec![ra]);

    let fault = service
        .add_resource_attribute(ResourceRef::Node(9999), a.id.unwrap(), false)
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::NotFound);
}

#[test]
fn templates() {
    let (_tdir, service) = open();
    let a = attr(&service, "capacity");
    let b = attr(&service, "flow");

    let t = service
        .add_template(&TemplateModel {
            name: "Reservoirs".into(),
            layout: Some(json!({"shape": "circle"})),
            items: vec![
                TemplateItemModel { attr_id: a.id.unwrap() },
                TemplateItemModel { attr_id: b.id.unwrap() },
            ],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(t.items.len(), 2);
    assert_eq!(service.get_template(t.id.unwrap()).unwrap(), t);

    let fault = service
        .add_template(&TemplateModel {
            name: "Broken".into(),
            items: vec![TemplateItemModel { attr_id: 9999 }],
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::NotFound);
}

#[test]
fn template_items_are_unique() {
    let (_tdir, service) = open();
    let a = attr(&service, "capacity");

    let fault = service
        .add_template(&TemplateModel {
            name: "Twice".into(),
            items: vec![
                TemplateItemModel { attr_id: a.id.unwrap() },
                TemplateItemModel { attr_id: a.id.unwrap() },
            ],
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::InvalidInput);
    assert!(fault.message.contains("listed twice"), "{}", fault.message);
}
