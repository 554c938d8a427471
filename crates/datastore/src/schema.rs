//! The Hydra schema.
//!
//! Migrations are tera templates with a variable per entity holding its quoted table name, e.g. `{{ Project }}` rather
//! than `tProject`, so that the configured prefix applies.  Index names start with `idx_{{ prefix }}` for the same
//! reason.  Migrations run in order and each runs at most once per database and prefix, so one file may hold several
//! prefixed copies of the schema.

/// Every entity the schema defines, in creation order.
pub const ENTITY_NAMES: &[&str] = &[
    "Project",
    "Network",
    "Node",
    "Link",
    "Scenario",
    "Attr",
    "ResourceAttr",
    "Dataset",
    "ResourceScenario",
    "Template",
    "TemplateItem",
];

#[derive(Debug)]
pub struct Migration {
    name: &'static str,
    sql: &'static str,
}

impl Migration {
    pub fn get_name(&self) -> &str {
        self.name
    }

    pub fn get_sql(&self) -> &str {
        self.sql
    }
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_networks",
        sql: r#"
        CREATE TABLE {{ Project }} (
            project_id INTEGER PRIMARY KEY,
            project_name VARCHAR(60) NOT NULL,
            project_description TEXT,
            status CHAR(1) NOT NULL,
            cr_date TEXT
        );

        CREATE TABLE {{ Network }} (
            network_id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL REFERENCES {{ Project }}(project_id) ON DELETE CASCADE,
            network_name VARCHAR(60) NOT NULL,
            network_description TEXT,
            network_layout TEXT,
            status CHAR(1) NOT NULL,
            cr_date TEXT
        );
        CREATE INDEX idx_{{ prefix }}network_project ON {{ Network }}(project_id);

        CREATE TABLE {{ Node }} (
            node_id INTEGER PRIMARY KEY,
            network_id INTEGER NOT NULL REFERENCES {{ Network }}(network_id) ON DELETE CASCADE,
            node_name VARCHAR(60) NOT NULL,
            node_description TEXT,
            node_x DOUBLE,
            node_y DOUBLE,
            status CHAR(1) NOT NULL,
            cr_date TEXT
        );
        CREATE INDEX idx_{{ prefix }}node_network ON {{ Node }}(network_id);

        CREATE TABLE {{ Link }} (
            link_id INTEGER PRIMARY KEY,
            network_id INTEGER NOT NULL REFERENCES {{ Network }}(network_id) ON DELETE CASCADE,
            node_1_id INTEGER NOT NULL REFERENCES {{ Node }}(node_id) ON DELETE CASCADE,
            node_2_id INTEGER NOT NULL REFERENCES {{ Node }}(node_id) ON DELETE CASCADE,
            link_name VARCHAR(60) NOT NULL,
            link_description TEXT,
            status CHAR(1) NOT NULL,
            cr_date TEXT
        );
        CREATE INDEX idx_{{ prefix }}link_network ON {{ Link }}(network_id);

        CREATE TABLE {{ Scenario }} (
            scenario_id INTEGER PRIMARY KEY,
            network_id INTEGER NOT NULL REFERENCES {{ Network }}(network_id) ON DELETE CASCADE,
            scenario_name VARCHAR(60) NOT NULL,
            scenario_description TEXT,
            status CHAR(1) NOT NULL,
            cr_date TEXT
        );
        CREATE INDEX idx_{{ prefix }}scenario_network ON {{ Scenario }}(network_id);
    "#,
    },
    Migration {
        name: "0002_attributes",
        sql: r#"
        CREATE TABLE {{ Attr }} (
            attr_id INTEGER PRIMARY KEY,
            attr_name VARCHAR(60) NOT NULL UNIQUE,
            attr_dimen VARCHAR(60),
            cr_date TEXT
        );

        -- ref_key says which table ref_id points into.
        CREATE TABLE {{ ResourceAttr }} (
            resource_attr_id INTEGER PRIMARY KEY,
            attr_id INTEGER NOT NULL REFERENCES {{ Attr }}(attr_id),
            ref_key VARCHAR(60) NOT NULL CHECK (ref_key IN ('NETWORK', 'NODE', 'LINK')),
            ref_id INTEGER NOT NULL,
            attr_is_var CHAR(1) NOT NULL CHECK (attr_is_var IN ('Y', 'N')),
            cr_date TEXT
        );
        CREATE INDEX idx_{{ prefix }}resource_attr_ref ON {{ ResourceAttr }}(ref_key, ref_id);

        -- Values are stored as JSON text; data_type says how to read them.
        CREATE TABLE {{ Dataset }} (
            dataset_id INTEGER PRIMARY KEY,
            data_type VARCHAR(60) NOT NULL,
            data_units VARCHAR(60),
            data_dimen VARCHAR(60),
            data_name VARCHAR(60) NOT NULL,
            value TEXT NOT NULL,
            cr_date TEXT
        );

        CREATE TABLE {{ ResourceScenario }} (
            resource_attr_id INTEGER NOT NULL
                REFERENCES {{ ResourceAttr }}(resource_attr_id) ON DELETE CASCADE,
            scenario_id INTEGER NOT NULL REFERENCES {{ Scenario }}(scenario_id) ON DELETE CASCADE,
            dataset_id INTEGER NOT NULL REFERENCES {{ Dataset }}(dataset_id),
            PRIMARY KEY (resource_attr_id, scenario_id)
        );
        CREATE INDEX idx_{{ prefix }}resource_scenario_scenario ON {{ ResourceScenario }}(scenario_id);
    "#,
    },
    Migration {
        name: "0003_templates",
        sql: r#"
        CREATE TABLE {{ Template }} (
            template_id INTEGER PRIMARY KEY,
            template_name VARCHAR(60) NOT NULL,
            layout TEXT,
            cr_date TEXT
        );

        CREATE TABLE {{ TemplateItem }} (
            template_id INTEGER NOT NULL REFERENCES {{ Template }}(template_id) ON DELETE CASCADE,
            attr_id INTEGER NOT NULL REFERENCES {{ Attr }}(attr_id),
            PRIMARY KEY (template_id, attr_id)
        );
    "#,
    },
];
