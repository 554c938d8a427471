use std::collections::HashSet;

use anyhow::Result;
use hydra_datastore::{Entity, Template, TemplateItem};

use crate::attributes::load_attr;
use crate::convert::*;
use crate::fault::{invalid, not_found, ServiceFault};
use crate::models::*;
use crate::service::HydraService;

fn template_model(e: &Entity<'_, Template>) -> Result<TemplateModel> {
    Ok(TemplateModel {
        id: Some(id(e)?),
        name: required_text(e, "template_name")?,
        layout: json(e, "layout")?,
        items: e
            .items()?
            .iter()
            .map(|i| -> Result<TemplateItemModel> {
                Ok(TemplateItemModel {
                    attr_id: required_int(i, "attr_id")?,
                })
            })
            .collect::<Result<_>>()?,
    })
}

impl HydraService {
    /// Create a template listing which attributes its resources should have.
    pub fn add_template(&self, template: &TemplateModel) -> Result<TemplateModel, ServiceFault> {
        self.unit_of_work("add_template", |session| {
            if template.name.trim().is_empty() {
                return Err(invalid("template name may not be empty"));
            }
            let mut seen = HashSet::new();
            if let Some(dup) = template.items.iter().find(|i| !seen.insert(i.attr_id)) {
                return Err(invalid(format!(
                    "attribute {} is listed twice in template {}",
                    dup.attr_id, template.name
                )));
            }

            let mut t = Entity::<Template>::new(session)?;
            t.set("template_name", template.name.as_str())?;
            t.set("layout", json_text(&template.layout)?)?;
            t.set("cr_date", now()?)?;
            t.save()?;
            let template_id = id(&t)?;

            for item in &template.items {
                load_attr(session, item.attr_id)?;
                let mut i = Entity::<TemplateItem>::with_values(
                    session,
                    [("template_id", template_id), ("attr_id", item.attr_id)],
                )?;
                i.save()?;
            }

            template_model(&t)
        })
    }

    pub fn get_template(&self, id: i64) -> Result<TemplateModel, ServiceFault> {
        self.unit_of_work("get_template", |session| {
            let t = Entity::<Template>::get_by_id(session, id)?
                .ok_or_else(|| not_found("template", id))?;
            template_model(&t)
        })
    }
}
