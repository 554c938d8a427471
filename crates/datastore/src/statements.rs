//! Statements generated from table descriptors.
//!
//! Every statement binds values as positional parameters.  The descriptor decides which columns go where; the
//! parameter order each statement expects is kept alongside it, as column indices into the descriptor.
use log::*;

use crate::descriptor::TableDescriptor;
use crate::errors::*;

const INSERT_TEMPLATE: &str = r#"
INSERT INTO {{ table }}(
    {{ columns | join(sep=", ") }}
) VALUES (
    {%- for c in columns -%}
    ?{{ loop.index }}{% if not loop.last %}, {% endif -%}
    {%- endfor -%}
)
"#;

const UPDATE_TEMPLATE: &str = r#"
UPDATE {{ table }} SET
    {% for b in assignments %}{{ b.column }} = ?{{ b.param }}{% if not loop.last %}, {% endif %}{% endfor %}
WHERE {% for b in predicates %}{{ b.column }} = ?{{ b.param }}{% if not loop.last %} AND {% endif %}{% endfor %}
"#;

const SELECT_TEMPLATE: &str = r#"
SELECT {{ columns | join(sep=", ") }}
FROM {{ table }}
{%- if keys %}
WHERE {% for k in keys %}{{ k }} = ?{{ loop.index }}{% if not loop.last %} AND {% endif %}{% endfor %}
{%- endif %}
{%- if order %}
ORDER BY {{ order | join(sep=", ") }}
{%- endif %}
"#;

const DELETE_TEMPLATE: &str = r#"
DELETE FROM {{ table }}
WHERE {% for k in keys %}{{ k }} = ?{{ loop.index }}{% if not loop.last %} AND {% endif %}{% endfor %}
"#;

/// Quote an identifier for sqlite.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quoted_names(table: &TableDescriptor, indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .map(|i| quote_ident(table.get_column(*i).get_name()))
        .collect()
}

/// A column bound to a positional parameter.
#[derive(serde::Serialize)]
struct Binding {
    column: String,
    param: usize,
}

/// Bind `indices` to consecutive parameters starting at `first`.
fn bindings(table: &TableDescriptor, indices: &[usize], first: usize) -> Vec<Binding> {
    quoted_names(table, indices)
        .into_iter()
        .enumerate()
        .map(|(i, column)| Binding {
            column,
            param: first + i,
        })
        .collect()
}

/// The prebuilt statements for one table.
#[derive(Debug)]
pub struct TableStatements {
    insert: String,
    /// `None` if the table has no key, or nothing but key columns.
    update: Option<String>,
    select: Option<String>,
    delete: Option<String>,
    key_indices: Vec<usize>,
    non_key_indices: Vec<usize>,
}

impl TableStatements {
    pub(crate) fn build(table: &TableDescriptor) -> Result<TableStatements> {
        let table_ident = quote_ident(table.get_name());
        let all_indices = (0..table.column_count()).collect::<Vec<_>>();
        let key_indices = table
            .iter_columns()
            .enumerate()
            .filter(|(_, c)| c.is_primary_key())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        let non_key_indices = all_indices
            .iter()
            .copied()
            .filter(|i| !key_indices.contains(i))
            .collect::<Vec<_>>();

        let mut context = tera::Context::new();
        context.insert("table", &table_ident);
        context.insert("columns", &quoted_names(table, &all_indices));
        let insert = tera::Tera::one_off(INSERT_TEMPLATE, &context, false)?;

        let (mut update, mut select, mut delete) = (None, None, None);
        if !key_indices.is_empty() {
            let keys = quoted_names(table, &key_indices);
            context.insert("keys", &keys);
            context.insert("order", &Vec::<String>::new());
            select = Some(tera::Tera::one_off(SELECT_TEMPLATE, &context, false)?);
            delete = Some(tera::Tera::one_off(DELETE_TEMPLATE, &context, false)?);

            if !non_key_indices.is_empty() {
                context.insert("assignments", &bindings(table, &non_key_indices, 1));
                context.insert(
                    "predicates",
                    &bindings(table, &key_indices, non_key_indices.len() + 1),
                );
                update = Some(tera::Tera::one_off(UPDATE_TEMPLATE, &context, false)?);
            }
        }

        debug!(
            "Statements for {}: insert={} update={:?} select={:?} delete={:?}",
            table_ident, insert, update, select, delete
        );

        Ok(TableStatements {
            insert,
            update,
            select,
            delete,
            key_indices,
            non_key_indices,
        })
    }

    pub fn insert(&self) -> &str {
        &self.insert
    }

    pub fn update(&self) -> Option<&str> {
        self.update.as_deref()
    }

    pub fn select(&self) -> Option<&str> {
        self.select.as_deref()
    }

    pub fn delete(&self) -> Option<&str> {
        self.delete.as_deref()
    }

    /// Column indices of the primary key, in the order key statements bind them.
    pub fn key_indices(&self) -> &[usize] {
        &self.key_indices
    }

    /// Column indices an update sets, in bind order.  The key follows these.
    pub fn non_key_indices(&self) -> &[usize] {
        &self.non_key_indices
    }
}

/// Build a select of every column of `table` where each of `columns` equals its bound parameter, in order, sorted by the
/// primary key.
pub fn build_select_where(table: &TableDescriptor, columns: &[&str]) -> Result<String> {
    let all_indices = (0..table.column_count()).collect::<Vec<_>>();
    let order = table
        .iter_key_columns()
        .map(|c| quote_ident(c.get_name()))
        .collect::<Vec<_>>();

    let mut context = tera::Context::new();
    context.insert("table", &quote_ident(table.get_name()));
    context.insert("columns", &quoted_names(table, &all_indices));
    context.insert(
        "keys",
        &columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>(),
    );
    context.insert("order", &order);
    Ok(tera::Tera::one_off(SELECT_TEMPLATE, &context, false)?)
}
