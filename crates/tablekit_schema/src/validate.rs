//! Save-time schema validation.
//!
//! A table that passes here cannot put the form or filter layers into an
//! unrepresentable state: slugs are unique, at least one field is active,
//! relationship targets are complete, and field-group nesting is acyclic -
//! a group table can never embed itself, directly or transitively.

use crate::catalog::SchemaCatalog;
use crate::table::{Field, FieldConfiguration, Table, TableKind};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that make a table schema unsaveable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Duplicate field slug '{slug}' on table '{table}'")]
    DuplicateSlug { table: String, slug: String },

    #[error("Table '{table}' must keep at least one active field")]
    LastActiveField { table: String },

    #[error("Field '{field}' references unknown group table '{group}'")]
    UnknownGroup { field: String, group: String },

    #[error("Field '{field}' references '{group}', which is not a field-group table")]
    NotAGroupTable { field: String, group: String },

    #[error("Field-group cycle: {}", path.join(" -> "))]
    GroupCycle { path: Vec<String> },

    #[error("Relationship field '{field}' has a sort order but no label field to sort by")]
    IncompleteRelationship { field: String },
}

/// Validate one table against the catalog it will live in.
///
/// The catalog supplies the nested group tables; `table` itself does not
/// need to be in the catalog yet (it usually is not, on first save).
pub fn validate_table(table: &Table, catalog: &SchemaCatalog) -> Result<(), SchemaError> {
    check_slugs(table)?;
    check_active(table)?;
    for field in table.active_fields() {
        check_field(table, field, catalog)?;
    }
    check_acyclic(table, catalog)
}

fn check_slugs(table: &Table) -> Result<(), SchemaError> {
    let mut seen = BTreeSet::new();
    for field in table.active_fields() {
        if !seen.insert(field.slug.as_str()) {
            return Err(SchemaError::DuplicateSlug {
                table: table.slug.clone(),
                slug: field.slug.clone(),
            });
        }
    }
    Ok(())
}

fn check_active(table: &Table) -> Result<(), SchemaError> {
    if table.active_fields().next().is_none() {
        return Err(SchemaError::LastActiveField {
            table: table.slug.clone(),
        });
    }
    Ok(())
}

fn check_field(table: &Table, field: &Field, catalog: &SchemaCatalog) -> Result<(), SchemaError> {
    match &field.configuration {
        FieldConfiguration::FieldGroup(config) => {
            let Some(nested) = catalog.get(&config.group.slug) else {
                // The group may be the table being saved, referencing itself.
                if config.group.slug == table.slug {
                    return Ok(());
                }
                return Err(SchemaError::UnknownGroup {
                    field: field.slug.clone(),
                    group: config.group.slug.clone(),
                });
            };
            if nested.kind != TableKind::FieldGroup {
                return Err(SchemaError::NotAGroupTable {
                    field: field.slug.clone(),
                    group: config.group.slug.clone(),
                });
            }
            Ok(())
        }
        FieldConfiguration::Relationship(config) => {
            // An order with no label field has nothing to sort by.
            if config.relationship.order.is_some() && config.relationship.field.is_none() {
                return Err(SchemaError::IncompleteRelationship {
                    field: field.slug.clone(),
                });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Depth-first walk over group references starting from `table`. The walk
/// resolves through the catalog, except that references back to `table`
/// itself short-circuit to the in-memory copy being validated.
fn check_acyclic(table: &Table, catalog: &SchemaCatalog) -> Result<(), SchemaError> {
    let mut path = vec![table.slug.clone()];
    walk_groups(table, table, catalog, &mut path)
}

fn walk_groups(
    root: &Table,
    current: &Table,
    catalog: &SchemaCatalog,
    path: &mut Vec<String>,
) -> Result<(), SchemaError> {
    for field in current.active_fields() {
        let FieldConfiguration::FieldGroup(config) = &field.configuration else {
            continue;
        };
        let slug = &config.group.slug;
        if path.iter().any(|seen| seen == slug) {
            let mut cycle = path.clone();
            cycle.push(slug.clone());
            return Err(SchemaError::GroupCycle { path: cycle });
        }
        let nested = if slug == &root.slug {
            Some(root)
        } else {
            catalog.get(slug)
        };
        // Unknown groups were already rejected by check_field.
        if let Some(nested) = nested {
            path.push(slug.clone());
            walk_groups(root, nested, catalog, path)?;
            path.pop();
        }
    }
    Ok(())
}
