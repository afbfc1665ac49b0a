//! Schema and row fixture builders.

use tablekit_protocol::{FieldId, TableId, Value};
use tablekit_schema::{
    CollectionRef, DateConfig, DropdownConfig, Field, FieldConfiguration, FieldRef, GroupConfig,
    GroupRef, RelationTarget, RelationshipConfig, Table, TableConfiguration, TableKind, TextConfig,
};

pub fn table(slug: &str, fields: Vec<Field>) -> Table {
    table_of_kind(slug, TableKind::Table, fields)
}

/// A nested table usable as a field-group target.
pub fn group_table(slug: &str, fields: Vec<Field>) -> Table {
    table_of_kind(slug, TableKind::FieldGroup, fields)
}

fn table_of_kind(slug: &str, kind: TableKind, fields: Vec<Field>) -> Table {
    Table {
        id: TableId::new(),
        slug: slug.to_string(),
        name: slug.to_string(),
        kind,
        fields,
        configuration: TableConfiguration {
            owner: "owner".into(),
            ..TableConfiguration::default()
        },
    }
}

pub fn field(slug: &str, configuration: FieldConfiguration) -> Field {
    Field {
        id: FieldId::new(),
        slug: slug.to_string(),
        name: slug.to_string(),
        trashed: false,
        configuration,
    }
}

pub fn text_field(slug: &str) -> Field {
    field(
        slug,
        FieldConfiguration::TextShort(TextConfig {
            listing: true,
            filtering: true,
            ..TextConfig::default()
        }),
    )
}

pub fn required_text_field(slug: &str) -> Field {
    field(
        slug,
        FieldConfiguration::TextShort(TextConfig {
            required: true,
            listing: true,
            ..TextConfig::default()
        }),
    )
}

pub fn dropdown_field(slug: &str, options: &[&str]) -> Field {
    field(
        slug,
        FieldConfiguration::Dropdown(DropdownConfig {
            multiple: true,
            filtering: true,
            listing: true,
            options: options.iter().map(|s| s.to_string()).collect(),
            ..DropdownConfig::default()
        }),
    )
}

pub fn date_field(slug: &str) -> Field {
    field(
        slug,
        FieldConfiguration::Date(DateConfig {
            filtering: true,
            ..DateConfig::default()
        }),
    )
}

/// A relationship field labeled by the target table's given field.
pub fn relationship_field(slug: &str, target: &Table, label: &Field) -> Field {
    field(
        slug,
        FieldConfiguration::Relationship(RelationshipConfig {
            required: false,
            multiple: true,
            filtering: true,
            listing: true,
            relationship: RelationTarget {
                collection: CollectionRef {
                    id: target.id.clone(),
                    slug: target.slug.clone(),
                },
                field: Some(FieldRef {
                    id: label.id.clone(),
                    slug: label.slug.clone(),
                }),
                order: None,
            },
        }),
    )
}

pub fn group_field(slug: &str, group: &Table) -> Field {
    field(
        slug,
        FieldConfiguration::FieldGroup(GroupConfig {
            required: false,
            multiple: true,
            filtering: false,
            listing: false,
            group: GroupRef {
                slug: group.slug.clone(),
            },
        }),
    )
}

/// A row with text values under the given slugs.
pub fn row(values: &[(&str, &str)]) -> tablekit_protocol::Row {
    let mut row = tablekit_protocol::Row::new();
    for (slug, value) in values {
        row.set_value(*slug, Value::Text(value.to_string()));
    }
    row
}
