//! Core schema types: tables, fields, and per-type configuration.

use serde::{Deserialize, Serialize};
use tablekit_protocol::{DateFormat, DisplayStyle, FieldId, FieldType, SortOrder, TableId, TextFormat};

/// Who can see a table and its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

/// A table is either a top-level collection with its own row list, or a
/// field-group definition that only ever renders embedded in a parent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TableKind {
    #[default]
    Table,
    FieldGroup,
}

/// Display order of fields, by field id. Fields absent from a list sort
/// after those present, keeping their relative declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FieldOrder {
    #[serde(default, rename = "orderList")]
    pub list: Vec<FieldId>,
    #[serde(default, rename = "orderForm")]
    pub form: Vec<FieldId>,
}

/// Table-level presentation and ownership settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TableConfiguration {
    #[serde(default)]
    pub style: DisplayStyle,
    #[serde(default)]
    pub visibility: Visibility,
    /// Whether non-administrators may contribute rows.
    #[serde(default)]
    pub collaboration: bool,
    pub owner: String,
    #[serde(default)]
    pub administrators: Vec<String>,
    #[serde(default, rename = "fields")]
    pub field_order: FieldOrder,
}

/// A user-defined table (a.k.a. collection): schema plus configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub slug: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: TableKind,
    pub fields: Vec<Field>,
    pub configuration: TableConfiguration,
}

impl Table {
    /// Fields that still take part in rendering, validation and listing.
    pub fn active_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.trashed)
    }

    pub fn field(&self, slug: &str) -> Option<&Field> {
        self.active_fields().find(|f| f.slug == slug)
    }

    pub fn field_by_id(&self, id: &FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| &f.id == id)
    }

    /// Active fields in form order: those named by the order list first (in
    /// that order), the rest after, keeping declaration order. The sort is
    /// stable either way.
    pub fn form_fields(&self) -> Vec<&Field> {
        self.ordered(&self.configuration.field_order.form)
    }

    /// Active fields in list order, same placement rule as [`form_fields`].
    ///
    /// [`form_fields`]: Table::form_fields
    pub fn list_fields(&self) -> Vec<&Field> {
        let ordered = self.ordered(&self.configuration.field_order.list);
        ordered
            .into_iter()
            .filter(|f| f.configuration.listing())
            .collect()
    }

    /// Active fields eligible for the ad hoc filter form.
    pub fn filterable_fields(&self) -> Vec<&Field> {
        self.form_fields()
            .into_iter()
            .filter(|f| f.configuration.filtering() && f.kind().supports_filtering())
            .collect()
    }

    fn ordered(&self, order: &[FieldId]) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.active_fields().collect();
        fields.sort_by_key(|f| {
            order
                .iter()
                .position(|id| id == &f.id)
                .unwrap_or(usize::MAX)
        });
        fields
    }
}

/// One typed column definition within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    /// Storage key inside a row. Unique among non-trashed fields.
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub trashed: bool,
    pub configuration: FieldConfiguration,
}

impl Field {
    pub fn kind(&self) -> FieldType {
        self.configuration.kind()
    }
}

// ============================================================================
// Per-type configuration payloads
// ============================================================================

/// Options for short and long text fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextConfig {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub filtering: bool,
    #[serde(default)]
    pub listing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<TextFormat>,
    #[serde(default, rename = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DropdownConfig {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub filtering: bool,
    #[serde(default)]
    pub listing: bool,
    /// The selectable options, in display order.
    #[serde(default, rename = "dropdown")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DateConfig {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub filtering: bool,
    #[serde(default)]
    pub listing: bool,
    #[serde(default)]
    pub format: DateFormat,
}

/// File fields hold storage ids only; the binary side lives in the external
/// file service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub listing: bool,
}

/// Names the related table and which of its fields labels a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRef {
    #[serde(rename = "_id")]
    pub id: TableId,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    #[serde(rename = "_id")]
    pub id: FieldId,
    pub slug: String,
}

/// Where a relationship points. `field` and `order` are only meaningful once
/// `collection` is chosen; retargeting clears them (cascade reset), since the
/// old label field is not guaranteed to exist on the new table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationTarget {
    pub collection: CollectionRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl RelationTarget {
    pub fn new(collection: CollectionRef) -> Self {
        Self {
            collection,
            field: None,
            order: None,
        }
    }

    /// Point at a different collection, dropping the label field and sort
    /// order chosen for the old one.
    pub fn retarget(&self, collection: CollectionRef) -> Self {
        if collection == self.collection {
            return self.clone();
        }
        Self::new(collection)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub filtering: bool,
    #[serde(default)]
    pub listing: bool,
    pub relationship: RelationTarget,
}

/// Points at a nested table of kind `field-group`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub filtering: bool,
    #[serde(default)]
    pub listing: bool,
    pub group: GroupRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CategoryConfig {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub filtering: bool,
    #[serde(default)]
    pub listing: bool,
    /// Flat taxonomy; hierarchical display is a presentation concern.
    #[serde(default, rename = "category")]
    pub categories: Vec<String>,
}

/// Reaction and evaluation fields aggregate many users' responses, so they
/// carry no `required` and no `filtering` at all - the options simply do not
/// exist on this payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResponseConfig {
    #[serde(default)]
    pub listing: bool,
}

/// Per-field configuration, tagged by field type. Exactly one branch is ever
/// populated; every capability (codec, validator, filter codec, resolver)
/// matches exhaustively on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldConfiguration {
    #[serde(rename = "TEXT_SHORT")]
    TextShort(TextConfig),
    #[serde(rename = "TEXT_LONG")]
    TextLong(TextConfig),
    #[serde(rename = "DROPDOWN")]
    Dropdown(DropdownConfig),
    #[serde(rename = "DATE")]
    Date(DateConfig),
    #[serde(rename = "FILE")]
    File(FileConfig),
    #[serde(rename = "RELATIONSHIP")]
    Relationship(RelationshipConfig),
    #[serde(rename = "FIELD_GROUP")]
    FieldGroup(GroupConfig),
    #[serde(rename = "CATEGORY")]
    Category(CategoryConfig),
    #[serde(rename = "REACTION")]
    Reaction(ResponseConfig),
    #[serde(rename = "EVALUATION")]
    Evaluation(ResponseConfig),
}

impl FieldConfiguration {
    pub fn kind(&self) -> FieldType {
        match self {
            FieldConfiguration::TextShort(_) => FieldType::TextShort,
            FieldConfiguration::TextLong(_) => FieldType::TextLong,
            FieldConfiguration::Dropdown(_) => FieldType::Dropdown,
            FieldConfiguration::Date(_) => FieldType::Date,
            FieldConfiguration::File(_) => FieldType::File,
            FieldConfiguration::Relationship(_) => FieldType::Relationship,
            FieldConfiguration::FieldGroup(_) => FieldType::FieldGroup,
            FieldConfiguration::Category(_) => FieldType::Category,
            FieldConfiguration::Reaction(_) => FieldType::Reaction,
            FieldConfiguration::Evaluation(_) => FieldType::Evaluation,
        }
    }

    /// Whether a value is mandatory. Response fields have no such option.
    pub fn required(&self) -> bool {
        match self {
            FieldConfiguration::TextShort(c) | FieldConfiguration::TextLong(c) => c.required,
            FieldConfiguration::Dropdown(c) => c.required,
            FieldConfiguration::Date(c) => c.required,
            FieldConfiguration::File(c) => c.required,
            FieldConfiguration::Relationship(c) => c.required,
            FieldConfiguration::FieldGroup(c) => c.required,
            FieldConfiguration::Category(c) => c.required,
            FieldConfiguration::Reaction(_) | FieldConfiguration::Evaluation(_) => false,
        }
    }

    pub fn multiple(&self) -> bool {
        match self {
            FieldConfiguration::Dropdown(c) => c.multiple,
            FieldConfiguration::File(c) => c.multiple,
            FieldConfiguration::Relationship(c) => c.multiple,
            FieldConfiguration::FieldGroup(c) => c.multiple,
            FieldConfiguration::Category(c) => c.multiple,
            FieldConfiguration::TextShort(_)
            | FieldConfiguration::TextLong(_)
            | FieldConfiguration::Date(_)
            | FieldConfiguration::Reaction(_)
            | FieldConfiguration::Evaluation(_) => false,
        }
    }

    pub fn listing(&self) -> bool {
        match self {
            FieldConfiguration::TextShort(c) | FieldConfiguration::TextLong(c) => c.listing,
            FieldConfiguration::Dropdown(c) => c.listing,
            FieldConfiguration::Date(c) => c.listing,
            FieldConfiguration::File(c) => c.listing,
            FieldConfiguration::Relationship(c) => c.listing,
            FieldConfiguration::FieldGroup(c) => c.listing,
            FieldConfiguration::Category(c) => c.listing,
            FieldConfiguration::Reaction(c) | FieldConfiguration::Evaluation(c) => c.listing,
        }
    }

    /// Whether this field appears in the filter form. File and response
    /// fields return false by construction - the flag does not exist on them.
    pub fn filtering(&self) -> bool {
        match self {
            FieldConfiguration::TextShort(c) | FieldConfiguration::TextLong(c) => c.filtering,
            FieldConfiguration::Dropdown(c) => c.filtering,
            FieldConfiguration::Date(c) => c.filtering,
            FieldConfiguration::Relationship(c) => c.filtering,
            FieldConfiguration::FieldGroup(c) => c.filtering,
            FieldConfiguration::Category(c) => c.filtering,
            FieldConfiguration::File(_)
            | FieldConfiguration::Reaction(_)
            | FieldConfiguration::Evaluation(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_field(slug: &str) -> Field {
        Field {
            id: FieldId::new(),
            slug: slug.to_string(),
            name: slug.to_string(),
            trashed: false,
            configuration: FieldConfiguration::TextShort(TextConfig {
                listing: true,
                ..TextConfig::default()
            }),
        }
    }

    fn table_with(fields: Vec<Field>) -> Table {
        Table {
            id: TableId::new(),
            slug: "tasks".into(),
            name: "Tasks".into(),
            kind: TableKind::Table,
            fields,
            configuration: TableConfiguration {
                owner: "owner".into(),
                ..TableConfiguration::default()
            },
        }
    }

    #[test]
    fn trashed_fields_are_invisible_but_kept() {
        let mut trashed = text_field("old");
        trashed.trashed = true;
        let table = table_with(vec![text_field("title"), trashed]);
        assert_eq!(table.fields.len(), 2);
        assert_eq!(table.active_fields().count(), 1);
        assert!(table.field("old").is_none());
    }

    #[test]
    fn form_order_places_unlisted_fields_last() {
        let a = text_field("a");
        let b = text_field("b");
        let c = text_field("c");
        let order = vec![c.id.clone(), a.id.clone()];
        let mut table = table_with(vec![a, b, c]);
        table.configuration.field_order.form = order;

        let slugs: Vec<_> = table.form_fields().iter().map(|f| f.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "a", "b"]);
    }

    #[test]
    fn retarget_clears_downstream_choices() {
        let target = RelationTarget {
            collection: CollectionRef {
                id: TableId::new(),
                slug: "projects".into(),
            },
            field: Some(FieldRef {
                id: FieldId::new(),
                slug: "name".into(),
            }),
            order: Some(SortOrder::Desc),
        };
        let same = target.retarget(target.collection.clone());
        assert_eq!(same, target);

        let other = target.retarget(CollectionRef {
            id: TableId::new(),
            slug: "people".into(),
        });
        assert!(other.field.is_none());
        assert!(other.order.is_none());
    }

    #[test]
    fn configuration_serde_is_tagged_by_type() {
        let config = FieldConfiguration::Dropdown(DropdownConfig {
            required: true,
            multiple: true,
            options: vec!["open".into(), "closed".into()],
            ..DropdownConfig::default()
        });
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "DROPDOWN");
        assert_eq!(json["dropdown"][0], "open");
        let back: FieldConfiguration = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn response_fields_cannot_be_required_or_filterable() {
        let config = FieldConfiguration::Reaction(ResponseConfig { listing: true });
        assert!(!config.required());
        assert!(!config.filtering());
        assert!(config.listing());
    }
}
