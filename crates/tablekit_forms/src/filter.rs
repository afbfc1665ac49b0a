//! The filter form and its flat query-string codec.
//!
//! Filter values live in the URL so a view is shareable and survives reload.
//! Each filterable field serializes to one or two plain parameters; building
//! the form back from a query string is the exact inverse, and an absent
//! parameter leaves the field blank rather than erroring.

use chrono::NaiveDate;
use tablekit_protocol::QueryState;
use tablekit_schema::{Field, FieldConfiguration, SchemaCatalog, Table};

/// Key suffixes for the two halves of a date-range filter.
const SUFFIX_INITIAL: &str = "-initial";
const SUFFIX_FINAL: &str = "-final";
/// Date filters are date-only even when the field displays a time.
const FILTER_DATE: &str = "%Y-%m-%d";

/// One filterable field's current filter input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterValue {
    #[default]
    Unset,
    /// Raw text match.
    Text(String),
    /// Chosen option values or related row ids.
    Selections(Vec<String>),
    /// Inclusive date bounds; either side may be open.
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl FilterValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Unset => true,
            FilterValue::Text(s) => s.trim().is_empty(),
            FilterValue::Selections(v) => v.is_empty(),
            FilterValue::DateRange { from, to } => from.is_none() && to.is_none(),
        }
    }
}

/// One slot in the filter form. `key` is the query-parameter name: the field
/// slug at top level, `group-sub` for a flattened group sub-field.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    pub key: String,
    pub field: Field,
    pub value: FilterValue,
}

impl FilterEntry {
    fn blank(key: String, field: &Field) -> Self {
        Self {
            key,
            field: field.clone(),
            value: FilterValue::Unset,
        }
    }
}

/// The ad hoc filter form for one table view.
///
/// Built from the table's filterable fields; field-group fields contribute
/// their nested table's filterable sub-fields, flattened under prefixed keys.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterForm {
    entries: Vec<FilterEntry>,
}

/// Flatten filterable fields into keyed entries, prefixing each nesting
/// level with its group slug. Group graphs are acyclic at save time, so the
/// recursion terminates at any depth.
fn collect_entries(
    prefix: Option<&str>,
    table: &Table,
    catalog: &SchemaCatalog,
    entries: &mut Vec<FilterEntry>,
) {
    for field in table.filterable_fields() {
        let key = match prefix {
            Some(prefix) => format!("{prefix}-{}", field.slug),
            None => field.slug.clone(),
        };
        match &field.configuration {
            FieldConfiguration::FieldGroup(config) => {
                if let Some(nested) = catalog.resolve_group(config) {
                    collect_entries(Some(&key), nested, catalog, entries);
                }
            }
            _ => entries.push(FilterEntry::blank(key, field)),
        }
    }
}

impl FilterForm {
    /// A blank form over the table's filterable fields.
    pub fn new(table: &Table, catalog: &SchemaCatalog) -> Self {
        let mut entries = Vec::new();
        collect_entries(None, table, catalog, &mut entries);
        Self { entries }
    }

    /// Rebuild the form from the current query string. Unknown parameters
    /// are ignored; absent parameters leave their field blank.
    pub fn from_query(table: &Table, catalog: &SchemaCatalog, query: &QueryState) -> Self {
        let mut form = Self::new(table, catalog);
        for entry in &mut form.entries {
            entry.value = decode_value(&entry.field.configuration, &entry.key, query);
        }
        form
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    pub fn value(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    pub fn set(&mut self, key: &str, value: FilterValue) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.value = value;
        }
    }

    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.value = FilterValue::Unset;
        }
    }

    /// Every query key this form owns, including both halves of each date
    /// range. Clearing filters removes exactly these from the query state.
    pub fn known_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for entry in &self.entries {
            match entry.field.configuration {
                FieldConfiguration::Date(_) => {
                    keys.push(format!("{}{SUFFIX_INITIAL}", entry.key));
                    keys.push(format!("{}{SUFFIX_FINAL}", entry.key));
                }
                _ => keys.push(entry.key.clone()),
            }
        }
        keys
    }

    /// The non-empty parameters this form currently encodes.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for entry in &self.entries {
            match &entry.value {
                FilterValue::Unset => {}
                FilterValue::Text(s) => {
                    if !s.trim().is_empty() {
                        params.push((entry.key.clone(), s.clone()));
                    }
                }
                FilterValue::Selections(values) => {
                    if !values.is_empty() {
                        params.push((entry.key.clone(), values.join(",")));
                    }
                }
                FilterValue::DateRange { from, to } => {
                    if let Some(from) = from {
                        params.push((
                            format!("{}{SUFFIX_INITIAL}", entry.key),
                            from.format(FILTER_DATE).to_string(),
                        ));
                    }
                    if let Some(to) = to {
                        params.push((
                            format!("{}{SUFFIX_FINAL}", entry.key),
                            to.format(FILTER_DATE).to_string(),
                        ));
                    }
                }
            }
        }
        params
    }
}

fn decode_value(config: &FieldConfiguration, key: &str, query: &QueryState) -> FilterValue {
    match config {
        FieldConfiguration::TextShort(_) | FieldConfiguration::TextLong(_) => query
            .get(key)
            .map(|s| FilterValue::Text(s.to_string()))
            .unwrap_or_default(),
        FieldConfiguration::Dropdown(_)
        | FieldConfiguration::Relationship(_)
        | FieldConfiguration::Category(_) => query
            .get(key)
            .map(|raw| {
                FilterValue::Selections(
                    raw.split(',')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            })
            .unwrap_or_default(),
        FieldConfiguration::Date(_) => {
            let parse = |suffix: &str| {
                query
                    .get(&format!("{key}{suffix}"))
                    .and_then(|raw| NaiveDate::parse_from_str(raw, FILTER_DATE).ok())
            };
            let from = parse(SUFFIX_INITIAL);
            let to = parse(SUFFIX_FINAL);
            if from.is_none() && to.is_none() {
                FilterValue::Unset
            } else {
                FilterValue::DateRange { from, to }
            }
        }
        // File and response fields never filter; group fields were flattened
        // away at construction.
        _ => FilterValue::Unset,
    }
}
