//! One editable form over a table's schema.
//!
//! [`FormState`] is a pure state machine: build it from a schema (and
//! optionally a stored row), feed it edits, ask it for violations or the
//! wire payload. Remote effects (option search, submission, file upload)
//! happen outside and report back through [`FormState::attach_server_error`].

use std::collections::BTreeMap;

use crate::codec::{default_form_value, empty_form_value, form_value, wire_value, CodecError};
use crate::group::GroupEntry;
use crate::validate::{validate_field, FieldViolation};
use crate::value::{DateValue, FormValue};
use tablekit_protocol::{Row, RowId, Value};
use tablekit_schema::{CascadeGraph, Field, FieldConfiguration, SchemaCatalog, Table};

/// One field's slot in a form: its schema snapshot, current value, and
/// per-field feedback state.
#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub field: Field,
    pub value: FormValue,
    /// True once the user has touched this field in the current session.
    pub dirty: bool,
    /// A field-scoped rejection reported by the backend after submit.
    pub server_error: Option<String>,
}

impl FormEntry {
    fn new(field: &Field, value: FormValue) -> Self {
        Self {
            field: field.clone(),
            value,
            dirty: false,
            server_error: None,
        }
    }
}

/// Form state for creating or editing one row.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    table: Table,
    row_id: Option<RowId>,
    entries: Vec<FormEntry>,
    cascades: CascadeGraph,
}

impl FormState {
    /// A creation form: every field starts from its configured default, or
    /// the type-appropriate empty when it has none.
    pub fn new(table: &Table) -> Self {
        let entries = table
            .form_fields()
            .into_iter()
            .map(|field| FormEntry::new(field, default_form_value(&field.configuration)))
            .collect();
        Self {
            table: table.clone(),
            row_id: None,
            entries,
            cascades: CascadeGraph::new(),
        }
    }

    /// An edit form over a stored row. Absent cells become empty, never the
    /// configured default; defaults apply to new rows only.
    pub fn from_row(table: &Table, catalog: &SchemaCatalog, row: &Row) -> Self {
        let entries = table
            .form_fields()
            .into_iter()
            .map(|field| {
                let value = form_value(&field.configuration, row.value(&field.slug), catalog);
                FormEntry::new(field, value)
            })
            .collect();
        Self {
            table: table.clone(),
            row_id: Some(row.id.clone()),
            entries,
            cascades: CascadeGraph::new(),
        }
    }

    /// Declare reset edges between this form's fields.
    pub fn with_cascades(mut self, cascades: CascadeGraph) -> Self {
        self.cascades = cascades;
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The stored row being edited, `None` for a creation form.
    pub fn row_id(&self) -> Option<&RowId> {
        self.row_id.as_ref()
    }

    pub fn entries(&self) -> &[FormEntry] {
        &self.entries
    }

    pub fn entry(&self, slug: &str) -> Option<&FormEntry> {
        self.entries.iter().find(|e| e.field.slug == slug)
    }

    pub fn value(&self, slug: &str) -> Option<&FormValue> {
        self.entry(slug).map(|e| &e.value)
    }

    pub fn is_dirty(&self) -> bool {
        self.entries.iter().any(|e| e.dirty)
    }

    /// Replace one field's value. Marks the field dirty, drops any stale
    /// server error on it, and resets every transitive cascade dependent
    /// back to its default.
    pub fn set(&mut self, slug: &str, value: FormValue) {
        if let Some(entry) = self.entry_mut(slug) {
            entry.value = value;
            entry.dirty = true;
            entry.server_error = None;
        } else {
            return;
        }
        for dependent in self.cascades.cascade_from(slug) {
            if let Some(entry) = self.entry_mut(&dependent) {
                entry.value = default_form_value(&entry.field.configuration);
                entry.dirty = true;
                entry.server_error = None;
            }
        }
    }

    /// Apply raw text input. Text fields store it as-is (empty clears); date
    /// fields parse strictly against the configured display format, keeping
    /// a rejected string as [`DateValue::Invalid`] so the form can both
    /// re-render it and refuse to submit it.
    pub fn input(&mut self, slug: &str, raw: &str) {
        let Some(entry) = self.entry(slug) else {
            return;
        };
        let value = match &entry.field.configuration {
            FieldConfiguration::Date(config) => {
                if raw.is_empty() {
                    FormValue::Unset
                } else {
                    match config.format.parse_strict(raw) {
                        Ok(at) => FormValue::Date(DateValue::Parsed(at)),
                        Err(_) => FormValue::Date(DateValue::Invalid(raw.to_string())),
                    }
                }
            }
            _ => {
                if raw.is_empty() {
                    FormValue::Unset
                } else {
                    FormValue::Text(raw.to_string())
                }
            }
        };
        self.set(slug, value);
    }

    /// Append a blank sub-record to a field-group cell. No-op when the slug
    /// is not a group field or its nested table is unknown.
    pub fn append_group_entry(&mut self, slug: &str, catalog: &SchemaCatalog) -> bool {
        let nested = {
            let Some(entry) = self.entry(slug) else {
                return false;
            };
            let FieldConfiguration::FieldGroup(config) = &entry.field.configuration else {
                return false;
            };
            match catalog.resolve_group(config) {
                Some(table) => table.clone(),
                None => return false,
            }
        };
        let Some(entry) = self.entry_mut(slug) else {
            return false;
        };
        let mut list = match std::mem::replace(&mut entry.value, FormValue::Unset) {
            FormValue::Group(list) => list,
            _ => Vec::new(),
        };
        list.push(GroupEntry::blank(&nested));
        entry.value = FormValue::Group(list);
        entry.dirty = true;
        true
    }

    /// Remove one sub-record by index. Purely local; when the entry is
    /// backed by a stored row the caller must have deleted it remotely
    /// first and only call this on success.
    pub fn remove_group_entry(&mut self, slug: &str, index: usize) -> Option<GroupEntry> {
        let entry = self.entry_mut(slug)?;
        let FormValue::Group(list) = &mut entry.value else {
            return None;
        };
        if index >= list.len() {
            return None;
        }
        entry.dirty = true;
        Some(list.remove(index))
    }

    /// All violations, in form order. Empty means submit may proceed.
    pub fn validate(&self) -> Vec<FieldViolation> {
        self.entries
            .iter()
            .flat_map(|e| validate_field(&e.field, &e.value))
            .collect()
    }

    /// Serialize every editable field back to wire values. Response fields
    /// are skipped: their writes go through the dedicated response path.
    pub fn wire_values(&self) -> Result<BTreeMap<String, Value>, CodecError> {
        let mut values = BTreeMap::new();
        for entry in &self.entries {
            if matches!(entry.value, FormValue::Aggregate(_)) {
                continue;
            }
            let value = wire_value(&entry.field.configuration, &entry.value)?;
            values.insert(entry.field.slug.clone(), value);
        }
        Ok(values)
    }

    /// True when no field holds a value. Aggregates do not count.
    pub fn is_blank(&self) -> bool {
        self.entries
            .iter()
            .all(|e| matches!(e.value, FormValue::Aggregate(_)) || e.value.is_empty())
    }

    /// Record a field-scoped backend rejection against its field.
    pub fn attach_server_error(&mut self, slug: &str, message: impl Into<String>) {
        if let Some(entry) = self.entry_mut(slug) {
            entry.server_error = Some(message.into());
        }
    }

    /// Reset dirty flags and server errors, typically after a successful
    /// submit.
    pub fn mark_clean(&mut self) {
        for entry in &mut self.entries {
            entry.dirty = false;
            entry.server_error = None;
        }
    }

    /// Re-key the form onto the row the backend created, so a follow-up
    /// submit updates instead of re-creating.
    pub fn bind_row(&mut self, id: RowId) {
        self.row_id = Some(id);
    }

    fn entry_mut(&mut self, slug: &str) -> Option<&mut FormEntry> {
        self.entries.iter_mut().find(|e| e.field.slug == slug)
    }

    /// Reset one field to its empty value without marking it dirty. Used
    /// when an upstream schema change removes the value's meaning.
    pub fn reset(&mut self, slug: &str) {
        if let Some(entry) = self.entry_mut(slug) {
            entry.value = empty_form_value(&entry.field.configuration);
        }
    }
}
