//! Schema lookup by table slug.
//!
//! Group fields reference their nested table by slug; the catalog is how
//! that reference is resolved, both at validation time (acyclicity) and when
//! a form expands a nested group.

use crate::table::{GroupConfig, Table, TableKind};
use std::collections::BTreeMap;

/// All table schemas known to one client session, keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, Table>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.slug.clone(), table);
    }

    pub fn remove(&mut self, slug: &str) -> Option<Table> {
        self.tables.remove(slug)
    }

    pub fn get(&self, slug: &str) -> Option<&Table> {
        self.tables.get(slug)
    }

    /// Resolve a group field's nested table. `None` when the slug is unknown
    /// or names a table that is not a field-group.
    pub fn resolve_group(&self, config: &GroupConfig) -> Option<&Table> {
        self.get(&config.group.slug)
            .filter(|t| t.kind == TableKind::FieldGroup)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
