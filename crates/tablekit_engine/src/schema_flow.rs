//! Table and field metadata lifecycle.
//!
//! Owns the client-side schema catalog: tables load through it keyed by
//! slug, and any field mutation refreshes the affected table from the
//! service response, which is what keeps forms and filters rendering the
//! current field set. Drafts are validated locally against the catalog
//! before they are sent, so a schema the backend would reject with
//! `UNPROCESSABLE_ENTITY` never leaves the client.

use std::sync::Arc;

use tablekit_protocol::FieldId;
use tablekit_schema::{validate_table, Field, SchemaCatalog, Table};
use tracing::debug;

use crate::cache::ViewCache;
use crate::error::EngineError;
use crate::services::{FieldDraft, FieldOrderUpdate, TableService};

pub struct SchemaFlow {
    tables: Arc<dyn TableService>,
    cache: Arc<ViewCache>,
    catalog: SchemaCatalog,
}

impl SchemaFlow {
    pub fn new(tables: Arc<dyn TableService>, cache: Arc<ViewCache>) -> Self {
        Self {
            tables,
            cache,
            catalog: SchemaCatalog::new(),
        }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Fetch a table schema, serving repeat lookups from the catalog.
    pub async fn load_table(&mut self, slug: &str) -> Result<Table, EngineError> {
        if let Some(table) = self.catalog.get(slug) {
            return Ok(table.clone());
        }
        let table = self.tables.get_table(slug).await?;
        debug!(table = slug, fields = table.fields.len(), "schema loaded");
        self.catalog.insert(table.clone());
        Ok(table)
    }

    pub async fn create_field(
        &mut self,
        table_slug: &str,
        draft: FieldDraft,
    ) -> Result<Field, EngineError> {
        let mut prospective = self.require(table_slug)?;
        prospective.fields.push(Field {
            id: FieldId::new(),
            slug: draft.slug.clone(),
            name: draft.name.clone(),
            trashed: false,
            configuration: draft.configuration.clone(),
        });
        validate_table(&prospective, &self.catalog)?;

        let field = self.tables.create_field(table_slug, draft).await?;
        self.refresh(table_slug).await?;
        Ok(field)
    }

    pub async fn update_field(
        &mut self,
        table_slug: &str,
        field_id: &FieldId,
        draft: FieldDraft,
    ) -> Result<Field, EngineError> {
        let mut prospective = self.require(table_slug)?;
        if let Some(existing) = prospective.fields.iter_mut().find(|f| &f.id == field_id) {
            existing.slug = draft.slug.clone();
            existing.name = draft.name.clone();
            existing.configuration = draft.configuration.clone();
        }
        validate_table(&prospective, &self.catalog)?;

        let field = self.tables.update_field(table_slug, field_id, draft).await?;
        self.refresh(table_slug).await?;
        Ok(field)
    }

    pub async fn reorder_fields(
        &mut self,
        table_slug: &str,
        order: FieldOrderUpdate,
    ) -> Result<Table, EngineError> {
        let table = self.tables.reorder_fields(table_slug, order).await?;
        self.catalog.insert(table.clone());
        Ok(table)
    }

    /// Soft-delete a field. The field disappears from rendering and
    /// validation; stored row data under its slug survives. Fails with
    /// `LAST_ACTIVE_FIELD` when nothing else would remain active.
    pub async fn trash_field(
        &mut self,
        table_slug: &str,
        field_id: &FieldId,
    ) -> Result<Table, EngineError> {
        let table = self.tables.trash_field(table_slug, field_id).await?;
        self.catalog.insert(table.clone());
        Ok(table)
    }

    /// Undo a field trash, re-enabling editing of its preserved data.
    pub async fn restore_field(
        &mut self,
        table_slug: &str,
        field_id: &FieldId,
    ) -> Result<Table, EngineError> {
        let table = self.tables.restore_field(table_slug, field_id).await?;
        self.catalog.insert(table.clone());
        Ok(table)
    }

    fn require(&self, slug: &str) -> Result<Table, EngineError> {
        self.catalog
            .get(slug)
            .cloned()
            .ok_or_else(|| EngineError::UnknownTable {
                slug: slug.to_string(),
            })
    }

    /// Re-fetch a table after a field mutation and drop its cached views;
    /// pages listed under the old field set may no longer be right.
    async fn refresh(&mut self, slug: &str) -> Result<(), EngineError> {
        let table = self.tables.get_table(slug).await?;
        self.catalog.insert(table);
        self.cache.invalidate_table(slug);
        Ok(())
    }
}
