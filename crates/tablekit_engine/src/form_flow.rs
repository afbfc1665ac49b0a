//! Row I/O around a form: listing, submission, feedback routing, group
//! sub-record deletes, file attachment.
//!
//! Cache writes happen only after the server acknowledged the mutation
//! (write-through, never optimistic), and feedback routes by cause:
//! field-identifiable rejections attach to their field and block submit,
//! everything else is returned for the host to surface as a dismissible
//! notification with the form state intact.

use std::sync::Arc;

use tablekit_forms::{FormState, FormValue};
use tablekit_protocol::{ErrorCause, Page, QueryState, Row, RowId, ServiceError};
use tablekit_schema::FieldConfiguration;
use tracing::{debug, warn};

use crate::cache::ViewCache;
use crate::services::{FileService, RowService, UploadRequest};

/// What a submit attempt came to.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Acknowledged; the returned row is already merged into the cache.
    Saved(Row),
    /// Local validation failed; nothing was sent.
    Invalid(Vec<tablekit_forms::FieldViolation>),
    /// The backend rejected the write. Field-identifiable causes have
    /// already been attached to their field; the rest belongs in a toast.
    Rejected(ServiceError),
}

/// Drives one table's row operations against the row and file services,
/// keeping the shared view cache consistent.
pub struct FormFlow {
    rows: Arc<dyn RowService>,
    files: Arc<dyn FileService>,
    cache: Arc<ViewCache>,
}

impl FormFlow {
    pub fn new(rows: Arc<dyn RowService>, files: Arc<dyn FileService>, cache: Arc<ViewCache>) -> Self {
        Self { rows, files, cache }
    }

    /// Read-through list fetch: a cached page is returned as-is, a miss goes
    /// to the service and is cached on the way back.
    pub async fn load_page(
        &self,
        table_slug: &str,
        query: &QueryState,
    ) -> Result<Page<Row>, ServiceError> {
        if let Some(page) = self.cache.get(table_slug, query) {
            debug!(table = table_slug, "list page served from cache");
            return Ok(page);
        }
        let page = self.rows.list_rows(table_slug, query).await?;
        self.cache.put(table_slug, query, page.clone());
        Ok(page)
    }

    /// Validate and persist the form. Create when the form has no row
    /// identity yet, update otherwise.
    pub async fn submit(&self, form: &mut FormState) -> SubmitOutcome {
        let violations = form.validate();
        if !violations.is_empty() {
            return SubmitOutcome::Invalid(violations);
        }
        let values = match form.wire_values() {
            Ok(values) => values,
            Err(err) => {
                return SubmitOutcome::Rejected(ServiceError::new(
                    ErrorCause::InvalidParameters,
                    err.to_string(),
                ));
            }
        };

        let table_slug = form.table().slug.clone();
        let result = match form.row_id() {
            Some(id) => {
                let id = id.clone();
                self.rows.update_row(&table_slug, &id, values).await
            }
            None => self.rows.create_row(&table_slug, values).await,
        };

        match result {
            Ok(row) => {
                if form.row_id().is_some() {
                    self.cache.apply_updated(&table_slug, &row);
                } else {
                    self.cache.apply_created(&table_slug, &row);
                }
                form.bind_row(row.id.clone());
                form.mark_clean();
                SubmitOutcome::Saved(row)
            }
            Err(err) => {
                if let Some(slug) = err.field_slug.clone().filter(|_| err.is_field_identifiable())
                {
                    form.attach_server_error(&slug, err.message.clone());
                } else {
                    warn!(table = %table_slug, cause = %err.cause, "row submit rejected");
                }
                SubmitOutcome::Rejected(err)
            }
        }
    }

    /// Remove one field-group sub-record. A persisted entry is deleted
    /// against the nested table's row storage first; only a confirmed delete
    /// (or an entry that was never saved) leaves the visible list. On
    /// failure, typically `ROW_IN_USE`, the entry stays and the error is
    /// returned for the host to surface.
    pub async fn remove_group_entry(
        &self,
        form: &mut FormState,
        slug: &str,
        index: usize,
    ) -> Result<bool, ServiceError> {
        let persisted = {
            let Some(entries) = form.value(slug).and_then(FormValue::as_group) else {
                return Ok(false);
            };
            let Some(entry) = entries.get(index) else {
                return Ok(false);
            };
            entry.row_id.clone()
        };

        if let Some(row_id) = persisted {
            let nested_slug = {
                let Some(field) = form.table().field(slug) else {
                    return Ok(false);
                };
                let FieldConfiguration::FieldGroup(config) = &field.configuration else {
                    return Ok(false);
                };
                config.group.slug.clone()
            };
            self.rows.delete_row(&nested_slug, &row_id).await?;
            self.cache.apply_removed(&nested_slug, &row_id);
        }
        Ok(form.remove_group_entry(slug, index).is_some())
    }

    /// Append or replace the current user's response on a reaction or
    /// evaluation cell. This is the only write path for those field types.
    pub async fn submit_response(
        &self,
        table_slug: &str,
        row: &Row,
        field_slug: &str,
        user: &str,
        value: serde_json::Value,
    ) -> Result<Row, ServiceError> {
        let merged = tablekit_forms::apply_response(row.value(field_slug), user, value);
        let mut values = std::collections::BTreeMap::new();
        values.insert(field_slug.to_string(), merged);
        let updated = self.rows.update_row(table_slug, &row.id, values).await?;
        self.cache.apply_updated(table_slug, &updated);
        Ok(updated)
    }

    /// Upload files and append the returned storage objects to a FILE
    /// field's value. On failure the field is left untouched.
    pub async fn attach_files(
        &self,
        form: &mut FormState,
        slug: &str,
        request: UploadRequest,
    ) -> Result<(), ServiceError> {
        let uploaded = self.files.upload(request).await?;
        let mut files = form
            .value(slug)
            .and_then(|v| v.as_files().map(<[_]>::to_vec))
            .unwrap_or_default();
        files.extend(uploaded);
        form.set(slug, FormValue::Files(files));
        Ok(())
    }

    /// Delete one stored file and drop it from the field's value.
    pub async fn detach_file(
        &self,
        form: &mut FormState,
        slug: &str,
        file_id: &str,
    ) -> Result<(), ServiceError> {
        self.files.delete_file(file_id).await?;
        let mut files = form
            .value(slug)
            .and_then(|v| v.as_files().map(<[_]>::to_vec))
            .unwrap_or_default();
        files.retain(|f| f.id != file_id);
        form.set(slug, FormValue::Files(files));
        Ok(())
    }

    /// Soft-delete a row and patch every cached view.
    pub async fn trash_row(&self, table_slug: &str, id: &RowId) -> Result<Row, ServiceError> {
        let row = self.rows.trash_row(table_slug, id).await?;
        self.cache.apply_trash_state(table_slug, &row);
        Ok(row)
    }

    pub async fn restore_row(&self, table_slug: &str, id: &RowId) -> Result<Row, ServiceError> {
        let row = self.rows.restore_row(table_slug, id).await?;
        self.cache.apply_trash_state(table_slug, &row);
        Ok(row)
    }

    /// Hard-delete a row. `ROW_IN_USE` keeps the row everywhere.
    pub async fn delete_row(&self, table_slug: &str, id: &RowId) -> Result<(), ServiceError> {
        self.rows.delete_row(table_slug, id).await?;
        self.cache.apply_removed(table_slug, id);
        Ok(())
    }
}
