//! In-memory service fakes.
//!
//! Each fake keeps its state behind a `Mutex` and implements the matching
//! engine contract faithfully enough for flow tests: filters and pagination
//! on listing, soft deletes, cause-coded errors, and injectable failures.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tablekit_engine::{
    Action, AuthzOracle, FieldDraft, FieldOrderUpdate, FileService, ResourceAcl, RowService,
    TableService, UploadRequest,
};
use tablekit_protocol::{
    ErrorCause, FieldId, Page, QueryState, Resource, Row, RowId, ServiceError, StorageObject,
    Value,
};
use tablekit_schema::{Field, Table};

fn not_found(resource: Resource, what: impl std::fmt::Display) -> ServiceError {
    ServiceError::new(ErrorCause::NotFound(resource), format!("{what} not found"))
}

// ============================================================================
// Tables
// ============================================================================

/// In-memory table metadata service.
#[derive(Default)]
pub struct InMemoryTables {
    tables: Mutex<BTreeMap<String, Table>>,
    fail_next: Mutex<Option<ServiceError>>,
}

impl InMemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: Table) -> Self {
        self.tables
            .lock()
            .unwrap()
            .insert(table.slug.clone(), table);
        self
    }

    pub fn insert(&self, table: Table) {
        self.tables
            .lock()
            .unwrap()
            .insert(table.slug.clone(), table);
    }

    /// Make the next call fail with the given error.
    pub fn fail_next(&self, error: ServiceError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    fn take_failure(&self) -> Result<(), ServiceError> {
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn with_table_mut<T>(
        &self,
        slug: &str,
        f: impl FnOnce(&mut Table) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut tables = self.tables.lock().unwrap();
        let table = tables
            .get_mut(slug)
            .ok_or_else(|| not_found(Resource::Table, slug))?;
        f(table)
    }
}

#[async_trait]
impl TableService for InMemoryTables {
    async fn get_table(&self, slug: &str) -> Result<Table, ServiceError> {
        self.take_failure()?;
        self.tables
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .ok_or_else(|| not_found(Resource::Table, slug))
    }

    async fn create_field(
        &self,
        table_slug: &str,
        draft: FieldDraft,
    ) -> Result<Field, ServiceError> {
        self.take_failure()?;
        self.with_table_mut(table_slug, |table| {
            if table.field(&draft.slug).is_some() {
                return Err(ServiceError::new(
                    ErrorCause::AlreadyExists(Resource::Field),
                    format!("a field named '{}' already exists", draft.slug),
                )
                .for_field(&draft.slug));
            }
            let field = Field {
                id: FieldId::new(),
                slug: draft.slug,
                name: draft.name,
                trashed: false,
                configuration: draft.configuration,
            };
            table.fields.push(field.clone());
            Ok(field)
        })
    }

    async fn update_field(
        &self,
        table_slug: &str,
        field_id: &FieldId,
        draft: FieldDraft,
    ) -> Result<Field, ServiceError> {
        self.take_failure()?;
        self.with_table_mut(table_slug, |table| {
            let field = table
                .fields
                .iter_mut()
                .find(|f| &f.id == field_id)
                .ok_or_else(|| not_found(Resource::Field, field_id))?;
            field.slug = draft.slug;
            field.name = draft.name;
            field.configuration = draft.configuration;
            Ok(field.clone())
        })
    }

    async fn reorder_fields(
        &self,
        table_slug: &str,
        order: FieldOrderUpdate,
    ) -> Result<Table, ServiceError> {
        self.take_failure()?;
        self.with_table_mut(table_slug, |table| {
            match order {
                FieldOrderUpdate::List(ids) => table.configuration.field_order.list = ids,
                FieldOrderUpdate::Form(ids) => table.configuration.field_order.form = ids,
            }
            Ok(table.clone())
        })
    }

    async fn trash_field(
        &self,
        table_slug: &str,
        field_id: &FieldId,
    ) -> Result<Table, ServiceError> {
        self.take_failure()?;
        self.with_table_mut(table_slug, |table| {
            let active = table.active_fields().count();
            let field = table
                .fields
                .iter_mut()
                .find(|f| &f.id == field_id)
                .ok_or_else(|| not_found(Resource::Field, field_id))?;
            if !field.trashed && active <= 1 {
                return Err(ServiceError::new(
                    ErrorCause::LastActiveField,
                    "a table needs at least one active field",
                ));
            }
            field.trashed = true;
            Ok(table.clone())
        })
    }

    async fn restore_field(
        &self,
        table_slug: &str,
        field_id: &FieldId,
    ) -> Result<Table, ServiceError> {
        self.take_failure()?;
        self.with_table_mut(table_slug, |table| {
            let field = table
                .fields
                .iter_mut()
                .find(|f| &f.id == field_id)
                .ok_or_else(|| not_found(Resource::Field, field_id))?;
            field.trashed = false;
            Ok(table.clone())
        })
    }
}

// ============================================================================
// Rows
// ============================================================================

/// In-memory row storage with working filters, pagination and soft deletes.
#[derive(Default)]
pub struct InMemoryRows {
    rows: Mutex<BTreeMap<String, Vec<Row>>>,
    fail_next: Mutex<Option<ServiceError>>,
    /// Row ids whose hard delete fails with `ROW_IN_USE`.
    in_use: Mutex<Vec<RowId>>,
}

impl InMemoryRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: &str, row: Row) -> RowId {
        let id = row.id.clone();
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
        id
    }

    pub fn fail_next(&self, error: ServiceError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    /// Mark a row as referenced: deleting it fails with `ROW_IN_USE`.
    pub fn mark_in_use(&self, id: RowId) {
        self.in_use.lock().unwrap().push(id);
    }

    pub fn stored(&self, table: &str, id: &RowId) -> Option<Row> {
        self.rows
            .lock()
            .unwrap()
            .get(table)?
            .iter()
            .find(|r| &r.id == id)
            .cloned()
    }

    pub fn count(&self, table: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .get(table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn take_failure(&self) -> Result<(), ServiceError> {
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn matches(row: &Row, key: &str, wanted: &str) -> bool {
        match row.value(key) {
            Value::Text(text) => wanted
                .split(',')
                .any(|token| text.to_lowercase().contains(&token.to_lowercase())),
            Value::Strings(values) => wanted
                .split(',')
                .any(|token| values.iter().any(|v| v.as_str() == token)),
            _ => false,
        }
    }
}

#[async_trait]
impl RowService for InMemoryRows {
    async fn list_rows(
        &self,
        table_slug: &str,
        query: &QueryState,
    ) -> Result<Page<Row>, ServiceError> {
        self.take_failure()?;
        let rows = self.rows.lock().unwrap();
        let all = rows.get(table_slug).cloned().unwrap_or_default();

        let filtered: Vec<Row> = all
            .into_iter()
            .filter(|row| row.trashed == query.trashed())
            .filter(|row| {
                query
                    .filter_params()
                    .all(|(key, wanted)| Self::matches(row, key, wanted))
            })
            .collect();

        let page = query.page();
        let per_page = query.per_page(25);
        let total = filtered.len() as u64;
        let start = ((page - 1) * per_page) as usize;
        let items: Vec<Row> = filtered
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        let has_more = (start + items.len()) < total as usize;
        Ok(Page {
            items,
            page,
            per_page,
            total,
            next_page: has_more.then_some(page + 1),
        })
    }

    async fn get_row(&self, table_slug: &str, id: &RowId) -> Result<Row, ServiceError> {
        self.take_failure()?;
        self.stored(table_slug, id)
            .ok_or_else(|| not_found(Resource::Row, id))
    }

    async fn create_row(
        &self,
        table_slug: &str,
        values: BTreeMap<String, Value>,
    ) -> Result<Row, ServiceError> {
        self.take_failure()?;
        let mut row = Row::new();
        row.values = values;
        self.seed(table_slug, row.clone());
        Ok(row)
    }

    async fn update_row(
        &self,
        table_slug: &str,
        id: &RowId,
        values: BTreeMap<String, Value>,
    ) -> Result<Row, ServiceError> {
        self.take_failure()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(table_slug)
            .and_then(|list| list.iter_mut().find(|r| &r.id == id))
            .ok_or_else(|| not_found(Resource::Row, id))?;
        for (slug, value) in values {
            row.set_value(slug, value);
        }
        Ok(row.clone())
    }

    async fn delete_row(&self, table_slug: &str, id: &RowId) -> Result<(), ServiceError> {
        self.take_failure()?;
        if self.in_use.lock().unwrap().contains(id) {
            return Err(ServiceError::new(
                ErrorCause::InUse(Resource::Row),
                "row is referenced by another record",
            ));
        }
        let mut rows = self.rows.lock().unwrap();
        let list = rows
            .get_mut(table_slug)
            .ok_or_else(|| not_found(Resource::Table, table_slug))?;
        let before = list.len();
        list.retain(|r| &r.id != id);
        if list.len() == before {
            return Err(not_found(Resource::Row, id));
        }
        Ok(())
    }

    async fn trash_row(&self, table_slug: &str, id: &RowId) -> Result<Row, ServiceError> {
        self.take_failure()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(table_slug)
            .and_then(|list| list.iter_mut().find(|r| &r.id == id))
            .ok_or_else(|| not_found(Resource::Row, id))?;
        row.trashed = true;
        row.trashed_at = Some(Utc::now());
        Ok(row.clone())
    }

    async fn restore_row(&self, table_slug: &str, id: &RowId) -> Result<Row, ServiceError> {
        self.take_failure()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(table_slug)
            .and_then(|list| list.iter_mut().find(|r| &r.id == id))
            .ok_or_else(|| not_found(Resource::Row, id))?;
        row.trashed = false;
        row.trashed_at = None;
        Ok(row.clone())
    }
}

// ============================================================================
// Files
// ============================================================================

/// In-memory file storage issuing sequential storage ids.
#[derive(Default)]
pub struct InMemoryFiles {
    next_id: AtomicU64,
    deleted: Mutex<Vec<String>>,
    rejected_content_type: Mutex<Option<String>>,
}

impl InMemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads with this content type fail with `INVALID_FILE_TYPE`.
    pub fn reject_content_type(&self, content_type: &str) {
        *self.rejected_content_type.lock().unwrap() = Some(content_type.to_string());
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileService for InMemoryFiles {
    async fn upload(&self, request: UploadRequest) -> Result<Vec<StorageObject>, ServiceError> {
        if self.rejected_content_type.lock().unwrap().as_deref() == Some(&request.content_type) {
            return Err(ServiceError::new(
                ErrorCause::InvalidFileType,
                format!("'{}' uploads are not allowed", request.content_type),
            ));
        }
        let id = format!("file-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        Ok(vec![StorageObject {
            id,
            name: Some(request.file_name),
            url: None,
            size: Some(request.bytes.len() as u64),
        }])
    }

    async fn delete_file(&self, id: &str) -> Result<(), ServiceError> {
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

// ============================================================================
// Authorization
// ============================================================================

/// Oracle that grants mutations to the owner and administrators, row
/// creation additionally to anyone when the table collaborates, and viewing
/// to everyone.
pub struct OwnerOracle {
    pub user: String,
}

impl OwnerOracle {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    fn is_manager(&self, resource: &ResourceAcl) -> bool {
        resource.owner == self.user || resource.administrators.contains(&self.user)
    }
}

#[async_trait]
impl AuthzOracle for OwnerOracle {
    async fn can_perform(&self, action: Action, resource: &ResourceAcl) -> bool {
        match action {
            Action::View => true,
            Action::Create => self.is_manager(resource) || resource.collaboration,
            Action::Update | Action::Delete => self.is_manager(resource),
        }
    }
}
