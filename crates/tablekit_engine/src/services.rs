//! Contracts for the external collaborators.
//!
//! The engine never talks to a transport directly; hosts hand it trait
//! objects for metadata, row storage, file storage and authorization. Every
//! method returns the shared [`ServiceError`] so cause-based feedback
//! routing works the same regardless of the backing implementation.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tablekit_protocol::{
    FieldId, Page, QueryState, Row, RowId, ServiceError, StorageObject, Value,
};
use tablekit_schema::{Field, FieldConfiguration, Table, TableConfiguration};

/// The shape of a field create or update request.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDraft {
    pub slug: String,
    pub name: String,
    pub configuration: FieldConfiguration,
}

/// Which of the two field orders a reorder call replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOrderUpdate {
    List(Vec<FieldId>),
    Form(Vec<FieldId>),
}

/// Table and field metadata endpoints.
#[async_trait]
pub trait TableService: Send + Sync {
    async fn get_table(&self, slug: &str) -> Result<Table, ServiceError>;

    async fn create_field(
        &self,
        table_slug: &str,
        draft: FieldDraft,
    ) -> Result<Field, ServiceError>;

    async fn update_field(
        &self,
        table_slug: &str,
        field_id: &FieldId,
        draft: FieldDraft,
    ) -> Result<Field, ServiceError>;

    async fn reorder_fields(
        &self,
        table_slug: &str,
        order: FieldOrderUpdate,
    ) -> Result<Table, ServiceError>;

    /// Soft-delete a field. Fails with `LAST_ACTIVE_FIELD` when it is the
    /// table's only remaining active field.
    async fn trash_field(&self, table_slug: &str, field_id: &FieldId)
        -> Result<Table, ServiceError>;

    async fn restore_field(
        &self,
        table_slug: &str,
        field_id: &FieldId,
    ) -> Result<Table, ServiceError>;
}

/// Row storage endpoints. Listing takes the full query state so filters,
/// pagination and the trash toggle travel as one canonical value.
#[async_trait]
pub trait RowService: Send + Sync {
    async fn list_rows(&self, table_slug: &str, query: &QueryState)
        -> Result<Page<Row>, ServiceError>;

    async fn get_row(&self, table_slug: &str, id: &RowId) -> Result<Row, ServiceError>;

    async fn create_row(
        &self,
        table_slug: &str,
        values: BTreeMap<String, Value>,
    ) -> Result<Row, ServiceError>;

    async fn update_row(
        &self,
        table_slug: &str,
        id: &RowId,
        values: BTreeMap<String, Value>,
    ) -> Result<Row, ServiceError>;

    /// Hard delete, with referential-integrity signaling (`ROW_IN_USE`).
    async fn delete_row(&self, table_slug: &str, id: &RowId) -> Result<(), ServiceError>;

    async fn trash_row(&self, table_slug: &str, id: &RowId) -> Result<Row, ServiceError>;

    async fn restore_row(&self, table_slug: &str, id: &RowId) -> Result<Row, ServiceError>;
}

/// One file going up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Binary storage endpoints. Rows only ever hold the returned storage ids.
#[async_trait]
pub trait FileService: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<Vec<StorageObject>, ServiceError>;

    async fn delete_file(&self, id: &str) -> Result<(), ServiceError>;
}

/// What a user is about to do to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

/// Ownership facts the oracle judges against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAcl {
    pub owner: String,
    pub administrators: Vec<String>,
    pub collaboration: bool,
}

impl From<&TableConfiguration> for ResourceAcl {
    fn from(config: &TableConfiguration) -> Self {
        Self {
            owner: config.owner.clone(),
            administrators: config.administrators.clone(),
            collaboration: config.collaboration,
        }
    }
}

/// Permission decisions are asked, never made here: the engine consults the
/// oracle before exposing an affordance and otherwise trusts the backend to
/// enforce.
#[async_trait]
pub trait AuthzOracle: Send + Sync {
    async fn can_perform(&self, action: Action, resource: &ResourceAcl) -> bool;
}

/// Which mutating affordances a host may expose for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

/// Ask the oracle once per affordance so a host can show or hide its
/// buttons up front.
pub async fn affordances_for(oracle: &dyn AuthzOracle, acl: &ResourceAcl) -> Affordances {
    Affordances {
        create: oracle.can_perform(Action::Create, acl).await,
        update: oracle.can_perform(Action::Update, acl).await,
        delete: oracle.can_perform(Action::Delete, acl).await,
    }
}
