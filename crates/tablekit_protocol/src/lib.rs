//! Canonical wire types for the Tablekit field engine.
//!
//! Everything that crosses a service boundary lives here: identifiers, the
//! wire `Value` a row cell is stored as, pagination, the error-cause taxonomy
//! the row/field/table services speak, the supported date display patterns,
//! and the flat query-string state the filter layer reads and writes.
//!
//! These are the CANONICAL definitions - every other crate branches on the
//! enums defined here rather than carrying its own copy.

pub mod cause;
pub mod date_format;
pub mod ids;
pub mod query;
pub mod types;

// Re-export the types callers reach for constantly.
pub use cause::{ErrorCause, Resource, ServiceError};
pub use date_format::{DateFormat, DateParseError};
pub use ids::{FieldId, IdParseError, RowId, TableId};
pub use query::{
    QueryState, PARAM_PAGE, PARAM_PER_PAGE, PARAM_STYLE, PARAM_TRASHED, RESERVED_PARAMS,
};
pub use types::{
    parse_iso_datetime, DisplayStyle, FieldType, Page, Response, Row, SortOrder, StorageObject,
    TextFormat, Value,
};
