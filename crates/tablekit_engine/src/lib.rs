//! The async half of the Tablekit field engine.
//!
//! Everything stateful or remote lives here, behind the narrow service
//! contracts in [`services`]: loading and mutating schemas, listing and
//! writing rows, searching related tables, uploading files. The pure
//! conversion and validation logic stays in `tablekit_forms`; this crate
//! drives it and owns the shared view cache that keeps every open list and
//! form consistent after a mutation.
//!
//! # Modules
//!
//! - [`services`]: `async_trait` contracts for the external collaborators
//! - [`config`]: engine tuning knobs and their defaults
//! - [`cache`]: the shared per-table view cache with id-match patching
//! - [`resolver`]: the relationship search state machine
//! - [`schema_flow`]: table/field metadata lifecycle and catalog upkeep
//! - [`form_flow`]: row submission, error routing, group sub-record deletes
//! - [`filter_flow`]: applying and clearing filters against query state

pub mod cache;
pub mod config;
pub mod error;
pub mod filter_flow;
pub mod form_flow;
pub mod resolver;
pub mod schema_flow;
pub mod services;

pub use cache::ViewCache;
pub use config::EngineConfig;
pub use error::EngineError;
pub use filter_flow::{apply_filters, clear_filters};
pub use form_flow::{FormFlow, SubmitOutcome};
pub use resolver::{Debouncer, RelationResolver, SearchTicket};
pub use schema_flow::SchemaFlow;
pub use services::{
    affordances_for, Action, Affordances, AuthzOracle, FieldDraft, FieldOrderUpdate, FileService,
    ResourceAcl, RowService, TableService, UploadRequest,
};
