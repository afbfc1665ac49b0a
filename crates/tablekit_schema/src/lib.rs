//! Field Schema Model
//!
//! # Philosophy: the schema drives everything
//!
//! A Tablekit table is defined entirely by metadata fetched at runtime:
//!
//! 1. **Definition**: a user declares a table and its typed fields
//! 2. **Validation**: the schema is checked at save time - unique slugs,
//!    at least one active field, complete relationship targets, acyclic
//!    field-group nesting
//! 3. **Interpretation**: forms, filters and list views all branch on the
//!    same [`FieldConfiguration`] sum type; adding a field type means the
//!    compiler flags every match that must learn about it
//! 4. **Evolution**: trashing a field is a soft delete - it vanishes from
//!    rendering and validation, its stored row data survives
//!
//! There are no stringly-typed `if type == X` checks downstream. The closed
//! variant set here is the single source of truth.
//!
//! # Modules
//!
//! - [`table`]: core types ([`Table`], [`Field`], [`FieldConfiguration`], ...)
//! - [`catalog`]: schema lookup by slug, used to resolve nested group tables
//! - [`validate`]: save-time schema validation
//! - [`deps`]: explicit cross-field dependency edges and cascade propagation

pub mod catalog;
pub mod deps;
pub mod table;
pub mod validate;

pub use catalog::SchemaCatalog;
pub use deps::CascadeGraph;
pub use table::{
    CategoryConfig, CollectionRef, DateConfig, DropdownConfig, Field, FieldConfiguration,
    FieldOrder, FieldRef, FileConfig, GroupConfig, GroupRef, RelationTarget, RelationshipConfig,
    ResponseConfig, Table, TableConfiguration, TableKind, TextConfig, Visibility,
};
pub use validate::{validate_table, SchemaError};
