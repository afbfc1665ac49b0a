//! The pure half of the Tablekit field engine.
//!
//! Everything here is synchronous and side-effect free: converting wire
//! values to editable form values and back, validating them, holding form
//! state for a table's row, expanding nested field-groups, and translating
//! filter values to and from the flat query-string representation. The async
//! half (remote lookups, submission, caching) lives in `tablekit_engine` and
//! drives these types.
//!
//! # Modules
//!
//! - [`value`]: the editable [`FormValue`] and its building blocks
//! - [`codec`]: per-field-type wire/form conversions (one exhaustive match
//!   per direction)
//! - [`validate`]: per-field-type validation rules and messages
//! - [`form`]: one form instance over a table schema ([`FormState`])
//! - [`group`]: repeating sub-records for field-group fields
//! - [`filter`]: the filter form and its query-string codec

pub mod codec;
pub mod filter;
pub mod form;
pub mod group;
pub mod validate;
pub mod value;

pub use codec::{
    apply_response, default_form_value, empty_form_value, form_value, wire_value, CodecError,
};
pub use filter::{FilterEntry, FilterForm, FilterValue};
pub use form::{FormEntry, FormState};
pub use group::GroupEntry;
pub use validate::{validate_field, FieldViolation};
pub use value::{DateValue, FormValue, RelationChoice, ResponseSummary, SelectOption};
