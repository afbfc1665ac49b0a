//! Error causes surfaced by the row/field/table services.
//!
//! The wire format is a flat cause code (`ROW_NOT_FOUND`, `FIELD_IN_USE`, ...)
//! plus an optional human message and, when the server can pin the failure to
//! a single form field, that field's slug. The propagation policy built on
//! top of these codes lives in the engine crate; this module only defines the
//! canonical taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The kind of entity a scoped cause refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resource {
    Table,
    Field,
    Row,
    File,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Table => "TABLE",
            Resource::Field => "FIELD",
            Resource::Row => "ROW",
            Resource::File => "FILE",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TABLE" => Ok(Resource::Table),
            "FIELD" => Ok(Resource::Field),
            "ROW" => Ok(Resource::Row),
            "FILE" => Ok(Resource::File),
            _ => Err(format!("Invalid resource: '{}'", s)),
        }
    }
}

/// Canonical failure causes across every Tablekit service.
/// This is the CANONICAL definition - use this everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCause {
    InvalidParameters,
    AuthenticationRequired,
    AccessDenied,
    NotFound(Resource),
    AlreadyExists(Resource),
    /// Referential-integrity conflict on delete.
    InUse(Resource),
    /// A table's only remaining active field cannot be trashed.
    LastActiveField,
    /// Schema-level validation failure (also raised by the upload virus check).
    UnprocessableEntity,
    InvalidFileType,
    FileTooLarge,
    InsufficientStorage,
    ServerError,
}

impl ErrorCause {
    pub fn code(&self) -> String {
        match self {
            ErrorCause::InvalidParameters => "INVALID_PARAMETERS".to_string(),
            ErrorCause::AuthenticationRequired => "AUTHENTICATION_REQUIRED".to_string(),
            ErrorCause::AccessDenied => "ACCESS_DENIED".to_string(),
            ErrorCause::NotFound(r) => format!("{}_NOT_FOUND", r),
            ErrorCause::AlreadyExists(r) => format!("{}_ALREADY_EXISTS", r),
            ErrorCause::InUse(r) => format!("{}_IN_USE", r),
            ErrorCause::LastActiveField => "LAST_ACTIVE_FIELD".to_string(),
            ErrorCause::UnprocessableEntity => "UNPROCESSABLE_ENTITY".to_string(),
            ErrorCause::InvalidFileType => "INVALID_FILE_TYPE".to_string(),
            ErrorCause::FileTooLarge => "FILE_TOO_LARGE".to_string(),
            ErrorCause::InsufficientStorage => "INSUFFICIENT_STORAGE".to_string(),
            ErrorCause::ServerError => "SERVER_ERROR".to_string(),
        }
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ErrorCause {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVALID_PARAMETERS" => return Ok(ErrorCause::InvalidParameters),
            "AUTHENTICATION_REQUIRED" => return Ok(ErrorCause::AuthenticationRequired),
            "ACCESS_DENIED" => return Ok(ErrorCause::AccessDenied),
            "LAST_ACTIVE_FIELD" => return Ok(ErrorCause::LastActiveField),
            "UNPROCESSABLE_ENTITY" => return Ok(ErrorCause::UnprocessableEntity),
            "INVALID_FILE_TYPE" => return Ok(ErrorCause::InvalidFileType),
            "FILE_TOO_LARGE" => return Ok(ErrorCause::FileTooLarge),
            "INSUFFICIENT_STORAGE" => return Ok(ErrorCause::InsufficientStorage),
            "SERVER_ERROR" => return Ok(ErrorCause::ServerError),
            _ => {}
        }
        for (suffix, make) in [
            ("_NOT_FOUND", ErrorCause::NotFound as fn(Resource) -> ErrorCause),
            ("_ALREADY_EXISTS", ErrorCause::AlreadyExists),
            ("_IN_USE", ErrorCause::InUse),
        ] {
            if let Some(prefix) = s.strip_suffix(suffix) {
                return prefix.parse::<Resource>().map(make);
            }
        }
        Err(format!("Invalid error cause: '{}'", s))
    }
}

impl Serialize for ErrorCause {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorCause {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An error returned by a table/row/file service call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{cause}: {message}")]
pub struct ServiceError {
    pub cause: ErrorCause,
    pub message: String,

    /// Set when the server pinned the failure to one form field.
    #[serde(default, rename = "fieldSlug", skip_serializing_if = "Option::is_none")]
    pub field_slug: Option<String>,
}

impl ServiceError {
    pub fn new(cause: ErrorCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
            field_slug: None,
        }
    }

    pub fn for_field(mut self, slug: impl Into<String>) -> Self {
        self.field_slug = Some(slug.into());
        self
    }

    /// Causes that can be attached to a specific form field and block
    /// submission until corrected. Everything else is transient.
    pub fn is_field_identifiable(&self) -> bool {
        self.field_slug.is_some()
            && matches!(
                self.cause,
                ErrorCause::InvalidParameters
                    | ErrorCause::AlreadyExists(_)
                    | ErrorCause::UnprocessableEntity
            )
    }
}
