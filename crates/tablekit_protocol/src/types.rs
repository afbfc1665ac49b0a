//! Row payload types and canonical enums.

use crate::ids::RowId;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Canonical Enums (used across all crates)
// ============================================================================

/// Tag for the closed set of field types a table may declare.
/// This is the CANONICAL definition - use this everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    TextShort,
    TextLong,
    Dropdown,
    Date,
    File,
    Relationship,
    FieldGroup,
    Category,
    Reaction,
    Evaluation,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::TextShort => "TEXT_SHORT",
            FieldType::TextLong => "TEXT_LONG",
            FieldType::Dropdown => "DROPDOWN",
            FieldType::Date => "DATE",
            FieldType::File => "FILE",
            FieldType::Relationship => "RELATIONSHIP",
            FieldType::FieldGroup => "FIELD_GROUP",
            FieldType::Category => "CATEGORY",
            FieldType::Reaction => "REACTION",
            FieldType::Evaluation => "EVALUATION",
        }
    }

    /// File attachments and aggregated responses never appear in the ad hoc
    /// filter form, even when a schema claims otherwise.
    pub fn supports_filtering(&self) -> bool {
        !matches!(
            self,
            FieldType::File | FieldType::Reaction | FieldType::Evaluation
        )
    }

    /// Reaction and evaluation values are aggregated from many users, so a
    /// mandatory-value rule can never apply to them.
    pub fn supports_required(&self) -> bool {
        !matches!(self, FieldType::Reaction | FieldType::Evaluation)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT_SHORT" => Ok(FieldType::TextShort),
            "TEXT_LONG" => Ok(FieldType::TextLong),
            "DROPDOWN" => Ok(FieldType::Dropdown),
            "DATE" => Ok(FieldType::Date),
            "FILE" => Ok(FieldType::File),
            "RELATIONSHIP" => Ok(FieldType::Relationship),
            "FIELD_GROUP" => Ok(FieldType::FieldGroup),
            "CATEGORY" => Ok(FieldType::Category),
            "REACTION" => Ok(FieldType::Reaction),
            "EVALUATION" => Ok(FieldType::Evaluation),
            _ => Err(format!("Invalid field type: '{}'", s)),
        }
    }
}

/// Input format constraint for short/long text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextFormat {
    AlphaNumeric,
    Integer,
    Decimal,
    Url,
    Email,
}

impl TextFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextFormat::AlphaNumeric => "ALPHA_NUMERIC",
            TextFormat::Integer => "INTEGER",
            TextFormat::Decimal => "DECIMAL",
            TextFormat::Url => "URL",
            TextFormat::Email => "EMAIL",
        }
    }
}

impl fmt::Display for TextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result ordering for relationship lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: '{}'. Expected: asc or desc", s)),
        }
    }
}

/// How a table's row list is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    #[default]
    List,
    Gallery,
}

impl DisplayStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStyle::List => "list",
            DisplayStyle::Gallery => "gallery",
        }
    }
}

impl fmt::Display for DisplayStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DisplayStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(DisplayStyle::List),
            "gallery" => Ok(DisplayStyle::Gallery),
            _ => Err(format!(
                "Invalid display style: '{}'. Expected: list or gallery",
                s
            )),
        }
    }
}

// ============================================================================
// Wire values
// ============================================================================

/// One user's entry on a reaction or evaluation field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub user: String,
    pub value: serde_json::Value,
}

/// A stored file as the file service describes it.
///
/// Write traffic carries bare storage ids; the server may widen a FILE cell
/// to these objects on read. `deny_unknown_fields` keeps the untagged
/// [`Value`] decode unambiguous against nested rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageObject {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl StorageObject {
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            url: None,
            size: None,
        }
    }
}

/// The persisted shape of a single row cell.
///
/// Which variant is legal depends on the owning field's type: scalar text for
/// short text and dates (dates stored as ISO-8601), string arrays for
/// dropdown/category selections, related row ids and storage ids, nested rows
/// for field-groups, and per-user responses for reaction/evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Strings(Vec<String>),
    Responses(Vec<Response>),
    Files(Vec<StorageObject>),
    Rows(Vec<Row>),
}

impl Value {
    /// Empty for required-checks: null, blank string, or empty array.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Strings(v) => v.is_empty(),
            Value::Responses(v) => v.is_empty(),
            Value::Files(v) => v.is_empty(),
            Value::Rows(v) => v.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Value::Strings(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            Value::Rows(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_responses(&self) -> Option<&[Response]> {
        match self {
            Value::Responses(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[StorageObject]> {
        match self {
            Value::Files(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

/// Parse a wire date value. Accepts a full RFC 3339 timestamp, a bare
/// `YYYY-MM-DDTHH:MM:SS`, or a date-only `YYYY-MM-DD`.
pub fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
}

// ============================================================================
// Rows and pagination
// ============================================================================

/// One record conforming to a table's fields, keyed by field slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,

    /// Cell values keyed by field slug. Slugs with no stored value are absent.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,

    #[serde(default)]
    pub trashed: bool,

    #[serde(default, rename = "trashedAt", skip_serializing_if = "Option::is_none")]
    pub trashed_at: Option<DateTime<Utc>>,
}

impl Row {
    pub fn new() -> Self {
        Self {
            id: RowId::new(),
            values: BTreeMap::new(),
            trashed: false,
            trashed_at: None,
        }
    }

    pub fn value(&self, slug: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(slug).unwrap_or(&NULL)
    }

    pub fn set_value(&mut self, slug: impl Into<String>, value: Value) {
        self.values.insert(slug.into(), value);
    }

    /// True when every stored cell is empty. Used by the field-group
    /// "at least one populated member" rule.
    pub fn is_blank(&self) -> bool {
        self.values.values().all(Value::is_empty)
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    #[serde(rename = "perPage")]
    pub per_page: u32,
    pub total: u64,
    /// `None` when this is the last page.
    #[serde(rename = "nextPage")]
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn empty(page: u32, per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            per_page,
            total: 0,
            next_page: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_round_trips_as_wire_string() {
        for ty in [
            FieldType::TextShort,
            FieldType::FieldGroup,
            FieldType::Evaluation,
        ] {
            assert_eq!(ty.as_str().parse::<FieldType>().unwrap(), ty);
        }
        let json = serde_json::to_string(&FieldType::TextShort).unwrap();
        assert_eq!(json, "\"TEXT_SHORT\"");
    }

    #[test]
    fn filterability_excludes_files_and_responses() {
        assert!(FieldType::Date.supports_filtering());
        assert!(!FieldType::File.supports_filtering());
        assert!(!FieldType::Reaction.supports_filtering());
        assert!(!FieldType::Evaluation.supports_required());
    }

    #[test]
    fn value_emptiness() {
        assert!(Value::Null.is_empty());
        assert!(Value::Text("  ".into()).is_empty());
        assert!(Value::Strings(vec![]).is_empty());
        assert!(!Value::Text("x".into()).is_empty());
    }

    #[test]
    fn value_serde_is_untagged() {
        let v: Value = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(v, Value::Text("hello".into()));
        let v: Value = serde_json::from_str("[\"a\", \"b\"]").unwrap();
        assert_eq!(v, Value::Strings(vec!["a".into(), "b".into()]));
        let v: Value = serde_json::from_str("null").unwrap();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn untagged_value_separates_files_from_rows() {
        let v: Value =
            serde_json::from_str(r#"[{"id": "abc123", "name": "report.pdf"}]"#).unwrap();
        assert!(matches!(v, Value::Files(_)));

        let id = RowId::new();
        let raw = format!(r#"[{{"id": "{}", "values": {{"title": "x"}}}}]"#, id);
        let v: Value = serde_json::from_str(&raw).unwrap();
        assert!(matches!(v, Value::Rows(_)));

        let v: Value = serde_json::from_str(r#"[{"user": "ana", "value": 4}]"#).unwrap();
        assert!(matches!(v, Value::Responses(_)));
    }

    #[test]
    fn row_blankness_sees_all_cells() {
        let mut row = Row::new();
        row.set_value("a", Value::Null);
        row.set_value("b", Value::Text(String::new()));
        assert!(row.is_blank());
        row.set_value("b", Value::Text("filled".into()));
        assert!(!row.is_blank());
    }

    #[test]
    fn iso_parsing_accepts_three_shapes() {
        assert!(parse_iso_datetime("2024-01-31").is_some());
        assert!(parse_iso_datetime("2024-01-31T10:30:00").is_some());
        assert!(parse_iso_datetime("2024-01-31T10:30:00Z").is_some());
        assert!(parse_iso_datetime("31/01/2024").is_none());
    }
}
