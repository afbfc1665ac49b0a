//! The editable form value and its building blocks.

use crate::group::GroupEntry;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tablekit_protocol::Response;
use tablekit_protocol::StorageObject;

/// One selectable option in a dropdown or category picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    /// Plain option whose label is its value (dropdown options are strings).
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// A selected related row: its id plus a display label.
///
/// A freshly loaded selection may carry only the id; `resolved` stays false
/// and the label is a placeholder until the resolver reconciles it against
/// the related table. A failed lookup keeps the placeholder, never drops
/// the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationChoice {
    pub id: String,
    pub label: String,
    pub resolved: bool,
}

impl RelationChoice {
    pub fn unresolved(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            resolved: false,
        }
    }

    pub fn resolved(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            resolved: true,
        }
    }
}

/// Read-only aggregate over a reaction/evaluation field's responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResponseSummary {
    pub count: usize,
    /// Mean of the numeric responses, when any are numeric.
    pub average: Option<f64>,
}

impl ResponseSummary {
    pub fn from_responses(responses: &[Response]) -> Self {
        let numeric: Vec<f64> = responses.iter().filter_map(|r| r.value.as_f64()).collect();
        let average = if numeric.is_empty() {
            None
        } else {
            Some(numeric.iter().sum::<f64>() / numeric.len() as f64)
        };
        Self {
            count: responses.len(),
            average,
        }
    }
}

/// A date input in one of three states. Keeping the raw text of an invalid
/// input lets validation report exactly what the user typed instead of
/// silently coercing a half-typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DateValue {
    Parsed(NaiveDateTime),
    Invalid(String),
}

/// The editable value a form holds for one field.
///
/// `Unset` (no value at all) is distinct from an explicitly emptied
/// selection such as `Options([])` - required-validation reports the two
/// states differently.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Unset,
    Text(String),
    Options(Vec<SelectOption>),
    Date(DateValue),
    Files(Vec<StorageObject>),
    Relations(Vec<RelationChoice>),
    Group(Vec<GroupEntry>),
    /// Read-only; reaction/evaluation fields have no editable form.
    Aggregate(ResponseSummary),
}

impl FormValue {
    /// Empty for required-checks.
    pub fn is_empty(&self) -> bool {
        match self {
            FormValue::Unset => true,
            FormValue::Text(s) => s.trim().is_empty(),
            FormValue::Options(v) => v.is_empty(),
            FormValue::Date(_) => false,
            FormValue::Files(v) => v.is_empty(),
            FormValue::Relations(v) => v.is_empty(),
            FormValue::Group(v) => v.is_empty(),
            FormValue::Aggregate(summary) => summary.count == 0,
        }
    }

    /// An emptied multi-selection: present but with nothing chosen. Distinct
    /// from [`FormValue::Unset`].
    pub fn is_emptied_selection(&self) -> bool {
        matches!(
            self,
            FormValue::Options(v) if v.is_empty()
        ) || matches!(self, FormValue::Relations(v) if v.is_empty())
            || matches!(self, FormValue::Files(v) if v.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_options(&self) -> Option<&[SelectOption]> {
        match self {
            FormValue::Options(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_relations(&self) -> Option<&[RelationChoice]> {
        match self {
            FormValue::Relations(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[StorageObject]> {
        match self {
            FormValue::Files(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&[GroupEntry]> {
        match self {
            FormValue::Group(v) => Some(v),
            _ => None,
        }
    }
}
