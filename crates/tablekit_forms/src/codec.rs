//! Per-field-type value conversions.
//!
//! `form_value` is the read direction (wire -> editable) and is lenient:
//! wire data the current schema cannot interpret becomes `Unset` rather than
//! an error, so a widened or historical representation never breaks a form.
//! `wire_value` is the write direction and is strict.
//!
//! Round-trip law: `wire_value(form_value(v)) == v` for every canonical wire
//! value. The two intentional widenings: FILE cells may arrive as full
//! storage objects but are re-submitted as their id projection, and DATE
//! cells may arrive date-only or with an offset but are re-submitted in the
//! canonical `YYYY-MM-DDTHH:MM:SS` shape.

use crate::group::GroupEntry;
use crate::value::{DateValue, FormValue, RelationChoice, ResponseSummary, SelectOption};
use tablekit_protocol::{parse_iso_datetime, FieldType, Response, StorageObject, Value};
use tablekit_schema::{FieldConfiguration, SchemaCatalog};
use thiserror::Error;

/// Canonical wire shape for stored date-times.
pub const WIRE_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("date input '{raw}' is not valid")]
    InvalidDate { raw: String },

    #[error("{ty} fields have no editable value to submit")]
    NotEditable { ty: FieldType },

    #[error("form value does not fit a {ty} field")]
    Mismatch { ty: FieldType },
}

/// The type-appropriate "no value yet" for a field.
pub fn empty_form_value(config: &FieldConfiguration) -> FormValue {
    match config {
        FieldConfiguration::Reaction(_) | FieldConfiguration::Evaluation(_) => {
            FormValue::Aggregate(ResponseSummary::default())
        }
        _ => FormValue::Unset,
    }
}

/// The value a fresh form starts from: the configured default when the field
/// has one, else the type-appropriate empty.
pub fn default_form_value(config: &FieldConfiguration) -> FormValue {
    match config {
        FieldConfiguration::TextShort(c) | FieldConfiguration::TextLong(c) => c
            .default_value
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|s| FormValue::Text(s.clone()))
            .unwrap_or(FormValue::Unset),
        other => empty_form_value(other),
    }
}

/// Wire -> editable. The catalog resolves nested group tables.
pub fn form_value(config: &FieldConfiguration, value: &Value, catalog: &SchemaCatalog) -> FormValue {
    match config {
        FieldConfiguration::TextShort(_) | FieldConfiguration::TextLong(_) => match value {
            Value::Text(s) if !s.is_empty() => FormValue::Text(s.clone()),
            _ => FormValue::Unset,
        },
        FieldConfiguration::Dropdown(_) | FieldConfiguration::Category(_) => match value {
            Value::Text(s) if !s.is_empty() => {
                FormValue::Options(vec![SelectOption::plain(s.clone())])
            }
            Value::Strings(values) => {
                FormValue::Options(values.iter().map(SelectOption::plain).collect())
            }
            _ => FormValue::Unset,
        },
        FieldConfiguration::Date(_) => match value {
            Value::Text(raw) => match parse_iso_datetime(raw) {
                Some(at) => FormValue::Date(DateValue::Parsed(at)),
                None => FormValue::Unset,
            },
            _ => FormValue::Unset,
        },
        FieldConfiguration::File(_) => match value {
            Value::Files(objects) => FormValue::Files(objects.clone()),
            Value::Strings(ids) => {
                FormValue::Files(ids.iter().map(|id| StorageObject::from_id(id)).collect())
            }
            _ => FormValue::Unset,
        },
        FieldConfiguration::Relationship(_) => match value {
            Value::Text(id) if !id.is_empty() => {
                FormValue::Relations(vec![RelationChoice::unresolved(id.clone())])
            }
            Value::Strings(ids) => FormValue::Relations(
                ids.iter()
                    .map(|id| RelationChoice::unresolved(id.clone()))
                    .collect(),
            ),
            _ => FormValue::Unset,
        },
        FieldConfiguration::FieldGroup(group) => match (value, catalog.resolve_group(group)) {
            (Value::Rows(rows), Some(nested)) => FormValue::Group(
                rows.iter()
                    .map(|row| GroupEntry::from_row(nested, catalog, row))
                    .collect(),
            ),
            _ => FormValue::Unset,
        },
        FieldConfiguration::Reaction(_) | FieldConfiguration::Evaluation(_) => match value {
            Value::Responses(responses) => {
                FormValue::Aggregate(ResponseSummary::from_responses(responses))
            }
            _ => FormValue::Aggregate(ResponseSummary::default()),
        },
    }
}

/// Editable -> wire. Strict: a value that cannot be persisted is an error,
/// never a silent null.
pub fn wire_value(config: &FieldConfiguration, value: &FormValue) -> Result<Value, CodecError> {
    let ty = config.kind();
    match config {
        FieldConfiguration::TextShort(_) | FieldConfiguration::TextLong(_) => match value {
            FormValue::Unset => Ok(Value::Null),
            FormValue::Text(s) if s.is_empty() => Ok(Value::Null),
            FormValue::Text(s) => Ok(Value::Text(s.clone())),
            _ => Err(CodecError::Mismatch { ty }),
        },
        FieldConfiguration::Dropdown(_) | FieldConfiguration::Category(_) => match value {
            FormValue::Unset => Ok(Value::Null),
            FormValue::Options(opts) if opts.is_empty() => Ok(Value::Null),
            FormValue::Options(opts) => {
                if config.multiple() {
                    Ok(Value::Strings(
                        opts.iter().map(|o| o.value.clone()).collect(),
                    ))
                } else {
                    // multiple=false collapses to a single scalar on submit
                    Ok(Value::Text(opts[0].value.clone()))
                }
            }
            _ => Err(CodecError::Mismatch { ty }),
        },
        FieldConfiguration::Date(_) => match value {
            FormValue::Unset => Ok(Value::Null),
            FormValue::Date(DateValue::Parsed(at)) => {
                Ok(Value::Text(at.format(WIRE_DATETIME).to_string()))
            }
            FormValue::Date(DateValue::Invalid(raw)) => {
                Err(CodecError::InvalidDate { raw: raw.clone() })
            }
            _ => Err(CodecError::Mismatch { ty }),
        },
        FieldConfiguration::File(_) => match value {
            FormValue::Unset => Ok(Value::Null),
            FormValue::Files(objects) if objects.is_empty() => Ok(Value::Null),
            // Id projection: read-side storage objects re-submit as ids.
            FormValue::Files(objects) => Ok(Value::Strings(
                objects.iter().map(|o| o.id.clone()).collect(),
            )),
            _ => Err(CodecError::Mismatch { ty }),
        },
        FieldConfiguration::Relationship(_) => match value {
            FormValue::Unset => Ok(Value::Null),
            FormValue::Relations(choices) if choices.is_empty() => Ok(Value::Null),
            FormValue::Relations(choices) => {
                if config.multiple() {
                    Ok(Value::Strings(
                        choices.iter().map(|c| c.id.clone()).collect(),
                    ))
                } else {
                    Ok(Value::Text(choices[0].id.clone()))
                }
            }
            _ => Err(CodecError::Mismatch { ty }),
        },
        FieldConfiguration::FieldGroup(_) => match value {
            FormValue::Unset => Ok(Value::Null),
            FormValue::Group(entries) if entries.is_empty() => Ok(Value::Null),
            FormValue::Group(entries) => {
                let rows = entries
                    .iter()
                    .map(GroupEntry::wire_row)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Rows(rows))
            }
            _ => Err(CodecError::Mismatch { ty }),
        },
        FieldConfiguration::Reaction(_) | FieldConfiguration::Evaluation(_) => {
            Err(CodecError::NotEditable { ty })
        }
    }
}

/// Append or update the current user's entry on a reaction/evaluation cell.
/// This is the only write path for response fields.
pub fn apply_response(existing: &Value, user: &str, value: serde_json::Value) -> Value {
    let mut responses = existing.as_responses().map(<[_]>::to_vec).unwrap_or_default();
    match responses.iter_mut().find(|r| r.user == user) {
        Some(entry) => entry.value = value,
        None => responses.push(Response {
            user: user.to_string(),
            value,
        }),
    }
    Value::Responses(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tablekit_schema::{DropdownConfig, FileConfig, RelationshipConfig, TextConfig};
    use tablekit_schema::{CollectionRef, RelationTarget};
    use tablekit_protocol::TableId;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new()
    }

    fn dropdown(multiple: bool) -> FieldConfiguration {
        FieldConfiguration::Dropdown(DropdownConfig {
            multiple,
            options: vec!["open".into(), "closed".into()],
            ..DropdownConfig::default()
        })
    }

    fn relationship(multiple: bool) -> FieldConfiguration {
        FieldConfiguration::Relationship(RelationshipConfig {
            required: false,
            multiple,
            filtering: false,
            listing: false,
            relationship: RelationTarget::new(CollectionRef {
                id: TableId::new(),
                slug: "projects".into(),
            }),
        })
    }

    #[test]
    fn text_round_trip() {
        let config = FieldConfiguration::TextShort(TextConfig::default());
        let wire = Value::Text("hello".into());
        let form = form_value(&config, &wire, &catalog());
        assert_eq!(wire_value(&config, &form).unwrap(), wire);
        assert_eq!(
            wire_value(&config, &form_value(&config, &Value::Null, &catalog())).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn multi_dropdown_round_trips_as_array() {
        let config = dropdown(true);
        let wire = Value::Strings(vec!["open".into(), "closed".into()]);
        let form = form_value(&config, &wire, &catalog());
        assert_eq!(wire_value(&config, &form).unwrap(), wire);
    }

    #[test]
    fn single_dropdown_collapses_to_scalar() {
        let config = dropdown(false);
        let wire = Value::Text("open".into());
        let form = form_value(&config, &wire, &catalog());
        assert_eq!(wire_value(&config, &form).unwrap(), wire);
    }

    #[test]
    fn date_round_trips_canonically() {
        let config = FieldConfiguration::Date(tablekit_schema::DateConfig::default());
        let wire = Value::Text("2024-01-31T10:30:00".into());
        let form = form_value(&config, &wire, &catalog());
        assert_eq!(wire_value(&config, &form).unwrap(), wire);

        // Date-only input widens on read, canonicalizes on write.
        let widened = form_value(&config, &Value::Text("2024-01-31".into()), &catalog());
        assert_eq!(
            wire_value(&config, &widened).unwrap(),
            Value::Text("2024-01-31T00:00:00".into())
        );
    }

    #[test]
    fn files_resubmit_as_id_projection() {
        let config = FieldConfiguration::File(FileConfig::default());
        let widened = Value::Files(vec![StorageObject {
            id: "f1".into(),
            name: Some("report.pdf".into()),
            url: Some("https://files/f1".into()),
            size: None,
        }]);
        let form = form_value(&config, &widened, &catalog());
        assert_eq!(
            wire_value(&config, &form).unwrap(),
            Value::Strings(vec!["f1".into()])
        );
    }

    #[test]
    fn relationship_ids_keep_placeholder_labels() {
        let config = relationship(true);
        let wire = Value::Strings(vec!["r1".into(), "r2".into()]);
        let form = form_value(&config, &wire, &catalog());
        let relations = form.as_relations().unwrap();
        assert!(relations.iter().all(|c| !c.resolved && c.label == c.id));
        assert_eq!(wire_value(&config, &form).unwrap(), wire);
    }

    #[test]
    fn response_fields_are_not_editable() {
        let config = FieldConfiguration::Evaluation(Default::default());
        let wire = Value::Responses(vec![Response {
            user: "ana".into(),
            value: json!(5),
        }]);
        let form = form_value(&config, &wire, &catalog());
        assert_eq!(
            form,
            FormValue::Aggregate(ResponseSummary {
                count: 1,
                average: Some(5.0)
            })
        );
        assert!(matches!(
            wire_value(&config, &form),
            Err(CodecError::NotEditable { .. })
        ));
    }

    #[test]
    fn apply_response_replaces_same_user() {
        let initial = apply_response(&Value::Null, "ana", json!(3));
        let updated = apply_response(&initial, "ana", json!(5));
        let appended = apply_response(&updated, "bo", json!(1));
        let responses = appended.as_responses().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].value, json!(5));
    }

    #[test]
    fn defaults_prefer_the_configured_value() {
        let config = FieldConfiguration::TextShort(TextConfig {
            default_value: Some("todo".into()),
            ..TextConfig::default()
        });
        assert_eq!(default_form_value(&config), FormValue::Text("todo".into()));
        assert_eq!(
            default_form_value(&FieldConfiguration::TextLong(TextConfig::default())),
            FormValue::Unset
        );
    }
}
