//! Per-field-type validation rules and messages.
//!
//! Field-level only: the single cross-field rule is the field-group check,
//! which recurses into each sub-record with the nested table's own schema.
//! Reaction and evaluation fields are never validated; their payloads cannot
//! be mandatory.

use crate::value::{DateValue, FormValue};
use tablekit_protocol::TextFormat;
use tablekit_schema::{Field, FieldConfiguration};

/// One failed rule, addressed by field slug. Violations inside group entries
/// use the path form `group[index].sub_slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub slug: String,
    pub message: String,
}

impl FieldViolation {
    fn new(slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            message: message.into(),
        }
    }
}

/// Validate one field's current value. Empty result means the field passes.
pub fn validate_field(field: &Field, value: &FormValue) -> Vec<FieldViolation> {
    match &field.configuration {
        FieldConfiguration::Reaction(_) | FieldConfiguration::Evaluation(_) => Vec::new(),
        FieldConfiguration::TextShort(config) | FieldConfiguration::TextLong(config) => {
            if let (Some(format), Some(text)) = (config.format, value.as_text()) {
                if !text.trim().is_empty() && !format_matches(format, text.trim()) {
                    return vec![FieldViolation::new(
                        &field.slug,
                        format!("{} must be {}", field.name, format_hint(format)),
                    )];
                }
            }
            required_check(field, value)
        }
        FieldConfiguration::Date(_) => {
            // An unparseable date fails even when the field is optional;
            // a half-typed value must never silently submit.
            if let FormValue::Date(DateValue::Invalid(_)) = value {
                return vec![FieldViolation::new(
                    &field.slug,
                    format!("{} is not a valid date", field.name),
                )];
            }
            required_check(field, value)
        }
        FieldConfiguration::FieldGroup(_) => validate_group(field, value),
        _ => required_check(field, value),
    }
}

fn format_matches(format: TextFormat, text: &str) -> bool {
    match format {
        TextFormat::AlphaNumeric => text.chars().all(|c| c.is_ascii_alphanumeric()),
        TextFormat::Integer => text.parse::<i64>().is_ok(),
        TextFormat::Decimal => text.parse::<f64>().is_ok(),
        TextFormat::Url => url::Url::parse(text).is_ok(),
        TextFormat::Email => {
            // A full RFC 5322 parse buys nothing here; local@domain with a
            // dotted domain catches the typos users actually make.
            match text.split_once('@') {
                Some((local, domain)) => {
                    !local.is_empty()
                        && !domain.is_empty()
                        && domain.contains('.')
                        && !domain.starts_with('.')
                        && !domain.ends_with('.')
                }
                None => false,
            }
        }
    }
}

fn format_hint(format: TextFormat) -> &'static str {
    match format {
        TextFormat::AlphaNumeric => "letters and digits only",
        TextFormat::Integer => "a whole number",
        TextFormat::Decimal => "a number",
        TextFormat::Url => "a valid URL",
        TextFormat::Email => "a valid email address",
    }
}

/// The two distinct empty states get two distinct messages: a value that was
/// never set is "required", a selection list emptied down to zero elements
/// asks for at least one option.
fn required_check(field: &Field, value: &FormValue) -> Vec<FieldViolation> {
    if !field.configuration.required() {
        return Vec::new();
    }
    if value.is_emptied_selection() {
        return vec![FieldViolation::new(&field.slug, "add at least one option")];
    }
    if value.is_empty() {
        return vec![FieldViolation::new(
            &field.slug,
            format!("{} is required", field.name),
        )];
    }
    Vec::new()
}

/// Required groups pass two independent checks: the entry list is non-empty,
/// and at least one entry has at least one populated sub-field. Individual
/// blank entries are fine as long as one is not. Non-blank entries are then
/// validated recursively against the nested schema.
fn validate_group(field: &Field, value: &FormValue) -> Vec<FieldViolation> {
    let required = field.configuration.required();
    let entries = match value {
        FormValue::Group(entries) => entries.as_slice(),
        _ => {
            if required {
                return vec![FieldViolation::new(
                    &field.slug,
                    format!("{} is required", field.name),
                )];
            }
            return Vec::new();
        }
    };

    let mut violations = Vec::new();
    if required {
        if entries.is_empty() {
            violations.push(FieldViolation::new(
                &field.slug,
                format!("{} is required", field.name),
            ));
        } else if entries.iter().all(|e| e.is_blank()) {
            violations.push(FieldViolation::new(
                &field.slug,
                format!("fill in at least one field of {}", field.name),
            ));
        }
    }

    for (index, entry) in entries.iter().enumerate() {
        if entry.is_blank() {
            continue;
        }
        for nested in entry.form.validate() {
            violations.push(FieldViolation::new(
                format!("{}[{}].{}", field.slug, index, nested.slug),
                nested.message,
            ));
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use crate::group::GroupEntry;
    use crate::value::SelectOption;
    use tablekit_protocol::{FieldId, TableId};
    use tablekit_schema::{
        DropdownConfig, GroupConfig, GroupRef, ResponseConfig, Table, TableConfiguration,
        TableKind, TextConfig,
    };

    fn field(slug: &str, configuration: FieldConfiguration) -> Field {
        Field {
            id: FieldId::new(),
            slug: slug.into(),
            name: slug.into(),
            trashed: false,
            configuration,
        }
    }

    fn required_dropdown() -> Field {
        field(
            "status",
            FieldConfiguration::Dropdown(DropdownConfig {
                required: true,
                multiple: true,
                options: vec!["open".into(), "done".into()],
                ..DropdownConfig::default()
            }),
        )
    }

    fn nested_table() -> Table {
        Table {
            id: TableId::new(),
            slug: "address".into(),
            name: "Address".into(),
            kind: TableKind::FieldGroup,
            fields: vec![field(
                "street",
                FieldConfiguration::TextShort(TextConfig::default()),
            )],
            configuration: TableConfiguration {
                owner: "owner".into(),
                ..TableConfiguration::default()
            },
        }
    }

    fn group_field(required: bool) -> Field {
        field(
            "addresses",
            FieldConfiguration::FieldGroup(GroupConfig {
                required,
                multiple: true,
                filtering: false,
                listing: false,
                group: GroupRef {
                    slug: "address".into(),
                },
            }),
        )
    }

    #[test]
    fn unset_and_emptied_get_distinct_messages() {
        let field = required_dropdown();
        let missing = validate_field(&field, &FormValue::Unset);
        assert_eq!(missing[0].message, "status is required");

        let emptied = validate_field(&field, &FormValue::Options(Vec::new()));
        assert_eq!(emptied[0].message, "add at least one option");

        let chosen = FormValue::Options(vec![SelectOption::plain("open")]);
        assert!(validate_field(&field, &chosen).is_empty());
    }

    #[test]
    fn invalid_date_fails_even_when_optional() {
        let field = field(
            "due",
            FieldConfiguration::Date(tablekit_schema::DateConfig::default()),
        );
        let violations = validate_field(&field, &FormValue::Date(DateValue::Invalid("1/1".into())));
        assert_eq!(violations[0].message, "due is not a valid date");
        assert!(validate_field(&field, &FormValue::Unset).is_empty());
    }

    #[test]
    fn required_group_needs_a_populated_entry() {
        let group = group_field(true);
        let table = nested_table();

        let empty = validate_field(&group, &FormValue::Group(Vec::new()));
        assert_eq!(empty[0].message, "addresses is required");

        let blank_only = FormValue::Group(vec![GroupEntry::blank(&table)]);
        let violations = validate_field(&group, &blank_only);
        assert_eq!(violations[0].message, "fill in at least one field of addresses");

        let mut populated = GroupEntry::blank(&table);
        populated.form.set("street", FormValue::Text("Elm St".into()));
        let good = FormValue::Group(vec![GroupEntry::blank(&table), populated]);
        assert!(validate_field(&group, &good).is_empty());
    }

    #[test]
    fn group_entry_violations_carry_a_path() {
        let mut nested = nested_table();
        nested.fields.push(field(
            "zip",
            FieldConfiguration::TextShort(TextConfig {
                required: true,
                ..TextConfig::default()
            }),
        ));
        let mut entry = GroupEntry::blank(&nested);
        entry.form.set("street", FormValue::Text("Elm St".into()));
        let violations = validate_field(&group_field(false), &FormValue::Group(vec![entry]));
        assert_eq!(violations[0].slug, "addresses[0].zip");
        assert_eq!(violations[0].message, "zip is required");
    }

    #[test]
    fn response_fields_are_never_validated() {
        let field = field(
            "rating",
            FieldConfiguration::Evaluation(ResponseConfig::default()),
        );
        assert!(validate_field(&field, &FormValue::Unset).is_empty());
    }

    #[test]
    fn text_format_constrains_non_empty_values() {
        let field = field(
            "quantity",
            FieldConfiguration::TextShort(TextConfig {
                format: Some(TextFormat::Integer),
                ..TextConfig::default()
            }),
        );
        let bad = validate_field(&field, &FormValue::Text("12a".into()));
        assert_eq!(bad[0].message, "quantity must be a whole number");
        assert!(validate_field(&field, &FormValue::Text("42".into())).is_empty());
        // Optional field, empty input: format does not apply.
        assert!(validate_field(&field, &FormValue::Text("".into())).is_empty());
    }

    #[test]
    fn url_and_email_formats() {
        let site = field(
            "site",
            FieldConfiguration::TextShort(TextConfig {
                format: Some(TextFormat::Url),
                ..TextConfig::default()
            }),
        );
        assert!(validate_field(&site, &FormValue::Text("https://example.com".into())).is_empty());
        assert_eq!(
            validate_field(&site, &FormValue::Text("not a url".into()))[0].message,
            "site must be a valid URL"
        );

        let contact = field(
            "contact",
            FieldConfiguration::TextShort(TextConfig {
                format: Some(TextFormat::Email),
                ..TextConfig::default()
            }),
        );
        assert!(validate_field(&contact, &FormValue::Text("a@b.co".into())).is_empty());
        assert!(!validate_field(&contact, &FormValue::Text("a@b".into())).is_empty());
    }

    #[test]
    fn format_failure_reports_before_required() {
        let field = field(
            "code",
            FieldConfiguration::TextShort(TextConfig {
                required: true,
                format: Some(TextFormat::AlphaNumeric),
                ..TextConfig::default()
            }),
        );
        let violations = validate_field(&field, &FormValue::Text("ab-1".into()));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "code must be letters and digits only");
        // Required still fires on a missing value.
        assert_eq!(
            validate_field(&field, &FormValue::Unset)[0].message,
            "code is required"
        );
    }

    #[test]
    fn form_validate_reports_in_form_order() {
        let table = Table {
            id: TableId::new(),
            slug: "tasks".into(),
            name: "Tasks".into(),
            kind: TableKind::Table,
            fields: vec![
                field(
                    "title",
                    FieldConfiguration::TextShort(TextConfig {
                        required: true,
                        ..TextConfig::default()
                    }),
                ),
                required_dropdown(),
            ],
            configuration: TableConfiguration {
                owner: "owner".into(),
                ..TableConfiguration::default()
            },
        };
        let form = FormState::new(&table);
        let slugs: Vec<_> = form.validate().into_iter().map(|v| v.slug).collect();
        assert_eq!(slugs, vec!["title", "status"]);
    }
}
