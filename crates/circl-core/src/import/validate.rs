use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use super::email::split_emails;
use super::fields::{FieldDef, FieldType};
use super::headers::HeaderMapping;
use super::parser::Row;
use crate::model::{Circle, MAX_NAME_LENGTH, MAX_NOTES_LENGTH};

/// Mapped, trimmed, non-empty values of one row, keyed by field key.
pub type FieldValues = BTreeMap<&'static str, String>;

/// A row that passed validation, with values normalized for mapping.
#[derive(Debug, Clone, Serialize)]
pub struct PartialContact {
    /// 1-based data row number.
    pub row: usize,
    pub values: FieldValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based data row number.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub valid_contacts: Vec<PartialContact>,
    pub errors: Vec<RowError>,
    /// Rows with no mapped values at all. Neither valid nor errors.
    pub skipped_empty: usize,
}

/// Pull the mapped columns out of a raw row. Blank cells are omitted.
pub fn extract(row: &Row, mapping: &HeaderMapping) -> FieldValues {
    mapping
        .mapped()
        .filter_map(|(field, column)| {
            let value = row.get(column)?.trim();
            (!value.is_empty()).then(|| (field.key, value.to_string()))
        })
        .collect()
}

/// Validate every row against the field schema.
///
/// No field is required. A row with nothing mapped is dropped silently; a row
/// with any malformed value is reported once (first problem wins) and left out.
pub fn validate_rows(rows: &[Row], mapping: &HeaderMapping) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (i, row) in rows.iter().enumerate() {
        let row_num = i + 1;
        let values = extract(row, mapping);
        if values.is_empty() {
            report.skipped_empty += 1;
            continue;
        }

        let mut normalized = FieldValues::new();
        let mut failure = None;
        for (field, _) in mapping.mapped() {
            let Some(value) = values.get(field.key) else {
                continue;
            };
            match validate_value(field, value) {
                Ok(v) => {
                    normalized.insert(field.key, v);
                }
                Err(reason) => {
                    failure = Some(reason);
                    break;
                }
            }
        }

        match failure {
            Some(reason) => report.errors.push(RowError {
                row: row_num,
                reason,
            }),
            None => report.valid_contacts.push(PartialContact {
                row: row_num,
                values: normalized,
            }),
        }
    }

    tracing::debug!(
        valid = report.valid_contacts.len(),
        errors = report.errors.len(),
        skipped = report.skipped_empty,
        "validated import rows"
    );
    report
}

/// Check one non-empty value and return its normalized form.
fn validate_value(field: &FieldDef, value: &str) -> Result<String, String> {
    match field.kind {
        FieldType::Email => match split_emails(value) {
            Ok(_) => Ok(value.to_string()),
            Err(bad) => Err(format!("Invalid email '{bad}' in {}", field.label)),
        },
        FieldType::Url => {
            normalize_url(value).ok_or_else(|| format!("Invalid URL '{value}' in {}", field.label))
        }
        FieldType::Date => parse_date(value)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .ok_or_else(|| format!("Invalid date '{value}' in {}", field.label)),
        FieldType::Enum => Ok(value
            .parse::<Circle>()
            .unwrap_or_else(|_| {
                tracing::debug!(value, "unknown circle, defaulting to outer");
                Circle::default()
            })
            .to_string()),
        FieldType::Text if field.key == "name" && value.chars().count() > MAX_NAME_LENGTH => Err(format!(
            "Name is longer than {MAX_NAME_LENGTH} characters"
        )),
        FieldType::Text if field.key == "notes" && value.chars().count() > MAX_NOTES_LENGTH => Err(format!(
            "Notes are longer than {MAX_NOTES_LENGTH} characters"
        )),
        FieldType::Text
        | FieldType::Phone
        | FieldType::Boolean
        | FieldType::Number
        | FieldType::List => Ok(value.to_string()),
    }
}

/// Accept `http://` / `https://` URLs as-is and prefix bare hosts with `https://`.
pub fn normalize_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return None;
    }
    let lower = value.to_ascii_lowercase();
    let url = if lower.starts_with("http://") || lower.starts_with("https://") {
        value.to_string()
    } else {
        format!("https://{value}")
    };
    let host = url.split("://").nth(1).unwrap_or("").split('/').next().unwrap_or("");
    host.contains('.').then_some(url)
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
}

/// Lenient truthiness; anything unrecognized is `false`.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "y" | "true" | "t" | "1" | "x" | "✓" | "★"
    )
}
