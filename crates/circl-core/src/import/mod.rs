//! CSV contact import: parse, detect headers, validate, map and bulk insert.
//!
//! [`ImportWizard`] drives the flow as a small state machine
//! (`Upload → Map → Confirm → Done`). The pure stages live in the submodules
//! and can be used on their own.

pub mod email;
pub mod fields;
pub mod headers;
pub mod mapper;
pub mod parser;
pub mod validate;

use std::path::Path;

use serde::Serialize;

pub use fields::{field_by_key, field_by_label, FieldDef, FieldGroup, FieldType, FIELDS};
pub use headers::{detect_headers, HeaderMapping};
pub use mapper::{map_row, map_values};
pub use parser::{parse_file, parse_reader, parse_str, ParsedCsv, Row};
pub use validate::{validate_rows, PartialContact, RowError, ValidationReport};

use crate::config::ImportConfig;
use crate::error::{CirclError, Result};
use crate::secure::SecureClient;
use crate::storage::StorageBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStep {
    Upload,
    Map,
    Confirm,
    Done,
}

/// Final counts of a finished import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub total_rows: usize,
    pub imported: usize,
    pub failed: usize,
    pub skipped_empty: usize,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone)]
pub enum ImportState {
    Upload {
        error: Option<String>,
    },
    Map {
        file: ParsedCsv,
        mapping: HeaderMapping,
    },
    Confirm {
        file: ParsedCsv,
        mapping: HeaderMapping,
        report: ValidationReport,
        error: Option<String>,
    },
    Done(ImportOutcome),
}

pub struct ImportWizard {
    state: ImportState,
    delimiter: u8,
    max_rows_hint: usize,
}

impl ImportWizard {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            state: ImportState::Upload { error: None },
            // Non-ASCII delimiters are rejected by config validation.
            delimiter: u8::try_from(config.delimiter).unwrap_or(b','),
            max_rows_hint: config.max_rows_hint,
        }
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn step(&self) -> ImportStep {
        match self.state {
            ImportState::Upload { .. } => ImportStep::Upload,
            ImportState::Map { .. } => ImportStep::Map,
            ImportState::Confirm { .. } => ImportStep::Confirm,
            ImportState::Done(_) => ImportStep::Done,
        }
    }

    /// Message left by the last failed transition, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ImportState::Upload { error } | ImportState::Confirm { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub fn mapping(&self) -> Option<&HeaderMapping> {
        match &self.state {
            ImportState::Map { mapping, .. } | ImportState::Confirm { mapping, .. } => {
                Some(mapping)
            }
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match &self.state {
            ImportState::Confirm { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&ImportOutcome> {
        match &self.state {
            ImportState::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Parse CSV text and move to `Map` with detected headers.
    ///
    /// A parse failure or a file without data rows keeps the wizard on
    /// `Upload` with a message; the error is also returned.
    pub fn load_csv(&mut self, text: &str) -> Result<()> {
        self.ensure_step(ImportStep::Upload, "load a file")?;
        let parsed = parse_str(text, self.delimiter);
        self.accept_upload(parsed)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        self.ensure_step(ImportStep::Upload, "load a file")?;
        let parsed = parse_file(path, self.delimiter);
        self.accept_upload(parsed)
    }

    fn accept_upload(&mut self, parsed: Result<ParsedCsv>) -> Result<()> {
        let file = match parsed {
            Ok(file) if file.is_empty() => Err(CirclError::InvalidInput(
                "CSV file has a header row but no contacts".into(),
            )),
            other => other,
        };
        let file = match file {
            Ok(file) => file,
            Err(e) => {
                self.state = ImportState::Upload {
                    error: Some(e.to_string()),
                };
                return Err(e);
            }
        };

        if file.len() > self.max_rows_hint {
            tracing::warn!(
                rows = file.len(),
                hint = self.max_rows_hint,
                "large import, this may take a while"
            );
        }
        let mapping = detect_headers(&file.headers);
        tracing::info!(rows = file.len(), mapped = mapping.len(), "CSV loaded");
        self.state = ImportState::Map { file, mapping };
        Ok(())
    }

    /// Map → Upload. The only backward transition.
    pub fn back(&mut self) -> Result<()> {
        self.ensure_step(ImportStep::Map, "go back")?;
        self.state = ImportState::Upload { error: None };
        Ok(())
    }

    /// Override one field's column while on `Map`. An empty column unmaps it.
    pub fn set_mapping(&mut self, label: &str, column: &str) -> Result<()> {
        let ImportState::Map { file, mapping } = &mut self.state else {
            return Err(wrong_step("change the mapping"));
        };
        let column = column.trim();
        if !column.is_empty() && !file.headers.iter().any(|h| h == column) {
            return Err(CirclError::InvalidInput(format!(
                "no column named '{column}' in the uploaded file"
            )));
        }
        mapping.set(label, column)
    }

    /// Map → Confirm: validate every row against the current mapping.
    pub fn confirm(&mut self) -> Result<&ValidationReport> {
        let (file, mapping) =
            match std::mem::replace(&mut self.state, ImportState::Upload { error: None }) {
                ImportState::Map { file, mapping } => (file, mapping),
                other => {
                    self.state = other;
                    return Err(wrong_step("confirm the mapping"));
                }
            };
        if mapping.is_empty() {
            self.state = ImportState::Map { file, mapping };
            return Err(CirclError::InvalidInput(
                "map at least one column before continuing".into(),
            ));
        }

        let report = validate_rows(&file.rows, &mapping);
        self.state = ImportState::Confirm {
            file,
            mapping,
            report,
            error: None,
        };
        match &self.state {
            ImportState::Confirm { report, .. } => Ok(report),
            _ => Err(wrong_step("confirm the mapping")),
        }
    }

    /// Confirm → Done: map valid rows and insert them in one batch.
    ///
    /// A backend failure leaves the wizard on `Confirm` with the message; no
    /// rows are written in that case.
    pub async fn submit<B: StorageBackend>(
        &mut self,
        client: &SecureClient<B>,
    ) -> Result<&ImportOutcome> {
        let ImportState::Confirm {
            file,
            report,
            error,
            ..
        } = &mut self.state
        else {
            return Err(wrong_step("import"));
        };

        let batch: Vec<_> = report
            .valid_contacts
            .iter()
            .map(|p| map_values(&p.values))
            .collect();
        let total_rows = file.len();

        let inserted = if batch.is_empty() {
            Ok(Vec::new())
        } else {
            client.insert_contacts(batch).await
        };
        let inserted = match inserted {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "bulk import failed");
                *error = Some(format!("Import failed: {e}"));
                return Err(e);
            }
        };

        let outcome = ImportOutcome {
            total_rows,
            imported: inserted.len(),
            failed: report.errors.len(),
            skipped_empty: report.skipped_empty,
            errors: std::mem::take(&mut report.errors),
        };
        tracing::info!(
            imported = outcome.imported,
            failed = outcome.failed,
            "import finished"
        );
        self.state = ImportState::Done(outcome);
        match &self.state {
            ImportState::Done(outcome) => Ok(outcome),
            _ => Err(wrong_step("import")),
        }
    }

    fn ensure_step(&self, expected: ImportStep, action: &str) -> Result<()> {
        if self.step() == expected {
            Ok(())
        } else {
            Err(wrong_step(action))
        }
    }
}

fn wrong_step(action: &str) -> CirclError {
    CirclError::InvalidInput(format!("cannot {action} at this step of the import"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CirclConfig;
    use crate::rate_limit::RateLimiter;
    use crate::storage::SqliteStorage;
    use uuid::Uuid;

    const CSV: &str = "Name,Email,Phone,Circle\n\
        \"Jane Doe\",jane@x.com,,inner\n\
        Bob,not-an-email,555,\n\
        ,,,\n\
        Cara,cara@y.com,123,\n";

    fn wizard() -> ImportWizard {
        ImportWizard::new(&CirclConfig::default().import)
    }

    fn client() -> SecureClient<SqliteStorage> {
        let storage = SqliteStorage::open_in_memory().unwrap();
        SecureClient::new(storage, Uuid::now_v7(), RateLimiter::from_millis(0))
    }

    #[test]
    fn starts_on_upload() {
        let w = wizard();
        assert_eq!(w.step(), ImportStep::Upload);
        assert!(w.error().is_none());
    }

    #[test]
    fn parse_error_stays_on_upload() {
        let mut w = wizard();
        assert!(w.load_csv("").is_err());
        assert_eq!(w.step(), ImportStep::Upload);
        assert!(w.error().is_some());

        assert!(w.load_csv("Name,Email\n").is_err());
        assert_eq!(w.step(), ImportStep::Upload);
    }

    #[test]
    fn back_only_from_map() {
        let mut w = wizard();
        assert!(w.back().is_err());
        w.load_csv(CSV).unwrap();
        assert_eq!(w.step(), ImportStep::Map);
        w.back().unwrap();
        assert_eq!(w.step(), ImportStep::Upload);
        assert!(w.mapping().is_none());

        w.load_csv(CSV).unwrap();
        w.confirm().unwrap();
        assert!(w.back().is_err());
        assert_eq!(w.step(), ImportStep::Confirm);
    }

    #[test]
    fn set_mapping_requires_known_column() {
        let mut w = wizard();
        w.load_csv(CSV).unwrap();
        assert!(w.set_mapping("Company", "Employer").is_err());
        w.set_mapping("Work Phone", "Phone").unwrap();
        assert_eq!(w.mapping().unwrap().column_for("work_phone"), Some("Phone"));
    }

    #[test]
    fn confirm_with_empty_mapping_stays_on_map() {
        let mut w = wizard();
        w.load_csv("Shoe Size\n44\n").unwrap();
        assert!(w.confirm().is_err());
        assert_eq!(w.step(), ImportStep::Map);
    }

    #[tokio::test]
    async fn full_import() {
        let client = client();
        let mut w = wizard();
        w.load_csv(CSV).unwrap();
        let report = w.confirm().unwrap();
        assert_eq!(report.valid_contacts.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 2);

        let outcome = w.submit(&client).await.unwrap();
        assert_eq!(outcome.total_rows, 4);
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.skipped_empty, 1);
        assert_eq!(w.step(), ImportStep::Done);

        let contacts = client.fetch_contacts().await.unwrap();
        let jane = contacts.iter().find(|c| c.name() == "Jane Doe").unwrap();
        assert_eq!(jane.circle(), crate::model::Circle::Inner);
        assert_eq!(jane.fields.personal_email.as_deref(), Some("jane@x.com"));
    }

    #[tokio::test]
    async fn backend_failure_stays_on_confirm_and_writes_nothing() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .with_conn(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_cara BEFORE INSERT ON contacts
                     WHEN NEW.name = 'Cara'
                     BEGIN SELECT RAISE(ABORT, 'disk quota exceeded'); END;",
                )
                .map_err(|e| CirclError::Storage(e.to_string()))
            })
            .await
            .unwrap();
        let client = SecureClient::new(storage, Uuid::now_v7(), RateLimiter::from_millis(0));

        let mut w = wizard();
        w.load_csv(CSV).unwrap();
        w.confirm().unwrap();
        assert!(w.submit(&client).await.is_err());

        assert_eq!(w.step(), ImportStep::Confirm);
        let message = w.error().unwrap();
        assert!(message.starts_with("Import failed:"));
        assert!(message.contains("disk quota exceeded"));
        assert_eq!(w.report().unwrap().valid_contacts.len(), 2);
        assert!(w.outcome().is_none());
        // Jane was written before Cara failed; the transaction rolled her back.
        assert!(client.fetch_contacts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_outside_confirm_is_rejected() {
        let client = client();
        let mut w = wizard();
        assert!(w.submit(&client).await.is_err());
        assert_eq!(w.step(), ImportStep::Upload);
    }
}
