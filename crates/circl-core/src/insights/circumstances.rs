use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::analyzer::RelationshipAnalysis;
use crate::model::Contact;

/// Something notable about a contact's situation, used for prompt context
/// and rule-based suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Circumstance {
    BirthdayThisMonth,
    ProfessionalConnection,
    KnownLocation,
    StaleContact,
}

impl Circumstance {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BirthdayThisMonth => "Birthday this month",
            Self::ProfessionalConnection => "Professional connection",
            Self::KnownLocation => "Known location",
            Self::StaleContact => "Stale contact",
        }
    }
}

impl std::fmt::Display for Circumstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Detect circumstances for one contact. The birthday check compares the
/// month only.
pub fn detect(contact: &Contact, analysis: &RelationshipAnalysis, today: NaiveDate) -> Vec<Circumstance> {
    let f = &contact.fields;
    let mut out = Vec::new();
    if f.birthday.is_some_and(|b| b.month() == today.month()) {
        out.push(Circumstance::BirthdayThisMonth);
    }
    if present(&f.company) && present(&f.job_title) {
        out.push(Circumstance::ProfessionalConnection);
    }
    if present(&f.location) {
        out.push(Circumstance::KnownLocation);
    }
    if analysis.is_overdue {
        out.push(Circumstance::StaleContact);
    }
    out
}
