use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CirclError, Result};

pub const MAX_TITLE_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeystoneCategory {
    Birthday,
    Anniversary,
    Milestone,
    Reminder,
    Other,
}

impl std::fmt::Display for KeystoneCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Birthday => write!(f, "birthday"),
            Self::Anniversary => write!(f, "anniversary"),
            Self::Milestone => write!(f, "milestone"),
            Self::Reminder => write!(f, "reminder"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for KeystoneCategory {
    type Err = CirclError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "birthday" => Ok(Self::Birthday),
            "anniversary" => Ok(Self::Anniversary),
            "milestone" => Ok(Self::Milestone),
            "reminder" => Ok(Self::Reminder),
            "other" => Ok(Self::Other),
            other => Err(CirclError::InvalidInput(format!(
                "unknown keystone category: '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

impl std::str::FromStr for Recurrence {
    type Err = CirclError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" | "annual" | "annually" => Ok(Self::Yearly),
            other => Err(CirclError::InvalidInput(format!(
                "unknown recurrence: '{other}' (expected weekly, monthly, or yearly)"
            ))),
        }
    }
}

/// A tracked important date, optionally tied to a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keystone {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub contact_id: Option<Uuid>,
    pub title: String,
    pub category: KeystoneCategory,
    pub date: NaiveDate,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

impl Keystone {
    pub fn new(user_id: Uuid, title: String, category: KeystoneCategory, date: NaiveDate) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            contact_id: None,
            title,
            category,
            date,
            recurrence: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_contact(mut self, contact_id: Uuid) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let trimmed = self.title.trim();
        if trimmed.is_empty() {
            return Err(CirclError::InvalidInput("title cannot be empty".into()));
        }
        if trimmed.len() > MAX_TITLE_LENGTH {
            return Err(CirclError::InvalidInput(format!(
                "title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
            )));
        }
        Ok(())
    }

    /// The first occurrence on or after `today`, or `None` for a one-off
    /// keystone that has already passed.
    ///
    /// Monthly and yearly recurrences are computed from the original date so
    /// day-of-month clamping (Jan 31 → Feb 28, Feb 29 → Feb 28) never drifts.
    pub fn next_occurrence(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.date >= today {
            return Some(self.date);
        }
        match self.recurrence? {
            Recurrence::Weekly => {
                let days = (today - self.date).num_days();
                let weeks = (days + 6) / 7;
                Some(self.date + Duration::weeks(weeks))
            }
            Recurrence::Monthly => {
                let months = month_diff(self.date, today);
                self.first_on_or_after(today, months, 1)
            }
            Recurrence::Yearly => {
                let months = (today.year() - self.date.year()) as u32 * 12;
                self.first_on_or_after(today, months, 12)
            }
        }
    }

    fn first_on_or_after(&self, today: NaiveDate, months: u32, step: u32) -> Option<NaiveDate> {
        let candidate = self.date.checked_add_months(Months::new(months))?;
        if candidate >= today {
            Some(candidate)
        } else {
            self.date.checked_add_months(Months::new(months + step))
        }
    }
}

/// Partial update for a keystone. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeystonePatch {
    pub title: Option<String>,
    pub category: Option<KeystoneCategory>,
    pub date: Option<NaiveDate>,
    pub contact_id: Option<Option<Uuid>>,
    pub recurrence: Option<Option<Recurrence>>,
    pub notes: Option<Option<String>>,
}

impl Keystone {
    pub fn apply(&mut self, patch: &KeystonePatch) {
        if let Some(ref title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(contact_id) = patch.contact_id {
            self.contact_id = contact_id;
        }
        if let Some(recurrence) = patch.recurrence {
            self.recurrence = recurrence;
        }
        if let Some(ref notes) = patch.notes {
            self.notes = notes.clone();
        }
    }
}

fn month_diff(from: NaiveDate, to: NaiveDate) -> u32 {
    let months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    months.max(0) as u32
}

/// Keystones whose next occurrence falls within `days` of `today`, soonest first.
pub fn upcoming(keystones: &[Keystone], today: NaiveDate, days: i64) -> Vec<(&Keystone, NaiveDate)> {
    let horizon = Duration::try_days(days)
        .and_then(|d| today.checked_add_signed(d))
        .unwrap_or(NaiveDate::MAX);
    let mut due: Vec<(&Keystone, NaiveDate)> = keystones
        .iter()
        .filter_map(|k| k.next_occurrence(today).map(|d| (k, d)))
        .filter(|(_, d)| *d <= horizon)
        .collect();
    due.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.title.cmp(&b.0.title)));
    due
}
