use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CirclError, Result};

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_NOTES_LENGTH: usize = 20_000;

/// Name given to imported rows that carry data but no name column.
pub const DEFAULT_CONTACT_NAME: &str = "Imported Contact";

/// Relationship-closeness tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Circle {
    Inner,
    Middle,
    #[default]
    Outer,
}

impl Circle {
    pub const ALL: [Circle; 3] = [Circle::Inner, Circle::Middle, Circle::Outer];

    /// Days without contact after which someone in this circle is overdue.
    pub fn threshold_days(&self) -> i64 {
        match self {
            Self::Inner => 7,
            Self::Middle => 21,
            Self::Outer => 60,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Middle => "middle",
            Self::Outer => "outer",
        }
    }
}

impl std::fmt::Display for Circle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Circle {
    type Err = CirclError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "middle" => Ok(Self::Middle),
            "outer" => Ok(Self::Outer),
            other => Err(CirclError::InvalidInput(format!(
                "unknown circle: '{other}' (expected inner, middle, or outer)"
            ))),
        }
    }
}

/// Contact fields supplied by the user or the CSV importer.
///
/// Everything except `name` is optional; `circle` falls back to `outer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    #[serde(default)]
    pub circle: Circle,
    #[serde(default)]
    pub personal_email: Option<String>,
    #[serde(default)]
    pub work_email: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub work_phone: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub twitter_handle: Option<String>,
    #[serde(default)]
    pub instagram_handle: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub how_met: Option<String>,
    #[serde(default)]
    pub hobbies: Option<String>,
    #[serde(default)]
    pub family_details: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub last_contact: Option<DateTime<Utc>>,
}

impl NewContact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_circle(mut self, circle: Circle) -> Self {
        self.circle = circle;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if let Some(ref notes) = self.notes {
            if notes.chars().count() > MAX_NOTES_LENGTH {
                return Err(CirclError::InvalidInput(format!(
                    "notes exceed maximum length of {MAX_NOTES_LENGTH} characters"
                )));
            }
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CirclError::InvalidInput("name cannot be empty".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CirclError::InvalidInput(format!(
            "name exceeds maximum length of {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// A person record owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub fields: NewContact,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(user_id: Uuid, fields: NewContact) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn circle(&self) -> Circle {
        self.fields.circle
    }

    /// First whitespace-separated token of the name, used in friendly prose.
    pub fn first_name(&self) -> &str {
        self.fields
            .name
            .split_whitespace()
            .next()
            .unwrap_or(&self.fields.name)
    }

    /// Apply a partial update in place and bump `updated_at`.
    pub fn apply(&mut self, patch: &ContactPatch) {
        let f = &mut self.fields;
        if let Some(ref name) = patch.name {
            f.name = name.trim().to_string();
        }
        if let Some(circle) = patch.circle {
            f.circle = circle;
        }
        macro_rules! set_opt {
            ($($field:ident),*) => {
                $(if let Some(ref v) = patch.$field {
                    f.$field = v.clone();
                })*
            };
        }
        set_opt!(
            personal_email,
            work_email,
            mobile_phone,
            work_phone,
            birthday,
            location,
            company,
            job_title,
            how_met,
            hobbies,
            notes,
            last_contact
        );
        if let Some(favorite) = patch.favorite {
            f.favorite = favorite;
        }
        if let Some(ref tags) = patch.tags {
            f.tags = tags.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update for a contact. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub circle: Option<Circle>,
    pub personal_email: Option<Option<String>>,
    pub work_email: Option<Option<String>>,
    pub mobile_phone: Option<Option<String>>,
    pub work_phone: Option<Option<String>>,
    pub birthday: Option<Option<NaiveDate>>,
    pub location: Option<Option<String>>,
    pub company: Option<Option<String>>,
    pub job_title: Option<Option<String>>,
    pub how_met: Option<Option<String>>,
    pub hobbies: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub favorite: Option<bool>,
    pub tags: Option<BTreeSet<String>>,
    pub last_contact: Option<Option<DateTime<Utc>>>,
}

impl ContactPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            validate_name(name)?;
        }
        Ok(())
    }
}
