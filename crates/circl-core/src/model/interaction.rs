use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CirclError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Call,
    Meeting,
    Email,
    Message,
    Note,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Meeting => "meeting",
            Self::Email => "email",
            Self::Message => "message",
            Self::Note => "note",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionKind {
    type Err = CirclError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "call" | "phone" => Ok(Self::Call),
            "meeting" | "meet" | "coffee" => Ok(Self::Meeting),
            "email" => Ok(Self::Email),
            "message" | "text" | "dm" => Ok(Self::Message),
            "note" => Ok(Self::Note),
            other => Err(CirclError::InvalidInput(format!(
                "unknown interaction type: '{other}' (expected call, meeting, email, message, or note)"
            ))),
        }
    }
}

/// A logged touchpoint with a contact. Immutable once stored; removed only
/// when its contact is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub contact_id: Uuid,
    pub kind: InteractionKind,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(
        user_id: Uuid,
        contact_id: Uuid,
        kind: InteractionKind,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            contact_id,
            kind,
            date,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.trim().is_empty() {
            None
        } else {
            Some(notes)
        };
        self
    }
}
