use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CirclError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    ReconnectReminder,
    Onboarding,
    WeeklyDigest,
    SecurityNotification,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReconnectReminder => "reconnect_reminder",
            Self::Onboarding => "onboarding",
            Self::WeeklyDigest => "weekly_digest",
            Self::SecurityNotification => "security_notification",
        }
    }
}

impl std::fmt::Display for EmailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmailKind {
    type Err = CirclError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reconnect_reminder" => Ok(Self::ReconnectReminder),
            "onboarding" => Ok(Self::Onboarding),
            "weekly_digest" => Ok(Self::WeeklyDigest),
            "security_notification" => Ok(Self::SecurityNotification),
            other => Err(CirclError::InvalidInput(format!(
                "unknown email type: '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Sent,
    Failed,
    Skipped,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl std::str::FromStr for EmailStatus {
    type Err = CirclError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            other => Err(CirclError::InvalidInput(format!(
                "unknown email status: '{other}'"
            ))),
        }
    }
}

/// Outcome of one email send attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: EmailKind,
    pub recipient: String,
    pub status: EmailStatus,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmailLog {
    pub fn new(user_id: Uuid, kind: EmailKind, recipient: &str, status: EmailStatus) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            kind,
            recipient: recipient.to_string(),
            status,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
