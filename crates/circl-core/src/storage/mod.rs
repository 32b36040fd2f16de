mod backend;
mod sqlite;

pub use backend::StorageBackend;
pub use sqlite::SqliteStorage;

use crate::config::CirclConfig;
use crate::error::{CirclError, Result};

/// Tables reachable through the data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Contacts,
    Interactions,
    Keystones,
    EmailLogs,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Interactions => "interactions",
            Self::Keystones => "keystones",
            Self::EmailLogs => "email_logs",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open the SQLite database named by the configuration, creating parent
/// directories as needed.
pub fn create_backend(config: &CirclConfig) -> Result<SqliteStorage> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CirclError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
    }
    SqliteStorage::open(&path)
}
