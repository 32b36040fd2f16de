#![allow(dead_code)]

use circl_core::error::{CirclError, Result};
use circl_core::llm::TextGenerator;
use circl_core::rate_limit::RateLimiter;
use circl_core::secure::SecureClient;
use circl_core::storage::SqliteStorage;
use uuid::Uuid;

/// In-memory storage shared by every client built from it.
pub fn test_storage() -> SqliteStorage {
    SqliteStorage::open_in_memory().expect("in-memory SQLite")
}

/// A client for a fresh user with rate limiting off.
pub fn test_client(storage: &SqliteStorage) -> SecureClient<SqliteStorage> {
    SecureClient::new(storage.clone(), Uuid::now_v7(), RateLimiter::from_millis(0))
}

/// Always answers with the same text.
pub struct CannedGenerator(pub String);

impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str, _system: Option<&str>) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Fails like an unreachable proxy.
pub struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    async fn generate(&self, _prompt: &str, _system: Option<&str>) -> Result<String> {
        Err(CirclError::Llm(
            "proxy request failed: connection refused".into(),
        ))
    }
}
