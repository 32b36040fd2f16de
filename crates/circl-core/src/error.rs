use thiserror::Error;

#[derive(Debug, Error)]
pub enum CirclError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl CirclError {
    /// Returns `true` when the error is likely transient and worth retrying
    /// (e.g. HTTP 429/5xx, network timeouts, connection refused).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Llm(msg) | Self::Storage(msg) | Self::Email(msg) => is_transient_message(msg),
            _ => false,
        }
    }
}

fn is_transient_message(msg: &str) -> bool {
    let msg_lower = msg.to_lowercase();
    for code in ["429", "500", "502", "503", "504"] {
        if msg_lower.contains(code) {
            return true;
        }
    }
    let patterns = [
        "timeout",
        "timed out",
        "connection refused",
        "connection reset",
        "broken pipe",
        "temporarily unavailable",
        "database is locked",
    ];
    patterns.iter().any(|p| msg_lower.contains(p))
}

pub type Result<T> = std::result::Result<T, CirclError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_429() {
        let err = CirclError::Llm("proxy error 429: rate limit exceeded".into());
        assert!(err.is_transient());
    }

    #[test]
    fn test_transient_locked_database() {
        let err = CirclError::Storage("insert failed: database is locked".into());
        assert!(err.is_transient());
    }

    #[test]
    fn test_permanent_401() {
        let err = CirclError::Llm("proxy error 401: unauthorized".into());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_ownership_errors_are_permanent() {
        assert!(!CirclError::Forbidden("contact belongs to another user".into()).is_transient());
        assert!(!CirclError::NotFound("contact 1234".into()).is_transient());
        assert!(!CirclError::InvalidInput("bad uuid".into()).is_transient());
    }
}
