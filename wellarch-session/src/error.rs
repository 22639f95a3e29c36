//! Error types for wellarch-session

use thiserror::Error;

/// Errors from the session store
#[derive(Error, Debug)]
pub enum Error {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Invalid session id: {0}")]
    InvalidId(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt session file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_session() {
        let error = Error::NotFound("0190d4c2".to_string());
        assert_eq!(error.to_string(), "Session not found: 0190d4c2");
    }

    #[test]
    fn corrupt_error_keeps_parse_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::Corrupt {
            path: "/tmp/x.json".into(),
            source,
        };
        assert!(error.to_string().starts_with("Corrupt session file /tmp/x.json"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
