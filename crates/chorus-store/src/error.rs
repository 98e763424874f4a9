use std::fmt;

/// Errors raised by an [`crate::EventStore`] implementation (spec §6).
#[derive(Debug)]
pub enum StoreError {
    Serialization(serde_json::Error),
    Sqlite(rusqlite::Error),
    Poisoned(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Serialization(e) => write!(f, "event serialization failed: {e}"),
            StoreError::Sqlite(e) => write!(f, "sqlite event store error: {e}"),
            StoreError::Poisoned(what) => write!(f, "lock poisoned: {what}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Serialization(e) => Some(e),
            StoreError::Sqlite(e) => Some(e),
            StoreError::Poisoned(_) => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}
