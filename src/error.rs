// src/error.rs
use thiserror::Error;

/// Local store read/write/delete failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Remote fetch failure, split the way the user-facing messages are.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// No network path: DNS, refused connection, timeout, offline.
    #[error("connectivity: {0}")]
    Connectivity(String),

    /// Remote reachable but answered with an error status.
    #[error("protocol: {reason}")]
    Protocol { status: Option<u16>, reason: String },

    /// Anything else on the fetch/decode path.
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Connectivity(_) => "connectivity",
            FetchError::Protocol { .. } => "protocol",
            FetchError::Unexpected(_) => "unexpected",
        }
    }
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("invalid publishedAt `{value}`: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Everything that can end a sync with a `Failure` state.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl SyncError {
    /// Human-readable reason carried by `SyncState::Failure`.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Fetch(FetchError::Connectivity(_)) => {
                "No internet connection. Showing cached data.".to_string()
            }
            SyncError::Fetch(FetchError::Protocol { reason, .. }) => {
                format!("Network error: {reason}")
            }
            SyncError::Fetch(FetchError::Unexpected(desc)) => {
                format!("An unexpected error occurred: {desc}")
            }
            SyncError::Storage(e) => format!("Storage error: {e}"),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Fetch(f) => f.kind(),
            SyncError::Storage(_) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_distinct_per_category() {
        let offline = SyncError::from(FetchError::Connectivity("dns".into())).user_message();
        let http = SyncError::from(FetchError::Protocol {
            status: Some(404),
            reason: "HTTP 404 Not Found".into(),
        })
        .user_message();
        let other = SyncError::from(FetchError::Unexpected("boom".into())).user_message();

        assert!(offline.contains("No internet connection"));
        assert_eq!(http, "Network error: HTTP 404 Not Found");
        assert_eq!(other, "An unexpected error occurred: boom");
        assert_ne!(offline, http);
        assert_ne!(http, other);
    }

    #[test]
    fn storage_message_names_storage() {
        let msg = SyncError::from(StoreError::Poisoned).user_message();
        assert!(msg.starts_with("Storage error"));
    }
}
