//! Unified error handling for the persistence and sync layer.

use thiserror::Error;

/// Application error type.
///
/// Remote errors are never fatal to the local application; they surface
/// through the sync status channel while local work continues.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("missing sync configuration: owner, repo, and token are required")]
    MissingConfig,

    #[error("remote write failed for {path}: {status} {body}")]
    RemoteWrite {
        path: String,
        status: u16,
        body: String,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("baseline file {path}: {source}")]
    Baseline {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] turnlog_engine::Error),
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::RemoteWrite {
            path: "data/users.json".into(),
            status: 409,
            body: "sha mismatch".into(),
        };
        assert_eq!(
            err.to_string(),
            "remote write failed for data/users.json: 409 sha mismatch"
        );

        assert_eq!(
            SyncError::MissingConfig.to_string(),
            "missing sync configuration: owner, repo, and token are required"
        );
    }
}
