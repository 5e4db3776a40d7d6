/// Result alias used by every fallible operation in `revcheck-core`.
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Errors surfaced to the reviewer.
///
/// Tokenizing, aligning, highlighting, and classifying never fail; only state
/// transitions and calls across the store boundary produce these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// Bad or missing input, e.g. a manual edit with no row selected.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A session or row that does not exist (index out of range, unknown id).
    #[error("{what} {key} not found")]
    NotFound { what: &'static str, key: String },

    /// The store call failed or returned a non-success result.
    #[error("store call failed: {0}")]
    Transport(String),

    /// A save was attempted against a session that changed since it was loaded.
    #[error("session {session_id} changed since it was loaded (seen revision {expected}, current {actual})")]
    Conflict {
        session_id: String,
        expected: u64,
        actual: u64,
    },
}

impl ReviewError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ReviewError::Validation(msg.into())
    }

    pub fn session_not_found(index: usize) -> Self {
        ReviewError::NotFound { what: "session", key: index.to_string() }
    }

    pub fn session_id_not_found(session_id: &str) -> Self {
        ReviewError::NotFound { what: "session", key: session_id.to_owned() }
    }

    pub fn row_not_found(index: usize) -> Self {
        ReviewError::NotFound { what: "row", key: index.to_string() }
    }
}

impl From<tokio_rusqlite::Error> for ReviewError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        ReviewError::Transport(err.to_string())
    }
}

impl From<rusqlite::Error> for ReviewError {
    fn from(err: rusqlite::Error) -> Self {
        ReviewError::Transport(err.to_string())
    }
}

impl From<csv::Error> for ReviewError {
    fn from(err: csv::Error) -> Self {
        ReviewError::Transport(err.to_string())
    }
}

impl From<calamine::Error> for ReviewError {
    fn from(err: calamine::Error) -> Self {
        ReviewError::Transport(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ReviewError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ReviewError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ReviewError {
    fn from(err: std::io::Error) -> Self {
        ReviewError::Transport(err.to_string())
    }
}
