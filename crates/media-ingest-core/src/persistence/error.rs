use std::path::PathBuf;

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persistence-specific errors
#[derive(Debug)]
pub enum PersistenceError {
    /// SQLite errors
    Database(rusqlite::Error),

    /// Connection pool errors
    Pool(r2d2::Error),

    /// File path related errors
    Path(PathBuf, String),

    /// Errors during database initialization
    Initialization(String),
}

impl PersistenceError {
    /// SQLite result code behind this error, if any
    pub fn sqlite_code(&self) -> Option<rusqlite::ErrorCode> {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(err, _)) => Some(err.code),
            _ => None,
        }
    }

    /// Whether the failure came from a UNIQUE (or other) constraint
    pub fn is_constraint_violation(&self) -> bool {
        self.sqlite_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
    }

    /// Whether retrying the same statement may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self.sqlite_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
        )
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        PersistenceError::Database(err)
    }
}

impl From<r2d2::Error> for PersistenceError {
    fn from(err: r2d2::Error) -> Self {
        PersistenceError::Pool(err)
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database(err) => write!(f, "Database error: {}", err),
            Self::Pool(err) => write!(f, "Connection pool error: {}", err),
            Self::Path(path, msg) => write!(f, "Path error for {}: {}", path.display(), msg),
            Self::Initialization(msg) => write!(f, "Database initialization error: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(err) => Some(err),
            Self::Pool(err) => Some(err),
            _ => None,
        }
    }
}
