use thiserror::Error;

/// All errors that can occur in nextbook-core.
#[derive(Debug, Error)]
pub enum NextbookError {
    #[error("Author not found: {0}")]
    AuthorNotFound(String),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Process exit codes used by the `nextbook` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    NetworkError = 6,
    Conflict = 7,
}

impl NextbookError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::AuthorNotFound(_) | Self::BookNotFound(_) => ExitCode::NotFound,
            Self::ValidationError(_) | Self::ConfigError(_) => ExitCode::InvalidArgs,
            Self::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ExitCode::Conflict
            }
            _ => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, NextbookError>;
