use thiserror::Error;

/// Failures writing to (or reading from) the durable stores.
///
/// These never reach the translation path: history writes swallow them, and
/// config reads skip the failing source.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("config file error ({path}): {message}")]
    File { path: String, message: String },

    #[error("config source '{0}' is read-only")]
    ReadOnly(&'static str),

    #[error("primary store failed ({primary}); backup file failed ({backup})")]
    AllWritesFailed { primary: String, backup: String },
}

impl PersistError {
    pub fn file(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        PersistError::File {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

pub type PersistResult<T> = Result<T, PersistError>;
