use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Backup lookup failed: {0}")]
    BackupLookup(String),

    #[error("Status write failed: {0}")]
    StatusWrite(String),

    #[error("Import creation failed: {0}")]
    ImportCreation(String),

    #[error("Import wait failed: {0}")]
    ImportWait(String),

    #[error("Replay launch failed: {0}")]
    ReplayLaunch(String),
}

impl RestoreError {
    /// Wraps any error as a catalog lookup failure, leaving lookup failures untouched.
    pub fn into_lookup_failure(self) -> Self {
        match self {
            RestoreError::BackupLookup(_) => self,
            other => RestoreError::BackupLookup(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RestoreError>;
