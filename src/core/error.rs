use rusqlite;
use std::io;
use thiserror::Error;

/// Internal failures of the store and process plumbing.
///
/// These are never interpreted by the governance rules; they surface to the
/// caller as-is through `GovernanceError::Internal`.
#[derive(Error, Debug)]
pub enum CivitasError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to initialize database: {0}")]
    DatabaseInitializationError(String),
    #[error("Path error: {0}")]
    PathError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Store integrity violated: {0}")]
    IntegrityError(String),
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}
