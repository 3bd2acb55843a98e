//! Store handle for a single community's governance state.
//!
//! A store is a directory holding the SQLite database, the broker audit log
//! and the optional `civitas.toml`. One store governs one community; there is
//! no partitioning by guild or election.

use crate::core::db;
use crate::core::error::CivitasError;
use crate::core::schemas;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_DIR: &str = ".civitas";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    /// Absolute or working-directory-relative path to the store directory.
    pub root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory and database if missing, seeding defaulted state.
    pub fn initialize(&self) -> Result<PathBuf, CivitasError> {
        if self.root.as_os_str().is_empty() {
            return Err(CivitasError::PathError(
                "store root must not be empty".to_string(),
            ));
        }
        db::initialize_civitas_db(&self.root)
    }

    pub fn db_path(&self) -> PathBuf {
        db::civitas_db_path(&self.root)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(schemas::CONFIG_FILE_NAME)
    }

    pub fn is_initialized(&self) -> bool {
        self.db_path().exists()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
