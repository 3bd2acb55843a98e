use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &Path) -> Result<Connection, error::CivitasError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::CivitasError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::CivitasError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::CivitasError::RusqliteError)?;
    Ok(conn)
}

pub fn civitas_db_path(root: &Path) -> PathBuf {
    root.join(schemas::CIVITAS_DB_NAME)
}

/// Create every record family and seed the defaulted singletons.
pub fn apply_schema(conn: &Connection) -> Result<(), error::CivitasError> {
    for statement in [
        schemas::DB_SCHEMA_CANDIDATES,
        schemas::DB_SCHEMA_CANDIDATES_NAME_INDEX,
        schemas::DB_SCHEMA_BALLOTS,
        schemas::DB_SCHEMA_PRESIDENT,
        schemas::DB_SCHEMA_RULES,
        schemas::DB_SCHEMA_FLAGS,
        schemas::DB_SEED_PRESIDENT,
        schemas::DB_SEED_FLAGS,
    ] {
        conn.execute(statement, [])?;
    }
    Ok(())
}

pub fn initialize_civitas_db(root: &Path) -> Result<PathBuf, error::CivitasError> {
    fs::create_dir_all(root).map_err(error::CivitasError::IoError)?;
    let db_path = civitas_db_path(root);

    let mut conn = db_connect(&db_path)?;
    let tx = conn.transaction()?;
    apply_schema(&tx).map_err(|e| {
        error::CivitasError::DatabaseInitializationError(format!(
            "{}: {}",
            db_path.display(),
            e
        ))
    })?;
    tx.commit()?;
    Ok(db_path)
}
