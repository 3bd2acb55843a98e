use crate::core::db;
use crate::core::error::CivitasError;
use crate::core::schemas;
use crate::core::time::Stamp;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The DB Broker is the single write path into the governance store.
///
/// Writes are serialized by an instance-owned lock and run inside one
/// `BEGIN IMMEDIATE` transaction, so other processes on the same file are
/// excluded as well. Reads skip the lock and see the last committed state.
pub struct DbBroker {
    db_path: PathBuf,
    audit_log_path: PathBuf,
    write_lock: Mutex<()>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DbBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            db_path: db::civitas_db_path(root),
            audit_log_path: root.join(schemas::BROKER_EVENTS_NAME),
            write_lock: Mutex::new(()),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn audit_log_path(&self) -> &Path {
        &self.audit_log_path
    }

    /// Execute a closure inside one serialized transaction.
    ///
    /// On `Ok` the success line is appended before the commit; if it cannot
    /// be written the transaction rolls back. On `Err` the transaction rolls
    /// back and the error line is best-effort, never replacing `f`'s error.
    pub fn with_tx<F, R, E>(&self, actor: &str, op_name: &str, f: F) -> Result<R, E>
    where
        F: FnOnce(&Connection) -> Result<R, E>,
        E: From<CivitasError> + Display,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| CivitasError::LockPoisoned(e.to_string()))?;

        let mut conn = db::db_connect(&self.db_path)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(CivitasError::from)?;

        let conn_ref: &Connection = &tx;
        match f(conn_ref) {
            Ok(value) => {
                self.log_event(actor, op_name, "success", None)?;
                if let Err(e) = tx.commit() {
                    self.log_event_best_effort(actor, op_name, "error", Some(e.to_string()));
                    return Err(E::from(CivitasError::from(e)));
                }
                Ok(value)
            }
            Err(e) => {
                drop(tx);
                self.log_event_best_effort(actor, op_name, "error", Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Run a read-only closure on a fresh connection, outside the write lock.
    ///
    /// The closure runs in one deferred transaction, so every query it makes
    /// sees the same committed snapshot.
    pub fn with_read<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&Connection) -> Result<R, E>,
        E: From<CivitasError>,
    {
        let conn = db::db_connect(&self.db_path)?;
        let tx = conn
            .unchecked_transaction()
            .map_err(CivitasError::from)?;
        // Nothing to commit; dropping the transaction ends the snapshot.
        f(&tx)
    }

    fn log_event_best_effort(&self, actor: &str, op: &str, status: &str, detail: Option<String>) {
        if let Err(e) = self.log_event(actor, op, status, detail) {
            use colored::Colorize;
            eprintln!(
                "{}",
                format!("audit log append failed for {}: {}", op, e).yellow()
            );
        }
    }

    fn log_event(
        &self,
        actor: &str,
        op: &str,
        status: &str,
        detail: Option<String>,
    ) -> Result<(), CivitasError> {
        let stamp = Stamp::now();
        let ev = BrokerEvent {
            ts: stamp.ts,
            event_id: stamp.event_id,
            actor: actor.to_string(),
            op: op.to_string(),
            db_id: schemas::CIVITAS_DB_NAME.to_string(),
            status: status.to_string(),
            detail,
        };
        let line = serde_json::to_string(&ev)
            .map_err(|e| CivitasError::IoError(std::io::Error::other(e)))?;

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(CivitasError::IoError)?;
        writeln!(f, "{}", line).map_err(CivitasError::IoError)?;
        Ok(())
    }

    /// Last `limit` audit events, oldest first. Unparseable lines are skipped.
    pub fn read_events(&self, limit: usize) -> Result<Vec<BrokerEvent>, CivitasError> {
        if !self.audit_log_path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.audit_log_path)?;
        let events: Vec<BrokerEvent> = content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        let skip = events.len().saturating_sub(limit);
        Ok(events.into_iter().skip(skip).collect())
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "broker",
        "version": "0.1.0",
        "description": "Serialized transactional write path with audit log",
        "commands": [
            { "name": "audit", "parameters": ["limit"], "description": "Show the mutation audit log" }
        ],
        "storage": [schemas::BROKER_EVENTS_NAME]
    })
}
