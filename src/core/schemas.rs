//! Database schema definitions for the governance store.
//!
//! One SQLite database holds every record family:
//! 1. candidates: the roster of the current election cycle.
//! 2. ballots: one row per voter, pointing at a candidate.
//! 3. president: a single-row slot, vacant when both columns are NULL.
//! 4. rules: append-only rule ledger.
//!
//! Phase flags live in `flags` as named integer booleans.

pub const CIVITAS_DB_NAME: &str = "civitas.db";
pub const BROKER_EVENTS_NAME: &str = "broker.events.jsonl";
pub const CONFIG_FILE_NAME: &str = "civitas.toml";

pub const DB_SCHEMA_CANDIDATES: &str = "
    CREATE TABLE IF NOT EXISTS candidates (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        candidate_id INTEGER NOT NULL UNIQUE,
        name TEXT NOT NULL,
        votes INTEGER NOT NULL DEFAULT 0 CHECK(votes >= 0)
    )
";
pub const DB_SCHEMA_CANDIDATES_NAME_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_candidates_name ON candidates(name)";

pub const DB_SCHEMA_BALLOTS: &str = "
    CREATE TABLE IF NOT EXISTS ballots (
        voter_id INTEGER PRIMARY KEY,
        candidate_id INTEGER NOT NULL
    )
";

pub const DB_SCHEMA_PRESIDENT: &str = "
    CREATE TABLE IF NOT EXISTS president (
        slot INTEGER PRIMARY KEY CHECK(slot = 1),
        name TEXT,
        candidate_id INTEGER
    )
";

pub const DB_SCHEMA_RULES: &str = "
    CREATE TABLE IF NOT EXISTS rules (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL,
        enacted_by INTEGER NOT NULL,
        enacted_at TEXT NOT NULL,
        under_tyranny INTEGER NOT NULL DEFAULT 0
    )
";

pub const DB_SCHEMA_FLAGS: &str = "
    CREATE TABLE IF NOT EXISTS flags (
        name TEXT PRIMARY KEY,
        value INTEGER NOT NULL DEFAULT 0
    )
";

// Defaulted state: vacant slot, every flag false. Idempotent on reopen.
pub const DB_SEED_PRESIDENT: &str =
    "INSERT OR IGNORE INTO president(slot, name, candidate_id) VALUES(1, NULL, NULL)";
pub const DB_SEED_FLAGS: &str = "
    INSERT OR IGNORE INTO flags(name, value)
    VALUES('polls_open', 0), ('debating', 0), ('tyranny', 0)
";
