//! Record-family access over a single SQLite connection.
//!
//! `Ledger` borrows the connection of the current broker transaction, so every
//! method called through it commits or rolls back together with the rest of
//! the operation. Nothing here checks phases or permissions.

use crate::core::gate::Caller;
use crate::core::time::Stamp;
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable platform identity of a community member (chat user id).
///
/// Stored bit-for-bit in a signed SQLite INTEGER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MemberId {
    fn from(id: u64) -> Self {
        MemberId(id)
    }
}

impl ToSql for MemberId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0 as i64))
    }
}

impl FromSql for MemberId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(|raw| MemberId(raw as u64))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Registration order; lower wins a tied tally.
    pub seq: i64,
    pub candidate_id: MemberId,
    pub name: String,
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub voter_id: MemberId,
    pub candidate_id: MemberId,
}

/// Occupant of the president slot. A vacant slot is `None` at every API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresidentSlot {
    pub name: String,
    pub candidate_id: MemberId,
}

impl PresidentSlot {
    /// Identity match, or display-name match for adapters that only know names.
    pub fn is_held_by(&self, caller: &Caller) -> bool {
        self.candidate_id == caller.id || self.name == caller.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: i64,
    pub text: String,
    pub enacted_by: MemberId,
    pub enacted_at: String,
    pub under_tyranny: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseFlags {
    pub polls_open: bool,
    pub debating: bool,
    pub tyranny_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    PollsOpen,
    Debating,
    Tyranny,
}

impl Flag {
    pub fn key(self) -> &'static str {
        match self {
            Flag::PollsOpen => "polls_open",
            Flag::Debating => "debating",
            Flag::Tyranny => "tyranny",
        }
    }
}

fn candidate_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Candidate> {
    Ok(Candidate {
        seq: row.get(0)?,
        candidate_id: row.get(1)?,
        name: row.get(2)?,
        votes: row.get(3)?,
    })
}

const CANDIDATE_COLUMNS: &str = "seq, candidate_id, name, votes";

pub struct Ledger<'c> {
    conn: &'c Connection,
}

impl<'c> Ledger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // --- candidates ---

    pub fn insert_candidate(&self, id: MemberId, name: &str) -> rusqlite::Result<Candidate> {
        self.conn.execute(
            "INSERT INTO candidates(candidate_id, name, votes) VALUES(?1, ?2, 0)",
            params![id, name],
        )?;
        Ok(Candidate {
            seq: self.conn.last_insert_rowid(),
            candidate_id: id,
            name: name.to_string(),
            votes: 0,
        })
    }

    pub fn candidate(&self, id: MemberId) -> rusqlite::Result<Option<Candidate>> {
        self.conn
            .query_row(
                &format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE candidate_id = ?1"),
                params![id],
                candidate_from_row,
            )
            .optional()
    }

    pub fn candidates_named(&self, name: &str) -> rusqlite::Result<Vec<Candidate>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE name = ?1 ORDER BY seq"
        ))?;
        let rows = stmt.query_map(params![name], candidate_from_row)?;
        rows.collect()
    }

    /// Full roster in registration order.
    pub fn candidates(&self) -> rusqlite::Result<Vec<Candidate>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY seq"))?;
        let rows = stmt.query_map([], candidate_from_row)?;
        rows.collect()
    }

    /// Highest vote count, earliest registration among ties.
    pub fn leading_candidate(&self) -> rusqlite::Result<Option<Candidate>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY votes DESC, seq ASC LIMIT 1"
                ),
                [],
                candidate_from_row,
            )
            .optional()
    }

    pub fn delete_candidate(&self, id: MemberId) -> rusqlite::Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM candidates WHERE candidate_id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// Returns false when no candidate row matched.
    pub fn adjust_votes(&self, id: MemberId, delta: i64) -> rusqlite::Result<bool> {
        let changed = self.conn.execute(
            "UPDATE candidates SET votes = votes + ?1 WHERE candidate_id = ?2",
            params![delta, id],
        )?;
        Ok(changed > 0)
    }

    pub fn reset_votes(&self) -> rusqlite::Result<usize> {
        self.conn
            .execute("UPDATE candidates SET votes = 0 WHERE votes <> 0", [])
    }

    pub fn vote_total(&self) -> rusqlite::Result<u64> {
        let total: i64 =
            self.conn
                .query_row("SELECT COALESCE(SUM(votes), 0) FROM candidates", [], |row| {
                    row.get(0)
                })?;
        Ok(total as u64)
    }

    pub fn clear_candidates(&self) -> rusqlite::Result<usize> {
        self.conn.execute("DELETE FROM candidates", [])
    }

    // --- ballots ---

    pub fn ballot(&self, voter: MemberId) -> rusqlite::Result<Option<Ballot>> {
        self.conn
            .query_row(
                "SELECT voter_id, candidate_id FROM ballots WHERE voter_id = ?1",
                params![voter],
                |row| {
                    Ok(Ballot {
                        voter_id: row.get(0)?,
                        candidate_id: row.get(1)?,
                    })
                },
            )
            .optional()
    }

    pub fn insert_ballot(&self, voter: MemberId, candidate: MemberId) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO ballots(voter_id, candidate_id) VALUES(?1, ?2)",
            params![voter, candidate],
        )?;
        Ok(())
    }

    pub fn update_ballot(&self, voter: MemberId, candidate: MemberId) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE ballots SET candidate_id = ?1 WHERE voter_id = ?2",
            params![candidate, voter],
        )?;
        Ok(())
    }

    pub fn ballot_count(&self) -> rusqlite::Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ballots", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn clear_ballots(&self) -> rusqlite::Result<usize> {
        self.conn.execute("DELETE FROM ballots", [])
    }

    // --- president slot ---

    pub fn president(&self) -> rusqlite::Result<Option<PresidentSlot>> {
        let (name, candidate_id): (Option<String>, Option<MemberId>) = self.conn.query_row(
            "SELECT name, candidate_id FROM president WHERE slot = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(match (name, candidate_id) {
            (Some(name), Some(candidate_id)) => Some(PresidentSlot { name, candidate_id }),
            _ => None,
        })
    }

    /// Full replace of the slot, never a merge with the prior occupant.
    pub fn set_president(&self, slot: &PresidentSlot) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE president SET name = ?1, candidate_id = ?2 WHERE slot = 1",
            params![slot.name, slot.candidate_id],
        )?;
        Ok(())
    }

    pub fn vacate_president(&self) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE president SET name = NULL, candidate_id = NULL WHERE slot = 1",
            [],
        )?;
        Ok(())
    }

    // --- rules ---

    pub fn append_rule(
        &self,
        text: &str,
        enacted_by: MemberId,
        under_tyranny: bool,
    ) -> rusqlite::Result<RuleRecord> {
        let enacted_at = Stamp::now().ts;
        self.conn.execute(
            "INSERT INTO rules(text, enacted_by, enacted_at, under_tyranny) VALUES(?1, ?2, ?3, ?4)",
            params![text, enacted_by, enacted_at, under_tyranny],
        )?;
        Ok(RuleRecord {
            id: self.conn.last_insert_rowid(),
            text: text.to_string(),
            enacted_by,
            enacted_at,
            under_tyranny,
        })
    }

    pub fn rules(&self) -> rusqlite::Result<Vec<RuleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, text, enacted_by, enacted_at, under_tyranny FROM rules ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RuleRecord {
                id: row.get(0)?,
                text: row.get(1)?,
                enacted_by: row.get(2)?,
                enacted_at: row.get(3)?,
                under_tyranny: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    // --- phase flags ---

    pub fn flag(&self, flag: Flag) -> rusqlite::Result<bool> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM flags WHERE name = ?1",
                params![flag.key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0) != 0)
    }

    pub fn set_flag(&self, flag: Flag, on: bool) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO flags(name, value) VALUES(?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![flag.key(), on as i64],
        )?;
        Ok(())
    }

    pub fn phase_flags(&self) -> rusqlite::Result<PhaseFlags> {
        Ok(PhaseFlags {
            polls_open: self.flag(Flag::PollsOpen)?,
            debating: self.flag(Flag::Debating)?,
            tyranny_active: self.flag(Flag::Tyranny)?,
        })
    }
}
