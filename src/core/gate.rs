//! Caller identity and the supervisor capability check.
//!
//! Role membership is a platform concern. The engine only asks an
//! `AuthorizationGate` whether a caller may perform a privileged action, and
//! always asks before taking the broker write lock.

use crate::core::ledger::MemberId;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who is asking. `name` is the display name the platform reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: MemberId,
    pub name: String,
}

impl Caller {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: MemberId(id),
            name: name.into(),
        }
    }

    /// Label written to the audit log.
    pub fn audit_label(&self) -> String {
        format!("{}#{}", self.name, self.id)
    }
}

/// Every engine operation. The op name doubles as the audit log `op` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    RegisterCandidate,
    Withdraw,
    CastVote,
    OpenPolls,
    ClosePolls,
    CloseAndElect,
    OpenDebate,
    CloseDebate,
    SpeakInDebate,
    EnactRule,
    DeclareTyranny,
    AttemptRevolt,
}

impl Action {
    pub fn op_name(self) -> &'static str {
        match self {
            Action::RegisterCandidate => "election.register",
            Action::Withdraw => "election.withdraw",
            Action::CastVote => "election.vote",
            Action::OpenPolls => "polls.open",
            Action::ClosePolls => "polls.close",
            Action::CloseAndElect => "polls.elect",
            Action::OpenDebate => "debate.open",
            Action::CloseDebate => "debate.close",
            Action::SpeakInDebate => "debate.speak",
            Action::EnactRule => "rules.enact",
            Action::DeclareTyranny => "tyranny.declare",
            Action::AttemptRevolt => "tyranny.revolt",
        }
    }

    /// Actions gated on the supervisor role.
    pub fn requires_supervisor(self) -> bool {
        matches!(
            self,
            Action::OpenPolls
                | Action::ClosePolls
                | Action::CloseAndElect
                | Action::OpenDebate
                | Action::CloseDebate
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op_name())
    }
}

pub trait AuthorizationGate: Send + Sync {
    /// Whether `caller` holds the supervisor role for `action`.
    fn is_supervisor(&self, caller: &Caller, action: Action) -> bool;
}

impl<F> AuthorizationGate for F
where
    F: Fn(&Caller, Action) -> bool + Send + Sync,
{
    fn is_supervisor(&self, caller: &Caller, action: Action) -> bool {
        self(caller, action)
    }
}

/// Gate backed by a fixed set of supervisor ids, usually from `civitas.toml`.
#[derive(Debug, Clone, Default)]
pub struct RosterGate {
    supervisors: FxHashSet<MemberId>,
}

impl RosterGate {
    pub fn new(supervisors: impl IntoIterator<Item = MemberId>) -> Self {
        Self {
            supervisors: supervisors.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }
}

impl AuthorizationGate for RosterGate {
    fn is_supervisor(&self, caller: &Caller, _action: Action) -> bool {
        self.supervisors.contains(&caller.id)
    }
}
