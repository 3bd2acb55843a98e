//! The governance engine: owned state plus the serialized write path.
//!
//! `Engine` holds the store handle, the broker, the authorization gate and the
//! revolt dice. The operations themselves live in the subsystem modules under
//! `plugins`; they all funnel through [`Engine::write`] and [`Engine::read`].

use crate::core::broker::DbBroker;
use crate::core::chance::{Dice, SeededDice};
use crate::core::config::{self, CivitasConfig};
use crate::core::error::CivitasError;
use crate::core::gate::{Action, AuthorizationGate, Caller, RosterGate};
use crate::core::ledger::{Ledger, PhaseFlags};
use crate::core::store::Store;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Phase an action requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PollsOpen,
    PollsClosed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::PollsOpen => f.write_str("polls open"),
            Phase::PollsClosed => f.write_str("polls closed"),
        }
    }
}

/// Caller-facing rejections plus the opaque internal category.
#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("{action} is only allowed with {required}")]
    PhaseViolation { action: Action, required: Phase },
    #[error("{name} is already registered as a candidate")]
    AlreadyRegistered { name: String },
    #[error("member {member} is not registered as a candidate")]
    NotRegistered { member: String },
    #[error("no single candidate matches '{target}' ({matches} matches)")]
    AmbiguousOrUnknownCandidate { target: String, matches: usize },
    #[error("already voted for {candidate}")]
    DuplicateVote { candidate: String },
    #[error("not authorized to perform {action}")]
    Unauthorized { action: Action },
    #[error("there is no tyranny to overthrow")]
    NoTyrannyActive,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Internal(#[from] CivitasError),
}

impl GovernanceError {
    /// True for rejections a caller can act on; false for store faults.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, GovernanceError::Internal(_))
    }
}

impl From<rusqlite::Error> for GovernanceError {
    fn from(e: rusqlite::Error) -> Self {
        GovernanceError::Internal(CivitasError::RusqliteError(e))
    }
}

pub struct Engine {
    store: Store,
    broker: DbBroker,
    gate: Box<dyn AuthorizationGate>,
    dice: Mutex<Box<dyn Dice>>,
    revolt_success_probability: f64,
}

impl Engine {
    /// Open `root`, reading `civitas.toml` when present.
    pub fn open(root: &Path) -> Result<Self, CivitasError> {
        let config = config::load_config(root)?;
        Self::new(Store::new(root), config)
    }

    /// Initialize the store and wire the gate and dice from `config`.
    pub fn new(store: Store, config: CivitasConfig) -> Result<Self, CivitasError> {
        config.validate()?;
        store.initialize()?;
        let dice: Box<dyn Dice> = match config.revolt_seed {
            Some(seed) => Box::new(SeededDice::from_seed(seed)),
            None => Box::new(SeededDice::from_entropy()),
        };
        Ok(Self {
            broker: DbBroker::new(&store.root),
            gate: Box::new(RosterGate::new(config.supervisors.iter().copied())),
            dice: Mutex::new(dice),
            revolt_success_probability: config.revolt_success_probability,
            store,
        })
    }

    pub fn with_gate(mut self, gate: impl AuthorizationGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    pub fn with_dice(mut self, dice: impl Dice + 'static) -> Self {
        self.dice = Mutex::new(Box::new(dice));
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn broker(&self) -> &DbBroker {
        &self.broker
    }

    pub fn revolt_success_probability(&self) -> f64 {
        self.revolt_success_probability
    }

    pub fn is_supervisor(&self, caller: &Caller, action: Action) -> bool {
        self.gate.is_supervisor(caller, action)
    }

    /// Gate check for privileged actions. Never called with the write lock held.
    pub(crate) fn require_supervisor(
        &self,
        caller: &Caller,
        action: Action,
    ) -> Result<(), GovernanceError> {
        if self.is_supervisor(caller, action) {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized { action })
        }
    }

    /// Run a mutating operation as one serialized transaction. Supervisor-only
    /// actions are checked against the gate first, outside the lock.
    pub(crate) fn write<F, R>(
        &self,
        caller: &Caller,
        action: Action,
        f: F,
    ) -> Result<R, GovernanceError>
    where
        F: FnOnce(&Ledger<'_>) -> Result<R, GovernanceError>,
    {
        if action.requires_supervisor() {
            self.require_supervisor(caller, action)?;
        }
        self.broker
            .with_tx(&caller.audit_label(), action.op_name(), |conn| {
                f(&Ledger::new(conn))
            })
    }

    /// Run a query against the latest committed state, without the write lock.
    pub(crate) fn read<F, R>(&self, f: F) -> Result<R, GovernanceError>
    where
        F: FnOnce(&Ledger<'_>) -> Result<R, GovernanceError>,
    {
        self.broker.with_read(|conn| f(&Ledger::new(conn)))
    }

    pub(crate) fn roll_revolt(&self) -> Result<bool, GovernanceError> {
        let mut dice = self
            .dice
            .lock()
            .map_err(|e| CivitasError::LockPoisoned(e.to_string()))?;
        Ok(dice.roll(self.revolt_success_probability))
    }

    pub fn phase_flags(&self) -> Result<PhaseFlags, GovernanceError> {
        self.read(|ledger| Ok(ledger.phase_flags()?))
    }
}
