//! Presidential decree and the probabilistic revolt against it.

use crate::cli::CommandContext;
use crate::core::engine::{Engine, GovernanceError};
use crate::core::gate::{Action, Caller};
use crate::core::ledger::{Flag, PhaseFlags, PresidentSlot};
use crate::core::output;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[clap(name = "tyranny", about = "Declare absolute power or revolt against it")]
pub struct TyrannyCli {
    #[clap(subcommand)]
    pub command: TyrannyCommand,
}

#[derive(Subcommand, Debug)]
pub enum TyrannyCommand {
    /// Suspend democracy (sitting president only).
    Declare,
    /// Try to overthrow an active tyranny.
    Revolt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevoltOutcome {
    pub succeeded: bool,
    /// President removed by a successful revolt.
    pub deposed: Option<PresidentSlot>,
}

pub fn declare_tyranny(engine: &Engine, caller: &Caller) -> Result<PhaseFlags, GovernanceError> {
    engine.write(caller, Action::DeclareTyranny, |ledger| {
        let is_president = ledger
            .president()?
            .is_some_and(|slot| slot.is_held_by(caller));
        if !is_president {
            return Err(GovernanceError::Unauthorized {
                action: Action::DeclareTyranny,
            });
        }
        ledger.set_flag(Flag::Tyranny, true)?;
        Ok(ledger.phase_flags()?)
    })
}

/// Roll against the configured odds. On success tyranny ends and the slot is
/// vacated; on failure nothing changes.
pub fn attempt_revolt(engine: &Engine, caller: &Caller) -> Result<RevoltOutcome, GovernanceError> {
    engine.write(caller, Action::AttemptRevolt, |ledger| {
        if !ledger.flag(Flag::Tyranny)? {
            return Err(GovernanceError::NoTyrannyActive);
        }
        if !engine.roll_revolt()? {
            return Ok(RevoltOutcome {
                succeeded: false,
                deposed: None,
            });
        }
        let deposed = ledger.president()?;
        ledger.set_flag(Flag::Tyranny, false)?;
        ledger.vacate_president()?;
        Ok(RevoltOutcome {
            succeeded: true,
            deposed,
        })
    })
}

pub fn president(engine: &Engine) -> Result<Option<PresidentSlot>, GovernanceError> {
    engine.read(|ledger| Ok(ledger.president()?))
}

pub fn run_tyranny_cli(ctx: &CommandContext<'_>, cli: TyrannyCli) -> Result<(), GovernanceError> {
    let caller = ctx.caller()?;
    match cli.command {
        TyrannyCommand::Declare => {
            let flags = declare_tyranny(ctx.engine, caller)?;
            output::emit(
                ctx.format,
                Action::DeclareTyranny.op_name(),
                "The President has declared absolute power! Democracy is suspended!",
                &flags,
            );
        }
        TyrannyCommand::Revolt => {
            let outcome = attempt_revolt(ctx.engine, caller)?;
            let text = if outcome.succeeded {
                "The people have revolted! Democracy is restored!"
            } else {
                "The rebellion failed! The tyranny continues!"
            };
            output::emit(ctx.format, Action::AttemptRevolt.op_name(), text, &outcome);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "tyranny",
        "version": "0.1.0",
        "description": "Presidential decree and revolt",
        "commands": [
            { "name": "declare", "requires": "sitting president" },
            { "name": "revolt", "requires": "active tyranny" }
        ],
        "storage": ["civitas.db"]
    })
}
