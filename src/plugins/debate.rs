//! Debate phase flag and the speech check adapters use for moderation.

use crate::cli::CommandContext;
use crate::core::engine::{Engine, GovernanceError};
use crate::core::gate::{Action, Caller};
use crate::core::ledger::{Flag, PhaseFlags};
use crate::core::output;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[clap(name = "debate", about = "Open, close, and inspect the debate phase")]
pub struct DebateCli {
    #[clap(subcommand)]
    pub command: DebateCommand,
}

#[derive(Subcommand, Debug)]
pub enum DebateCommand {
    /// Start debating (supervisor only).
    Open,
    /// Stop debating (supervisor only).
    Close,
    /// Show whether debating is on.
    Status,
    /// Check whether the caller may post in the debate channel right now.
    Speak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpeechVerdict {
    pub allowed: bool,
    pub debating: bool,
    pub is_candidate: bool,
    pub is_supervisor: bool,
}

fn set_debating(
    engine: &Engine,
    caller: &Caller,
    action: Action,
    on: bool,
) -> Result<PhaseFlags, GovernanceError> {
    engine.write(caller, action, |ledger| {
        ledger.set_flag(Flag::Debating, on)?;
        Ok(ledger.phase_flags()?)
    })
}

pub fn open_debate(engine: &Engine, caller: &Caller) -> Result<PhaseFlags, GovernanceError> {
    set_debating(engine, caller, Action::OpenDebate, true)
}

pub fn close_debate(engine: &Engine, caller: &Caller) -> Result<PhaseFlags, GovernanceError> {
    set_debating(engine, caller, Action::CloseDebate, false)
}

pub fn debate_state(engine: &Engine) -> Result<bool, GovernanceError> {
    engine.read(|ledger| Ok(ledger.flag(Flag::Debating)?))
}

/// Supervisors may always speak; anyone else only while debating and only if
/// registered as a candidate.
pub fn may_speak_in_debate(
    engine: &Engine,
    caller: &Caller,
) -> Result<SpeechVerdict, GovernanceError> {
    let is_supervisor = engine.is_supervisor(caller, Action::SpeakInDebate);
    engine.read(|ledger| {
        let debating = ledger.flag(Flag::Debating)?;
        let is_candidate = ledger.candidate(caller.id)?.is_some();
        Ok(SpeechVerdict {
            allowed: is_supervisor || (debating && is_candidate),
            debating,
            is_candidate,
            is_supervisor,
        })
    })
}

pub fn run_debate_cli(ctx: &CommandContext<'_>, cli: DebateCli) -> Result<(), GovernanceError> {
    match cli.command {
        DebateCommand::Open => {
            let flags = open_debate(ctx.engine, ctx.caller()?)?;
            output::emit(
                ctx.format,
                Action::OpenDebate.op_name(),
                "Debating is finally open!",
                &flags,
            );
        }
        DebateCommand::Close => {
            let flags = close_debate(ctx.engine, ctx.caller()?)?;
            output::emit(
                ctx.format,
                Action::CloseDebate.op_name(),
                "Debating has been closed.",
                &flags,
            );
        }
        DebateCommand::Status => {
            let debating = debate_state(ctx.engine)?;
            output::emit(
                ctx.format,
                "debate.status",
                &format!("Debating is {}!", if debating { "on" } else { "off" }),
                &serde_json::json!({ "debating": debating }),
            );
        }
        DebateCommand::Speak => {
            let verdict = may_speak_in_debate(ctx.engine, ctx.caller()?)?;
            let text = if verdict.allowed {
                "You may speak in the debates channel."
            } else {
                "Please do not talk in the debates channel. Candidates must wait until debating starts."
            };
            output::emit(ctx.format, Action::SpeakInDebate.op_name(), text, &verdict);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "debate",
        "version": "0.1.0",
        "description": "Debate phase flag and debate-channel speech check",
        "commands": [
            { "name": "open", "privileged": true },
            { "name": "close", "privileged": true },
            { "name": "status" },
            { "name": "speak" }
        ],
        "storage": ["civitas.db"]
    })
}
