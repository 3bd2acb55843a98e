//! Candidate roster, ballots, and the poll lifecycle.
//!
//! Registration and withdrawal require closed polls; voting requires open
//! polls. `close_and_elect` tallies, replaces the president slot and wipes the
//! roster and ballot ledger in one transaction.

use crate::cli::CommandContext;
use crate::core::engine::{Engine, GovernanceError, Phase};
use crate::core::error::CivitasError;
use crate::core::gate::{Action, Caller};
use crate::core::ledger::{Ballot, Candidate, Flag, Ledger, MemberId, PhaseFlags, PresidentSlot};
use crate::core::output;
use clap::{Parser, Subcommand};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Parser, Debug)]
#[clap(name = "election", about = "Run for office, withdraw, and vote")]
pub struct ElectionCli {
    #[clap(subcommand)]
    pub command: ElectionCommand,
}

#[derive(Subcommand, Debug)]
pub enum ElectionCommand {
    /// Register the caller as a candidate (polls must be closed).
    Run {
        /// Name voters type to pick you; defaults to the caller name.
        #[clap(long)]
        display_name: Option<String>,
    },
    /// Leave the race (polls must be closed).
    Withdraw,
    /// Cast or change a vote by candidate name or `<@id>` mention.
    Vote { target: String },
    /// List candidates with their current vote counts.
    Candidates,
}

#[derive(Parser, Debug)]
#[clap(name = "polls", about = "Supervisor controls for the voting window")]
pub struct PollsCli {
    #[clap(subcommand)]
    pub command: PollsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PollsCommand {
    /// Open voting with a fresh ballot ledger.
    Open,
    /// Close voting without tallying.
    Close,
    /// Close voting, tally, and seat the winner.
    Elect,
}

/// How a voter names their choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteTarget {
    /// Direct identity reference, e.g. from a `<@123>` mention.
    Member(MemberId),
    /// Free-text display name, matched exactly.
    Name(String),
}

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@!?(\d+)>$").expect("mention pattern is valid"));

impl VoteTarget {
    pub fn parse(raw: &str) -> Result<Self, GovernanceError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(GovernanceError::InvalidArgument(
                "vote target must not be empty".to_string(),
            ));
        }
        if raw.starts_with("<@") && raw.ends_with('>') {
            let id = MENTION_RE
                .captures(raw)
                .and_then(|caps| caps[1].parse::<u64>().ok())
                .ok_or_else(|| {
                    GovernanceError::InvalidArgument(format!("invalid mention format: {}", raw))
                })?;
            return Ok(VoteTarget::Member(MemberId(id)));
        }
        Ok(VoteTarget::Name(raw.to_string()))
    }

    fn describe(&self) -> String {
        match self {
            VoteTarget::Member(id) => format!("<@{}>", id),
            VoteTarget::Name(name) => name.clone(),
        }
    }
}

impl FromStr for VoteTarget {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoteTarget::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteOutcome {
    Cast { to: Candidate },
    Changed { from: Candidate, to: Candidate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollsOpened {
    pub flags: PhaseFlags,
    /// Ballots left behind by a close without tally.
    pub stale_ballots_cleared: usize,
    pub already_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionOutcome {
    pub winner: Option<Candidate>,
    /// Occupant replaced by the winner, for role hand-over.
    pub previous: Option<PresidentSlot>,
    pub ballots_cleared: usize,
}

fn require_phase(ledger: &Ledger<'_>, action: Action, required: Phase) -> Result<(), GovernanceError> {
    let open = ledger.flag(Flag::PollsOpen)?;
    let satisfied = match required {
        Phase::PollsOpen => open,
        Phase::PollsClosed => !open,
    };
    if satisfied {
        Ok(())
    } else {
        Err(GovernanceError::PhaseViolation { action, required })
    }
}

fn resolve_target(ledger: &Ledger<'_>, target: &VoteTarget) -> Result<Candidate, GovernanceError> {
    let mut matches = match target {
        VoteTarget::Member(id) => ledger.candidate(*id)?.into_iter().collect(),
        VoteTarget::Name(name) => ledger.candidates_named(name)?,
    };
    if matches.len() == 1 {
        Ok(matches.remove(0))
    } else {
        Err(GovernanceError::AmbiguousOrUnknownCandidate {
            target: target.describe(),
            matches: matches.len(),
        })
    }
}

fn refreshed(ledger: &Ledger<'_>, id: MemberId) -> Result<Candidate, GovernanceError> {
    ledger.candidate(id)?.ok_or_else(|| {
        CivitasError::IntegrityError(format!("candidate {} vanished mid-vote", id)).into()
    })
}

pub fn register_candidate(
    engine: &Engine,
    caller: &Caller,
    display_name: Option<&str>,
) -> Result<Candidate, GovernanceError> {
    let name = display_name.unwrap_or(caller.name.as_str()).trim();
    if name.is_empty() {
        return Err(GovernanceError::InvalidArgument(
            "candidate name must not be empty".to_string(),
        ));
    }

    engine.write(caller, Action::RegisterCandidate, |ledger| {
        require_phase(ledger, Action::RegisterCandidate, Phase::PollsClosed)?;
        if let Some(existing) = ledger.candidate(caller.id)? {
            return Err(GovernanceError::AlreadyRegistered {
                name: existing.name,
            });
        }
        Ok(ledger.insert_candidate(caller.id, name)?)
    })
}

/// Leave the race. Ballots are left alone: none can exist while polls are
/// closed except after a close without tally, and `open_polls` clears those.
pub fn withdraw(engine: &Engine, caller: &Caller) -> Result<Candidate, GovernanceError> {
    engine.write(caller, Action::Withdraw, |ledger| {
        require_phase(ledger, Action::Withdraw, Phase::PollsClosed)?;
        let candidate =
            ledger
                .candidate(caller.id)?
                .ok_or_else(|| GovernanceError::NotRegistered {
                    member: caller.name.clone(),
                })?;
        ledger.delete_candidate(caller.id)?;
        Ok(candidate)
    })
}

pub fn cast_vote(
    engine: &Engine,
    voter: &Caller,
    target: &VoteTarget,
) -> Result<VoteOutcome, GovernanceError> {
    engine.write(voter, Action::CastVote, |ledger| {
        require_phase(ledger, Action::CastVote, Phase::PollsOpen)?;
        let chosen = resolve_target(ledger, target)?;

        match ledger.ballot(voter.id)? {
            Some(ballot) if ballot.candidate_id == chosen.candidate_id => {
                Err(GovernanceError::DuplicateVote {
                    candidate: chosen.name,
                })
            }
            Some(ballot) => {
                if !ledger.adjust_votes(ballot.candidate_id, -1)? {
                    return Err(CivitasError::IntegrityError(format!(
                        "ballot of {} points at missing candidate {}",
                        voter.id, ballot.candidate_id
                    ))
                    .into());
                }
                ledger.update_ballot(voter.id, chosen.candidate_id)?;
                ledger.adjust_votes(chosen.candidate_id, 1)?;
                Ok(VoteOutcome::Changed {
                    from: refreshed(ledger, ballot.candidate_id)?,
                    to: refreshed(ledger, chosen.candidate_id)?,
                })
            }
            None => {
                ledger.insert_ballot(voter.id, chosen.candidate_id)?;
                ledger.adjust_votes(chosen.candidate_id, 1)?;
                Ok(VoteOutcome::Cast {
                    to: refreshed(ledger, chosen.candidate_id)?,
                })
            }
        }
    })
}

/// Open voting. Leftover ballots are cleared only on the closed-to-open
/// transition; opening polls that are already open changes nothing.
pub fn open_polls(engine: &Engine, caller: &Caller) -> Result<PollsOpened, GovernanceError> {
    engine.write(caller, Action::OpenPolls, |ledger| {
        if ledger.flag(Flag::PollsOpen)? {
            return Ok(PollsOpened {
                flags: ledger.phase_flags()?,
                stale_ballots_cleared: 0,
                already_open: true,
            });
        }
        let stale_ballots_cleared = ledger.clear_ballots()?;
        ledger.reset_votes()?;
        ledger.set_flag(Flag::PollsOpen, true)?;
        Ok(PollsOpened {
            flags: ledger.phase_flags()?,
            stale_ballots_cleared,
            already_open: false,
        })
    })
}

pub fn close_polls(engine: &Engine, caller: &Caller) -> Result<PhaseFlags, GovernanceError> {
    engine.write(caller, Action::ClosePolls, |ledger| {
        ledger.set_flag(Flag::PollsOpen, false)?;
        Ok(ledger.phase_flags()?)
    })
}

/// Close the polls and seat the top candidate. Ties go to the earliest
/// registration.
pub fn close_and_elect(
    engine: &Engine,
    caller: &Caller,
) -> Result<ElectionOutcome, GovernanceError> {
    engine.write(caller, Action::CloseAndElect, |ledger| {
        ledger.set_flag(Flag::PollsOpen, false)?;

        let Some(winner) = ledger.leading_candidate()? else {
            return Ok(ElectionOutcome {
                winner: None,
                previous: None,
                ballots_cleared: 0,
            });
        };

        let previous = ledger.president()?;
        ledger.set_president(&PresidentSlot {
            name: winner.name.clone(),
            candidate_id: winner.candidate_id,
        })?;
        ledger.clear_candidates()?;
        let ballots_cleared = ledger.clear_ballots()?;

        Ok(ElectionOutcome {
            winner: Some(winner),
            previous,
            ballots_cleared,
        })
    })
}

pub fn candidates(engine: &Engine) -> Result<Vec<Candidate>, GovernanceError> {
    engine.read(|ledger| Ok(ledger.candidates()?))
}

pub fn ballot_for(engine: &Engine, voter: MemberId) -> Result<Option<Ballot>, GovernanceError> {
    engine.read(|ledger| Ok(ledger.ballot(voter)?))
}

pub fn ballot_count(engine: &Engine) -> Result<u64, GovernanceError> {
    engine.read(|ledger| Ok(ledger.ballot_count()?))
}

/// Sum of candidate vote counts. Equals `ballot_count` while polls are open.
pub fn vote_total(engine: &Engine) -> Result<u64, GovernanceError> {
    engine.read(|ledger| Ok(ledger.vote_total()?))
}

pub fn run_election_cli(ctx: &CommandContext<'_>, cli: ElectionCli) -> Result<(), GovernanceError> {
    match cli.command {
        ElectionCommand::Run { display_name } => {
            let caller = ctx.caller()?;
            let candidate = register_candidate(ctx.engine, caller, display_name.as_deref())?;
            output::emit(
                ctx.format,
                Action::RegisterCandidate.op_name(),
                &format!(
                    "{} is now running for President! Vote with `vote {}` once polls open.",
                    candidate.name, candidate.name
                ),
                &candidate,
            );
        }
        ElectionCommand::Withdraw => {
            let caller = ctx.caller()?;
            let candidate = withdraw(ctx.engine, caller)?;
            output::emit(
                ctx.format,
                Action::Withdraw.op_name(),
                &format!("{}, you have withdrawn from the race.", candidate.name),
                &candidate,
            );
        }
        ElectionCommand::Vote { target } => {
            let caller = ctx.caller()?;
            let target = VoteTarget::parse(&target)?;
            let outcome = cast_vote(ctx.engine, caller, &target)?;
            let text = match &outcome {
                VoteOutcome::Cast { to } => format!("Vote cast for {}!", to.name),
                VoteOutcome::Changed { from, to } => {
                    format!("Vote changed from {} to {}!", from.name, to.name)
                }
            };
            output::emit(ctx.format, Action::CastVote.op_name(), &text, &outcome);
        }
        ElectionCommand::Candidates => {
            let roster = candidates(ctx.engine)?;
            output::emit(
                ctx.format,
                "election.candidates",
                &output::render_candidates(&roster),
                &roster,
            );
        }
    }
    Ok(())
}

pub fn run_polls_cli(ctx: &CommandContext<'_>, cli: PollsCli) -> Result<(), GovernanceError> {
    let caller = ctx.caller()?;
    match cli.command {
        PollsCommand::Open => {
            let opened = open_polls(ctx.engine, caller)?;
            let text = if opened.already_open {
                "Polls are already open."
            } else {
                "Polls are now open! Citizens can vote for their preferred candidate."
            };
            output::emit(ctx.format, Action::OpenPolls.op_name(), text, &opened);
        }
        PollsCommand::Close => {
            let flags = close_polls(ctx.engine, caller)?;
            output::emit(
                ctx.format,
                Action::ClosePolls.op_name(),
                "Polls are now closed.",
                &flags,
            );
        }
        PollsCommand::Elect => {
            let outcome = close_and_elect(ctx.engine, caller)?;
            let text = match &outcome.winner {
                Some(winner) => format!(
                    "{} has been elected with {}!",
                    winner.name,
                    output::plural_votes(winner.votes)
                ),
                None => "No candidates ran; no one was elected.".to_string(),
            };
            output::emit(ctx.format, Action::CloseAndElect.op_name(), &text, &outcome);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "election",
        "version": "0.1.0",
        "description": "Candidate roster, ballots, and poll lifecycle",
        "commands": [
            { "name": "run", "parameters": ["display_name"], "phase": "polls closed" },
            { "name": "withdraw", "phase": "polls closed" },
            { "name": "vote", "parameters": ["target"], "phase": "polls open" },
            { "name": "candidates" },
            { "name": "polls open", "privileged": true },
            { "name": "polls close", "privileged": true },
            { "name": "polls elect", "privileged": true }
        ],
        "storage": ["civitas.db"]
    })
}
