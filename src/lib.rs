//! Civitas: the rules engine of a community that elects a president.
//!
//! Members register as candidates while polls are closed, vote (and change
//! their vote) while polls are open, and a supervisor closes the polls to seat
//! the winner. The president can enact rules or declare tyranny; anyone can
//! attempt a revolt, which succeeds with a configured probability.
//!
//! # Architecture
//!
//! ## The store
//!
//! One SQLite database per community (`civitas.db`) holds four record
//! families (candidates, ballots, the president slot, rules) and three phase
//! flags (polls open, debating, tyranny).
//!
//! ## The broker
//!
//! All mutations route through `DbBroker` for:
//! - Serialization (an engine-owned lock plus `BEGIN IMMEDIATE`)
//! - All-or-nothing commits (a rejected operation rolls back)
//! - Audit logging (`broker.events.jsonl`)
//!
//! Queries skip the lock and read the last committed state.
//!
//! ## Subsystems (Plugins)
//!
//! - `election`: candidate roster, ballots, poll lifecycle and tally
//! - `debate`: debate phase and the debate-channel speech check
//! - `rules`: append-only rule ledger
//! - `tyranny`: decree and revolt
//!
//! Platform concerns stay outside: role membership arrives through the
//! `AuthorizationGate` trait, and revolt randomness through the `Dice` trait.
//!
//! # Examples
//!
//! ```bash
//! civitas init
//! civitas --as 1 --name alice election run
//! civitas --as 99 polls open
//! civitas --as 2 election vote alice
//! civitas --as 99 polls elect
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: store, broker, engine, gate, dice, config
//! - [`plugins`]: governance subsystems

pub mod cli;
pub mod core;
pub mod plugins;

use crate::cli::{Cli, Command, CommandContext};
use crate::core::broker;
use crate::core::config::{self, CivitasConfig};
use crate::core::engine::{Engine, GovernanceError};
use crate::core::error::CivitasError;
use crate::core::ledger::{PhaseFlags, PresidentSlot};
use crate::core::output::{self, OutputFormat};
use crate::core::store::Store;
use crate::plugins::{debate, election, rules, tyranny};

use clap::Parser;
use serde::Serialize;
use std::fs;

#[derive(Debug, Clone, Serialize)]
pub struct GovernanceStatus {
    pub flags: PhaseFlags,
    pub president: Option<PresidentSlot>,
    pub candidates: usize,
    pub ballots: u64,
}

/// Flags, president and roster size from a single committed snapshot.
pub fn status(engine: &Engine) -> Result<GovernanceStatus, GovernanceError> {
    engine.read(|ledger| {
        Ok(GovernanceStatus {
            flags: ledger.phase_flags()?,
            president: ledger.president()?,
            candidates: ledger.candidates()?.len(),
            ballots: ledger.ballot_count()?,
        })
    })
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Init => "init",
        Command::Status => "status",
        Command::President => "president",
        Command::Audit { .. } => "audit",
        Command::Schema => "schema",
        Command::Election(_) => "election",
        Command::Polls(_) => "polls",
        Command::Debate(_) => "debate",
        Command::Rule(_) => "rule",
        Command::Tyranny(_) => "tyranny",
    }
}

/// The engine has already created the database; this adds a default config.
fn init_store(store: &Store, format: OutputFormat) -> Result<(), GovernanceError> {
    let db_path = store.db_path();
    let config_path = store.config_path();
    if !config_path.exists() {
        let rendered = toml::to_string(&CivitasConfig::default())
            .map_err(|e| CivitasError::ConfigError(e.to_string()))?;
        fs::write(&config_path, rendered).map_err(CivitasError::IoError)?;
    }
    output::emit(
        format,
        "init",
        &format!("Civitas store initialized at {}", db_path.display()),
        &serde_json::json!({
            "db": db_path.display().to_string(),
            "config": config_path.display().to_string(),
        }),
    );
    Ok(())
}

fn dispatch(ctx: &CommandContext<'_>, command: Command) -> Result<(), GovernanceError> {
    match command {
        Command::Init => init_store(ctx.engine.store(), ctx.format)?,
        Command::Status => {
            let st = status(ctx.engine)?;
            let text = format!(
                "Polls: {} | Debating: {} | Tyranny: {} | President: {} | Candidates: {} | Ballots: {}",
                if st.flags.polls_open { "open" } else { "closed" },
                if st.flags.debating { "on" } else { "off" },
                if st.flags.tyranny_active { "ACTIVE" } else { "none" },
                st.president.as_ref().map_or("No one", |p| p.name.as_str()),
                st.candidates,
                st.ballots,
            );
            output::emit(ctx.format, "status", &text, &st);
        }
        Command::President => {
            let slot = tyranny::president(ctx.engine)?;
            output::emit(
                ctx.format,
                "president",
                &output::render_president(slot.as_ref()),
                &slot,
            );
        }
        Command::Audit { limit } => {
            let events = ctx.engine.broker().read_events(limit)?;
            let text = events
                .iter()
                .map(|e| format!("{} {} {} {}", e.ts, e.actor, e.op, e.status))
                .collect::<Vec<_>>()
                .join("\n");
            output::emit(ctx.format, "audit", &text, &events);
        }
        Command::Schema => {
            let schemas = serde_json::json!([
                election::schema(),
                debate::schema(),
                rules::schema(),
                tyranny::schema(),
                broker::schema(),
            ]);
            println!(
                "{}",
                serde_json::to_string_pretty(&schemas).unwrap_or_else(|_| schemas.to_string())
            );
        }
        Command::Election(cli) => election::run_election_cli(ctx, cli)?,
        Command::Polls(cli) => election::run_polls_cli(ctx, cli)?,
        Command::Debate(cli) => debate::run_debate_cli(ctx, cli)?,
        Command::Rule(cli) => rules::run_rule_cli(ctx, cli)?,
        Command::Tyranny(cli) => tyranny::run_tyranny_cli(ctx, cli)?,
    }
    Ok(())
}

/// Entry point of the `civitas` binary. Failures are rendered before returning.
pub fn run() -> Result<(), GovernanceError> {
    let cli = Cli::parse();
    let format = cli.format;
    let cmd = command_name(&cli.command);

    let result = config::load_config(&cli.root)
        .and_then(|config| Engine::new(Store::new(&cli.root), config))
        .map_err(GovernanceError::from)
        .and_then(|engine| {
            let ctx = CommandContext {
                engine: &engine,
                caller: crate::cli::caller_from_flags(cli.as_id, cli.name),
                format,
            };
            dispatch(&ctx, cli.command)
        });

    if let Err(e) = &result {
        output::emit_error(format, cmd, e);
    }
    result
}
