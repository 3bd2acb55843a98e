//! CLI struct definitions for the `civitas` command-line adapter.
//!
//! All clap-derived top-level types live here; each subsystem owns its own
//! subcommand types next to its operations.

use crate::core::engine::{Engine, GovernanceError};
use crate::core::gate::Caller;
use crate::core::output::OutputFormat;
use crate::core::store::DEFAULT_STORE_DIR;
use crate::plugins::{debate, election, rules, tyranny};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "civitas",
    version = env!("CARGO_PKG_VERSION"),
    about = "Rules engine for a community that elects a president, tolerates tyranny, and revolts."
)]
pub(crate) struct Cli {
    /// Store directory holding civitas.db, the audit log and civitas.toml.
    #[clap(long, global = true, default_value = DEFAULT_STORE_DIR)]
    pub root: PathBuf,
    /// Output format: 'text' or 'json'.
    #[clap(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Member id of the caller.
    #[clap(long = "as", global = true)]
    pub as_id: Option<u64>,
    /// Display name of the caller (defaults to `member-<id>`).
    #[clap(long, global = true)]
    pub name: Option<String>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create the store with defaulted state.
    Init,
    /// Show the phase flags, the president and the roster size.
    Status,
    /// Show the sitting president.
    President,
    /// Tail the mutation audit log.
    Audit {
        #[clap(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print every subsystem schema as JSON.
    Schema,
    /// Candidate registration and voting.
    Election(election::ElectionCli),
    /// Supervisor controls for the voting window.
    Polls(election::PollsCli),
    /// Debate phase controls.
    Debate(debate::DebateCli),
    /// Rule ledger.
    Rule(rules::RuleCli),
    /// Tyranny and revolt.
    Tyranny(tyranny::TyrannyCli),
}

/// Everything a subsystem CLI handler needs for one invocation.
pub struct CommandContext<'a> {
    pub engine: &'a Engine,
    pub caller: Option<Caller>,
    pub format: OutputFormat,
}

impl CommandContext<'_> {
    pub fn caller(&self) -> Result<&Caller, GovernanceError> {
        self.caller.as_ref().ok_or_else(|| {
            GovernanceError::InvalidArgument("--as <ID> is required for this command".to_string())
        })
    }
}

pub(crate) fn caller_from_flags(as_id: Option<u64>, name: Option<String>) -> Option<Caller> {
    as_id.map(|id| {
        let name = name.unwrap_or_else(|| format!("member-{}", id));
        Caller::new(id, name)
    })
}
