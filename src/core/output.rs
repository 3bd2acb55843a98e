//! Rendering helpers for CLI surfaces.
//!
//! Text mode prints one human line (or a short list); JSON mode prints the
//! standard command envelope with the outcome merged in.

use crate::core::engine::GovernanceError;
use crate::core::ledger::{Candidate, PresidentSlot, RuleRecord};
use crate::core::time::Stamp;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

pub fn plural_votes(votes: u32) -> String {
    format!("{} vote{}", votes, if votes == 1 { "" } else { "s" })
}

pub fn render_candidates(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "No candidates are currently running.".to_string();
    }
    let mut out = String::from("Candidates running:");
    for c in candidates {
        out.push_str(&format!("\n  {} - {}", c.name, plural_votes(c.votes)));
    }
    out
}

pub fn render_rules(rules: &[RuleRecord]) -> String {
    if rules.is_empty() {
        return "No rules exist yet.".to_string();
    }
    let mut out = String::from("Rules:");
    for r in rules {
        let marker = if r.under_tyranny { " (decree)" } else { "" };
        out.push_str(&format!("\n  {}. {}{}", r.id, compact_line(&r.text, 120), marker));
    }
    out
}

pub fn render_president(slot: Option<&PresidentSlot>) -> String {
    match slot {
        Some(p) => format!("The current President is: {}", p.name),
        None => "The current President is: No one".to_string(),
    }
}

pub const ENVELOPE_VERSION: &str = "1.0.0";

/// JSON response shape for `--format json`. `body` keys sit at top level.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, B: Serialize> {
    pub envelope_version: &'static str,
    #[serde(flatten)]
    pub stamp: Stamp,
    pub cmd: &'a str,
    pub status: &'a str,
    #[serde(flatten)]
    pub body: B,
}

impl<'a, B: Serialize> Envelope<'a, B> {
    pub fn new(cmd: &'a str, status: &'a str, body: B) -> Self {
        Self {
            envelope_version: ENVELOPE_VERSION,
            stamp: Stamp::now(),
            cmd,
            status,
            body,
        }
    }

    fn print(&self) {
        match serde_json::to_string_pretty(self) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => eprintln!("failed to render {} envelope: {}", self.cmd, e),
        }
    }
}

#[derive(Serialize)]
struct ResultBody<'p, T: Serialize> {
    result: &'p T,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Print an outcome in the chosen format.
pub fn emit<T: Serialize>(format: OutputFormat, cmd: &str, text: &str, payload: &T) {
    match format {
        OutputFormat::Text => {
            use colored::Colorize;
            println!("{}", text.bright_green());
        }
        OutputFormat::Json => Envelope::new(cmd, "ok", ResultBody { result: payload }).print(),
    }
}

/// Print a rejection or failure in the chosen format.
pub fn emit_error(format: OutputFormat, cmd: &str, err: &GovernanceError) {
    match format {
        OutputFormat::Text => {
            use colored::Colorize;
            eprintln!("{}", err.to_string().bright_red());
        }
        OutputFormat::Json => {
            let status = if err.is_rejection() { "rejected" } else { "error" };
            Envelope::new(cmd, status, ErrorBody { error: err.to_string() }).print();
        }
    }
}
