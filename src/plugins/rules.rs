use crate::cli::CommandContext;
use crate::core::engine::{Engine, GovernanceError};
use crate::core::gate::{Action, Caller};
use crate::core::ledger::{Flag, RuleRecord};
use crate::core::output;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "rule", about = "Enact and list community rules")]
pub struct RuleCli {
    #[clap(subcommand)]
    pub command: RuleCommand,
}

#[derive(Subcommand, Debug)]
pub enum RuleCommand {
    /// Enact a rule (sitting president, or anyone during tyranny).
    Enact {
        #[clap(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List every rule in enactment order.
    List,
}

/// Append a rule. Allowed for the sitting president, or for anyone while
/// tyranny is in effect.
pub fn enact_rule(
    engine: &Engine,
    caller: &Caller,
    text: &str,
) -> Result<RuleRecord, GovernanceError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(GovernanceError::InvalidArgument(
            "rule text must not be empty".to_string(),
        ));
    }

    engine.write(caller, Action::EnactRule, |ledger| {
        let tyranny = ledger.flag(Flag::Tyranny)?;
        let is_president = ledger
            .president()?
            .is_some_and(|slot| slot.is_held_by(caller));
        if !(is_president || tyranny) {
            return Err(GovernanceError::Unauthorized {
                action: Action::EnactRule,
            });
        }
        Ok(ledger.append_rule(text, caller.id, tyranny)?)
    })
}

pub fn rules(engine: &Engine) -> Result<Vec<RuleRecord>, GovernanceError> {
    engine.read(|ledger| Ok(ledger.rules()?))
}

pub fn run_rule_cli(ctx: &CommandContext<'_>, cli: RuleCli) -> Result<(), GovernanceError> {
    match cli.command {
        RuleCommand::Enact { text } => {
            let rule = enact_rule(ctx.engine, ctx.caller()?, &text.join(" "))?;
            output::emit(
                ctx.format,
                Action::EnactRule.op_name(),
                &format!("New rule enacted: {}", rule.text),
                &rule,
            );
        }
        RuleCommand::List => {
            let all = rules(ctx.engine)?;
            output::emit(ctx.format, "rules.list", &output::render_rules(&all), &all);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "rules",
        "version": "0.1.0",
        "description": "Append-only rule ledger",
        "commands": [
            { "name": "enact", "parameters": ["text"], "requires": "sitting president or active tyranny" },
            { "name": "list" }
        ],
        "storage": ["civitas.db"]
    })
}
