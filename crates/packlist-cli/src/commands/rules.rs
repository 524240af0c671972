//! Rules command - inspect built-in field rule sets.

use clap::{Args, Subcommand};
use console::style;

use packlist_core::RuleSet;
use packlist_core::fields::BUILTIN_RULE_SETS;

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List built-in rule sets
    List,

    /// Show the rules of one set
    Show {
        /// Rule set name
        name: String,
    },
}

pub async fn run(args: RulesArgs) -> anyhow::Result<()> {
    match args.command {
        RulesCommand::List => {
            for (name, description) in BUILTIN_RULE_SETS {
                println!("{:<16} {}", style(name).bold(), description);
            }
            Ok(())
        }
        RulesCommand::Show { name } => {
            let set = RuleSet::builtin(&name)?;
            print!("{}", describe(&set));
            Ok(())
        }
    }
}

fn describe(set: &RuleSet) -> String {
    let mut output = format!("{} ({} fields)\n", set.name(), set.len());
    for rule in set.rules() {
        output.push_str(&format!("\n{}\n", rule.name()));
        output.push_str(&format!("  pattern:  {}\n", rule.pattern()));
        output.push_str(&format!("  group:    {}\n", rule.capture_group()));
        if rule.is_multiline() {
            output.push_str("  multiline\n");
        }
        if !rule.fallback().is_empty() {
            output.push_str(&format!("  fallback: {}\n", rule.fallback()));
        }
    }
    output
}
