//! The command tree of the program and the actions behind each command.

mod repo;
mod repoquery;
mod root;
mod transaction;

use std::cell::RefCell;
use std::io::{self, BufRead, IsTerminal, Write};
use std::rc::Rc;

use anyhow::{Result, anyhow, bail};
use dnf5_argparse::option::{self, OptionBool, OptionString, SharedValues};
use dnf5_argparse::{ArgCount, Argument, ArgumentParser, CommandId, GroupId, NamedArgId};
use tracing::debug;

use crate::backend::{Goal, Problems, TransactionBackend};
use crate::config::ConfigMain;
use crate::context::Context;

pub use root::ROOT_COMMAND;

/// Action of a leaf command, run after a successful parse.
pub trait Command {
    fn run(&self, ctx: &Context, backend: &mut dyn TransactionBackend) -> Result<()>;
}

/// Ids of the arguments the program itself inspects after parsing.
pub struct Commands {
    pub help: NamedArgId,
    pub version: NamedArgId,
    actions: Vec<(CommandId, Box<dyn Command>)>,
}

impl Commands {
    /// Action for `cmd`; aliases must be resolved by the caller.
    pub fn get(&self, cmd: CommandId) -> Option<&dyn Command> {
        self.actions
            .iter()
            .find(|(id, _)| *id == cmd)
            .map(|(_, action)| action.as_ref())
    }
}

/// Build the whole command tree into `ctx.parser`.
pub fn register(ctx: &mut Context) -> Result<Commands> {
    let root = root::register(ctx)?;
    let mut actions: Vec<(CommandId, Box<dyn Command>)> = Vec::new();

    let parser = &mut ctx.parser;
    let software = parser.add_new_group("software");
    parser
        .group_mut(software)
        .set_header("Software Management Commands:");
    parser.register_group(root.id, software)?;
    let query = parser.add_new_group("query");
    parser.group_mut(query).set_header("Query Commands:");
    parser.register_group(root.id, query)?;

    let (install, action) = transaction::register_install(parser, root.id, software)?;
    actions.push((install, action));
    let (remove, action) = transaction::register_remove(parser, root.id, software)?;
    actions.push((remove, action));
    let (upgrade, action) = transaction::register_upgrade(parser, root.id, software)?;
    actions.push((upgrade, action));

    let update = parser.add_new_command_alias("update", upgrade)?;
    parser.command_mut(update).set_description("Alias for 'upgrade'");
    parser.command_mut(update).set_complete(false);
    parser.register_command(root.id, update)?;

    let (repoquery, action) = repoquery::register(parser, root.id, query)?;
    actions.push((repoquery, action));
    actions.extend(repo::register(parser, root.id, query)?);

    debug!(commands = actions.len(), "command tree registered");
    Ok(Commands {
        help: root.help,
        version: root.version,
        actions,
    })
}

/// Create a command, register it under `parent` and list it in `group`.
fn add_command(
    parser: &mut ArgumentParser,
    parent: CommandId,
    group: Option<GroupId>,
    id: &str,
    description: &str,
) -> Result<CommandId> {
    let cmd = parser.add_new_command(id)?;
    let command = parser.command_mut(cmd);
    command.set_description(description);
    command.set_named_args_help_header("Options:");
    command.set_positional_args_help_header("Positional Arguments:");
    command.set_commands_help_header("Commands:");
    parser.register_command(parent, cmd)?;
    if let Some(group) = group {
        parser.group_register_argument(group, cmd)?;
    }
    Ok(cmd)
}

/// Boolean switch stored into a fresh option the command keeps.
fn add_flag(
    parser: &mut ArgumentParser,
    cmd: CommandId,
    long_name: &str,
    description: &str,
) -> Result<(NamedArgId, Rc<RefCell<OptionBool>>)> {
    let value = option::shared(OptionBool::new(false));
    let arg = parser.add_new_named_arg(long_name)?;
    let named = parser.named_arg_mut(arg);
    named.set_long_name(long_name);
    named.set_description(description);
    named.set_const_value("true");
    named.link_value(value.clone());
    parser.register_named_arg(cmd, arg)?;
    Ok((arg, value))
}

/// Positional list of strings.
fn add_specs(
    parser: &mut ArgumentParser,
    cmd: CommandId,
    id: &str,
    nvals: ArgCount,
    description: &str,
) -> Result<SharedValues> {
    let values = parser.add_new_values();
    let init = parser.add_init_value(OptionString::empty());
    let arg = parser.add_new_positional_arg(id, nvals, Some(init), Some(values.clone()))?;
    parser.positional_arg_mut(arg).set_description(description);
    parser.register_positional_arg(cmd, arg)?;
    Ok(values)
}

fn strings(values: &SharedValues) -> Vec<String> {
    option::values_as(values, |value: &OptionString| value.value().to_string())
}

fn problems_error(context: &str, problems: Problems) -> anyhow::Error {
    anyhow!("{context}:\n  {}", problems.join("\n  "))
}

/// Resolve, confirm, download and run `goal`.
fn run_goal(ctx: &Context, backend: &mut dyn TransactionBackend, goal: &Goal) -> Result<()> {
    let transaction = backend
        .resolve(goal)
        .map_err(|problems| problems_error("Failed to resolve the transaction", problems))?;
    if transaction.is_empty() {
        println!("Nothing to do.");
        return Ok(());
    }

    println!("Transaction Summary:");
    for (action, spec) in &transaction.items {
        println!(" {action}: {spec}");
    }
    if !user_confirm(&ctx.config)? {
        bail!("Operation aborted by the user.");
    }

    backend
        .download(&transaction)
        .map_err(|problems| problems_error("Failed to download packages", problems))?;
    backend
        .run(&transaction)
        .map_err(|problems| problems_error("Transaction failed", problems))?;
    println!("Complete!");
    Ok(())
}

fn user_confirm(config: &ConfigMain) -> Result<bool> {
    if config.assumeno() {
        return Ok(false);
    }
    if config.assumeyes() {
        return Ok(true);
    }
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }
    eprint!("Is this ok [y/N]: ");
    io::stderr().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
