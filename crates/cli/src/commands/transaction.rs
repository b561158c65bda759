//! Commands that change installed software.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use dnf5_argparse::option::{OptionBool, SharedValues};
use dnf5_argparse::{ArgCount, ArgumentParser, CommandId, GroupId};

use super::{Command, add_command, add_flag, add_specs, run_goal, strings};
use crate::backend::{Action, Goal, TransactionBackend};
use crate::context::Context;

struct InstallCommand {
    specs: SharedValues,
}

impl Command for InstallCommand {
    fn run(&self, ctx: &Context, backend: &mut dyn TransactionBackend) -> Result<()> {
        let mut goal = Goal::default();
        for spec in strings(&self.specs) {
            goal.add(Action::Install, &spec);
        }
        run_goal(ctx, backend, &goal)
    }
}

pub(super) fn register_install(
    parser: &mut ArgumentParser,
    root: CommandId,
    group: GroupId,
) -> Result<(CommandId, Box<dyn Command>)> {
    let cmd = add_command(parser, root, Some(group), "install", "Install software")?;
    let specs = add_specs(
        parser,
        cmd,
        "package-spec-NPFB",
        ArgCount::AtLeastOne,
        "List of package specs to install",
    )?;
    let action: Box<dyn Command> = Box::new(InstallCommand { specs });
    Ok((cmd, action))
}

struct RemoveCommand {
    specs: SharedValues,
}

impl Command for RemoveCommand {
    fn run(&self, ctx: &Context, backend: &mut dyn TransactionBackend) -> Result<()> {
        let mut goal = Goal::default();
        for spec in strings(&self.specs) {
            goal.add(Action::Remove, &spec);
        }
        run_goal(ctx, backend, &goal)
    }
}

pub(super) fn register_remove(
    parser: &mut ArgumentParser,
    root: CommandId,
    group: GroupId,
) -> Result<(CommandId, Box<dyn Command>)> {
    let cmd = add_command(parser, root, Some(group), "remove", "Remove (uninstall) software")?;
    let specs = add_specs(
        parser,
        cmd,
        "package-spec-N",
        ArgCount::AtLeastOne,
        "List of package specs to remove",
    )?;
    let action: Box<dyn Command> = Box::new(RemoveCommand { specs });
    Ok((cmd, action))
}

struct UpgradeCommand {
    specs: SharedValues,
    minimal: Rc<RefCell<OptionBool>>,
}

impl Command for UpgradeCommand {
    fn run(&self, ctx: &Context, backend: &mut dyn TransactionBackend) -> Result<()> {
        let specs = strings(&self.specs);
        let mut goal = Goal {
            upgrade_all: specs.is_empty(),
            minimal: self.minimal.borrow().value(),
            ..Goal::default()
        };
        for spec in &specs {
            goal.add(Action::Upgrade, spec);
        }
        run_goal(ctx, backend, &goal)
    }
}

pub(super) fn register_upgrade(
    parser: &mut ArgumentParser,
    root: CommandId,
    group: GroupId,
) -> Result<(CommandId, Box<dyn Command>)> {
    let cmd = add_command(parser, root, Some(group), "upgrade", "Upgrade software")?;
    let (_, minimal) = add_flag(
        parser,
        cmd,
        "minimal",
        "upgrade only to the lowest version that fixes a problem",
    )?;
    let specs = add_specs(
        parser,
        cmd,
        "package-spec-NPFB",
        ArgCount::Unlimited,
        "List of package specs to upgrade",
    )?;
    let action: Box<dyn Command> = Box::new(UpgradeCommand { specs, minimal });
    Ok((cmd, action))
}
