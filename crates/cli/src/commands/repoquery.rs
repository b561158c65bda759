use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use dnf5_argparse::option::{OptionBool, SharedValues};
use dnf5_argparse::{ArgCount, ArgumentParser, CommandId, GroupId};

use super::{Command, add_command, add_flag, add_specs, strings};
use crate::backend::{PackageQuery, TransactionBackend};
use crate::context::Context;

struct RepoqueryCommand {
    installed: Rc<RefCell<OptionBool>>,
    available: Rc<RefCell<OptionBool>>,
    info: Rc<RefCell<OptionBool>>,
    keys: SharedValues,
}

impl Command for RepoqueryCommand {
    fn run(&self, _ctx: &Context, backend: &mut dyn TransactionBackend) -> Result<()> {
        let installed = self.installed.borrow().value();
        let query = PackageQuery {
            keys: strings(&self.keys),
            installed,
            available: self.available.borrow().value() || !installed,
        };
        let info = self.info.borrow().value();
        for package in backend.query(&query) {
            if info {
                println!("Name           : {package}");
            } else {
                println!("{package}");
            }
        }
        Ok(())
    }
}

pub(super) fn register(
    parser: &mut ArgumentParser,
    root: CommandId,
    group: GroupId,
) -> Result<(CommandId, Box<dyn Command>)> {
    let cmd = add_command(
        parser,
        root,
        Some(group),
        "repoquery",
        "Search for packages matching various criteria",
    )?;
    let (installed_arg, installed) =
        add_flag(parser, cmd, "installed", "Query only installed packages.")?;
    let (available_arg, available) =
        add_flag(parser, cmd, "available", "Query only available packages (default).")?;
    parser.add_conflict_argument(installed_arg, available_arg);

    let (info_arg, info) = add_flag(
        parser,
        cmd,
        "info",
        "Show detailed information about the packages.",
    )?;
    let (nevra_arg, _) = add_flag(
        parser,
        cmd,
        "nevra",
        "Use name-epoch:version-release.architecture format for displaying packages (default).",
    )?;
    parser.add_conflict_argument(info_arg, nevra_arg);

    let keys = add_specs(parser, cmd, "keys", ArgCount::Unlimited, "List of keys to match")?;
    let action: Box<dyn Command> = Box::new(RepoqueryCommand {
        installed,
        available,
        info,
        keys,
    });
    Ok((cmd, action))
}
