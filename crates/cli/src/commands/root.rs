use std::path::Path;

use anyhow::Result;
use dnf5_argparse::option::Priority;
use dnf5_argparse::{Argument, ArgumentParser, CommandId, Error, NamedArgId};

use crate::config::split_setopt;
use crate::context::Context;

pub const ROOT_COMMAND: &str = "dnf5";

pub(super) struct Root {
    pub id: CommandId,
    pub help: NamedArgId,
    pub version: NamedArgId,
}

fn add_named_arg(
    parser: &mut ArgumentParser,
    root: CommandId,
    long_name: &str,
    short_name: Option<char>,
    description: &str,
) -> Result<NamedArgId> {
    let arg = parser.add_new_named_arg(long_name)?;
    let named = parser.named_arg_mut(arg);
    named.set_long_name(long_name);
    if let Some(short) = short_name {
        named.set_short_name(short);
    }
    named.set_description(description);
    named.set_const_value("true");
    parser.register_named_arg(root, arg)?;
    Ok(arg)
}

fn invalid(argument: &str, reason: String) -> Error {
    Error::InvalidValue {
        argument: argument.to_string(),
        reason,
    }
}

pub(super) fn register(ctx: &mut Context) -> Result<Root> {
    let config = ctx.config.clone();
    let repo_setopts = ctx.repo_setopts.clone();
    let parser = &mut ctx.parser;

    let root = parser.add_new_command(ROOT_COMMAND)?;
    let command = parser.command_mut(root);
    command.set_description("Utility for installing, updating and removing packages");
    command.set_long_description(
        "DNF5 is a program for maintaining packages.\n\
         This build runs every transaction as a dry run.",
    );
    command.set_commands_help_header("Commands:");
    command.set_named_args_help_header("Global options:");
    parser.set_root_command(root);

    let help = add_named_arg(parser, root, "help", Some('h'), "Print help")?;

    let assumeyes = add_named_arg(
        parser,
        root,
        "assumeyes",
        Some('y'),
        "automatically answer yes for all questions",
    )?;
    parser
        .named_arg_mut(assumeyes)
        .link_value(config.assumeyes.clone());

    let assumeno = add_named_arg(
        parser,
        root,
        "assumeno",
        None,
        "automatically answer no for all questions",
    )?;
    parser
        .named_arg_mut(assumeno)
        .link_value(config.assumeno.clone());

    let refresh = add_named_arg(
        parser,
        root,
        "refresh",
        None,
        "set metadata as expired before running the command",
    )?;
    parser
        .named_arg_mut(refresh)
        .link_value(config.refresh.clone());

    let installroot = add_named_arg(parser, root, "installroot", None, "set install root")?;
    let arg = parser.named_arg_mut(installroot);
    arg.set_has_value(true);
    arg.set_arg_value_help("ABSOLUTE_PATH");
    arg.link_value(config.installroot.clone());
    arg.set_parse_hook_func(|_, _, _, value| {
        if Path::new(value).is_absolute() {
            Ok(())
        } else {
            Err(invalid(
                "--installroot",
                format!("path \"{value}\" is not absolute"),
            ))
        }
    });

    let debuglevel = add_named_arg(
        parser,
        root,
        "debuglevel",
        None,
        "set debugging output level",
    )?;
    let arg = parser.named_arg_mut(debuglevel);
    arg.set_has_value(true);
    arg.set_arg_value_help("DEBUGLEVEL");
    arg.link_value(config.debuglevel.clone());

    let setopt = add_named_arg(
        parser,
        root,
        "setopt",
        None,
        "set arbitrary config and repo options",
    )?;
    let arg = parser.named_arg_mut(setopt);
    arg.set_has_value(true);
    arg.set_arg_value_help("[REPO_ID.]OPTION=VALUE");
    arg.set_long_description(
        "Override a configuration option. Use REPO_ID.OPTION to override an option \
         of one repository. Can be given multiple times.",
    );
    arg.set_parse_hook_func(move |_, _, _, value| {
        let Some((key, val)) = split_setopt(value) else {
            return Err(invalid(
                "--setopt",
                format!("badly formatted argument value \"{value}\""),
            ));
        };
        match key.rfind('.') {
            Some(dot) if dot == key.len() - 1 => Err(invalid(
                "--setopt",
                format!("last key character cannot be '.': \"{value}\""),
            )),
            Some(_) => {
                repo_setopts
                    .borrow_mut()
                    .push((key.to_string(), val.to_string()));
                Ok(())
            }
            None => config
                .set_option(key, val, Priority::CommandLine)
                .map_err(|err| invalid("--setopt", format!("{err:#}"))),
        }
    });

    let best = add_named_arg(
        parser,
        root,
        "best",
        None,
        "try the best available package versions in transactions",
    )?;
    parser.named_arg_mut(best).link_value(ctx.config.best.clone());
    let no_best = add_named_arg(
        parser,
        root,
        "no-best",
        None,
        "do not limit the transaction to the best candidate",
    )?;
    let arg = parser.named_arg_mut(no_best);
    arg.set_const_value("false");
    arg.link_value(ctx.config.best.clone());
    parser.add_conflict_argument(best, no_best);

    let version = add_named_arg(parser, root, "version", None, "Show DNF5 version and exit")?;

    Ok(Root {
        id: root,
        help,
        version,
    })
}
