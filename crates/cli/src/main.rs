mod aliases;
mod backend;
mod commands;
mod config;
mod context;

use std::env;
use std::io;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use dnf5_argparse::{Argument, Error as ArgError};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

use crate::backend::DryRun;
use crate::commands::ROOT_COMMAND;
use crate::context::Context;

/// Exit code for a command line the parser rejected.
const EXIT_ARGUMENT_PARSER_ERROR: u8 = 2;

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(&err),
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut ctx = Context::new();
    let commands = commands::register(&mut ctx)?;
    aliases::load_cmdline_aliases(&mut ctx.parser, &aliases::alias_dirs());

    if let Some(idx) = args.get(1).and_then(|arg| arg.strip_prefix("--complete=")) {
        let idx: usize = idx
            .parse()
            .with_context(|| format!("invalid completion index \"{idx}\""))?;
        ctx.parser.complete(args.iter().skip(2).cloned(), idx);
        return Ok(());
    }

    if let Err(err) = ctx.parser.parse(args.iter().cloned()) {
        let help_requested = ctx.parser.named_arg(commands.help).parse_count() > 0
            || args.iter().any(|arg| arg == "--help" || arg == "-h");
        if help_requested
            && matches!(
                err,
                ArgError::MissingPositionalArgument { .. } | ArgError::MissingCommand { .. }
            )
            && let Some(selected) = ctx.parser.selected_command()
        {
            ctx.parser.print_help(selected);
            return Ok(());
        }
        return Err(err.into());
    }

    let selected = ctx
        .parser
        .selected_command()
        .ok_or(ArgError::RootCommandNotSet)?;

    if ctx.parser.named_arg(commands.help).parse_count() > 0 {
        ctx.parser.print_help(selected);
        return Ok(());
    }
    if ctx.parser.named_arg(commands.version).parse_count() > 0 {
        println!("{ROOT_COMMAND} version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let storage = ctx.parser.resolve_alias(selected);
    let Some(action) = commands.get(storage) else {
        return Err(ctx.parser.missing_command_error(selected).into());
    };
    debug!(command = ctx.parser.command(storage).id(), "running command");

    let mut backend = DryRun::new(
        io::stdout(),
        ctx.config.clone(),
        ctx.repo_setopts.borrow().clone(),
    );
    action.run(&ctx, &mut backend)
}

fn report_error(err: &anyhow::Error) -> ExitCode {
    let Some(arg_err) = err
        .downcast_ref::<ArgError>()
        .filter(|arg_err| arg_err.is_usage_error())
    else {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    };

    eprintln!("{arg_err}. Add \"--help\" for more information about the arguments.");
    if let ArgError::UnknownArgument { command, argument } = arg_err
        && command == ROOT_COMMAND
        && !argument.starts_with('-')
    {
        eprintln!(
            "It could be a command provided by a plugin, try: \
             {ROOT_COMMAND} install '{ROOT_COMMAND}-command({argument})'"
        );
    }
    ExitCode::from(EXIT_ARGUMENT_PARSER_ERROR)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
