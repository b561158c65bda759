//! Hierarchical command-line argument parser.
//!
//! A single [`ArgumentParser`] owns a tree of [`Command`]s with their
//! [`NamedArg`]s, [`PositionalArg`]s and [`Group`]s. Everything is addressed by
//! small copyable ids handed out by the `add_new_*` factories:
//!
//! - commands dispatch to subcommands, which consume the rest of argv
//! - named arguments may be inherited from ancestor commands, aliased, and may
//!   trigger other named arguments ("attached" arguments)
//! - conflicting arguments are rejected in the order they appear
//! - [`ArgumentParser::complete`] runs the same scan but prints shell-completion
//!   candidates for one argv slot instead of failing
//!
//! Parsed values are written into shared typed options from [`option`].

mod argument;
mod command;
mod complete;
mod error;
mod group;
mod help;
mod named_arg;
pub mod option;
mod parse;
mod parser;
mod positional_arg;

pub use argument::{ArgRef, Argument, ArgumentBase, ArgumentKind, ConflictGroupId, UserData};
pub use command::{Command, CommandAlias, CommandId, CommandParseHook};
pub use error::{ConflictingArg, Error, MAX_ATTACHED_DEPTH, Result};
pub use group::{Group, GroupId};
pub use named_arg::{AttachedNamedArg, NamedArg, NamedArgId, NamedArgParseHook};
pub use parser::ArgumentParser;
pub use positional_arg::{
    ArgCount, CompleteHook, PositionalArg, PositionalArgId, PositionalArgParseHook,
};
