use std::fmt;
use std::rc::Rc;

use crate::argument::{Argument, ArgumentBase, ArgumentKind};
use crate::error::Result;
use crate::group::GroupId;
use crate::named_arg::{AttachedNamedArg, NamedArgId};
use crate::parser::ArgumentParser;
use crate::positional_arg::PositionalArgId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub(crate) usize);

/// Called after a command finished parsing with `(parser, command, option, argv)`.
///
/// `argv` starts with the token that selected the command.
pub type CommandParseHook = Rc<dyn Fn(&ArgumentParser, CommandId, &str, &[String]) -> Result<()>>;

/// Children registered in a command.
#[derive(Default)]
pub(crate) struct CommandItems {
    pub(crate) commands: Vec<CommandId>,
    pub(crate) named_args: Vec<NamedArgId>,
    pub(crate) positional_args: Vec<PositionalArgId>,
    pub(crate) groups: Vec<GroupId>,
    pub(crate) parse_hook: Option<CommandParseHook>,
}

/// Alternative name for another command.
///
/// The alias owns no children; lookups and parsing use the attached command.
#[derive(Debug, Clone)]
pub struct CommandAlias {
    pub(crate) attached_command: CommandId,
    pub(crate) attached_named_args: Vec<AttachedNamedArg>,
}

impl CommandAlias {
    pub fn attached_command(&self) -> CommandId {
        self.attached_command
    }

    pub fn attached_named_args(&self) -> &[AttachedNamedArg] {
        &self.attached_named_args
    }

    /// Parse the named argument at `id_path` before the alias's own arguments.
    ///
    /// Unlike named-argument attachments, `value` is used verbatim.
    pub fn attach_named_arg(&mut self, id_path: &str, value: &str) {
        self.attached_named_args.push(AttachedNamedArg {
            id_path: id_path.to_string(),
            value: value.to_string(),
        });
    }
}

pub struct Command {
    base: ArgumentBase,
    pub(crate) items: CommandItems,
    pub(crate) alias: Option<CommandAlias>,
    pub(crate) parent: Option<CommandId>,
    commands_help_header: String,
    named_args_help_header: String,
    positional_args_help_header: String,
}

impl Command {
    pub(crate) fn new(id: &str) -> Result<Self> {
        Ok(Self {
            base: ArgumentBase::new(id)?,
            items: CommandItems::default(),
            alias: None,
            parent: None,
            commands_help_header: String::new(),
            named_args_help_header: String::new(),
            positional_args_help_header: String::new(),
        })
    }

    pub(crate) fn new_alias(id: &str, attached_command: CommandId) -> Result<Self> {
        let mut cmd = Self::new(id)?;
        cmd.alias = Some(CommandAlias {
            attached_command,
            attached_named_args: Vec::new(),
        });
        Ok(cmd)
    }

    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }

    pub fn alias(&self) -> Option<&CommandAlias> {
        self.alias.as_ref()
    }

    pub fn alias_mut(&mut self) -> Option<&mut CommandAlias> {
        self.alias.as_mut()
    }

    pub fn commands_help_header(&self) -> &str {
        &self.commands_help_header
    }

    /// An empty header hides the section in help output.
    pub fn set_commands_help_header(&mut self, header: &str) {
        self.commands_help_header = header.to_string();
    }

    pub fn named_args_help_header(&self) -> &str {
        &self.named_args_help_header
    }

    pub fn set_named_args_help_header(&mut self, header: &str) {
        self.named_args_help_header = header.to_string();
    }

    pub fn positional_args_help_header(&self) -> &str {
        &self.positional_args_help_header
    }

    pub fn set_positional_args_help_header(&mut self, header: &str) {
        self.positional_args_help_header = header.to_string();
    }
}

impl Argument for Command {
    fn base(&self) -> &ArgumentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ArgumentBase {
        &mut self.base
    }

    fn kind(&self) -> ArgumentKind {
        ArgumentKind::Command
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("base", &self.base)
            .field("parent", &self.parent)
            .field("alias", &self.alias)
            .field("commands", &self.items.commands)
            .field("named_args", &self.items.named_args)
            .field("positional_args", &self.items.positional_args)
            .finish_non_exhaustive()
    }
}
