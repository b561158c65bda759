use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::argument::{ArgRef, Argument, ConflictGroupId};
use crate::command::{Command, CommandId, CommandItems};
use crate::error::{ConflictingArg, Error, Result};
use crate::group::{Group, GroupId};
use crate::named_arg::{NamedArg, NamedArgId};
use crate::option::{ConfigOption, OptionList, SharedOption, SharedValues};
use crate::positional_arg::{ArgCount, PositionalArg, PositionalArgId};

/// Transient state of a completion pass.
pub(crate) struct Completion {
    /// Absolute argv index of the word being completed.
    pub(crate) target: usize,
    pub(crate) output: String,
}

/// Owner of every command, argument and group of one command-line grammar.
///
/// Objects are created through the `add_new_*` factories and referenced by the
/// returned ids. Nothing is ever removed, so ids stay valid for the parser's lifetime.
pub struct ArgumentParser {
    pub(crate) commands: Vec<Command>,
    pub(crate) named_args: Vec<NamedArg>,
    pub(crate) positional_args: Vec<PositionalArg>,
    pub(crate) groups: Vec<Group>,
    pub(crate) conflict_groups: Vec<Vec<ArgRef>>,
    root_command: Option<CommandId>,
    pub(crate) selected_command: Option<CommandId>,
    inherit_named_args: bool,
    pub(crate) complete_add_description: bool,
    pub(crate) completion: Option<Completion>,
}

impl Default for ArgumentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgumentParser {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            named_args: Vec::new(),
            positional_args: Vec::new(),
            groups: Vec::new(),
            conflict_groups: Vec::new(),
            root_command: None,
            selected_command: None,
            inherit_named_args: false,
            complete_add_description: true,
            completion: None,
        }
    }

    pub fn add_new_command(&mut self, id: &str) -> Result<CommandId> {
        self.commands.push(Command::new(id)?);
        Ok(CommandId(self.commands.len() - 1))
    }

    /// Create an alias of `attached_command`. Register it like any other command.
    pub fn add_new_command_alias(
        &mut self,
        id: &str,
        attached_command: CommandId,
    ) -> Result<CommandId> {
        self.commands.push(Command::new_alias(id, attached_command)?);
        Ok(CommandId(self.commands.len() - 1))
    }

    pub fn add_new_named_arg(&mut self, id: &str) -> Result<NamedArgId> {
        self.named_args.push(NamedArg::new(id)?);
        Ok(NamedArgId(self.named_args.len() - 1))
    }

    /// Positional argument consuming `nvals` tokens.
    ///
    /// When `values` is given, parsed tokens are stored into it, growing the list
    /// with clones of `init_value` as needed.
    pub fn add_new_positional_arg(
        &mut self,
        id: &str,
        nvals: ArgCount,
        init_value: Option<SharedOption>,
        values: Option<SharedValues>,
    ) -> Result<PositionalArgId> {
        let arg = PositionalArg::with_init_value(id, nvals, init_value, values)?;
        self.positional_args.push(arg);
        Ok(PositionalArgId(self.positional_args.len() - 1))
    }

    /// Positional argument writing into a pre-filled list, one token per element.
    pub fn add_new_positional_arg_with_values(
        &mut self,
        id: &str,
        values: SharedValues,
    ) -> Result<PositionalArgId> {
        let arg = PositionalArg::with_values(id, values)?;
        self.positional_args.push(arg);
        Ok(PositionalArgId(self.positional_args.len() - 1))
    }

    pub fn add_new_group(&mut self, id: &str) -> GroupId {
        self.groups.push(Group::new(id));
        GroupId(self.groups.len() - 1)
    }

    /// Make all `args` mutually exclusive by giving them one shared conflict list.
    pub fn add_conflict_args_group<I>(&mut self, args: I) -> ConflictGroupId
    where
        I: IntoIterator<Item = ArgRef>,
    {
        let args: Vec<ArgRef> = args.into_iter().collect();
        let group = ConflictGroupId(self.conflict_groups.len());
        for &arg in &args {
            self.argument_mut(arg).base_mut().conflict_args = Some(group);
        }
        self.conflict_groups.push(args);
        group
    }

    pub fn add_init_value<T: ConfigOption>(&self, value: T) -> SharedOption {
        Rc::new(RefCell::new(value))
    }

    pub fn add_new_values(&self) -> SharedValues {
        Rc::new(RefCell::new(Vec::new()))
    }

    pub fn add_values(&self, values: OptionList) -> SharedValues {
        Rc::new(RefCell::new(values))
    }

    pub fn command(&self, id: CommandId) -> &Command {
        &self.commands[id.0]
    }

    pub fn command_mut(&mut self, id: CommandId) -> &mut Command {
        &mut self.commands[id.0]
    }

    pub fn named_arg(&self, id: NamedArgId) -> &NamedArg {
        &self.named_args[id.0]
    }

    pub fn named_arg_mut(&mut self, id: NamedArgId) -> &mut NamedArg {
        &mut self.named_args[id.0]
    }

    pub fn positional_arg(&self, id: PositionalArgId) -> &PositionalArg {
        &self.positional_args[id.0]
    }

    pub fn positional_arg_mut(&mut self, id: PositionalArgId) -> &mut PositionalArg {
        &mut self.positional_args[id.0]
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id.0]
    }

    pub fn argument(&self, arg: ArgRef) -> &dyn Argument {
        match arg {
            ArgRef::Command(id) => &self.commands[id.0],
            ArgRef::Named(id) => &self.named_args[id.0],
            ArgRef::Positional(id) => &self.positional_args[id.0],
        }
    }

    pub fn argument_mut(&mut self, arg: ArgRef) -> &mut dyn Argument {
        match arg {
            ArgRef::Command(id) => &mut self.commands[id.0],
            ArgRef::Named(id) => &mut self.named_args[id.0],
            ArgRef::Positional(id) => &mut self.positional_args[id.0],
        }
    }

    /// Follow alias links down to the command that stores the children.
    pub fn resolve_alias(&self, mut cmd: CommandId) -> CommandId {
        while let Some(alias) = &self.commands[cmd.0].alias {
            cmd = alias.attached_command;
        }
        cmd
    }

    pub(crate) fn items(&self, cmd: CommandId) -> &CommandItems {
        &self.commands[self.resolve_alias(cmd).0].items
    }

    fn items_mut(&mut self, cmd: CommandId) -> &mut CommandItems {
        let storage = self.resolve_alias(cmd);
        &mut self.commands[storage.0].items
    }

    fn command_id_of(&self, cmd: CommandId) -> &str {
        self.commands[cmd.0].id()
    }

    fn named_arg_id_of(&self, arg: NamedArgId) -> &str {
        self.named_args[arg.0].id()
    }

    fn positional_arg_id_of(&self, arg: PositionalArgId) -> &str {
        self.positional_args[arg.0].id()
    }

    fn already_registered(&self, kind: &'static str, id: &str, cmd: CommandId) -> Error {
        Error::IdAlreadyRegistered {
            kind,
            id: id.to_string(),
            command: self.command_id_of(cmd).to_string(),
        }
    }

    /// Register `cmd` as a subcommand. Registering into an alias registers into
    /// the aliased command.
    pub fn register_command(&mut self, parent: CommandId, cmd: CommandId) -> Result<()> {
        let storage = self.resolve_alias(parent);
        let id = self.command_id_of(cmd);
        if self.commands_of(storage).iter().any(|&c| self.command_id_of(c) == id) {
            return Err(self.already_registered("Command", id, storage));
        }
        self.commands[cmd.0].parent = Some(storage);
        self.commands[storage.0].items.commands.push(cmd);
        Ok(())
    }

    pub fn register_named_arg(&mut self, cmd: CommandId, arg: NamedArgId) -> Result<()> {
        let storage = self.resolve_alias(cmd);
        let id = self.named_arg_id_of(arg);
        if self.named_args_of(storage).iter().any(|&a| self.named_arg_id_of(a) == id) {
            return Err(self.already_registered("Named argument", id, storage));
        }
        self.commands[storage.0].items.named_args.push(arg);
        Ok(())
    }

    pub fn register_positional_arg(&mut self, cmd: CommandId, arg: PositionalArgId) -> Result<()> {
        let storage = self.resolve_alias(cmd);
        let id = self.positional_arg_id_of(arg);
        if self
            .positional_args_of(storage)
            .iter()
            .any(|&a| self.positional_arg_id_of(a) == id)
        {
            return Err(self.already_registered("Positional argument", id, storage));
        }
        self.commands[storage.0].items.positional_args.push(arg);
        Ok(())
    }

    pub fn register_group(&mut self, cmd: CommandId, group: GroupId) -> Result<()> {
        let storage = self.resolve_alias(cmd);
        let id = self.groups[group.0].id();
        if self.groups_of(storage).iter().any(|&g| self.groups[g.0].id() == id) {
            return Err(self.already_registered("Group", id, storage));
        }
        self.commands[storage.0].items.groups.push(group);
        Ok(())
    }

    /// Add `arg` to a help/completion group.
    pub fn group_register_argument(
        &mut self,
        group: GroupId,
        arg: impl Into<ArgRef>,
    ) -> Result<()> {
        let arg = arg.into();
        let id = self.argument(arg).id();
        let grp = &self.groups[group.0];
        if grp.arguments.iter().any(|&a| self.argument(a).id() == id) {
            return Err(Error::GroupArgumentIdRegistered {
                id: id.to_string(),
                group: grp.id().to_string(),
            });
        }
        self.groups[group.0].arguments.push(arg);
        Ok(())
    }

    pub fn set_command_parse_hook_func<F>(&mut self, cmd: CommandId, hook: F)
    where
        F: Fn(&ArgumentParser, CommandId, &str, &[String]) -> Result<()> + 'static,
    {
        self.items_mut(cmd).parse_hook = Some(Rc::new(hook));
    }

    pub fn commands_of(&self, cmd: CommandId) -> &[CommandId] {
        &self.items(cmd).commands
    }

    pub fn named_args_of(&self, cmd: CommandId) -> &[NamedArgId] {
        &self.items(cmd).named_args
    }

    pub fn positional_args_of(&self, cmd: CommandId) -> &[PositionalArgId] {
        &self.items(cmd).positional_args
    }

    pub fn groups_of(&self, cmd: CommandId) -> &[GroupId] {
        &self.items(cmd).groups
    }

    pub fn child_command(&self, cmd: CommandId, id: &str) -> Result<CommandId> {
        self.commands_of(cmd)
            .iter()
            .copied()
            .find(|&c| self.command_id_of(c) == id)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Command id \"{}\" does not contain subcommand with id \"{id}\"",
                    self.command_id_of(cmd)
                ))
            })
    }

    pub fn child_named_arg(&self, cmd: CommandId, id: &str) -> Result<NamedArgId> {
        self.named_args_of(cmd)
            .iter()
            .copied()
            .find(|&a| self.named_arg_id_of(a) == id)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Command id \"{}\" does not contain named argument with id \"{id}\"",
                    self.command_id_of(cmd)
                ))
            })
    }

    pub fn child_positional_arg(&self, cmd: CommandId, id: &str) -> Result<PositionalArgId> {
        self.positional_args_of(cmd)
            .iter()
            .copied()
            .find(|&a| self.positional_arg_id_of(a) == id)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Command id \"{}\" does not contain positional argument with id \"{id}\"",
                    self.command_id_of(cmd)
                ))
            })
    }

    pub fn child_group(&self, cmd: CommandId, id: &str) -> Result<GroupId> {
        self.groups_of(cmd)
            .iter()
            .copied()
            .find(|&g| self.groups[g.0].id() == id)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Command id \"{}\" does not contain group with id \"{id}\"",
                    self.command_id_of(cmd)
                ))
            })
    }

    /// Command ids from the root down to `cmd`. An alias reports its target.
    pub fn invocation(&self, cmd: CommandId) -> Vec<String> {
        let mut invocation = Vec::new();
        let mut current = Some(self.resolve_alias(cmd));
        while let Some(id) = current {
            invocation.push(self.command_id_of(id).to_string());
            current = self.commands[id.0].parent;
        }
        invocation.reverse();
        invocation
    }

    /// Error for container commands invoked without a subcommand.
    pub fn missing_command_error(&self, cmd: CommandId) -> Error {
        Error::MissingCommand {
            command: self.invocation(cmd).join(" "),
        }
    }

    /// Declare `arg` and `conflict` mutually exclusive.
    pub fn add_conflict_argument(&mut self, arg: impl Into<ArgRef>, conflict: impl Into<ArgRef>) {
        let (arg, conflict) = (arg.into(), conflict.into());
        self.push_conflict(arg, conflict);
        self.push_conflict(conflict, arg);
    }

    fn push_conflict(&mut self, arg: ArgRef, conflict: ArgRef) {
        let group = match self.argument(arg).conflict_arguments() {
            Some(group) => group,
            None => {
                let group = ConflictGroupId(self.conflict_groups.len());
                self.conflict_groups.push(Vec::new());
                self.argument_mut(arg).base_mut().conflict_args = Some(group);
                group
            }
        };
        let list = &mut self.conflict_groups[group.0];
        if !list.contains(&conflict) {
            list.push(conflict);
        }
    }

    /// Give `dst` every conflict `src` has, except `dst` and `src` themselves.
    pub fn add_conflict_arguments_from_another(
        &mut self,
        dst: impl Into<ArgRef>,
        src: impl Into<ArgRef>,
    ) {
        let (dst, src) = (dst.into(), src.into());
        if dst == src {
            return;
        }
        for conflict in self.conflict_arguments(src).to_vec() {
            if conflict != dst && conflict != src {
                self.add_conflict_argument(dst, conflict);
            }
        }
    }

    /// Replace the conflict list of `arg` with an existing shared list.
    pub fn set_conflict_arguments(&mut self, arg: impl Into<ArgRef>, group: ConflictGroupId) {
        self.argument_mut(arg.into()).base_mut().conflict_args = Some(group);
    }

    pub fn conflict_arguments(&self, arg: impl Into<ArgRef>) -> &[ArgRef] {
        match self.argument(arg.into()).conflict_arguments() {
            Some(group) => &self.conflict_groups[group.0],
            None => &[],
        }
    }

    /// The first conflicting argument that was already parsed.
    pub fn conflict_argument(&self, arg: impl Into<ArgRef>) -> Option<ArgRef> {
        let arg = arg.into();
        self.conflict_arguments(arg)
            .iter()
            .copied()
            .find(|&other| other != arg && self.argument(other).parse_count() > 0)
    }

    pub(crate) fn conflict_error(&self, argument: String, conflict: ArgRef) -> Error {
        let conflicting = match conflict {
            ArgRef::Named(id) => ConflictingArg::Named(self.named_args[id.0].display_names()),
            ArgRef::Positional(id) => {
                ConflictingArg::Positional(self.positional_arg_id_of(id).to_string())
            }
            ArgRef::Command(id) => ConflictingArg::Command(self.command_id_of(id).to_string()),
        };
        Error::ConflictingArguments {
            argument,
            conflicting,
        }
    }

    /// Create a named argument that behaves like `src` under other names.
    ///
    /// The alias shares the linked value, hook and conflicts of `src` and is hidden
    /// from completion.
    pub fn add_named_arg_alias(
        &mut self,
        src: NamedArgId,
        id: &str,
        long_name: &str,
        short_name: Option<char>,
        group: Option<GroupId>,
    ) -> Result<NamedArgId> {
        let alias = self.add_new_named_arg(id)?;
        let source = &self.named_args[src.0];

        let mut names = Vec::new();
        if let Some(short) = source.short_name {
            names.push(format!("'-{short}'"));
        }
        if !source.long_name.is_empty() {
            names.push(format!("'--{}'", source.long_name));
        }
        let description = format!("Alias for {}", names.join(", "));
        let has_value = source.has_value;
        let value = source.value.clone();
        let store_value = source.store_value;
        let const_value = source.const_value.clone();
        let arg_value_help = source.arg_value_help.clone();
        let parse_hook = source.parse_hook.clone();

        let arg = &mut self.named_args[alias.0];
        arg.long_name = long_name.to_string();
        arg.short_name = short_name;
        arg.set_description(&description);
        arg.has_value = has_value;
        arg.value = value;
        arg.store_value = store_value;
        arg.const_value = const_value;
        arg.arg_value_help = arg_value_help;
        arg.set_parse_hook(parse_hook);
        arg.set_complete(false);

        if let Some(group) = group {
            self.group_register_argument(group, alias)?;
        }
        self.add_conflict_arguments_from_another(alias, src);
        trace!(source = %self.named_args[src.0].id(), alias = id, "named argument alias created");
        Ok(alias)
    }

    pub fn set_root_command(&mut self, cmd: CommandId) {
        self.root_command = Some(cmd);
    }

    pub fn root_command(&self) -> Option<CommandId> {
        self.root_command
    }

    pub(crate) fn require_root(&self) -> Result<CommandId> {
        self.root_command.ok_or(Error::RootCommandNotSet)
    }

    /// The deepest command reached by the last parse.
    pub fn selected_command(&self) -> Option<CommandId> {
        self.selected_command
    }

    /// Zero the parse count of every command and argument.
    pub fn reset_parse_count(&mut self) {
        for cmd in &mut self.commands {
            cmd.reset_parse_count();
        }
        for arg in &mut self.named_args {
            arg.reset_parse_count();
        }
        for arg in &mut self.positional_args {
            arg.reset_parse_count();
        }
    }

    /// Let commands match named arguments registered on their ancestors.
    pub fn set_inherit_named_args(&mut self, enable: bool) {
        self.inherit_named_args = enable;
    }

    pub fn inherit_named_args(&self) -> bool {
        self.inherit_named_args
    }

    /// Print completion candidates as a two-column table with descriptions.
    pub fn set_complete_add_description(&mut self, enable: bool) {
        self.complete_add_description = enable;
    }

    pub fn complete_add_description(&self) -> bool {
        self.complete_add_description
    }

    /// Command at a dotted path such as `repo.list`; the root id is omitted.
    pub fn get_command(&self, id_path: &str) -> Result<CommandId> {
        let mut cmd = self.require_root()?;
        if id_path.is_empty() {
            return Ok(cmd);
        }
        for segment in id_path.split('.') {
            cmd = self.child_command(cmd, segment)?;
        }
        Ok(cmd)
    }

    /// Named argument at a dotted path such as `repoquery.info`.
    ///
    /// With `search_in_parent`, an argument registered on a command along the path
    /// also matches.
    pub fn get_named_arg(&self, id_path: &str, search_in_parent: bool) -> Result<NamedArgId> {
        self.lookup(id_path, search_in_parent, Self::named_args_of, Self::named_arg_id_of)?
            .ok_or_else(|| {
                Error::NotFound(format!("Named argument with path id \"{id_path}\" not found"))
            })
    }

    pub fn get_positional_arg(
        &self,
        id_path: &str,
        search_in_parent: bool,
    ) -> Result<PositionalArgId> {
        self.lookup(
            id_path,
            search_in_parent,
            Self::positional_args_of,
            Self::positional_arg_id_of,
        )?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Positional argument with path id \"{id_path}\" not found"
            ))
        })
    }

    fn lookup<T: Copy>(
        &self,
        id_path: &str,
        search_in_parent: bool,
        args_of: fn(&Self, CommandId) -> &[T],
        id_of: fn(&Self, T) -> &str,
    ) -> Result<Option<T>> {
        let (cmd_path, arg_id) = match id_path.rsplit_once('.') {
            Some((cmd_path, arg_id)) => (Some(cmd_path), arg_id),
            None => (None, id_path),
        };
        let find = |cmd: CommandId| {
            args_of(self, cmd)
                .iter()
                .copied()
                .find(|&arg| id_of(self, arg) == arg_id)
        };

        let mut cmd = self.require_root()?;
        let mut found = None;
        if let Some(cmd_path) = cmd_path {
            for segment in cmd_path.split('.') {
                if search_in_parent && let Some(arg) = find(cmd) {
                    found = Some(arg);
                }
                cmd = self.child_command(cmd, segment)?;
            }
        }
        if let Some(arg) = find(cmd) {
            found = Some(arg);
        }
        Ok(found)
    }
}
