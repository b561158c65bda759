use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::command::CommandId;
use crate::error::{Error, Result};
use crate::named_arg::NamedArgId;
use crate::positional_arg::PositionalArgId;

/// Host state attached to an argument. The parser never looks inside.
pub type UserData = Rc<dyn Any>;

/// Handle of a shared list of mutually exclusive arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConflictGroupId(pub(crate) usize);

/// Any argument registered in an [`ArgumentParser`](crate::ArgumentParser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgRef {
    Command(CommandId),
    Named(NamedArgId),
    Positional(PositionalArgId),
}

impl From<CommandId> for ArgRef {
    fn from(id: CommandId) -> Self {
        Self::Command(id)
    }
}

impl From<NamedArgId> for ArgRef {
    fn from(id: NamedArgId) -> Self {
        Self::Named(id)
    }
}

impl From<PositionalArgId> for ArgRef {
    fn from(id: PositionalArgId) -> Self {
        Self::Positional(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Command,
    Named,
    Positional,
}

/// State shared by every argument kind.
pub struct ArgumentBase {
    id: String,
    description: String,
    long_description: String,
    pub(crate) conflict_args: Option<ConflictGroupId>,
    pub(crate) parse_count: usize,
    complete: bool,
    user_data: Option<UserData>,
}

impl ArgumentBase {
    pub(crate) fn new(id: &str) -> Result<Self> {
        if id.contains('.') {
            return Err(Error::ArgumentInvalidId { id: id.to_string() });
        }
        Ok(Self {
            id: id.to_string(),
            description: String::new(),
            long_description: String::new(),
            conflict_args: None,
            parse_count: 0,
            complete: true,
            user_data: None,
        })
    }
}

impl fmt::Debug for ArgumentBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentBase")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("conflict_args", &self.conflict_args)
            .field("parse_count", &self.parse_count)
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

/// Capabilities common to commands, named arguments and positional arguments.
pub trait Argument {
    fn base(&self) -> &ArgumentBase;
    fn base_mut(&mut self) -> &mut ArgumentBase;
    fn kind(&self) -> ArgumentKind;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn description(&self) -> &str {
        &self.base().description
    }

    fn set_description(&mut self, description: &str) {
        self.base_mut().description = description.to_string();
    }

    fn long_description(&self) -> &str {
        &self.base().long_description
    }

    fn set_long_description(&mut self, long_description: &str) {
        self.base_mut().long_description = long_description.to_string();
    }

    /// How many times the argument was matched since the last reset.
    fn parse_count(&self) -> usize {
        self.base().parse_count
    }

    fn reset_parse_count(&mut self) {
        self.base_mut().parse_count = 0;
    }

    /// Whether the argument is offered by shell completion.
    fn complete(&self) -> bool {
        self.base().complete
    }

    fn set_complete(&mut self, complete: bool) {
        self.base_mut().complete = complete;
    }

    fn conflict_arguments(&self) -> Option<ConflictGroupId> {
        self.base().conflict_args
    }

    fn user_data(&self) -> Option<&UserData> {
        self.base().user_data.as_ref()
    }

    fn set_user_data(&mut self, user_data: UserData) {
        self.base_mut().user_data = Some(user_data);
    }
}
