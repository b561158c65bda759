use std::fmt;

use thiserror::Error;

/// Maximum nesting of attached named arguments before parsing gives up.
pub const MAX_ATTACHED_DEPTH: usize = 32;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The already parsed argument that blocks the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictingArg {
    /// Named argument, rendered as `--long/-s`.
    Named(String),
    Positional(String),
    Command(String),
}

impl fmt::Display for ConflictingArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(names) => write!(f, "together with named argument \"{names}\""),
            Self::Positional(id) => write!(f, "together with positional argument \"{id}\""),
            Self::Command(id) => write!(f, "in command \"{id}\""),
        }
    }
}

/// Every failure the parser reports, both while building the argument tree
/// and while parsing a command line.
#[derive(Debug, Error)]
pub enum Error {
    #[error("\"{argument}\" not allowed {conflicting}")]
    ConflictingArguments {
        argument: String,
        conflicting: ConflictingArg,
    },

    #[error("Missing command for \"{command}\"")]
    MissingCommand { command: String },

    #[error("Missing positional argument \"{argument}\" for command \"{command}\"")]
    MissingPositionalArgument { argument: String, command: String },

    #[error("Not enough values for positional argument \"{argument}\"")]
    PositionalArgumentFewValues { argument: String },

    #[error("Missing value for named argument \"{option}\"")]
    NamedArgMissingValue { option: String },

    #[error("Unexpected value for named argument \"{option}\"")]
    NamedArgValueNotExpected { option: String },

    #[error("Unknown argument \"{argument}\" for command \"{command}\"")]
    UnknownArgument { command: String, argument: String },

    #[error("{kind} id \"{id}\" already registered for command \"{command}\"")]
    IdAlreadyRegistered {
        kind: &'static str,
        id: String,
        command: String,
    },

    #[error("Argument id \"{id}\" already registered in group \"{group}\"")]
    GroupArgumentIdRegistered { id: String, group: String },

    #[error("Invalid character '.' in argument id \"{id}\"")]
    ArgumentInvalidId { id: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid value for argument \"{argument}\": {reason}")]
    InvalidValue { argument: String, reason: String },

    #[error("{0}")]
    MissingDependentArgument(String),

    #[error(
        "Attached named arguments of \"{argument}\" are nested deeper than {} levels",
        MAX_ATTACHED_DEPTH
    )]
    AttachedArgumentsTooDeep { argument: String },

    #[error("Root command is not set")]
    RootCommandNotSet,

    #[error("Invalid positional argument \"{argument}\": {reason}")]
    InvalidPositionalArgument {
        argument: String,
        reason: &'static str,
    },
}

impl Error {
    /// Stable name of the error kind, used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConflictingArguments { .. } => "ConflictingArguments",
            Self::MissingCommand { .. } => "MissingCommand",
            Self::MissingPositionalArgument { .. } => "MissingPositionalArgument",
            Self::PositionalArgumentFewValues { .. } => "PositionalArgumentFewValues",
            Self::NamedArgMissingValue { .. } => "NamedArgMissingValue",
            Self::NamedArgValueNotExpected { .. } => "NamedArgValueNotExpected",
            Self::UnknownArgument { .. } => "UnknownArgument",
            Self::IdAlreadyRegistered { .. } => "IdAlreadyRegistered",
            Self::GroupArgumentIdRegistered { .. } => "GroupArgumentIdRegistered",
            Self::ArgumentInvalidId { .. } => "ArgumentInvalidId",
            Self::NotFound(_) => "NotFound",
            Self::InvalidValue { .. } => "InvalidValue",
            Self::MissingDependentArgument(_) => "MissingDependentArgument",
            Self::AttachedArgumentsTooDeep { .. } => "AttachedArgumentsTooDeep",
            Self::RootCommandNotSet => "RootCommandNotSet",
            Self::InvalidPositionalArgument { .. } => "InvalidPositionalArgument",
        }
    }

    /// Whether the error was caused by the user's command line rather than
    /// by the way the argument tree was built.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::ConflictingArguments { .. }
                | Self::MissingCommand { .. }
                | Self::MissingPositionalArgument { .. }
                | Self::PositionalArgumentFewValues { .. }
                | Self::NamedArgMissingValue { .. }
                | Self::NamedArgValueNotExpected { .. }
                | Self::UnknownArgument { .. }
                | Self::InvalidValue { .. }
                | Self::MissingDependentArgument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_messages_depend_on_the_conflicting_kind() {
        let named = Error::ConflictingArguments {
            argument: "--info".to_string(),
            conflicting: ConflictingArg::Named("--nevra".to_string()),
        };
        assert_eq!(
            named.to_string(),
            "\"--info\" not allowed together with named argument \"--nevra\""
        );

        let command = Error::ConflictingArguments {
            argument: "--info".to_string(),
            conflicting: ConflictingArg::Command("repoquery".to_string()),
        };
        assert_eq!(
            command.to_string(),
            "\"--info\" not allowed in command \"repoquery\""
        );

        let positional = Error::ConflictingArguments {
            argument: "pkg".to_string(),
            conflicting: ConflictingArg::Positional("keys".to_string()),
        };
        assert_eq!(
            positional.to_string(),
            "\"pkg\" not allowed together with positional argument \"keys\""
        );
    }

    #[test]
    fn usage_errors_are_distinguished_from_definition_errors() {
        let unknown = Error::UnknownArgument {
            command: "dnf5".to_string(),
            argument: "--bogus".to_string(),
        };
        assert!(unknown.is_usage_error());
        assert_eq!(unknown.name(), "UnknownArgument");
        assert!(!Error::RootCommandNotSet.is_usage_error());
        assert!(
            !Error::ArgumentInvalidId {
                id: "a.b".to_string()
            }
            .is_usage_error()
        );
    }
}
