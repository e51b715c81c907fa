//! Error types for conversion, dispatch and registration.

use thiserror::Error;

/// Boxed error carried as the cause of a failed primitive parse.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A token could not be turned into the declared type.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("'{argument}' is not a valid {expected}")]
    Parse {
        argument: String,
        expected: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("'{0}' could not be converted into a bool")]
    Bool(String),

    #[error("'{argument}' is not one of: {}", .allowed.join(", "))]
    Literal {
        argument: String,
        allowed: Vec<String>,
    },

    /// Every alternative of a union rejected the token.
    #[error("'{argument}' could not be converted into {expected}")]
    NoAlternative { argument: String, expected: String },

    /// A custom converter failed; the converter's own error is the source.
    #[error("{converter} could not convert '{argument}': {source}")]
    Custom {
        converter: String,
        argument: String,
        #[source]
        source: anyhow::Error,
    },

    /// A flag without a default was not given.
    #[error("missing value for flag '{0}'")]
    MissingFlag(String),

    /// A converted value did not have the shape a typed field expects.
    #[error("flag '{name}' holds a {found} value")]
    UnexpectedValue { name: String, found: &'static str },
}

/// Errors raised by [`Registry::process`](crate::Registry::process) and friends.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Missing required argument: {parameter}")]
    MissingRequiredArgument { parameter: String },

    #[error("Invalid value for '{parameter}': {source}")]
    Conversion {
        parameter: String,
        #[source]
        source: ConversionError,
    },

    /// An asynchronous command reached the blocking dispatch path.
    #[error("Command '{0}' is asynchronous; dispatch it with process_async")]
    RequiresAsync(String),

    /// The command callback itself failed.
    #[error(transparent)]
    Callback(anyhow::Error),
}

impl CommandError {
    /// True for failures caused by what the user typed, as opposed to
    /// callback failures and misuse of the dispatch API.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CommandError::CommandNotFound(_)
                | CommandError::MissingRequiredArgument { .. }
                | CommandError::Conversion { .. }
        )
    }

    pub(crate) fn missing(parameter: &str) -> Self {
        CommandError::MissingRequiredArgument {
            parameter: parameter.to_string(),
        }
    }

    pub(crate) fn conversion(parameter: &str, source: ConversionError) -> Self {
        CommandError::Conversion {
            parameter: parameter.to_string(),
            source,
        }
    }
}

/// Errors raised while building the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Parent command not found: {0}")]
    ParentNotFound(String),

    #[error("Name '{name}' is already used by another command at this level")]
    DuplicateName { name: String },
}
