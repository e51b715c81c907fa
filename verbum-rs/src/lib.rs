//! # verbum: text-command parsing and dispatch
//!
//! Turns lines such as `give sword 3` or `say "hello there"` into typed calls
//! on registered command callbacks, for chat bots and in-game consoles.
//!
//! ## Core Principles
//!
//! - **Declared types drive parsing**: every parameter carries a [`TypeSpec`]
//!   and words are converted before the callback runs
//! - **Trees, not strings**: subcommands are children of their parent command
//! - **Two dispatch paths**: [`Registry::process`] for blocking callbacks,
//!   [`Registry::process_async`] for callbacks that suspend
//! - **Completion from the same tree**: [`Registry::complete`] walks the
//!   commands exactly like dispatch does
//!
//! ## Quick Start
//!
//! ```
//! use verbum::{Command, CommandError, Parameter, Registry, TypeSpec, Value};
//!
//! let mut registry: Registry<()> = Registry::new();
//! registry
//!     .add(
//!         Command::new("give", |args| {
//!             let item = args.require("item")?.to_string();
//!             let count = args.get("count").and_then(Value::as_int).unwrap_or(1);
//!             Ok(format!("{count} x {item}"))
//!         })
//!         .alias("g")
//!         .param(Parameter::positional("item", TypeSpec::Str))
//!         .param(Parameter::positional("count", TypeSpec::optional(TypeSpec::Int))),
//!     )
//!     .unwrap();
//!
//! assert_eq!(registry.process("g sword 3", &()).unwrap(), Value::from("3 x sword"));
//! assert_eq!(registry.process("give shield", &()).unwrap(), Value::from("1 x shield"));
//! assert!(matches!(
//!     registry.process("take sword", &()),
//!     Err(CommandError::CommandNotFound(name)) if name == "take"
//! ));
//! ```

// Lets derived code name `::verbum` from inside this crate's own tests.
extern crate self as verbum;

// Re-export the derive macro
pub use verbum_macros::FlagGroup;

pub mod color;
pub mod command;
pub mod complete;
pub mod converter;
pub mod error;
pub mod flags;
pub mod parameter;
pub mod registry;
pub mod tracing_support;
pub mod types;
pub mod value;
pub mod view;

// Re-export tracing itself (required for #[instrument] macro)
#[cfg(feature = "tracing")]
pub use tracing_support::tracing;

// Re-export commonly used items
#[cfg(feature = "tracing")]
pub use tracing_support::{
    debug, error, info, init_subscriber, init_subscriber_with_config, instrument, trace, warn,
    TracingConfig, TracingFormat,
};

pub use color::{Color, ColorConverter, ColorParseError};
pub use command::{Args, Callback, Command, CommandId};
pub use complete::Completion;
pub use converter::{convert, convert_async, Converter, FnConverter};
pub use error::{CommandError, ConversionError, RegistrationError};
pub use flags::{Flag, FlagConverter, FlagGroup, FlagType};
pub use parameter::{ParamKind, Parameter};
pub use registry::{DuplicatePolicy, Registry, RegistryConfig};
pub use types::TypeSpec;
pub use value::{FlagValues, FromValue, Value};
pub use view::{Exhausted, StringView};

/// Host data handed to conversions and callbacks.
///
/// Dispatch passes it by reference and never looks inside. Commands built
/// with [`Command::pass_context`] receive a clone through [`Args::context`].
/// Implemented for every `Clone + Send + Sync + 'static` type; use `()` when
/// there is nothing to pass.
pub trait Context: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Context for T {}
