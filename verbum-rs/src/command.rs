//! Command tree nodes and the resolve → bind → invoke pipeline.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, trace};

use crate::converter::{convert, convert_async};
use crate::error::CommandError;
use crate::flags::FlagGroup;
use crate::parameter::{ParamKind, Parameter};
use crate::value::Value;
use crate::view::StringView;
use crate::Context;

/// Identity of a [`Command`], issued by the [`Registry`](crate::Registry)
/// it is added to. Unique within that registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl CommandId {
    /// Carried by commands that have not been added to a registry yet.
    pub const UNREGISTERED: CommandId = CommandId(0);
}

/// Arguments bound for one invocation.
#[derive(Debug)]
pub struct Args<C> {
    context: Option<C>,
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl<C> Args<C> {
    fn new(context: Option<C>) -> Self {
        Self {
            context,
            positional: Vec::new(),
            named: Vec::new(),
        }
    }

    /// The execution context, present when the command was built with
    /// [`Command::pass_context`].
    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    /// Positional and variadic values in input order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Value bound to the parameter called `name`. Variadic parameters bind
    /// a [`Value::List`].
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// Like [`get`](Self::get), for callbacks that propagate with `?`.
    pub fn require(&self, name: &str) -> anyhow::Result<&Value> {
        self.get(name)
            .ok_or_else(|| anyhow::anyhow!("no argument named '{}'", name))
    }

    /// Build a typed flag group out of the parameter called `name`.
    pub fn flags<T: FlagGroup>(&self, name: &str) -> anyhow::Result<T> {
        let flags = self
            .require(name)?
            .as_flags()
            .ok_or_else(|| anyhow::anyhow!("argument '{}' is not a flag group", name))?;
        Ok(T::from_flags(flags)?)
    }

    fn push_positional(&mut self, name: &str, value: Value) {
        self.positional.push(value.clone());
        self.named.push((name.to_string(), value));
    }

    fn push_variadic(&mut self, name: &str, values: Vec<Value>) {
        self.positional.extend(values.iter().cloned());
        self.named.push((name.to_string(), Value::List(values)));
    }

    fn push_keyword(&mut self, name: &str, value: Value) {
        self.named.push((name.to_string(), value));
    }
}

type SyncHandler<C> = dyn Fn(Args<C>) -> anyhow::Result<Value> + Send + Sync;
type AsyncHandler<C> = dyn Fn(Args<C>) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync;

/// The callback of a command. Which variant a command has is decided when it
/// is built and never re-checked.
pub enum Callback<C> {
    Sync(Arc<SyncHandler<C>>),
    Async(Arc<AsyncHandler<C>>),
}

impl<C> Callback<C> {
    pub fn is_async(&self) -> bool {
        matches!(self, Callback::Async(_))
    }
}

/// A node of the command tree.
pub struct Command<C> {
    id: CommandId,
    names: Vec<String>,
    description: String,
    usage: String,
    parameters: Vec<Parameter<C>>,
    children: Vec<Command<C>>,
    callback: Callback<C>,
    pass_context: bool,
}

impl<C: Context> Command<C> {
    fn with_callback(name: impl Into<String>, callback: Callback<C>) -> Self {
        Self {
            id: CommandId::UNREGISTERED,
            names: vec![name.into()],
            description: String::new(),
            usage: String::new(),
            parameters: Vec::new(),
            children: Vec::new(),
            callback,
            pass_context: false,
        }
    }

    /// A command with a blocking callback.
    ///
    /// ```
    /// use verbum::{Command, Parameter, TypeSpec, Value};
    ///
    /// let add: Command<()> = Command::new("add", |args| {
    ///     let sum: i64 = args.positional().iter().filter_map(Value::as_int).sum();
    ///     Ok(sum)
    /// })
    /// .param(Parameter::variadic("numbers", TypeSpec::Int));
    /// assert_eq!(add.name(), "add");
    /// ```
    pub fn new<F, R>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Args<C>) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Value>,
    {
        let handler = move |args: Args<C>| callback(args).map(Into::into);
        Self::with_callback(name, Callback::Sync(Arc::new(handler)))
    }

    /// A command whose callback returns a future, for callbacks that need to
    /// suspend. Dispatch it with [`Registry::process_async`](crate::Registry::process_async).
    pub fn new_async<F, Fut, R>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Args<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Value> + 'static,
    {
        let handler = move |args: Args<C>| -> BoxFuture<'static, anyhow::Result<Value>> {
            let fut = callback(args);
            Box::pin(async move { fut.await.map(Into::into) })
        };
        Self::with_callback(name, Callback::Async(Arc::new(handler)))
    }

    /// Add another name the command answers to.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.names.push(alias.into());
        self
    }

    /// Add several aliases at once.
    pub fn aliases<S: Into<String>>(mut self, aliases: impl IntoIterator<Item = S>) -> Self {
        self.names.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// One-line description for help listings.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Override the generated usage line.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Append a parameter; binding follows declaration order.
    pub fn param(mut self, parameter: Parameter<C>) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Hand the execution context to the callback through [`Args::context`].
    pub fn pass_context(mut self) -> Self {
        self.pass_context = true;
        self
    }

    /// Attach a child command.
    pub fn subcommand(mut self, child: Command<C>) -> Self {
        self.children.push(child);
        self
    }

    /// Identity given by the owning registry, [`CommandId::UNREGISTERED`]
    /// before registration.
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Number this command and its subtree from `next` onwards.
    pub(crate) fn assign_ids(&mut self, next: &mut u64) {
        self.id = CommandId(*next);
        *next += 1;
        for child in &mut self.children {
            child.assign_ids(next);
        }
    }

    /// Primary name.
    pub fn name(&self) -> &str {
        &self.names[0]
    }

    /// Primary name followed by aliases.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn about(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[Parameter<C>] {
        &self.parameters
    }

    /// Subcommands in registration order.
    pub fn children(&self) -> &[Command<C>] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Command<C>> {
        &mut self.children
    }

    pub fn callback(&self) -> &Callback<C> {
        &self.callback
    }

    pub fn is_async(&self) -> bool {
        self.callback.is_async()
    }

    pub fn passes_context(&self) -> bool {
        self.pass_context
    }

    /// Exact, case-sensitive match against the name or an alias.
    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    /// First child answering to `name`.
    pub fn find_child(&self, name: &str) -> Option<&Command<C>> {
        self.children.iter().find(|child| child.matches(name))
    }

    /// The usage line: the explicit one if set, otherwise generated from the
    /// parameters.
    pub fn signature(&self) -> String {
        if !self.usage.is_empty() {
            return self.usage.clone();
        }

        let mut parts = vec![self.name().to_string()];
        if !self.children.is_empty() {
            let names: Vec<&str> = self.children.iter().map(Command::name).collect();
            parts.push(format!("[{}]", names.join("|")));
        }
        parts.extend(self.parameters.iter().map(Parameter::usage));
        parts.join(" ")
    }

    /// Descend through children named by the next words of `view`. The first
    /// word that names no child is pushed back for parameter binding.
    pub fn resolve(&self, view: &mut StringView) -> &Command<C> {
        let mut current = self;
        while !current.children.is_empty() && !view.is_exhausted() {
            let Ok(word) = view.next_word() else {
                break;
            };

            match current.find_child(&word) {
                Some(child) => {
                    trace!(parent = current.name(), child = child.name(), "Descending into subcommand");
                    current = child;
                }
                None => {
                    view.unread();
                    break;
                }
            }
        }
        current
    }

    /// Bind the rest of `view` to this command's parameters.
    pub fn bind(&self, view: &mut StringView, context: &C) -> Result<Args<C>, CommandError> {
        let mut args = Args::new(self.pass_context.then(|| context.clone()));

        for param in &self.parameters {
            let name = param.name();
            match param.kind() {
                ParamKind::Positional => {
                    let value = match view.next_word() {
                        Ok(word) => convert(&word, view, param.spec(), context)
                            .map_err(|source| CommandError::conversion(name, source))?,
                        Err(_) => fallback(param)?,
                    };
                    args.push_positional(name, value);
                }
                ParamKind::Variadic => {
                    let mut values = Vec::new();
                    while !view.is_exhausted() {
                        let Ok(word) = view.next_word() else {
                            break;
                        };
                        let value = convert(&word, view, param.spec(), context)
                            .map_err(|source| CommandError::conversion(name, source))?;
                        if view.has_pending() {
                            break;
                        }
                        values.push(value);
                    }
                    args.push_variadic(name, values);
                }
                ParamKind::KeywordOnly => {
                    let rest = view.remainder();
                    let value = if rest.is_empty() {
                        fallback(param)?
                    } else {
                        convert(&rest, view, param.spec(), context)
                            .map_err(|source| CommandError::conversion(name, source))?
                    };
                    args.push_keyword(name, value);
                }
            }
        }

        Ok(args)
    }

    /// [`bind`](Self::bind), converting through [`convert_async`].
    pub async fn bind_async(
        &self,
        view: &mut StringView,
        context: &C,
    ) -> Result<Args<C>, CommandError> {
        let mut args = Args::new(self.pass_context.then(|| context.clone()));

        for param in &self.parameters {
            let name = param.name();
            match param.kind() {
                ParamKind::Positional => {
                    let value = match view.next_word() {
                        Ok(word) => convert_async(&word, view, param.spec(), context)
                            .await
                            .map_err(|source| CommandError::conversion(name, source))?,
                        Err(_) => fallback(param)?,
                    };
                    args.push_positional(name, value);
                }
                ParamKind::Variadic => {
                    let mut values = Vec::new();
                    while !view.is_exhausted() {
                        let Ok(word) = view.next_word() else {
                            break;
                        };
                        let value = convert_async(&word, view, param.spec(), context)
                            .await
                            .map_err(|source| CommandError::conversion(name, source))?;
                        if view.has_pending() {
                            break;
                        }
                        values.push(value);
                    }
                    args.push_variadic(name, values);
                }
                ParamKind::KeywordOnly => {
                    let rest = view.remainder();
                    let value = if rest.is_empty() {
                        fallback(param)?
                    } else {
                        convert_async(&rest, view, param.spec(), context)
                            .await
                            .map_err(|source| CommandError::conversion(name, source))?
                    };
                    args.push_keyword(name, value);
                }
            }
        }

        Ok(args)
    }

    /// Resolve, bind and invoke on the blocking path.
    pub fn execute(&self, view: &mut StringView, context: &C) -> Result<Value, CommandError> {
        let command = self.resolve(view);
        let Callback::Sync(handler) = &command.callback else {
            return Err(CommandError::RequiresAsync(command.name().to_string()));
        };

        let args = command.bind(view, context)?;
        debug!(command = command.name(), args = args.positional.len(), "Invoking command");
        handler(args).map_err(CommandError::Callback)
    }

    /// Resolve, bind and invoke on the suspension-capable path. Blocking
    /// commands run inline.
    pub async fn execute_async(
        &self,
        view: &mut StringView,
        context: &C,
    ) -> Result<Value, CommandError> {
        let command = self.resolve(view);
        match &command.callback {
            Callback::Sync(handler) => {
                let args = command.bind(view, context)?;
                debug!(command = command.name(), args = args.positional.len(), "Invoking command");
                handler(args).map_err(CommandError::Callback)
            }
            Callback::Async(handler) => {
                let args = command.bind_async(view, context).await?;
                debug!(command = command.name(), args = args.positional.len(), "Awaiting command");
                handler(args).await.map_err(CommandError::Callback)
            }
        }
    }
}

/// Default of a parameter whose input ran out.
fn fallback<C: Context>(param: &Parameter<C>) -> Result<Value, CommandError> {
    param
        .default_value()
        .cloned()
        .ok_or_else(|| CommandError::missing(param.name()))
}

impl<C: Context> std::fmt::Debug for Command<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("names", &self.names)
            .field("parameters", &self.parameters)
            .field("children", &self.children)
            .field("async", &self.is_async())
            .finish()
    }
}
