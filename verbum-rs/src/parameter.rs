//! Formal parameters of a command.

use crate::complete::Completion;
use crate::types::TypeSpec;
use crate::value::Value;
use crate::Context;

/// How a parameter takes its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// One word.
    Positional,
    /// Every remaining word, collected into a list.
    ///
    /// The run ends at the first word a conversion pushes back, such as the
    /// `None` alternative of a union. That word and everything after it go
    /// to the following parameters, or are ignored when there are none.
    Variadic,
    /// The whole remainder of the line as one string.
    KeywordOnly,
}

/// One declared argument of a command: name, kind, type and default.
#[derive(Clone)]
pub struct Parameter<C> {
    name: String,
    kind: ParamKind,
    spec: TypeSpec<C>,
    default: Option<Value>,
    help: String,
}

impl<C: Context> Parameter<C> {
    /// A parameter of the given kind. Types that accept `None` start with a
    /// `None` default, which makes the parameter optional.
    pub fn new(name: impl Into<String>, kind: ParamKind, spec: TypeSpec<C>) -> Self {
        let default = spec.accepts_none().then_some(Value::None);
        Self {
            name: name.into(),
            kind,
            spec,
            default,
            help: String::new(),
        }
    }

    /// A parameter taking one word.
    pub fn positional(name: impl Into<String>, spec: TypeSpec<C>) -> Self {
        Self::new(name, ParamKind::Positional, spec)
    }

    /// A parameter collecting the remaining words into a list.
    pub fn variadic(name: impl Into<String>, spec: TypeSpec<C>) -> Self {
        Self::new(name, ParamKind::Variadic, spec)
    }

    /// A parameter taking the rest of the line as one string.
    pub fn keyword(name: impl Into<String>, spec: TypeSpec<C>) -> Self {
        Self::new(name, ParamKind::KeywordOnly, spec)
    }

    /// Value used when the input runs out before this parameter.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Help text shown next to the parameter.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Name the bound value is stored under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the parameter takes its input.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Declared type.
    pub fn spec(&self) -> &TypeSpec<C> {
        &self.spec
    }

    /// Default, explicit or implied by a type that accepts `None`.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Help text, empty when none was set.
    pub fn help_text(&self) -> &str {
        &self.help
    }

    /// A parameter is required when it has no default. Variadic parameters
    /// accept zero values and are never required.
    pub fn is_required(&self) -> bool {
        self.kind != ParamKind::Variadic && self.default.is_none()
    }

    /// Candidates for a word being typed into this parameter.
    pub fn complete(&self, fragment: &str) -> Completion {
        self.spec.complete(fragment)
    }

    /// Usage form: `<name>` when required, `[name]` otherwise, with `...`
    /// for parameters that take several words.
    pub fn usage(&self) -> String {
        let dots = match self.kind {
            ParamKind::Positional => "",
            ParamKind::Variadic | ParamKind::KeywordOnly => "...",
        };
        if self.is_required() {
            format!("<{}{}>", self.name, dots)
        } else {
            format!("[{}{}]", self.name, dots)
        }
    }
}

impl<C: Context> std::fmt::Debug for Parameter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("spec", &self.spec)
            .field("default", &self.default)
            .finish()
    }
}
