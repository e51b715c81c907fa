//! The `--flag value` micro-language.
//!
//! A [`FlagConverter`] parses one remainder string such as
//! `--name Bob --age 9` into [`FlagValues`]. Each flag's value text is handed
//! back to the converter framework with the flag's own type.
//!
//! ```
//! use verbum::{FlagConverter, Flag, StringView, TypeSpec, Value, convert};
//!
//! let spec: TypeSpec<()> = TypeSpec::custom(
//!     FlagConverter::new("profile")
//!         .flag(Flag::new("name", TypeSpec::Str))
//!         .flag(Flag::new("age", TypeSpec::Int)),
//! );
//!
//! let value = convert("--name Bob --age 9", &mut StringView::new(""), &spec, &()).unwrap();
//! let flags = value.as_flags().unwrap();
//! assert_eq!(flags.get("name"), Some(&Value::from("Bob")));
//! assert_eq!(flags.get("age"), Some(&Value::Int(9)));
//! ```

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::complete::Completion;
use crate::converter::{convert, convert_async, Converter};
use crate::error::ConversionError;
use crate::types::TypeSpec;
use crate::value::{FlagValues, FromValue, Value};
use crate::view::StringView;
use crate::Context;

/// One named flag of a group.
#[derive(Clone)]
pub struct Flag<C> {
    name: String,
    spec: TypeSpec<C>,
    default: Option<Value>,
    help: String,
}

impl<C: Context> Flag<C> {
    /// A flag of type `spec`. Types that accept `None` default to `None`.
    pub fn new(name: impl Into<String>, spec: TypeSpec<C>) -> Self {
        let default = spec.accepts_none().then_some(Value::None);
        Self {
            name: name.into(),
            spec,
            default,
            help: String::new(),
        }
    }

    /// Value used when the flag does not appear.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Help text shown next to the flag.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Flag name, without the prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the flag's value.
    pub fn spec(&self) -> &TypeSpec<C> {
        &self.spec
    }

    /// Default, if the flag may be left out.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Help text, empty when none was set.
    pub fn help_text(&self) -> &str {
        &self.help
    }
}

/// Converter for a declared group of flags.
#[derive(Clone)]
pub struct FlagConverter<C> {
    name: String,
    flags: Vec<Flag<C>>,
    prefix: String,
    delimiter: String,
    /// Built on first use; cleared whenever the flags, prefix or delimiter change.
    pattern: OnceLock<Regex>,
}

/// One flag occurrence found in the input.
struct Occurrence<'a> {
    flag: usize,
    value: &'a str,
}

impl<C: Context> FlagConverter<C> {
    /// An empty group with the `--` prefix and a single-space delimiter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: Vec::new(),
            prefix: "--".to_string(),
            delimiter: " ".to_string(),
            pattern: OnceLock::new(),
        }
    }

    /// Add a flag to the group.
    pub fn flag(mut self, flag: Flag<C>) -> Self {
        self.flags.push(flag);
        self.pattern = OnceLock::new();
        self
    }

    /// Text that introduces a flag name.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.pattern = OnceLock::new();
        self
    }

    /// Text that separates a flag name from its value.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self.pattern = OnceLock::new();
        self
    }

    /// Declared flags, in declaration order.
    pub fn flags(&self) -> &[Flag<C>] {
        &self.flags
    }

    /// The flag called `name`.
    pub fn get_flag(&self, name: &str) -> Option<&Flag<C>> {
        self.flags.iter().find(|flag| flag.name == name)
    }

    /// The compiled flag pattern, built once per configuration.
    fn pattern(&self) -> Result<&Regex, regex::Error> {
        if let Some(pattern) = self.pattern.get() {
            return Ok(pattern);
        }
        let pattern = self.build_pattern()?;
        Ok(self.pattern.get_or_init(|| pattern))
    }

    /// `prefix (name|...) delimiter`, longest names first so that a name is
    /// never cut short by another name it starts with.
    fn build_pattern(&self) -> Result<Regex, regex::Error> {
        let mut names: Vec<&str> = self.flags.iter().map(|flag| flag.name.as_str()).collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        let alternatives: Vec<String> = names.into_iter().map(regex::escape).collect();

        Regex::new(&format!(
            "{}({}){}",
            regex::escape(&self.prefix),
            alternatives.join("|"),
            regex::escape(&self.delimiter)
        ))
    }

    /// Every flag occurrence in `argument`, in input order.
    fn scan<'a>(&self, argument: &'a str) -> Result<Vec<Occurrence<'a>>, regex::Error> {
        if self.flags.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = self.pattern()?;
        let found: Vec<(usize, usize, usize)> = pattern
            .captures_iter(argument)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?.as_str();
                let flag = self.flags.iter().position(|flag| flag.name == name)?;
                Some((flag, whole.start(), whole.end()))
            })
            .collect();

        Ok(found
            .iter()
            .enumerate()
            .map(|(i, &(flag, _, value_start))| {
                let value_end = found.get(i + 1).map_or(argument.len(), |next| next.1);
                Occurrence {
                    flag,
                    value: argument[value_start..value_end].trim(),
                }
            })
            .collect())
    }

    /// Fill absent flags from their defaults, in declaration order.
    fn finish(&self, mut found: Vec<Option<Value>>) -> Result<FlagValues, ConversionError> {
        let mut values = FlagValues::new();
        for (flag, slot) in self.flags.iter().zip(found.iter_mut()) {
            let value = match slot.take() {
                Some(value) => value,
                None => flag
                    .default
                    .clone()
                    .ok_or_else(|| ConversionError::MissingFlag(flag.name.clone()))?,
            };
            values.insert(flag.name.clone(), value);
        }
        Ok(values)
    }

    /// Parse `argument` into flag values.
    pub fn parse(&self, argument: &str, context: &C) -> Result<FlagValues, anyhow::Error> {
        let mut found: Vec<Option<Value>> = vec![None; self.flags.len()];

        for occurrence in self.scan(argument)? {
            let flag = &self.flags[occurrence.flag];
            let mut words = StringView::new(occurrence.value);

            let value = match &flag.spec {
                TypeSpec::List(element) => {
                    let word = words.next_word().unwrap_or_default();
                    let item = convert(&word, &mut words, element, context)?;
                    append(found[occurrence.flag].take(), item)
                }
                spec => convert(occurrence.value, &mut words, spec, context)?,
            };
            found[occurrence.flag] = Some(value);
        }

        Ok(self.finish(found)?)
    }

    /// [`parse`](Self::parse) with the suspension-capable conversions.
    pub async fn parse_async(
        &self,
        argument: &str,
        context: &C,
    ) -> Result<FlagValues, anyhow::Error> {
        let mut found: Vec<Option<Value>> = vec![None; self.flags.len()];

        for occurrence in self.scan(argument)? {
            let flag = &self.flags[occurrence.flag];
            let mut words = StringView::new(occurrence.value);

            let value = match &flag.spec {
                TypeSpec::List(element) => {
                    let word = words.next_word().unwrap_or_default();
                    let item = convert_async(&word, &mut words, element, context).await?;
                    append(found[occurrence.flag].take(), item)
                }
                spec => convert_async(occurrence.value, &mut words, spec, context).await?,
            };
            found[occurrence.flag] = Some(value);
        }

        Ok(self.finish(found)?)
    }

    /// The fragment after the last prefix: a flag name being typed, or a
    /// value being typed once the delimiter has been written.
    fn complete_fragment(&self, fragment: &str) -> Completion {
        let prefix = if self.prefix.is_empty() { " " } else { self.prefix.as_str() };

        let Some(start) = fragment.rfind(prefix) else {
            let names = self.flags.iter().map(|flag| format!("{}{}", self.prefix, flag.name));
            return Completion::filtered(fragment.trim_start(), names);
        };

        let latest = &fragment[start + prefix.len()..];
        match latest.split_once(self.delimiter.as_str()) {
            Some((name, value)) => match self.get_flag(name) {
                Some(flag) => flag.spec.complete(value),
                None => Completion::default(),
            },
            None => Completion::filtered(latest, self.flags.iter().map(|flag| flag.name.as_str())),
        }
    }
}

fn append(existing: Option<Value>, item: Value) -> Value {
    match existing {
        Some(Value::List(mut items)) => {
            items.push(item);
            Value::List(items)
        }
        _ => Value::List(vec![item]),
    }
}

#[async_trait]
impl<C: Context> Converter<C> for FlagConverter<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn convert(
        &self,
        argument: &str,
        _view: &mut StringView,
        context: &C,
    ) -> anyhow::Result<Value> {
        Ok(Value::Flags(self.parse(argument, context)?))
    }

    async fn convert_async(
        &self,
        argument: &str,
        _view: &mut StringView,
        context: &C,
    ) -> anyhow::Result<Value> {
        Ok(Value::Flags(self.parse_async(argument, context).await?))
    }

    fn complete(&self, fragment: &str) -> Completion {
        self.complete_fragment(fragment)
    }
}

/// A Rust type usable as a flag field.
pub trait FlagType: FromValue {
    fn type_spec<C: Context>() -> TypeSpec<C>;

    /// Value used when the flag is absent and no default was declared.
    fn implicit_default() -> Option<Value> {
        None
    }
}

impl FlagType for String {
    fn type_spec<C: Context>() -> TypeSpec<C> {
        TypeSpec::Str
    }
}

impl FlagType for i64 {
    fn type_spec<C: Context>() -> TypeSpec<C> {
        TypeSpec::Int
    }
}

impl FlagType for f64 {
    fn type_spec<C: Context>() -> TypeSpec<C> {
        TypeSpec::Float
    }
}

impl FlagType for bool {
    fn type_spec<C: Context>() -> TypeSpec<C> {
        TypeSpec::Bool
    }
}

impl<T: FlagType> FlagType for Option<T> {
    fn type_spec<C: Context>() -> TypeSpec<C> {
        TypeSpec::optional(T::type_spec())
    }

    fn implicit_default() -> Option<Value> {
        Some(Value::None)
    }
}

impl<T: FlagType> FlagType for Vec<T> {
    fn type_spec<C: Context>() -> TypeSpec<C> {
        TypeSpec::list(T::type_spec())
    }

    fn implicit_default() -> Option<Value> {
        Some(Value::List(Vec::new()))
    }
}

/// A struct whose fields are filled from a flag group.
///
/// Usually derived: `#[derive(FlagGroup)]` turns each named field into a flag
/// of the field's [`FlagType`].
pub trait FlagGroup: Sized {
    fn flag_converter<C: Context>() -> FlagConverter<C>;

    fn from_flags(values: &FlagValues) -> Result<Self, ConversionError>;

    /// Descriptor for a parameter taking this group.
    fn type_spec<C: Context>() -> TypeSpec<C> {
        TypeSpec::custom(Self::flag_converter::<C>())
    }
}

/// Read the flag `name` as a `T`; used by derived [`FlagGroup`] impls.
pub fn extract<T: FromValue>(values: &FlagValues, name: &str) -> Result<T, ConversionError> {
    let value = values
        .get(name)
        .ok_or_else(|| ConversionError::MissingFlag(name.to_string()))?;
    T::from_value(value).ok_or_else(|| ConversionError::UnexpectedValue {
        name: name.to_string(),
        found: value.type_name(),
    })
}
