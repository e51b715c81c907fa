//! Type-directed conversion of raw tokens into [`Value`]s.
//!
//! [`convert`] and [`convert_async`] share one algorithm. They differ only in
//! how custom converters are called: the async path awaits
//! [`Converter::convert_async`], which converters may override to suspend
//! (for example to wait for a follow-up message from the user).

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::trace;

use crate::complete::Completion;
use crate::error::ConversionError;
use crate::types::TypeSpec;
use crate::value::Value;
use crate::view::StringView;
use crate::Context;

/// A type that owns its conversion logic.
///
/// A unit struct implementing this trait plays the role of a stateless
/// converter; a struct with fields carries configuration (see
/// [`FlagConverter`](crate::FlagConverter)).
#[async_trait]
pub trait Converter<C: Context>: Send + Sync {
    /// Name used in error messages and type displays.
    fn name(&self) -> &str;

    /// Convert `argument`. The view is positioned after the argument, so a
    /// converter may read further words or push the argument back.
    fn convert(&self, argument: &str, view: &mut StringView, context: &C)
        -> anyhow::Result<Value>;

    /// Suspension-capable conversion, used when an asynchronous command binds
    /// its arguments. Defaults to [`convert`](Self::convert).
    async fn convert_async(
        &self,
        argument: &str,
        view: &mut StringView,
        context: &C,
    ) -> anyhow::Result<Value> {
        self.convert(argument, view, context)
    }

    /// Completion candidates for a partially typed argument.
    fn complete(&self, fragment: &str) -> Completion {
        Completion::new(fragment, Vec::new())
    }
}

type ConvertFn<C> =
    dyn Fn(&str, &mut StringView, &C) -> anyhow::Result<Value> + Send + Sync + 'static;

/// Adapts a plain function or closure into a [`Converter`].
pub struct FnConverter<C> {
    name: String,
    func: Arc<ConvertFn<C>>,
}

impl<C: Context> FnConverter<C> {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str, &mut StringView, &C) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl<C: Context> Converter<C> for FnConverter<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn convert(
        &self,
        argument: &str,
        view: &mut StringView,
        context: &C,
    ) -> anyhow::Result<Value> {
        (self.func)(argument, view, context)
    }
}

/// Words treated as `true` and `false` by [`TypeSpec::Bool`].
const TRUTHY: [&str; 4] = ["1", "yes", "y", "true"];
const FALSY: [&str; 4] = ["0", "no", "n", "false"];

fn parse_bool(argument: &str) -> Result<Value, ConversionError> {
    let lowered = argument.to_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Ok(Value::Bool(true))
    } else if FALSY.contains(&lowered.as_str()) {
        Ok(Value::Bool(false))
    } else {
        Err(ConversionError::Bool(argument.to_string()))
    }
}

fn parse_int(argument: &str) -> Result<Value, ConversionError> {
    argument
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|e| ConversionError::Parse {
            argument: argument.to_string(),
            expected: "int",
            source: Box::new(e),
        })
}

fn parse_float(argument: &str) -> Result<Value, ConversionError> {
    argument
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| ConversionError::Parse {
            argument: argument.to_string(),
            expected: "float",
            source: Box::new(e),
        })
}

fn match_literal(argument: &str, allowed: &[String]) -> Result<Value, ConversionError> {
    if allowed.iter().any(|literal| literal == argument) {
        Ok(Value::Str(argument.to_string()))
    } else {
        Err(ConversionError::Literal {
            argument: argument.to_string(),
            allowed: allowed.to_vec(),
        })
    }
}

fn custom_error<C: Context>(
    converter: &Arc<dyn Converter<C>>,
    argument: &str,
    source: anyhow::Error,
) -> ConversionError {
    ConversionError::Custom {
        converter: converter.name().to_string(),
        argument: argument.to_string(),
        source,
    }
}

/// A sequence element that resolved to `None` hands its word back; the word
/// is spent on that element.
fn skip_pushed_back(words: &mut StringView) {
    if words.has_pending() {
        let _ = words.next_word();
    }
}

/// Convert `argument` according to `spec`.
pub fn convert<C: Context>(
    argument: &str,
    view: &mut StringView,
    spec: &TypeSpec<C>,
    context: &C,
) -> Result<Value, ConversionError> {
    match spec {
        TypeSpec::Bool => parse_bool(argument),
        TypeSpec::Union(alternatives) => {
            for alternative in alternatives {
                if let TypeSpec::None = alternative {
                    view.unread();
                    return Ok(Value::None);
                }

                match convert(argument, view, alternative, context) {
                    Ok(value) => return Ok(value),
                    Err(err) => trace!(%err, alternative = %alternative, "Union alternative rejected"),
                }
            }

            Err(ConversionError::NoAlternative {
                argument: argument.to_string(),
                expected: spec.to_string(),
            })
        }
        TypeSpec::Annotated { carrier, .. } => convert(argument, view, carrier, context),
        TypeSpec::Literal(allowed) => match_literal(argument, allowed),
        TypeSpec::Str => Ok(Value::Str(argument.to_string())),
        TypeSpec::Int => parse_int(argument),
        TypeSpec::Float => parse_float(argument),
        TypeSpec::None => {
            view.unread();
            Ok(Value::None)
        }
        TypeSpec::Custom(converter) => converter
            .convert(argument, view, context)
            .map_err(|source| custom_error(converter, argument, source)),
        TypeSpec::List(element) | TypeSpec::Tuple(element) => {
            let mut words = StringView::new(argument);
            let mut items = Vec::new();
            while let Ok(word) = words.next_word() {
                items.push(convert(&word, &mut words, element, context)?);
                skip_pushed_back(&mut words);
            }
            Ok(Value::List(items))
        }
    }
}

/// Suspension-capable counterpart of [`convert`].
pub fn convert_async<'a, C: Context>(
    argument: &'a str,
    view: &'a mut StringView,
    spec: &'a TypeSpec<C>,
    context: &'a C,
) -> BoxFuture<'a, Result<Value, ConversionError>> {
    Box::pin(async move {
        match spec {
            TypeSpec::Bool => parse_bool(argument),
            TypeSpec::Union(alternatives) => {
                for alternative in alternatives {
                    if let TypeSpec::None = alternative {
                        view.unread();
                        return Ok(Value::None);
                    }

                    match convert_async(argument, &mut *view, alternative, context).await {
                        Ok(value) => return Ok(value),
                        Err(err) => {
                            trace!(%err, alternative = %alternative, "Union alternative rejected")
                        }
                    }
                }

                Err(ConversionError::NoAlternative {
                    argument: argument.to_string(),
                    expected: spec.to_string(),
                })
            }
            TypeSpec::Annotated { carrier, .. } => {
                convert_async(argument, view, carrier, context).await
            }
            TypeSpec::Literal(allowed) => match_literal(argument, allowed),
            TypeSpec::Str => Ok(Value::Str(argument.to_string())),
            TypeSpec::Int => parse_int(argument),
            TypeSpec::Float => parse_float(argument),
            TypeSpec::None => {
                view.unread();
                Ok(Value::None)
            }
            TypeSpec::Custom(converter) => converter
                .convert_async(argument, view, context)
                .await
                .map_err(|source| custom_error(converter, argument, source)),
            TypeSpec::List(element) | TypeSpec::Tuple(element) => {
                let mut words = StringView::new(argument);
                let mut items = Vec::new();
                while let Ok(word) = words.next_word() {
                    items.push(convert_async(&word, &mut words, element, context).await?);
                    skip_pushed_back(&mut words);
                }
                Ok(Value::List(items))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    type Spec = TypeSpec<()>;

    fn run(argument: &str, spec: &Spec) -> Result<Value, ConversionError> {
        let mut view = StringView::new("");
        convert(argument, &mut view, spec, &())
    }

    #[test]
    fn test_bool_words() {
        for word in ["1", "YES", "y", "True"] {
            assert_eq!(run(word, &Spec::Bool).unwrap(), Value::Bool(true));
        }
        for word in ["0", "no", "N", "false"] {
            assert_eq!(run(word, &Spec::Bool).unwrap(), Value::Bool(false));
        }
        assert!(matches!(run("maybe", &Spec::Bool), Err(ConversionError::Bool(_))));
    }

    #[test]
    fn test_primitives() {
        assert_eq!(run("42", &Spec::Int).unwrap(), Value::Int(42));
        assert_eq!(run("-1.5", &Spec::Float).unwrap(), Value::Float(-1.5));
        assert_eq!(run("hi", &Spec::Str).unwrap(), Value::from("hi"));
        assert!(matches!(
            run("4x", &Spec::Int),
            Err(ConversionError::Parse { expected: "int", .. })
        ));
    }

    #[test]
    fn test_union_takes_first_success() {
        let spec = Spec::union([Spec::Int, Spec::Float, Spec::Str]);
        assert_eq!(run("3", &spec).unwrap(), Value::Int(3));
        assert_eq!(run("3.5", &spec).unwrap(), Value::Float(3.5));
        assert_eq!(run("x", &spec).unwrap(), Value::from("x"));

        let strict = Spec::union([Spec::Int, Spec::Bool]);
        assert!(matches!(
            run("x", &strict),
            Err(ConversionError::NoAlternative { .. })
        ));
    }

    #[test]
    fn test_union_none_pushes_token_back() {
        let mut view = StringView::new("abc next");
        let word = view.next_word().unwrap();
        let value = convert(&word, &mut view, &Spec::optional(Spec::Int), &()).unwrap();

        assert_eq!(value, Value::None);
        assert_eq!(view.next_word().unwrap(), "abc");
    }

    #[test]
    fn test_literal_and_annotated() {
        let spec = Spec::annotated(Spec::literal(["rock", "paper"]), "choice");
        assert_eq!(run("rock", &spec).unwrap(), Value::from("rock"));
        assert!(matches!(run("Rock", &spec), Err(ConversionError::Literal { .. })));
    }

    #[test]
    fn test_sequence_converts_each_word() {
        let spec = Spec::tuple(Spec::Int);
        assert_eq!(
            run("1 2 3", &spec).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_fn_converter_errors_are_wrapped() {
        let spec = Spec::custom(FnConverter::new("even", |argument: &str, _: &mut StringView, _: &()| {
            let n: i64 = argument.parse()?;
            anyhow::ensure!(n % 2 == 0, "{} is odd", n);
            Ok(Value::Int(n))
        }));

        assert_eq!(run("4", &spec).unwrap(), Value::Int(4));
        match run("3", &spec) {
            Err(ConversionError::Custom { converter, source, .. }) => {
                assert_eq!(converter, "even");
                assert_eq!(source.to_string(), "3 is odd");
            }
            other => panic!("Expected custom error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let spec = Spec::optional(Spec::union([Spec::Int, Spec::literal(["all"])]));
        for word in ["5", "all"] {
            let mut view = StringView::new("");
            let value = convert_async(word, &mut view, &spec, &()).await.unwrap();
            assert_eq!(value, run(word, &spec).unwrap());
        }

        let mut view = StringView::new("nope");
        let word = view.next_word().unwrap();
        let value = convert_async(&word, &mut view, &spec, &()).await.unwrap();
        assert_eq!(value, Value::None);
        assert!(view.has_pending());
    }
}
