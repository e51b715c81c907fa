//! Type descriptors for parameters and flags.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::complete::Completion;
use crate::converter::Converter;
use crate::Context;

/// The declared type of a parameter or flag.
///
/// Conversion walks the descriptor recursively until it reaches a primitive,
/// a literal set or a custom converter.
pub enum TypeSpec<C> {
    Str,
    Int,
    Float,
    /// Accepts `1/yes/y/true` and `0/no/n/false`, case-insensitively.
    Bool,
    /// The "no value" alternative of an optional type.
    None,
    /// Alternatives tried in declaration order.
    Union(Vec<TypeSpec<C>>),
    /// A closed set of accepted strings.
    Literal(Vec<String>),
    /// A carrier type with metadata that conversion ignores.
    Annotated {
        carrier: Box<TypeSpec<C>>,
        metadata: Arc<dyn Any + Send + Sync>,
    },
    /// A type that owns its conversion logic.
    Custom(Arc<dyn Converter<C>>),
    /// Accumulates one element per flag occurrence.
    List(Box<TypeSpec<C>>),
    /// Converts every word of a value.
    Tuple(Box<TypeSpec<C>>),
}

impl<C> Clone for TypeSpec<C> {
    fn clone(&self) -> Self {
        match self {
            TypeSpec::Str => TypeSpec::Str,
            TypeSpec::Int => TypeSpec::Int,
            TypeSpec::Float => TypeSpec::Float,
            TypeSpec::Bool => TypeSpec::Bool,
            TypeSpec::None => TypeSpec::None,
            TypeSpec::Union(alternatives) => TypeSpec::Union(alternatives.clone()),
            TypeSpec::Literal(allowed) => TypeSpec::Literal(allowed.clone()),
            TypeSpec::Annotated { carrier, metadata } => TypeSpec::Annotated {
                carrier: carrier.clone(),
                metadata: Arc::clone(metadata),
            },
            TypeSpec::Custom(converter) => TypeSpec::Custom(Arc::clone(converter)),
            TypeSpec::List(element) => TypeSpec::List(element.clone()),
            TypeSpec::Tuple(element) => TypeSpec::Tuple(element.clone()),
        }
    }
}

impl<C: Context> TypeSpec<C> {
    /// `inner` or nothing.
    pub fn optional(inner: TypeSpec<C>) -> Self {
        TypeSpec::Union(vec![inner, TypeSpec::None])
    }

    pub fn union(alternatives: impl IntoIterator<Item = TypeSpec<C>>) -> Self {
        TypeSpec::Union(alternatives.into_iter().collect())
    }

    pub fn literal<S: Into<String>>(allowed: impl IntoIterator<Item = S>) -> Self {
        TypeSpec::Literal(allowed.into_iter().map(Into::into).collect())
    }

    pub fn annotated<M: Any + Send + Sync>(carrier: TypeSpec<C>, metadata: M) -> Self {
        TypeSpec::Annotated {
            carrier: Box::new(carrier),
            metadata: Arc::new(metadata),
        }
    }

    pub fn custom(converter: impl Converter<C> + 'static) -> Self {
        TypeSpec::Custom(Arc::new(converter))
    }

    pub fn list(element: TypeSpec<C>) -> Self {
        TypeSpec::List(Box::new(element))
    }

    pub fn tuple(element: TypeSpec<C>) -> Self {
        TypeSpec::Tuple(Box::new(element))
    }

    /// Metadata attached by [`TypeSpec::annotated`], looked up through
    /// nested annotations.
    pub fn metadata<M: Any>(&self) -> Option<&M> {
        match self {
            TypeSpec::Annotated { carrier, metadata } => metadata
                .downcast_ref::<M>()
                .or_else(|| carrier.metadata::<M>()),
            _ => None,
        }
    }

    /// True when the descriptor can resolve to [`Value::None`](crate::Value::None),
    /// which gives parameters of this type an implicit `None` default.
    pub fn accepts_none(&self) -> bool {
        match self {
            TypeSpec::None => true,
            TypeSpec::Union(alternatives) => alternatives.iter().any(TypeSpec::accepts_none),
            TypeSpec::Annotated { carrier, .. } => carrier.accepts_none(),
            _ => false,
        }
    }

    /// Candidates for a partially typed value of this type.
    pub fn complete(&self, fragment: &str) -> Completion {
        match self {
            TypeSpec::Bool => Completion::filtered(fragment, ["true", "false"]),
            TypeSpec::Literal(allowed) => Completion::filtered(fragment, allowed),
            TypeSpec::Union(alternatives) => {
                let mut merged = Completion::new(fragment, Vec::new());
                for alternative in alternatives {
                    let completion = alternative.complete(fragment);
                    if merged.candidates.is_empty() {
                        merged.insertion_point = completion.insertion_point;
                    }
                    for candidate in completion.candidates {
                        if !merged.candidates.contains(&candidate) {
                            merged.candidates.push(candidate);
                        }
                    }
                }
                merged
            }
            TypeSpec::Annotated { carrier, .. } => carrier.complete(fragment),
            TypeSpec::Custom(converter) => converter.complete(fragment),
            TypeSpec::List(element) | TypeSpec::Tuple(element) => element.complete(fragment),
            TypeSpec::Str | TypeSpec::Int | TypeSpec::Float | TypeSpec::None => {
                Completion::new(fragment, Vec::new())
            }
        }
    }
}

impl<C: Context> fmt::Display for TypeSpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Str => write!(f, "str"),
            TypeSpec::Int => write!(f, "int"),
            TypeSpec::Float => write!(f, "float"),
            TypeSpec::Bool => write!(f, "bool"),
            TypeSpec::None => write!(f, "none"),
            TypeSpec::Union(alternatives) => {
                let parts: Vec<String> = alternatives.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" | "))
            }
            TypeSpec::Literal(allowed) => write!(f, "one of ({})", allowed.join(", ")),
            TypeSpec::Annotated { carrier, .. } => write!(f, "{}", carrier),
            TypeSpec::Custom(converter) => write!(f, "{}", converter.name()),
            TypeSpec::List(element) => write!(f, "list[{}]", element),
            TypeSpec::Tuple(element) => write!(f, "tuple[{}]", element),
        }
    }
}

impl<C: Context> fmt::Debug for TypeSpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeSpec({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Spec = TypeSpec<()>;

    #[test]
    fn test_accepts_none() {
        assert!(Spec::optional(Spec::Int).accepts_none());
        assert!(Spec::annotated(Spec::optional(Spec::Str), "doc").accepts_none());
        assert!(!Spec::union([Spec::Int, Spec::Float]).accepts_none());
        assert!(!Spec::Int.accepts_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Spec::optional(Spec::Int).to_string(), "int | none");
        assert_eq!(Spec::list(Spec::Str).to_string(), "list[str]");
        assert_eq!(Spec::literal(["a", "b"]).to_string(), "one of (a, b)");
    }

    #[test]
    fn test_metadata_lookup() {
        let spec = Spec::annotated(Spec::annotated(Spec::Int, 7u32), "range");
        assert_eq!(spec.metadata::<&str>(), Some(&"range"));
        assert_eq!(spec.metadata::<u32>(), Some(&7));
        assert_eq!(spec.metadata::<i8>(), None);
    }

    #[test]
    fn test_literal_completion() {
        let spec = Spec::literal(["north", "south", "nowhere"]);
        let completion = spec.complete("no");
        assert_eq!(completion.candidates, vec!["north", "nowhere"]);
        assert_eq!(completion.insertion_point, 2);
    }

    #[test]
    fn test_union_completion_merges_without_duplicates() {
        let spec = Spec::union([Spec::literal(["on", "off"]), Spec::Bool, Spec::literal(["on"])]);
        assert_eq!(spec.complete("").candidates, vec!["on", "off", "true", "false"]);
    }
}
