//! Integration tests for flag groups on commands

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use verbum::{
    Args, Command, CommandError, ConversionError, Flag, FlagConverter, FlagGroup, Parameter,
    Registry, TypeSpec, Value,
};

#[derive(Debug, PartialEq, FlagGroup)]
struct Profile {
    name: String,

    #[flag(default = 18, help = "Age in years")]
    age: i64,

    #[flag(name = "nick-name")]
    nick: Option<String>,

    tags: Vec<String>,
}

#[derive(Debug, PartialEq, FlagGroup)]
#[flags(prefix = "/", delimiter = "=")]
struct Search {
    query: String,

    #[flag(default = false)]
    exact: bool,
}

fn profile_registry(calls: Arc<AtomicUsize>) -> Registry<()> {
    let mut registry = Registry::new();
    registry
        .add(
            Command::new("profile", move |args: Args<()>| {
                calls.fetch_add(1, Ordering::SeqCst);
                let profile: Profile = args.flags("flags")?;
                Ok(format!("{} ({})", profile.name, profile.age))
            })
            .param(Parameter::keyword("flags", Profile::type_spec())),
        )
        .unwrap();
    registry
}

#[test]
fn test_flags_by_hand() {
    let mut registry = Registry::new();
    let flags = FlagConverter::new("person")
        .flag(Flag::new("name", TypeSpec::Str))
        .flag(Flag::new("age", TypeSpec::Int));
    registry
        .add(
            Command::new("person", |args: Args<()>| Ok(args.require("flags")?.clone()))
                .param(Parameter::keyword("flags", TypeSpec::custom(flags))),
        )
        .unwrap();

    let value = registry.process("person --name Bob --age 9", &()).unwrap();
    let flags = value.as_flags().unwrap();
    assert_eq!(flags.get("name"), Some(&Value::from("Bob")));
    assert_eq!(flags.get("age"), Some(&Value::Int(9)));
}

#[test]
fn test_derived_group_fills_defaults() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = profile_registry(calls.clone());

    assert_eq!(
        registry.process("profile --name Bob --age 9", &()).unwrap(),
        Value::from("Bob (9)")
    );
    assert_eq!(
        registry.process("profile --name Ann Lee", &()).unwrap(),
        Value::from("Ann Lee (18)")
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_missing_flag_fails_before_invocation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = profile_registry(calls.clone());

    match registry.process("profile --age 9", &()) {
        Err(CommandError::Conversion { parameter, source }) => {
            assert_eq!(parameter, "flags");
            let ConversionError::Custom { source, .. } = source else {
                panic!("Expected the flag converter to fail");
            };
            assert!(matches!(
                source.downcast_ref::<ConversionError>(),
                Some(ConversionError::MissingFlag(name)) if name == "name"
            ));
        }
        other => panic!("Expected conversion error, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_derived_group_builds_struct() {
    let converter = Profile::flag_converter::<()>();
    let values = converter
        .parse("--tags red --nick-name Bobby --name Bob --tags blue", &())
        .unwrap();

    assert_eq!(
        Profile::from_flags(&values).unwrap(),
        Profile {
            name: "Bob".into(),
            age: 18,
            nick: Some("Bobby".into()),
            tags: vec!["red".into(), "blue".into()],
        }
    );

    let empty = converter.parse("--name Bob", &()).unwrap();
    let profile = Profile::from_flags(&empty).unwrap();
    assert_eq!(profile.nick, None);
    assert!(profile.tags.is_empty());
}

#[test]
fn test_derived_group_attributes() {
    let converter = Search::flag_converter::<()>();
    assert_eq!(converter.get_flag("exact").unwrap().default_value(), Some(&Value::Bool(false)));
    assert_eq!(
        Profile::flag_converter::<()>().get_flag("age").unwrap().help_text(),
        "Age in years"
    );

    let values = converter.parse("/query=rust lang /exact=yes", &()).unwrap();
    assert_eq!(
        Search::from_flags(&values).unwrap(),
        Search {
            query: "rust lang".into(),
            exact: true,
        }
    );
}

#[test]
fn test_wrong_value_shape() {
    let mut values = verbum::FlagValues::new();
    values.insert("query", Value::Int(3));
    values.insert("exact", Value::Bool(false));

    assert!(matches!(
        Search::from_flags(&values),
        Err(ConversionError::UnexpectedValue { name, found: "int" }) if name == "query"
    ));
}

#[tokio::test]
async fn test_flags_on_async_path() {
    let mut registry = Registry::new();
    registry
        .add(
            Command::new_async("search", |args: Args<()>| async move {
                let search: Search = args.flags("flags")?;
                anyhow::Ok(search.query)
            })
            .param(Parameter::keyword("flags", Search::type_spec())),
        )
        .unwrap();

    assert_eq!(
        registry.process_async("search /query=ferris", &()).await.unwrap(),
        Value::from("ferris")
    );
}
