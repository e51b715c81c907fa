//! Integration tests for line completion

use verbum::{Args, Command, Flag, FlagConverter, Parameter, Registry, TypeSpec, Value};

fn noop(name: &str) -> Command<()> {
    Command::new(name, |_args: Args<()>| Ok(()))
}

fn registry() -> Registry<()> {
    let mut registry = Registry::new();
    registry
        .add(
            noop("give")
                .alias("g")
                .param(Parameter::positional("item", TypeSpec::literal(["sword", "shield", "potion"])))
                .param(Parameter::positional("count", TypeSpec::optional(TypeSpec::Int))),
        )
        .unwrap();
    registry
        .add(noop("admin").subcommand(noop("kick")).subcommand(noop("ban")))
        .unwrap();
    registry
        .add(
            noop("mode").param(Parameter::positional(
                "speed",
                TypeSpec::literal(["fast", "slow", "steady"]),
            )),
        )
        .unwrap();
    registry
        .add(
            noop("profile").param(Parameter::keyword(
                "flags",
                TypeSpec::custom(
                    FlagConverter::new("profile")
                        .flag(Flag::new("name", TypeSpec::Str))
                        .flag(Flag::new("mood", TypeSpec::literal(["happy", "sad"])))
                        .flag(Flag::new("nick-name", TypeSpec::optional(TypeSpec::Str))),
                ),
            )),
        )
        .unwrap();
    registry
}

#[test]
fn test_top_level_names() {
    let registry = registry();

    assert_eq!(registry.complete("").candidates, vec!["give", "admin", "mode", "profile"]);

    let completion = registry.complete("g");
    assert_eq!(completion.candidates, vec!["give", "g"]);
    assert_eq!(completion.insertion_point, 1);

    assert!(registry.complete("zz").is_empty());
}

#[test]
fn test_subcommand_names() {
    let registry = registry();

    assert_eq!(registry.complete("admin ").candidates, vec!["kick", "ban"]);

    let completion = registry.complete("admin k");
    assert_eq!(completion.candidates, vec!["kick"]);
    assert_eq!(completion.apply("admin k", "kick"), "admin kick");
}

#[test]
fn test_literal_parameters() {
    let registry = registry();

    let completion = registry.complete("mode s");
    assert_eq!(completion.candidates, vec!["slow", "steady"]);
    assert_eq!(completion.insertion_point, 1);

    assert_eq!(registry.complete("give ").candidates, vec!["sword", "shield", "potion"]);
    assert_eq!(registry.complete("g s").candidates, vec!["sword", "shield"]);

    // The count parameter has nothing to offer.
    assert!(registry.complete("give sword ").is_empty());
}

#[test]
fn test_quoted_word_is_replaced_with_its_quotes() {
    let registry = registry();

    let line = r#"mode "s""#;
    let completion = registry.complete(line);
    assert_eq!(completion.candidates, vec!["slow", "steady"]);
    assert_eq!(completion.insertion_point, 3);
    assert_eq!(completion.apply(line, "slow"), "mode slow");

    let line = "admin «k»";
    let completion = registry.complete(line);
    assert_eq!(completion.candidates, vec!["kick"]);
    assert_eq!(completion.apply(line, "kick"), "admin kick");

    // An unclosed quote is part of the word being typed.
    let line = r#"give "s"#;
    let completion = registry.complete(line);
    assert!(completion.is_empty());
    assert_eq!(completion.insertion_point, 2);
}

#[test]
fn test_flag_names_and_values() {
    let registry = registry();

    let names = registry.complete("profile --n");
    assert_eq!(names.candidates, vec!["name", "nick-name"]);
    assert_eq!(names.apply("profile --n", "nick-name"), "profile --nick-name");

    let values = registry.complete("profile --name Bob --mood h");
    assert_eq!(values.candidates, vec!["happy"]);
    assert_eq!(values.insertion_point, 1);

    assert_eq!(
        registry.complete("profile ").candidates,
        vec!["--name", "--mood", "--nick-name"]
    );
}

#[test]
fn test_completion_is_idempotent() {
    let registry = registry();

    for line in ["", "g", "admin ", "admin k", "mode s", "profile --name Bob --mood h"] {
        let first = registry.complete(line);
        let second = registry.complete(line);
        assert_eq!(first, second, "completion of {:?} changed", line);
    }

    // Completion leaves the tree usable for dispatch.
    assert_eq!(registry.process("mode fast", &()).unwrap(), Value::None);
}
