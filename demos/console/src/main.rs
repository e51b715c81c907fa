//! In-game console built on verbum
//!
//! Reads one command per line from stdin and dispatches it against a small
//! game state. A line ending in `?` prints completions for the text before it
//! instead of running it.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=verbum=debug cargo run
//! > give sword 2
//! > g potion
//! > inventory
//! > say "hello there"
//! > paint #ff8800
//! > profile --name Ferris --tags crab --tags rust
//! > admin k?
//! > roll 3
//! > help
//! ```

use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use verbum::{
    info, Args, Color, ColorConverter, Command, CommandError, FlagGroup, Parameter, Registry,
    TypeSpec, Value,
};

/// Shared game state handed to commands that ask for it.
#[derive(Clone, Default)]
struct Game {
    inventory: Arc<Mutex<Vec<(String, i64)>>>,
}

#[derive(Debug, FlagGroup)]
struct Profile {
    #[flag(help = "Display name")]
    name: String,

    #[flag(default = 1)]
    level: i64,

    tags: Vec<String>,
}

fn build_registry() -> Result<Registry<Game>, verbum::RegistrationError> {
    let mut registry = Registry::new();

    registry.add(
        Command::new("give", |args: Args<Game>| {
            let item = args.require("item")?.to_string();
            let count = args.get("count").and_then(Value::as_int).unwrap_or(1);
            if let Some(game) = args.context() {
                game.inventory
                    .lock()
                    .map_err(|_| anyhow::anyhow!("inventory lock poisoned"))?
                    .push((item.clone(), count));
            }
            Ok(format!("Gave {} x {}", count, item))
        })
        .alias("g")
        .description("Put items into the inventory")
        .pass_context()
        .param(Parameter::positional(
            "item",
            TypeSpec::literal(["sword", "shield", "potion", "map"]),
        ))
        .param(Parameter::positional("count", TypeSpec::optional(TypeSpec::Int))),
    )?;

    registry.add(
        Command::new("inventory", |args: Args<Game>| {
            let Some(game) = args.context() else {
                return Ok(String::new());
            };
            let inventory = game
                .inventory
                .lock()
                .map_err(|_| anyhow::anyhow!("inventory lock poisoned"))?;
            let lines: Vec<String> = inventory
                .iter()
                .map(|(item, count)| format!("{:>4} {}", count, item))
                .collect();
            Ok(lines.join("\n"))
        })
        .alias("inv")
        .description("List the inventory")
        .pass_context(),
    )?;

    registry.add(
        Command::new("say", |args: Args<Game>| Ok(args.require("text")?.clone()))
            .description("Echo a message")
            .param(Parameter::keyword("text", TypeSpec::Str)),
    )?;

    registry.add(
        Command::new("paint", |args: Args<Game>| {
            let color = args
                .require("color")?
                .downcast_ref::<Color>()
                .copied()
                .ok_or_else(|| anyhow::anyhow!("not a colour"))?;
            Ok(format!("Painted {} (alpha {})", color, color.a))
        })
        .description("Paint the walls")
        .param(Parameter::positional("color", TypeSpec::custom(ColorConverter))),
    )?;

    registry.add(
        Command::new("profile", |args: Args<Game>| {
            let profile: Profile = args.flags("flags")?;
            Ok(format!(
                "{} (level {}) [{}]",
                profile.name,
                profile.level,
                profile.tags.join(", ")
            ))
        })
        .description("Show a character sheet")
        .param(Parameter::keyword("flags", Profile::type_spec())),
    )?;

    registry.add(
        Command::new_async("roll", |args: Args<Game>| async move {
            let dice = args.get("dice").and_then(Value::as_int).unwrap_or(1);
            tokio::time::sleep(Duration::from_millis(200)).await;
            anyhow::Ok(format!("Rolled {} dice", dice))
        })
        .description("Roll dice, slowly")
        .param(Parameter::positional("dice", TypeSpec::Int).default(1)),
    )?;

    registry.add(
        Command::new("admin", |_args: Args<Game>| Ok("admin [kick|ban] <player>"))
            .description("Moderation tools")
            .subcommand(
                Command::new("kick", |args: Args<Game>| {
                    Ok(format!("Kicked {}", args.require("player")?))
                })
                .param(Parameter::positional("player", TypeSpec::Str)),
            )
            .subcommand(
                Command::new("ban", |args: Args<Game>| {
                    Ok(format!("Banned {}", args.require("player")?))
                })
                .param(Parameter::positional("player", TypeSpec::Str)),
            ),
    )?;

    Ok(registry)
}

fn print_help(registry: &Registry<Game>) {
    for command in registry.commands() {
        println!("  {:<40} {}", command.signature(), command.about());
    }
    println!("  {:<40} {}", "<partial line>?", "Show completions");
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = verbum::init_subscriber() {
        eprintln!("Error: Failed to install log subscriber: {}", e);
    }

    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(commands = registry.len(), "Console ready");

    let game = Game::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: Failed to read input: {}", e);
                return ExitCode::FAILURE;
            }
        };

        if line.trim() == "help" {
            print_help(&registry);
            continue;
        }

        if let Some(partial) = line.strip_suffix('?') {
            let completion = registry.complete(partial);
            for candidate in &completion.candidates {
                println!("  {}", completion.apply(partial, candidate));
            }
            continue;
        }

        match registry.process_async(&line, &game).await {
            Ok(Value::None) => {}
            Ok(value) => println!("{}", value),
            Err(e @ CommandError::CommandNotFound(_)) => {
                eprintln!("{} (try 'help')", e);
            }
            Err(e) if e.is_user_error() => eprintln!("{}", e),
            Err(e) => eprintln!("Error: {:#}", anyhow::Error::from(e)),
        }
    }
}
