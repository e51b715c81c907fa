//! Registry of top-level commands and line dispatch.
//!
//! A [`Registry`] is an ordered list of command trees. Lookup is first match
//! in insertion order; removal by name scans from the back, so the most
//! recently added command answering to a name is the one removed.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{Command, CommandId};
use crate::complete::{self, Completion};
use crate::error::{CommandError, RegistrationError};
use crate::value::Value;
use crate::view::StringView;
use crate::Context;

/// What to do when a command is added next to another answering to one of
/// its names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Accept silently. The earlier command keeps winning lookups.
    Shadow,
    /// Accept and log a warning.
    #[default]
    Warn,
    /// Refuse with [`RegistrationError::DuplicateName`].
    Reject,
}

/// Registry behaviour, loadable from any serde format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegistryConfig {
    pub duplicate_names: DuplicatePolicy,
}

/// Owned set of top-level commands.
pub struct Registry<C> {
    commands: Vec<Command<C>>,
    config: RegistryConfig,
    /// Next [`CommandId`] to hand out.
    next_id: u64,
}

impl<C: Context> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Context> Registry<C> {
    /// Empty registry with the default [`RegistryConfig`].
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Empty registry with the given behaviour.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            commands: Vec::new(),
            config,
            next_id: 1,
        }
    }

    /// Behaviour this registry was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a top-level command. The command and its subcommands get
    /// fresh ids; the returned one is the command's own.
    pub fn add(&mut self, mut command: Command<C>) -> Result<CommandId, RegistrationError> {
        check_duplicates(&self.commands, &command, self.config.duplicate_names, "")?;

        command.assign_ids(&mut self.next_id);
        let id = command.id();
        debug!(command = command.name(), id = ?id, "Command registered");
        self.commands.push(command);
        Ok(id)
    }

    /// Attach `command` under the command reached by following
    /// `parent_path` from the top level, e.g. `&["admin", "user"]`.
    pub fn add_subcommand(
        &mut self,
        parent_path: &[&str],
        mut command: Command<C>,
    ) -> Result<CommandId, RegistrationError> {
        let path = parent_path.join(" ");
        let policy = self.config.duplicate_names;

        let (first, rest) = parent_path
            .split_first()
            .ok_or_else(|| RegistrationError::ParentNotFound(path.clone()))?;
        let mut parent = self
            .commands
            .iter_mut()
            .find(|cmd| cmd.matches(first))
            .ok_or_else(|| RegistrationError::ParentNotFound(path.clone()))?;
        for name in rest {
            parent = parent
                .children_mut()
                .iter_mut()
                .find(|cmd| cmd.matches(name))
                .ok_or_else(|| RegistrationError::ParentNotFound(path.clone()))?;
        }

        check_duplicates(parent.children(), &command, policy, &path)?;

        command.assign_ids(&mut self.next_id);
        let id = command.id();
        debug!(parent = %path, command = command.name(), id = ?id, "Subcommand registered");
        parent.children_mut().push(command);
        Ok(id)
    }

    /// Remove the most recently added top-level command answering to `name`.
    pub fn remove(&mut self, name: &str) -> Option<Command<C>> {
        let index = self.commands.iter().rposition(|cmd| cmd.matches(name))?;
        let removed = self.commands.remove(index);
        debug!(command = removed.name(), "Command removed");
        Some(removed)
    }

    /// Remove the top-level command with identity `id`.
    pub fn remove_by_id(&mut self, id: CommandId) -> Option<Command<C>> {
        let index = self.commands.iter().position(|cmd| cmd.id() == id)?;
        let removed = self.commands.remove(index);
        debug!(command = removed.name(), "Command removed");
        Some(removed)
    }

    /// First top-level command answering to `name`.
    pub fn get(&self, name: &str) -> Option<&Command<C>> {
        self.commands.iter().find(|cmd| cmd.matches(name))
    }

    /// Top-level commands in registration order.
    pub fn commands(&self) -> &[Command<C>] {
        &self.commands
    }

    /// Number of top-level commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn lookup(&self, view: &mut StringView) -> Result<&Command<C>, CommandError> {
        let name = view.next_word().unwrap_or_default();
        self.get(&name).ok_or_else(|| {
            debug!(command = %name, "Command not found");
            CommandError::CommandNotFound(name)
        })
    }

    /// Dispatch one line on the blocking path.
    pub fn process(&self, line: &str, context: &C) -> Result<Value, CommandError> {
        let mut view = StringView::new(line);
        let command = self.lookup(&mut view)?;
        command.execute(&mut view, context)
    }

    /// Dispatch one line on the suspension-capable path.
    pub async fn process_async(&self, line: &str, context: &C) -> Result<Value, CommandError> {
        let mut view = StringView::new(line);
        let command = self.lookup(&mut view)?;
        command.execute_async(&mut view, context).await
    }

    /// Completion candidates for a partially typed line.
    pub fn complete(&self, line: &str) -> Completion {
        complete::complete(&self.commands, line)
    }
}

fn check_duplicates<C: Context>(
    siblings: &[Command<C>],
    command: &Command<C>,
    policy: DuplicatePolicy,
    parent: &str,
) -> Result<(), RegistrationError> {
    let Some(taken) = command
        .names()
        .iter()
        .find(|name| siblings.iter().any(|sibling| sibling.matches(name)))
    else {
        return Ok(());
    };

    match policy {
        DuplicatePolicy::Shadow => Ok(()),
        DuplicatePolicy::Warn => {
            warn!(name = %taken, parent = %parent, "Command name shadowed by an earlier registration");
            Ok(())
        }
        DuplicatePolicy::Reject => Err(RegistrationError::DuplicateName {
            name: taken.clone(),
        }),
    }
}

impl<C: Context> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("commands", &self.commands)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Args;

    fn named(name: &str, reply: &'static str) -> Command<()> {
        Command::new(name, move |_args: Args<()>| Ok(reply))
    }

    #[test]
    fn test_first_match_wins_and_remove_takes_last() {
        let mut registry = Registry::new();
        registry.add(named("ping", "first")).unwrap();
        registry.add(named("ping", "second")).unwrap();

        assert_eq!(registry.process("ping", &()).unwrap(), Value::from("first"));

        registry.remove("ping").unwrap();
        assert_eq!(registry.process("ping", &()).unwrap(), Value::from("first"));
        registry.remove("ping").unwrap();
        assert!(registry.is_empty());
        assert!(registry.remove("ping").is_none());
    }

    #[test]
    fn test_reject_policy() {
        let mut registry = Registry::with_config(RegistryConfig {
            duplicate_names: DuplicatePolicy::Reject,
        });
        registry.add(named("ping", "a").alias("p")).unwrap();

        let err = registry.add(named("pong", "b").alias("p")).unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateName { name: "p".into() });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_add_subcommand_by_path() {
        let mut registry = Registry::new();
        registry.add(named("admin", "admin").subcommand(named("user", "user"))).unwrap();
        registry.add_subcommand(&["admin", "user"], named("kick", "kicked")).unwrap();

        assert_eq!(registry.process("admin user kick", &()).unwrap(), Value::from("kicked"));
        assert_eq!(
            registry.add_subcommand(&["admin", "nobody"], named("x", "x")).unwrap_err(),
            RegistrationError::ParentNotFound("admin nobody".into())
        );
        assert!(registry.add_subcommand(&[], named("x", "x")).is_err());
    }

    #[test]
    fn test_remove_by_id() {
        let mut registry = Registry::new();
        let first = registry.add(named("ping", "first")).unwrap();
        registry.add(named("ping", "second")).unwrap();

        let removed = registry.remove_by_id(first).unwrap();
        assert_eq!(removed.id(), first);
        assert_eq!(registry.process("ping", &()).unwrap(), Value::from("second"));
        assert!(registry.remove_by_id(first).is_none());
    }

    #[test]
    fn test_ids_are_issued_per_registry() {
        let mut first = Registry::new();
        let mut second = Registry::new();

        let ping = first.add(named("ping", "a")).unwrap();
        let admin = first.add(named("admin", "admin").subcommand(named("user", "user"))).unwrap();
        let kick = first.add_subcommand(&["admin"], named("kick", "kick")).unwrap();
        let user = first.get("admin").unwrap().find_child("user").unwrap().id();

        let ids = [ping, admin, user, kick];
        for (i, id) in ids.iter().enumerate() {
            assert_ne!(*id, CommandId::UNREGISTERED);
            assert!(!ids[..i].contains(id), "id {:?} issued twice", id);
        }

        // A fresh registry numbers from the start again; ids only mean
        // something to the registry that issued them.
        assert_eq!(second.add(named("ping", "b")).unwrap(), ping);
        assert!(second.remove_by_id(ping).is_some());
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_config_from_json() {
        let config: RegistryConfig = serde_json::from_str(r#"{"duplicate-names": "reject"}"#).unwrap();
        assert_eq!(config.duplicate_names, DuplicatePolicy::Reject);

        let config: RegistryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.duplicate_names, DuplicatePolicy::Warn);
    }
}
