//! Magic commands: `%name args...` and `%%name args...` followed by a data block.

pub mod builtins;
pub mod parser;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use clap::ArgMatches;
use tracing::debug;

use crate::shell::{Completion, Shell};

pub use parser::{CommandForm, ParsedCommand, parse_command};

/// Prefix that marks input as a command rather than code.
pub const COMMAND_SIGIL: char = '%';

/// A named capability invoked through the `%`/`%%` syntax.
pub trait Command {
    /// Declare the flags and positional arguments this command accepts.
    ///
    /// `parser` arrives already named after the command, with colors off and no binary
    /// name expected.
    fn options(&self, parser: clap::Command) -> clap::Command {
        parser
    }

    /// Execute the command.
    ///
    /// `data` is everything after the invocation line, verbatim. Errors become rejected
    /// evaluations; returning a [`Completion::Pending`] hands asynchronous work back to
    /// the caller untouched.
    fn run(
        &self,
        shell: &mut Shell,
        args: &ArgMatches,
        data: &str,
        evaluation_id: &str,
    ) -> anyhow::Result<Completion>;
}

impl<F> Command for F
where
    F: Fn(&mut Shell, &ArgMatches, &str, &str) -> anyhow::Result<Completion>,
{
    fn run(
        &self,
        shell: &mut Shell,
        args: &ArgMatches,
        data: &str,
        evaluation_id: &str,
    ) -> anyhow::Result<Completion> {
        self(shell, args, data, evaluation_id)
    }
}

/// Name → command lookup. Filled while building a shell, read-only afterwards.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` under `name`, replacing any earlier registration.
    pub fn register(&mut self, name: impl Into<String>, command: Arc<dyn Command>) {
        let name = name.into();
        if self.commands.insert(name.clone(), command).is_some() {
            debug!(command = %name, "replaced registered command");
        } else {
            debug!(command = %name, "registered command");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtins::{BUILTINS, Inspect, get_builtin};

    #[test]
    fn names_are_sorted_and_replacement_keeps_one_entry() {
        let mut registry = CommandRegistry::new();
        assert!(registry.names().is_empty());

        registry.register("zeta", Arc::new(Inspect));
        registry.register("alpha", Arc::new(Inspect));
        registry.register("zeta", Arc::new(Inspect));

        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
        assert!(registry.get("alpha").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn every_builtin_name_resolves() {
        for name in BUILTINS {
            assert!(get_builtin(name).is_some(), "{name}");
        }
        assert!(get_builtin("cd").is_none());
    }
}
